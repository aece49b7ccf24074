use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// One of the two daily delivery occasions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DeliverySlot {
    Morning,
    Evening,
}

impl Display for DeliverySlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slot = match self {
            DeliverySlot::Morning => "MORNING",
            DeliverySlot::Evening => "EVENING",
        };
        write!(f, "{}", slot)
    }
}

impl DeliverySlot {
    pub fn from_str(value: &str) -> Self {
        match value {
            "MORNING" => DeliverySlot::Morning,
            _ => DeliverySlot::Evening,
        }
    }
}

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Lifecycle of a delivery log entry: created as `Reserved`, then exactly one
/// terminal transition to `Sent` or `Failed`.
#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DeliveryStatus {
    #[default]
    Reserved,
    Sent,
    Failed,
}

impl Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            DeliveryStatus::Reserved => "RESERVED",
            DeliveryStatus::Sent => "SENT",
            DeliveryStatus::Failed => "FAILED",
        };
        write!(f, "{}", status)
    }
}

impl DeliveryStatus {
    pub fn from_str(value: &str) -> Self {
        match value {
            "RESERVED" => DeliveryStatus::Reserved,
            "SENT" => DeliveryStatus::Sent,
            _ => DeliveryStatus::Failed,
        }
    }
}

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Position of a subscriber within a guided input flow. `Idle` means no flow
/// is pending; unknown stored values decode to `Idle` rather than failing.
#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ConversationStep {
    #[default]
    Idle,
    WaitingLocation,
    WaitingMorningTime,
    WaitingEveningTime,
    WaitingUpdateMorningTime,
    WaitingUpdateEveningTime,
}

impl Display for ConversationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let step = match self {
            ConversationStep::Idle => "IDLE",
            ConversationStep::WaitingLocation => "WAITING_LOCATION",
            ConversationStep::WaitingMorningTime => "WAITING_MORNING_TIME",
            ConversationStep::WaitingEveningTime => "WAITING_EVENING_TIME",
            ConversationStep::WaitingUpdateMorningTime => "WAITING_UPDATE_MORNING_TIME",
            ConversationStep::WaitingUpdateEveningTime => "WAITING_UPDATE_EVENING_TIME",
        };
        write!(f, "{}", step)
    }
}

impl ConversationStep {
    pub fn from_str(value: &str) -> Self {
        match value {
            "WAITING_LOCATION" => ConversationStep::WaitingLocation,
            "WAITING_MORNING_TIME" => ConversationStep::WaitingMorningTime,
            "WAITING_EVENING_TIME" => ConversationStep::WaitingEveningTime,
            "WAITING_UPDATE_MORNING_TIME" => ConversationStep::WaitingUpdateMorningTime,
            "WAITING_UPDATE_EVENING_TIME" => ConversationStep::WaitingUpdateEveningTime,
            _ => ConversationStep::Idle,
        }
    }
}

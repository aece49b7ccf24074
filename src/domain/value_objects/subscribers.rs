use serde::{Deserialize, Serialize};

/// Committed at the end of onboarding; activates the profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OnboardingProfile {
    pub telegram_user_id: i64,
    pub telegram_chat_id: i64,
    pub timezone: String,
    pub morning_time: String,
    pub evening_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocationUpdate {
    pub telegram_user_id: i64,
    pub telegram_chat_id: i64,
    pub lat: f64,
    pub lon: f64,
    pub timezone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimezoneUpdate {
    pub telegram_user_id: i64,
    pub telegram_chat_id: i64,
    pub timezone: String,
}

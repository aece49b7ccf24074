use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::subscribers::SubscriberEntity;
use crate::domain::value_objects::subscribers::{
    LocationUpdate, OnboardingProfile, TimezoneUpdate,
};

#[async_trait]
#[automock]
pub trait SubscriberRepository {
    async fn find_by_telegram_user_id(
        &self,
        telegram_user_id: i64,
    ) -> Result<Option<SubscriberEntity>>;

    /// Creates or updates the profile with both delivery times and activates
    /// it. The commit half of onboarding.
    async fn upsert_onboarding(&self, profile: OnboardingProfile) -> Result<SubscriberEntity>;

    async fn set_active(&self, id: Uuid, is_active: bool) -> Result<()>;

    async fn update_morning_time(&self, id: Uuid, value: String) -> Result<()>;

    async fn update_evening_time(&self, id: Uuid, value: String) -> Result<()>;

    /// Saves the timezone, creating an inactive profile if none exists yet.
    async fn save_timezone(&self, update: TimezoneUpdate) -> Result<()>;

    /// Saves geolocation plus timezone, creating a profile if none exists.
    async fn save_location(&self, update: LocationUpdate) -> Result<()>;

    /// Active subscribers with at least one delivery time configured.
    async fn list_active_eligible(&self) -> Result<Vec<SubscriberEntity>>;
}

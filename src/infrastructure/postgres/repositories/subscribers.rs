use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{RunQueryDsl, insert_into, prelude::*, update};
use uuid::Uuid;

use crate::{
    domain::{
        entities::subscribers::{InsertSubscriberEntity, SubscriberEntity},
        repositories::subscribers::SubscriberRepository,
        value_objects::subscribers::{LocationUpdate, OnboardingProfile, TimezoneUpdate},
    },
    infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::subscribers},
};

pub struct SubscriberPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SubscriberPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SubscriberRepository for SubscriberPostgres {
    async fn find_by_telegram_user_id(
        &self,
        telegram_user_id: i64,
    ) -> Result<Option<SubscriberEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = subscribers::table
            .filter(subscribers::telegram_user_id.eq(telegram_user_id))
            .select(SubscriberEntity::as_select())
            .first::<SubscriberEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn upsert_onboarding(&self, profile: OnboardingProfile) -> Result<SubscriberEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let existing = subscribers::table
            .filter(subscribers::telegram_user_id.eq(profile.telegram_user_id))
            .select(subscribers::id)
            .first::<Uuid>(&mut conn)
            .optional()?;

        let result = match existing {
            Some(id) => update(subscribers::table)
                .filter(subscribers::id.eq(id))
                .set((
                    subscribers::telegram_chat_id.eq(profile.telegram_chat_id),
                    subscribers::timezone.eq(profile.timezone),
                    subscribers::morning_time.eq(Some(profile.morning_time)),
                    subscribers::evening_time.eq(Some(profile.evening_time)),
                    subscribers::is_active.eq(true),
                    subscribers::updated_at.eq(Utc::now()),
                ))
                .returning(SubscriberEntity::as_returning())
                .get_result::<SubscriberEntity>(&mut conn)?,
            None => insert_into(subscribers::table)
                .values(&InsertSubscriberEntity {
                    telegram_user_id: profile.telegram_user_id,
                    telegram_chat_id: profile.telegram_chat_id,
                    timezone: profile.timezone,
                    lat: None,
                    lon: None,
                    morning_time: Some(profile.morning_time),
                    evening_time: Some(profile.evening_time),
                    is_active: true,
                })
                .returning(SubscriberEntity::as_returning())
                .get_result::<SubscriberEntity>(&mut conn)?,
        };

        Ok(result)
    }

    async fn set_active(&self, id: Uuid, is_active: bool) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(subscribers::table)
            .filter(subscribers::id.eq(id))
            .set((
                subscribers::is_active.eq(is_active),
                subscribers::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn update_morning_time(&self, id: Uuid, value: String) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(subscribers::table)
            .filter(subscribers::id.eq(id))
            .set((
                subscribers::morning_time.eq(Some(value)),
                subscribers::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn update_evening_time(&self, id: Uuid, value: String) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(subscribers::table)
            .filter(subscribers::id.eq(id))
            .set((
                subscribers::evening_time.eq(Some(value)),
                subscribers::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn save_timezone(&self, timezone_update: TimezoneUpdate) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let existing = subscribers::table
            .filter(subscribers::telegram_user_id.eq(timezone_update.telegram_user_id))
            .select(subscribers::id)
            .first::<Uuid>(&mut conn)
            .optional()?;

        match existing {
            Some(id) => {
                update(subscribers::table)
                    .filter(subscribers::id.eq(id))
                    .set((
                        subscribers::telegram_chat_id.eq(timezone_update.telegram_chat_id),
                        subscribers::timezone.eq(timezone_update.timezone),
                        subscribers::updated_at.eq(Utc::now()),
                    ))
                    .execute(&mut conn)?;
            }
            None => {
                insert_into(subscribers::table)
                    .values(&InsertSubscriberEntity {
                        telegram_user_id: timezone_update.telegram_user_id,
                        telegram_chat_id: timezone_update.telegram_chat_id,
                        timezone: timezone_update.timezone,
                        lat: None,
                        lon: None,
                        morning_time: None,
                        evening_time: None,
                        is_active: false,
                    })
                    .execute(&mut conn)?;
            }
        }

        Ok(())
    }

    async fn save_location(&self, location_update: LocationUpdate) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let existing = subscribers::table
            .filter(subscribers::telegram_user_id.eq(location_update.telegram_user_id))
            .select(subscribers::id)
            .first::<Uuid>(&mut conn)
            .optional()?;

        match existing {
            Some(id) => {
                update(subscribers::table)
                    .filter(subscribers::id.eq(id))
                    .set((
                        subscribers::telegram_chat_id.eq(location_update.telegram_chat_id),
                        subscribers::lat.eq(Some(location_update.lat)),
                        subscribers::lon.eq(Some(location_update.lon)),
                        subscribers::timezone.eq(location_update.timezone),
                        subscribers::updated_at.eq(Utc::now()),
                    ))
                    .execute(&mut conn)?;
            }
            None => {
                insert_into(subscribers::table)
                    .values(&InsertSubscriberEntity {
                        telegram_user_id: location_update.telegram_user_id,
                        telegram_chat_id: location_update.telegram_chat_id,
                        timezone: location_update.timezone,
                        lat: Some(location_update.lat),
                        lon: Some(location_update.lon),
                        morning_time: None,
                        evening_time: None,
                        is_active: false,
                    })
                    .execute(&mut conn)?;
            }
        }

        Ok(())
    }

    async fn list_active_eligible(&self) -> Result<Vec<SubscriberEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = subscribers::table
            .filter(subscribers::is_active.eq(true))
            .filter(
                subscribers::morning_time
                    .is_not_null()
                    .or(subscribers::evening_time.is_not_null()),
            )
            .select(SubscriberEntity::as_select())
            .load::<SubscriberEntity>(&mut conn)?;

        Ok(results)
    }
}

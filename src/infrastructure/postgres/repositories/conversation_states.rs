use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{RunQueryDsl, insert_into, prelude::*};

use crate::{
    domain::{
        entities::conversation_states::{ConversationStateEntity, UpsertConversationStateEntity},
        repositories::conversation_states::ConversationStateRepository,
        value_objects::enums::conversation_steps::ConversationStep,
    },
    infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::conversation_states},
};

pub struct ConversationStatePostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl ConversationStatePostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }

    fn upsert(
        &self,
        telegram_user_id: i64,
        step: ConversationStep,
        payload: serde_json::Value,
    ) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = UpsertConversationStateEntity {
            telegram_user_id,
            step: step.to_string(),
            payload,
            updated_at: Utc::now(),
        };

        insert_into(conversation_states::table)
            .values(&row)
            .on_conflict(conversation_states::telegram_user_id)
            .do_update()
            .set((
                conversation_states::step.eq(&row.step),
                conversation_states::payload.eq(&row.payload),
                conversation_states::updated_at.eq(row.updated_at),
            ))
            .execute(&mut conn)?;

        Ok(())
    }
}

#[async_trait]
impl ConversationStateRepository for ConversationStatePostgres {
    async fn get(&self, telegram_user_id: i64) -> Result<Option<ConversationStateEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = conversation_states::table
            .find(telegram_user_id)
            .select(ConversationStateEntity::as_select())
            .first::<ConversationStateEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn set(
        &self,
        telegram_user_id: i64,
        step: ConversationStep,
        payload: serde_json::Value,
    ) -> Result<()> {
        self.upsert(telegram_user_id, step, payload)
    }

    async fn clear(&self, telegram_user_id: i64) -> Result<()> {
        self.upsert(telegram_user_id, ConversationStep::Idle, serde_json::json!({}))
    }
}

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::infrastructure::postgres::schema::conversation_states;

/// At most one row per subscriber; writing a new step replaces the payload.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = conversation_states)]
#[diesel(primary_key(telegram_user_id))]
pub struct ConversationStateEntity {
    pub telegram_user_id: i64,
    pub step: String,
    pub payload: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = conversation_states)]
pub struct UpsertConversationStateEntity {
    pub telegram_user_id: i64,
    pub step: String,
    pub payload: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

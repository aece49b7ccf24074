use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::subscribers;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = subscribers)]
pub struct SubscriberEntity {
    pub id: Uuid,
    pub telegram_user_id: i64,
    pub telegram_chat_id: i64,
    pub timezone: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub morning_time: Option<String>,
    pub evening_time: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = subscribers)]
pub struct InsertSubscriberEntity {
    pub telegram_user_id: i64,
    pub telegram_chat_id: i64,
    pub timezone: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub morning_time: Option<String>,
    pub evening_time: Option<String>,
    pub is_active: bool,
}

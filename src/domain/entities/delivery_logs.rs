use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::delivery_logs;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = delivery_logs)]
pub struct DeliveryLogEntity {
    pub id: Uuid,
    pub subscriber_id: Uuid,
    pub slot: String,
    pub target_date: NaiveDate,
    pub scheduled_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub status: String,
    pub error: Option<String>,
    pub dedupe_key: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = delivery_logs)]
pub struct InsertDeliveryLogEntity {
    pub subscriber_id: Uuid,
    pub slot: String,
    pub target_date: NaiveDate,
    pub scheduled_at: DateTime<Utc>,
    pub status: String,
    pub error: Option<String>,
    pub dedupe_key: String,
}

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::{RunQueryDsl, insert_into, prelude::*, update};
use uuid::Uuid;

use crate::{
    domain::{
        entities::delivery_logs::InsertDeliveryLogEntity,
        repositories::delivery_ledger::{DeliveryLedgerRepository, Reservation, dedupe_key},
        value_objects::enums::{
            delivery_slots::DeliverySlot, delivery_statuses::DeliveryStatus,
        },
    },
    infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::delivery_logs},
};

pub struct DeliveryLedgerPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl DeliveryLedgerPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl DeliveryLedgerRepository for DeliveryLedgerPostgres {
    async fn reserve(
        &self,
        subscriber_id: Uuid,
        slot: DeliverySlot,
        target_date: NaiveDate,
    ) -> Result<Reservation> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let key = dedupe_key(subscriber_id, slot, target_date);

        let existing = delivery_logs::table
            .filter(delivery_logs::dedupe_key.eq(&key))
            .select(delivery_logs::id)
            .first::<Uuid>(&mut conn)
            .optional()?;

        if existing.is_some() {
            return Ok(Reservation::not_reserved());
        }

        let inserted = insert_into(delivery_logs::table)
            .values(&InsertDeliveryLogEntity {
                subscriber_id,
                slot: slot.to_string(),
                target_date,
                scheduled_at: Utc::now(),
                status: DeliveryStatus::Reserved.to_string(),
                error: None,
                dedupe_key: key,
            })
            .returning(delivery_logs::id)
            .get_result::<Uuid>(&mut conn);

        match inserted {
            Ok(entry_id) => Ok(Reservation {
                reserved: true,
                entry_id: Some(entry_id),
            }),
            // The unique constraint is the mutual-exclusion primitive: a
            // concurrent run winning the insert race is not an error.
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                Ok(Reservation::not_reserved())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn mark_status(
        &self,
        entry_id: Uuid,
        status: DeliveryStatus,
        error: Option<String>,
    ) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        match status {
            DeliveryStatus::Sent => {
                update(delivery_logs::table)
                    .filter(delivery_logs::id.eq(entry_id))
                    .set((
                        delivery_logs::status.eq(status.to_string()),
                        delivery_logs::error.eq(error),
                        delivery_logs::sent_at.eq(Some(Utc::now())),
                    ))
                    .execute(&mut conn)?;
            }
            _ => {
                update(delivery_logs::table)
                    .filter(delivery_logs::id.eq(entry_id))
                    .set((
                        delivery_logs::status.eq(status.to_string()),
                        delivery_logs::error.eq(error),
                    ))
                    .execute(&mut conn)?;
            }
        }

        Ok(())
    }
}

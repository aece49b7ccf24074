use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use mockall::automock;
use uuid::Uuid;

use crate::domain::value_objects::enums::{
    delivery_slots::DeliverySlot, delivery_statuses::DeliveryStatus,
};

/// Outcome of a reservation attempt. `reserved == false` means another run
/// already claimed this (subscriber, slot, date) and the caller must not send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    pub reserved: bool,
    pub entry_id: Option<Uuid>,
}

impl Reservation {
    pub fn not_reserved() -> Self {
        Self {
            reserved: false,
            entry_id: None,
        }
    }
}

/// Uniqueness anchor for at-most-once delivery. The store must enforce a
/// unique constraint on this key.
pub fn dedupe_key(subscriber_id: Uuid, slot: DeliverySlot, target_date: NaiveDate) -> String {
    format!("{}:{}:{}", subscriber_id, slot, target_date.format("%Y-%m-%d"))
}

#[async_trait]
#[automock]
pub trait DeliveryLedgerRepository {
    /// Claims the (subscriber, slot, date) triple. A unique-key collision is
    /// not an error: it reports `reserved = false`.
    async fn reserve(
        &self,
        subscriber_id: Uuid,
        slot: DeliverySlot,
        target_date: NaiveDate,
    ) -> Result<Reservation>;

    /// Single terminal write; only called once per reservation, by its owner.
    async fn mark_status(
        &self,
        entry_id: Uuid,
        status: DeliveryStatus,
        error: Option<String>,
    ) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedupe_key_is_deterministic() {
        let subscriber_id = Uuid::nil();
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();

        assert_eq!(
            dedupe_key(subscriber_id, DeliverySlot::Morning, date),
            "00000000-0000-0000-0000-000000000000:MORNING:2024-03-05"
        );
        assert_eq!(
            dedupe_key(subscriber_id, DeliverySlot::Evening, date),
            "00000000-0000-0000-0000-000000000000:EVENING:2024-03-05"
        );
    }
}

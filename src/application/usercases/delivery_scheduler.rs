use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use tokio::task::JoinSet;
use tracing::{error, info};
use uuid::Uuid;

use crate::application::interfaces::{
    content_provider::{ContentError, ContentMode, ContentProvider},
    message_dispatcher::MessageDispatcher,
};
use crate::domain::{
    entities::subscribers::SubscriberEntity,
    repositories::{
        delivery_ledger::DeliveryLedgerRepository, subscribers::SubscriberRepository,
    },
    value_objects::{
        enums::{delivery_slots::DeliverySlot, delivery_statuses::DeliveryStatus},
        local_time,
    },
};

/// A slot that matched the current minute for one subscriber.
#[derive(Debug, Clone, PartialEq)]
pub struct DueDelivery {
    pub subscriber_id: Uuid,
    pub telegram_chat_id: i64,
    pub slot: DeliverySlot,
    pub target_date: NaiveDate,
    pub timezone: Tz,
    pub mode: ContentMode,
}

/// Evaluates one subscriber against the current instant. Matching is exact
/// string equality on local `HH:mm`; a missed minute skips the slot for the
/// day.
pub fn due_deliveries(
    subscriber: &SubscriberEntity,
    now: DateTime<Utc>,
    default_timezone: &str,
) -> Vec<DueDelivery> {
    let timezone = local_time::resolve_timezone(&subscriber.timezone, default_timezone);
    let hh_mm = local_time::local_hh_mm(now, timezone);

    let mut due = Vec::new();

    if subscriber.morning_time.as_deref() == Some(hh_mm.as_str()) {
        due.push(DueDelivery {
            subscriber_id: subscriber.id,
            telegram_chat_id: subscriber.telegram_chat_id,
            slot: DeliverySlot::Morning,
            target_date: local_time::local_date(now, timezone),
            timezone,
            mode: ContentMode::Today,
        });
    }

    if subscriber.evening_time.as_deref() == Some(hh_mm.as_str()) {
        due.push(DueDelivery {
            subscriber_id: subscriber.id,
            telegram_chat_id: subscriber.telegram_chat_id,
            slot: DeliverySlot::Evening,
            target_date: local_time::local_date_tomorrow(now, timezone),
            timezone,
            mode: ContentMode::Tomorrow,
        });
    }

    due
}

pub struct DeliverySchedulerUseCase<S, L, C, D>
where
    S: SubscriberRepository + Send + Sync + 'static,
    L: DeliveryLedgerRepository + Send + Sync + 'static,
    C: ContentProvider + Send + Sync + 'static,
    D: MessageDispatcher + Send + Sync + 'static,
{
    subscriber_repo: Arc<S>,
    ledger_repo: Arc<L>,
    content_provider: Arc<C>,
    dispatcher: Arc<D>,
    default_timezone: String,
    dispatch_timeout: Duration,
    concurrency: usize,
}

impl<S, L, C, D> DeliverySchedulerUseCase<S, L, C, D>
where
    S: SubscriberRepository + Send + Sync + 'static,
    L: DeliveryLedgerRepository + Send + Sync + 'static,
    C: ContentProvider + Send + Sync + 'static,
    D: MessageDispatcher + Send + Sync + 'static,
{
    pub fn new(
        subscriber_repo: Arc<S>,
        ledger_repo: Arc<L>,
        content_provider: Arc<C>,
        dispatcher: Arc<D>,
        default_timezone: String,
        dispatch_timeout: Duration,
        concurrency: usize,
    ) -> Self {
        Self {
            subscriber_repo,
            ledger_repo,
            content_provider,
            dispatcher,
            default_timezone,
            dispatch_timeout,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn tick(&self) -> Result<()> {
        self.tick_at(Utc::now()).await
    }

    /// One scheduler pass. Failures are isolated per delivery; this only
    /// errors when the subscriber listing itself fails.
    pub async fn tick_at(&self, now: DateTime<Utc>) -> Result<()> {
        let subscribers = self.subscriber_repo.list_active_eligible().await?;

        let deliveries: Vec<DueDelivery> = subscribers
            .iter()
            .flat_map(|subscriber| due_deliveries(subscriber, now, &self.default_timezone))
            .collect();

        if deliveries.is_empty() {
            return Ok(());
        }

        info!("Tick matched {} due deliveries", deliveries.len());

        let mut set: JoinSet<()> = JoinSet::new();
        for delivery in deliveries {
            while set.len() >= self.concurrency {
                if let Some(Err(join_error)) = set.join_next().await {
                    error!("Delivery task panicked: {}", join_error);
                }
            }

            let ledger_repo = Arc::clone(&self.ledger_repo);
            let content_provider = Arc::clone(&self.content_provider);
            let dispatcher = Arc::clone(&self.dispatcher);
            let timeout = self.dispatch_timeout;

            set.spawn(Self::process_delivery(
                ledger_repo,
                content_provider,
                dispatcher,
                delivery,
                timeout,
            ));
        }

        while let Some(result) = set.join_next().await {
            if let Err(join_error) = result {
                error!("Delivery task panicked: {}", join_error);
            }
        }

        Ok(())
    }

    /// Reserve first, then generate and dispatch. The reservation is the only
    /// guard against duplicate sends, so it must precede any slow work.
    async fn process_delivery(
        ledger_repo: Arc<L>,
        content_provider: Arc<C>,
        dispatcher: Arc<D>,
        delivery: DueDelivery,
        timeout: Duration,
    ) {
        let reservation = match ledger_repo
            .reserve(delivery.subscriber_id, delivery.slot, delivery.target_date)
            .await
        {
            Ok(reservation) => reservation,
            Err(e) => {
                error!(
                    subscriber_id = %delivery.subscriber_id,
                    slot = %delivery.slot,
                    target_date = %delivery.target_date,
                    "Failed to reserve delivery: {}", e
                );
                return;
            }
        };

        if !reservation.reserved {
            return;
        }
        let Some(entry_id) = reservation.entry_id else {
            return;
        };

        let outcome = tokio::time::timeout(
            timeout,
            Self::generate_and_send(content_provider, dispatcher, &delivery),
        )
        .await;

        let (status, error_text) = match outcome {
            Ok(Ok(())) => (DeliveryStatus::Sent, None),
            Ok(Err(e)) => (DeliveryStatus::Failed, Some(e.to_string())),
            Err(_) => (
                DeliveryStatus::Failed,
                Some(format!("delivery timed out after {:?}", timeout)),
            ),
        };

        if let Some(error_text) = &error_text {
            error!(
                subscriber_id = %delivery.subscriber_id,
                slot = %delivery.slot,
                target_date = %delivery.target_date,
                "Delivery failed: {}", error_text
            );
        }

        if let Err(e) = ledger_repo.mark_status(entry_id, status, error_text).await {
            error!(
                subscriber_id = %delivery.subscriber_id,
                slot = %delivery.slot,
                "Failed to record delivery status: {}", e
            );
        }
    }

    async fn generate_and_send(
        content_provider: Arc<C>,
        dispatcher: Arc<D>,
        delivery: &DueDelivery,
    ) -> Result<()> {
        let text = content_provider
            .generate(delivery.target_date, delivery.timezone, delivery.mode)
            .await
            .map_err(|e| match e {
                ContentError::RateLimited => anyhow::anyhow!("content provider rate limited"),
                ContentError::Other(inner) => inner,
            })?;

        dispatcher
            .send(delivery.telegram_chat_id, &text, None)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mockall::predicate::eq;

    use crate::application::interfaces::{
        content_provider::MockContentProvider, message_dispatcher::MockMessageDispatcher,
    };
    use crate::domain::repositories::{
        delivery_ledger::{MockDeliveryLedgerRepository, Reservation},
        subscribers::MockSubscriberRepository,
    };

    fn sample_subscriber(morning: Option<&str>, evening: Option<&str>) -> SubscriberEntity {
        let now = Utc::now();
        SubscriberEntity {
            id: Uuid::new_v4(),
            telegram_user_id: 1001,
            telegram_chat_id: 2002,
            timezone: "Europe/Moscow".to_string(),
            lat: None,
            lon: None,
            morning_time: morning.map(|v| v.to_string()),
            evening_time: evening.map(|v| v.to_string()),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn scheduler(
        subscriber_repo: MockSubscriberRepository,
        ledger_repo: MockDeliveryLedgerRepository,
        content_provider: MockContentProvider,
        dispatcher: MockMessageDispatcher,
    ) -> DeliverySchedulerUseCase<
        MockSubscriberRepository,
        MockDeliveryLedgerRepository,
        MockContentProvider,
        MockMessageDispatcher,
    > {
        DeliverySchedulerUseCase::new(
            Arc::new(subscriber_repo),
            Arc::new(ledger_repo),
            Arc::new(content_provider),
            Arc::new(dispatcher),
            "Europe/Amsterdam".to_string(),
            Duration::from_secs(5),
            4,
        )
    }

    // 05:30 UTC is 08:30 in Moscow (UTC+3, no DST).
    fn moscow_morning() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 5, 30, 0).unwrap()
    }

    #[test]
    fn matches_local_time_not_utc() {
        let subscriber = sample_subscriber(Some("08:30"), None);

        let due = due_deliveries(&subscriber, moscow_morning(), "Europe/Amsterdam");
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].slot, DeliverySlot::Morning);
        assert_eq!(due[0].mode, ContentMode::Today);
        assert_eq!(
            due[0].target_date,
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
        );

        // The same wall-clock value in UTC must not match.
        let utc_0830 = Utc.with_ymd_and_hms(2024, 3, 15, 8, 30, 0).unwrap();
        assert!(due_deliveries(&subscriber, utc_0830, "Europe/Amsterdam").is_empty());

        // Adjacent minutes must not match either.
        let one_minute_later = Utc.with_ymd_and_hms(2024, 3, 15, 5, 31, 0).unwrap();
        assert!(due_deliveries(&subscriber, one_minute_later, "Europe/Amsterdam").is_empty());
    }

    #[test]
    fn evening_slot_targets_local_tomorrow() {
        let subscriber = sample_subscriber(None, Some("08:30"));

        let due = due_deliveries(&subscriber, moscow_morning(), "Europe/Amsterdam");
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].slot, DeliverySlot::Evening);
        assert_eq!(due[0].mode, ContentMode::Tomorrow);
        assert_eq!(
            due[0].target_date,
            NaiveDate::from_ymd_opt(2024, 3, 16).unwrap()
        );
    }

    #[test]
    fn invalid_timezone_falls_back_to_default() {
        let mut subscriber = sample_subscriber(Some("06:30"), None);
        subscriber.timezone = "Not/AZone".to_string();

        // 05:30 UTC is 06:30 in Amsterdam (CET, winter).
        let instant = Utc.with_ymd_and_hms(2024, 1, 15, 5, 30, 0).unwrap();
        let due = due_deliveries(&subscriber, instant, "Europe/Amsterdam");
        assert_eq!(due.len(), 1);
    }

    #[tokio::test]
    async fn reserved_slot_is_generated_and_sent() {
        let subscriber = sample_subscriber(Some("08:30"), None);
        let subscriber_id = subscriber.id;
        let entry_id = Uuid::new_v4();
        let target_date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();

        let mut subscriber_repo = MockSubscriberRepository::new();
        subscriber_repo
            .expect_list_active_eligible()
            .returning(move || {
                let subscriber = subscriber.clone();
                Box::pin(async move { Ok(vec![subscriber]) })
            });

        let mut ledger_repo = MockDeliveryLedgerRepository::new();
        ledger_repo
            .expect_reserve()
            .with(
                eq(subscriber_id),
                eq(DeliverySlot::Morning),
                eq(target_date),
            )
            .times(1)
            .returning(move |_, _, _| {
                Box::pin(async move {
                    Ok(Reservation {
                        reserved: true,
                        entry_id: Some(entry_id),
                    })
                })
            });
        ledger_repo
            .expect_mark_status()
            .with(eq(entry_id), eq(DeliveryStatus::Sent), eq(None::<String>))
            .times(1)
            .returning(|_, _, _| Box::pin(async { Ok(()) }));

        let mut content_provider = MockContentProvider::new();
        content_provider
            .expect_generate()
            .with(
                eq(target_date),
                eq(chrono_tz::Europe::Moscow),
                eq(ContentMode::Today),
            )
            .times(1)
            .returning(|_, _, _| Box::pin(async { Ok("good morning".to_string()) }));

        let mut dispatcher = MockMessageDispatcher::new();
        dispatcher
            .expect_send()
            .withf(|chat_id, text, markup| {
                *chat_id == 2002 && text == "good morning" && markup.is_none()
            })
            .times(1)
            .returning(|_, _, _| Box::pin(async { Ok(()) }));

        let usecase = scheduler(subscriber_repo, ledger_repo, content_provider, dispatcher);
        usecase.tick_at(moscow_morning()).await.unwrap();
    }

    #[tokio::test]
    async fn second_tick_in_same_minute_sends_nothing() {
        let subscriber = sample_subscriber(Some("08:30"), None);

        let mut subscriber_repo = MockSubscriberRepository::new();
        subscriber_repo
            .expect_list_active_eligible()
            .returning(move || {
                let subscriber = subscriber.clone();
                Box::pin(async move { Ok(vec![subscriber]) })
            });

        let mut ledger_repo = MockDeliveryLedgerRepository::new();
        ledger_repo
            .expect_reserve()
            .times(1)
            .returning(|_, _, _| Box::pin(async { Ok(Reservation::not_reserved()) }));
        ledger_repo.expect_mark_status().times(0);

        let mut content_provider = MockContentProvider::new();
        content_provider.expect_generate().times(0);

        let mut dispatcher = MockMessageDispatcher::new();
        dispatcher.expect_send().times(0);

        let usecase = scheduler(subscriber_repo, ledger_repo, content_provider, dispatcher);
        usecase.tick_at(moscow_morning()).await.unwrap();
    }

    #[tokio::test]
    async fn dispatch_failure_is_recorded_as_terminal() {
        let subscriber = sample_subscriber(Some("08:30"), None);
        let entry_id = Uuid::new_v4();

        let mut subscriber_repo = MockSubscriberRepository::new();
        subscriber_repo
            .expect_list_active_eligible()
            .returning(move || {
                let subscriber = subscriber.clone();
                Box::pin(async move { Ok(vec![subscriber]) })
            });

        let mut ledger_repo = MockDeliveryLedgerRepository::new();
        ledger_repo.expect_reserve().returning(move |_, _, _| {
            Box::pin(async move {
                Ok(Reservation {
                    reserved: true,
                    entry_id: Some(entry_id),
                })
            })
        });
        ledger_repo
            .expect_mark_status()
            .withf(move |id, status, error| {
                *id == entry_id
                    && *status == DeliveryStatus::Failed
                    && error.as_deref() == Some("chat unreachable")
            })
            .times(1)
            .returning(|_, _, _| Box::pin(async { Ok(()) }));

        let mut content_provider = MockContentProvider::new();
        content_provider
            .expect_generate()
            .returning(|_, _, _| Box::pin(async { Ok("text".to_string()) }));

        let mut dispatcher = MockMessageDispatcher::new();
        dispatcher
            .expect_send()
            .returning(|_, _, _| Box::pin(async { Err(anyhow::anyhow!("chat unreachable")) }));

        let usecase = scheduler(subscriber_repo, ledger_repo, content_provider, dispatcher);
        usecase.tick_at(moscow_morning()).await.unwrap();
    }

    #[tokio::test]
    async fn one_subscriber_failure_does_not_abort_the_tick() {
        let failing = sample_subscriber(Some("08:30"), None);
        let healthy = sample_subscriber(Some("08:30"), None);
        let failing_id = failing.id;
        let entry_id = Uuid::new_v4();

        let mut subscriber_repo = MockSubscriberRepository::new();
        subscriber_repo
            .expect_list_active_eligible()
            .returning(move || {
                let subscribers = vec![failing.clone(), healthy.clone()];
                Box::pin(async move { Ok(subscribers) })
            });

        let mut ledger_repo = MockDeliveryLedgerRepository::new();
        ledger_repo
            .expect_reserve()
            .times(2)
            .returning(move |subscriber_id, _, _| {
                Box::pin(async move {
                    if subscriber_id == failing_id {
                        Err(anyhow::anyhow!("ledger unavailable"))
                    } else {
                        Ok(Reservation {
                            reserved: true,
                            entry_id: Some(entry_id),
                        })
                    }
                })
            });
        ledger_repo
            .expect_mark_status()
            .with(eq(entry_id), eq(DeliveryStatus::Sent), eq(None::<String>))
            .times(1)
            .returning(|_, _, _| Box::pin(async { Ok(()) }));

        let mut content_provider = MockContentProvider::new();
        content_provider
            .expect_generate()
            .times(1)
            .returning(|_, _, _| Box::pin(async { Ok("text".to_string()) }));

        let mut dispatcher = MockMessageDispatcher::new();
        dispatcher
            .expect_send()
            .times(1)
            .returning(|_, _, _| Box::pin(async { Ok(()) }));

        let usecase = scheduler(subscriber_repo, ledger_repo, content_provider, dispatcher);
        usecase.tick_at(moscow_morning()).await.unwrap();
    }
}

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::time::MissedTickBehavior;
use tracing::error;

use crate::application::{
    interfaces::{content_provider::ContentProvider, message_dispatcher::MessageDispatcher},
    usercases::delivery_scheduler::DeliverySchedulerUseCase,
};
use crate::domain::repositories::{
    delivery_ledger::DeliveryLedgerRepository, subscribers::SubscriberRepository,
};

const TICK_INTERVAL: Duration = Duration::from_secs(60);

/// Drives the scheduler once a minute. A slow tick skips the missed beats
/// instead of firing them back to back; the ledger makes repeats harmless
/// either way.
pub async fn run_scheduler_loop<S, L, C, D>(
    usecase: Arc<DeliverySchedulerUseCase<S, L, C, D>>,
) -> Result<()>
where
    S: SubscriberRepository + Send + Sync + 'static,
    L: DeliveryLedgerRepository + Send + Sync + 'static,
    C: ContentProvider + Send + Sync + 'static,
    D: MessageDispatcher + Send + Sync + 'static,
{
    let mut interval = tokio::time::interval(TICK_INTERVAL);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        interval.tick().await;

        if let Err(e) = usecase.tick().await {
            error!("Scheduler tick failed: {}", e);
        }
    }
}

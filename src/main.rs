use std::sync::Arc;

use anyhow::Result;
use daily_guide::{
    application::usercases::delivery_scheduler::DeliverySchedulerUseCase,
    config::config_loader,
    infrastructure::{
        axum_http::http_serve,
        content::daily_content::DailyContentProvider,
        postgres::{
            postgres_connection,
            repositories::{
                delivery_ledger::DeliveryLedgerPostgres, subscribers::SubscriberPostgres,
            },
        },
        telegram::telegram_api::TelegramApi,
    },
    scheduler::scheduler_loop,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(error) = run().await {
        error!("Service exited with error: {}", error);
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Arc::new(config_loader::load()?);
    info!("ENV has been loaded");

    let db_pool = Arc::new(postgres_connection::establish_connection(
        &config.database.url,
    )?);
    info!("Postgres connection has been established");

    let telegram_api = Arc::new(TelegramApi::new(
        config.telegram.api_base_url.clone(),
        config.telegram.bot_token.clone(),
    ));
    let content_provider = Arc::new(DailyContentProvider::new(config.content_api.clone()));

    let scheduler_usecase = Arc::new(DeliverySchedulerUseCase::new(
        Arc::new(SubscriberPostgres::new(Arc::clone(&db_pool))),
        Arc::new(DeliveryLedgerPostgres::new(Arc::clone(&db_pool))),
        Arc::clone(&content_provider),
        Arc::clone(&telegram_api),
        config.delivery.default_timezone.clone(),
        config.delivery.dispatch_timeout,
        config.delivery.tick_concurrency,
    ));

    let scheduler = tokio::spawn(scheduler_loop::run_scheduler_loop(scheduler_usecase));

    let webhook_server = tokio::spawn(http_serve::start(
        Arc::clone(&config),
        db_pool,
        telegram_api,
        content_provider,
    ));

    tokio::select! {
        result = scheduler => result??,
        result = webhook_server => result??,
    };
    Ok(())
}

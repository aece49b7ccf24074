use std::time::Duration;

use anyhow::{Context, Result};

use super::config_model::{Database, Delivery, DotEnvyConfig, Server, Telegram};
use crate::infrastructure::content::daily_content::LlmApiConfig;

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let server = Server {
        port: std::env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .context("SERVER_PORT is invalid")?,
        body_limit: std::env::var("SERVER_BODY_LIMIT")
            .unwrap_or_else(|_| "1".to_string())
            .parse()
            .context("SERVER_BODY_LIMIT is invalid")?,
        timeout: std::env::var("SERVER_TIMEOUT")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .context("SERVER_TIMEOUT is invalid")?,
    };

    let database = Database {
        url: std::env::var("DATABASE_URL").context("DATABASE_URL is missing")?,
    };

    let telegram = Telegram {
        bot_token: std::env::var("TELEGRAM_BOT_TOKEN").context("TELEGRAM_BOT_TOKEN is missing")?,
        api_base_url: std::env::var("TELEGRAM_API_BASE_URL")
            .unwrap_or_else(|_| "https://api.telegram.org".to_string()),
        webhook_secret: std::env::var("TELEGRAM_WEBHOOK_SECRET").ok().and_then(|v| {
            let trimmed = v.trim().to_string();
            (!trimmed.is_empty()).then_some(trimmed)
        }),
    };

    let delivery = Delivery {
        default_timezone: std::env::var("DEFAULT_TIMEZONE")
            .unwrap_or_else(|_| "Europe/Amsterdam".to_string()),
        dispatch_timeout: Duration::from_secs(
            std::env::var("DISPATCH_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("DISPATCH_TIMEOUT_SECS is invalid")?,
        ),
        tick_concurrency: std::env::var("TICK_CONCURRENCY")
            .unwrap_or_else(|_| "8".to_string())
            .parse()
            .context("TICK_CONCURRENCY is invalid")?,
    };

    let content_api = match std::env::var("CONTENT_API_URL") {
        Ok(base_url) if !base_url.trim().is_empty() => Some(LlmApiConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: std::env::var("CONTENT_API_KEY").context("CONTENT_API_KEY is missing")?,
            model: std::env::var("CONTENT_MODEL")
                .unwrap_or_else(|_| "deepseek/deepseek-chat".to_string()),
        }),
        _ => None,
    };

    Ok(DotEnvyConfig {
        server,
        database,
        telegram,
        delivery,
        content_api,
    })
}

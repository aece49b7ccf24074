use crate::infrastructure::content::daily_content::LlmApiConfig;

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub server: Server,
    pub database: Database,
    pub telegram: Telegram,
    pub delivery: Delivery,
    pub content_api: Option<LlmApiConfig>,
}

#[derive(Debug, Clone)]
pub struct Server {
    pub port: u16,
    pub timeout: u64,
    pub body_limit: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct Telegram {
    pub bot_token: String,
    pub api_base_url: String,
    pub webhook_secret: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Delivery {
    pub default_timezone: String,
    pub dispatch_timeout: std::time::Duration,
    pub tick_concurrency: usize,
}

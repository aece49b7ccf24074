pub mod telegram_webhook;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::error;

use crate::application::interfaces::message_dispatcher::{MessageDispatcher, ReplyMarkup};
use crate::domain::value_objects::inbound_events::CallbackToken;

/// Minimal Telegram Bot API client built on reqwest.
pub struct TelegramApi {
    http: reqwest::Client,
    base_url: String,
    bot_token: String,
}

#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    description: Option<String>,
}

impl TelegramApi {
    pub fn new(base_url: String, bot_token: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            bot_token,
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.base_url.trim_end_matches('/'),
            self.bot_token,
            method
        )
    }

    async fn call(&self, method: &str, body: Value) -> Result<()> {
        let response = self
            .http
            .post(self.method_url(method))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let parsed = response.json::<TelegramResponse>().await;

        match parsed {
            Ok(telegram) if telegram.ok => Ok(()),
            Ok(telegram) => {
                let description = telegram
                    .description
                    .unwrap_or_else(|| "no description".to_string());
                error!("Telegram {} failed: {} ({})", method, description, status);
                Err(anyhow!("telegram {} failed: {}", method, description))
            }
            Err(e) => {
                error!("Telegram {} returned unreadable body: {}", method, e);
                Err(anyhow!("telegram {} failed with status {}", method, status))
            }
        }
    }

    /// Stops the client-side loading spinner after a button press.
    pub async fn answer_callback_query(&self, callback_query_id: &str) -> Result<()> {
        self.call(
            "answerCallbackQuery",
            json!({ "callback_query_id": callback_query_id }),
        )
        .await
    }
}

fn render_markup(markup: ReplyMarkup) -> Value {
    match markup {
        ReplyMarkup::JoinButton => json!({
            "inline_keyboard": [[
                { "text": "Join", "callback_data": CallbackToken::Join.as_str() },
            ]]
        }),
        ReplyMarkup::SettingsMenu => json!({
            "inline_keyboard": [
                [{ "text": "Change morning", "callback_data": CallbackToken::ChangeMorning.as_str() }],
                [{ "text": "Change evening", "callback_data": CallbackToken::ChangeEvening.as_str() }],
                [{ "text": "Disable", "callback_data": CallbackToken::Disable.as_str() }],
                [{ "text": "Enable", "callback_data": CallbackToken::Enable.as_str() }],
            ]
        }),
    }
}

#[async_trait]
impl MessageDispatcher for TelegramApi {
    async fn send(&self, chat_id: i64, text: &str, markup: Option<ReplyMarkup>) -> Result<()> {
        let mut body = json!({
            "chat_id": chat_id,
            "text": text,
        });

        if let Some(markup) = markup {
            body["reply_markup"] = render_markup(markup);
        }

        self.call("sendMessage", body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyboard_tokens_match_the_parser() {
        let markup = render_markup(ReplyMarkup::SettingsMenu);
        let rows = markup["inline_keyboard"].as_array().unwrap();

        for row in rows {
            let data = row[0]["callback_data"].as_str().unwrap();
            assert!(CallbackToken::parse(data).is_some(), "unparseable: {}", data);
        }
    }

    #[test]
    fn method_url_embeds_the_token() {
        let api = TelegramApi::new("https://api.telegram.org".to_string(), "123:abc".to_string());
        assert_eq!(
            api.method_url("sendMessage"),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }
}

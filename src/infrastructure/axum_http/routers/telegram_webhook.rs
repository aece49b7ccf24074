use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
};
use serde::Deserialize;
use tracing::warn;

use crate::{
    application::usercases::conversation::ConversationUseCase,
    config::config_model::DotEnvyConfig,
    domain::value_objects::inbound_events::{
        CallbackToken, CommandToken, EventContext, InboundEvent,
    },
    infrastructure::{
        axum_http::update_dedupe::UpdateDedupe,
        content::daily_content::DailyContentProvider,
        postgres::{
            postgres_connection::PgPoolSquad,
            repositories::{
                conversation_states::ConversationStatePostgres, subscribers::SubscriberPostgres,
            },
        },
        telegram::telegram_api::TelegramApi,
    },
};

const SECRET_TOKEN_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Repeated updates older than this are assumed flushed out of Telegram's
/// retry queue.
const UPDATE_DEDUPE_TTL: Duration = Duration::from_secs(10 * 60);

pub type WebhookConversationUseCase = ConversationUseCase<
    SubscriberPostgres,
    ConversationStatePostgres,
    DailyContentProvider,
    TelegramApi,
>;

pub struct WebhookState {
    conversation: WebhookConversationUseCase,
    telegram_api: Arc<TelegramApi>,
    dedupe: UpdateDedupe,
    secret_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramUpdate {
    pub update_id: i64,
    pub message: Option<TelegramMessage>,
    pub callback_query: Option<TelegramCallbackQuery>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramMessage {
    pub from: Option<TelegramUser>,
    pub chat: TelegramChat,
    pub text: Option<String>,
    pub location: Option<TelegramLocation>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct TelegramLocation {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Deserialize)]
pub struct TelegramCallbackQuery {
    pub id: String,
    pub from: TelegramUser,
    pub data: Option<String>,
    pub message: Option<TelegramMessage>,
}

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    config: Arc<DotEnvyConfig>,
    telegram_api: Arc<TelegramApi>,
    content_provider: Arc<DailyContentProvider>,
) -> Router {
    let conversation = ConversationUseCase::new(
        Arc::new(SubscriberPostgres::new(Arc::clone(&db_pool))),
        Arc::new(ConversationStatePostgres::new(Arc::clone(&db_pool))),
        content_provider,
        Arc::clone(&telegram_api),
        config.delivery.default_timezone.clone(),
    );

    let state = Arc::new(WebhookState {
        conversation,
        telegram_api,
        dedupe: UpdateDedupe::new(UPDATE_DEDUPE_TTL),
        secret_token: config.telegram.webhook_secret.clone(),
    });

    Router::new().route("/", post(handle_update)).with_state(state)
}

/// Always answers 200 for well-formed updates, even when processing fails;
/// Telegram keeps retrying anything else and the engine already logged it.
pub async fn handle_update(
    State(state): State<Arc<WebhookState>>,
    headers: HeaderMap,
    Json(update): Json<TelegramUpdate>,
) -> impl IntoResponse {
    if let Some(expected) = &state.secret_token {
        let provided = headers
            .get(SECRET_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok());
        if provided != Some(expected.as_str()) {
            return StatusCode::UNAUTHORIZED;
        }
    }

    if !state.dedupe.insert(update.update_id) {
        return StatusCode::OK;
    }

    let callback_query_id = update
        .callback_query
        .as_ref()
        .map(|callback| callback.id.clone());

    if let Some((ctx, event)) = translate_update(&update) {
        state.conversation.handle_event(ctx, event).await;
    }

    if let Some(callback_query_id) = callback_query_id {
        if let Err(e) = state
            .telegram_api
            .answer_callback_query(&callback_query_id)
            .await
        {
            warn!("Failed to answer callback query: {}", e);
        }
    }

    StatusCode::OK
}

/// Maps a raw Telegram update onto the engine's event shapes. Returns `None`
/// for updates the engine has no business seeing (no sender, unknown
/// callback data, unrecognized slash commands).
fn translate_update(update: &TelegramUpdate) -> Option<(EventContext, InboundEvent)> {
    if let Some(callback) = &update.callback_query {
        let chat_id = callback.message.as_ref()?.chat.id;
        let token = CallbackToken::parse(callback.data.as_deref()?)?;
        return Some((
            EventContext {
                telegram_user_id: callback.from.id,
                telegram_chat_id: chat_id,
            },
            InboundEvent::Callback(token),
        ));
    }

    let message = update.message.as_ref()?;
    let from = message.from.as_ref()?;
    let ctx = EventContext {
        telegram_user_id: from.id,
        telegram_chat_id: message.chat.id,
    };

    if let Some(location) = &message.location {
        return Some((
            ctx,
            InboundEvent::Location {
                lat: location.latitude,
                lon: location.longitude,
            },
        ));
    }

    let text = message.text.as_deref()?.trim();
    if text.is_empty() {
        return None;
    }

    if text.starts_with('/') {
        let token = CommandToken::parse(text)?;
        return Some((ctx, InboundEvent::Command(token)));
    }

    Some((ctx, InboundEvent::Text(text.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message_update(text: &str) -> TelegramUpdate {
        TelegramUpdate {
            update_id: 1,
            message: Some(TelegramMessage {
                from: Some(TelegramUser { id: 1001 }),
                chat: TelegramChat { id: 2002 },
                text: Some(text.to_string()),
                location: None,
            }),
            callback_query: None,
        }
    }

    #[test]
    fn slash_commands_become_command_events() {
        let (ctx, event) = translate_update(&message_update("/start")).unwrap();
        assert_eq!(ctx.telegram_user_id, 1001);
        assert_eq!(ctx.telegram_chat_id, 2002);
        assert_eq!(event, InboundEvent::Command(CommandToken::Start));
    }

    #[test]
    fn unknown_slash_commands_are_dropped() {
        assert!(translate_update(&message_update("/frobnicate")).is_none());
    }

    #[test]
    fn plain_text_becomes_a_text_event() {
        let (_, event) = translate_update(&message_update("08:30")).unwrap();
        assert_eq!(event, InboundEvent::Text("08:30".to_string()));
    }

    #[test]
    fn location_messages_become_location_events() {
        let update = TelegramUpdate {
            update_id: 2,
            message: Some(TelegramMessage {
                from: Some(TelegramUser { id: 1001 }),
                chat: TelegramChat { id: 2002 },
                text: None,
                location: Some(TelegramLocation {
                    latitude: 52.37,
                    longitude: 4.9,
                }),
            }),
            callback_query: None,
        };

        let (_, event) = translate_update(&update).unwrap();
        assert_eq!(
            event,
            InboundEvent::Location {
                lat: 52.37,
                lon: 4.9
            }
        );
    }

    #[test]
    fn callback_updates_become_callback_events() {
        let update = TelegramUpdate {
            update_id: 3,
            message: None,
            callback_query: Some(TelegramCallbackQuery {
                id: "cb-1".to_string(),
                from: TelegramUser { id: 1001 },
                data: Some("JOIN".to_string()),
                message: Some(TelegramMessage {
                    from: None,
                    chat: TelegramChat { id: 2002 },
                    text: None,
                    location: None,
                }),
            }),
        };

        let (ctx, event) = translate_update(&update).unwrap();
        assert_eq!(ctx.telegram_chat_id, 2002);
        assert_eq!(event, InboundEvent::Callback(CallbackToken::Join));
    }

    #[test]
    fn messages_without_a_sender_are_dropped() {
        let update = TelegramUpdate {
            update_id: 4,
            message: Some(TelegramMessage {
                from: None,
                chat: TelegramChat { id: 2002 },
                text: Some("hello".to_string()),
                location: None,
            }),
            callback_query: None,
        };
        assert!(translate_update(&update).is_none());
    }
}

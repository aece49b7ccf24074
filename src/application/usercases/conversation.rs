use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use serde_json::json;
use tracing::{error, warn};

use crate::application::interfaces::{
    content_provider::{ContentError, ContentMode, ContentProvider},
    message_dispatcher::{MessageDispatcher, ReplyMarkup},
};
use crate::domain::{
    entities::subscribers::SubscriberEntity,
    repositories::{
        conversation_states::ConversationStateRepository, subscribers::SubscriberRepository,
    },
    value_objects::{
        enums::conversation_steps::ConversationStep,
        inbound_events::{CallbackToken, CommandToken, EventContext, InboundEvent},
        local_time,
        subscribers::{LocationUpdate, OnboardingProfile, TimezoneUpdate},
    },
};

/// The only payload key the onboarding flow carries between steps.
pub const PAYLOAD_MORNING_TIME: &str = "morning_time";

const CANCEL_KEYWORD: &str = "cancel";

const MSG_WELCOME: &str =
    "Welcome. I send gentle daily guidance every morning and evening. Tap Join to pick your delivery times.";
const MSG_NOT_ONBOARDED: &str = "No profile found yet. Send /start and tap Join first.";
const MSG_PROMPT_MORNING: &str = "Enter the morning delivery time as HH:mm, for example 08:30.";
const MSG_PROMPT_EVENING: &str = "Now enter the evening delivery time as HH:mm.";
const MSG_INVALID_TIME: &str = "That does not look like HH:mm (for example 07:45). Try again.";
const MSG_MORNING_FIRST: &str = "Let's set the morning time first. Enter it as HH:mm.";
const MSG_PROMPT_UPDATE_MORNING: &str = "Enter the new morning time as HH:mm.";
const MSG_PROMPT_UPDATE_EVENING: &str = "Enter the new evening time as HH:mm.";
const MSG_PROMPT_LOCATION: &str = "Send a location, or /cancel to stop.";
const MSG_DISABLED: &str = "Daily deliveries disabled.";
const MSG_ENABLED: &str = "Daily deliveries enabled.";
const MSG_CANCELLED: &str = "Cancelled.";
const MSG_TIMEZONE_USAGE: &str = "Usage: /settimezone Europe/Amsterdam";
const MSG_INVALID_TIMEZONE: &str =
    "That is not a valid timezone name. Example: Europe/Amsterdam";
const MSG_TRY_LATER: &str = "The content service is busy right now. Try again in a few minutes.";
const MSG_CONTENT_FAILED: &str = "Could not prepare your message right now. Try again later.";
const MSG_GENERIC_FAILURE: &str = "Something went wrong. Try again later.";

pub struct ConversationUseCase<S, St, C, D>
where
    S: SubscriberRepository + Send + Sync + 'static,
    St: ConversationStateRepository + Send + Sync + 'static,
    C: ContentProvider + Send + Sync + 'static,
    D: MessageDispatcher + Send + Sync + 'static,
{
    subscriber_repo: Arc<S>,
    state_repo: Arc<St>,
    content_provider: Arc<C>,
    dispatcher: Arc<D>,
    default_timezone: String,
}

impl<S, St, C, D> ConversationUseCase<S, St, C, D>
where
    S: SubscriberRepository + Send + Sync + 'static,
    St: ConversationStateRepository + Send + Sync + 'static,
    C: ContentProvider + Send + Sync + 'static,
    D: MessageDispatcher + Send + Sync + 'static,
{
    pub fn new(
        subscriber_repo: Arc<S>,
        state_repo: Arc<St>,
        content_provider: Arc<C>,
        dispatcher: Arc<D>,
        default_timezone: String,
    ) -> Self {
        Self {
            subscriber_repo,
            state_repo,
            content_provider,
            dispatcher,
            default_timezone,
        }
    }

    /// Entry point for one inbound update. Collaborator failures never
    /// propagate to the transport: they are logged and answered with a
    /// graceful reply.
    pub async fn handle_event(&self, ctx: EventContext, event: InboundEvent) {
        if let Err(e) = self.dispatch(ctx, event).await {
            error!(
                telegram_user_id = ctx.telegram_user_id,
                "Failed to process update: {}", e
            );
            let _ = self
                .dispatcher
                .send(ctx.telegram_chat_id, MSG_GENERIC_FAILURE, None)
                .await;
        }
    }

    async fn dispatch(&self, ctx: EventContext, event: InboundEvent) -> Result<()> {
        match event {
            InboundEvent::Command(token) => self.handle_command(ctx, token).await,
            InboundEvent::Callback(token) => self.handle_callback(ctx, token).await,
            InboundEvent::Location { lat, lon } => self.handle_location(ctx, lat, lon).await,
            InboundEvent::Text(text) => self.handle_text(ctx, text).await,
        }
    }

    async fn handle_command(&self, ctx: EventContext, token: CommandToken) -> Result<()> {
        match token {
            CommandToken::Start => {
                self.send(ctx, MSG_WELCOME, Some(ReplyMarkup::JoinButton))
                    .await
            }
            CommandToken::Cancel => {
                self.state_repo.clear(ctx.telegram_user_id).await?;
                self.send(ctx, MSG_CANCELLED, None).await
            }
            CommandToken::Settings => {
                let Some(subscriber) = self.require_subscriber(ctx).await? else {
                    return Ok(());
                };
                let summary = settings_summary(&subscriber);
                self.send(ctx, &summary, Some(ReplyMarkup::SettingsMenu))
                    .await
            }
            CommandToken::Stop => {
                let Some(subscriber) = self.require_subscriber(ctx).await? else {
                    return Ok(());
                };
                self.subscriber_repo.set_active(subscriber.id, false).await?;
                self.send(ctx, MSG_DISABLED, None).await
            }
            CommandToken::Resume => {
                let Some(subscriber) = self.require_subscriber(ctx).await? else {
                    return Ok(());
                };
                self.subscriber_repo.set_active(subscriber.id, true).await?;
                self.send(ctx, MSG_ENABLED, None).await
            }
            CommandToken::Today => self.handle_on_demand(ctx, ContentMode::Today).await,
            CommandToken::Tomorrow => self.handle_on_demand(ctx, ContentMode::Tomorrow).await,
            CommandToken::SetTimezone(arg) => self.handle_set_timezone(ctx, arg).await,
        }
    }

    async fn handle_callback(&self, ctx: EventContext, token: CallbackToken) -> Result<()> {
        if token == CallbackToken::Join {
            self.state_repo
                .set(
                    ctx.telegram_user_id,
                    ConversationStep::WaitingMorningTime,
                    json!({}),
                )
                .await?;
            return self.send(ctx, MSG_PROMPT_MORNING, None).await;
        }

        let Some(subscriber) = self.require_subscriber(ctx).await? else {
            return Ok(());
        };

        match token {
            CallbackToken::Join => unreachable!("handled above"),
            CallbackToken::ChangeMorning => {
                self.state_repo
                    .set(
                        ctx.telegram_user_id,
                        ConversationStep::WaitingUpdateMorningTime,
                        json!({}),
                    )
                    .await?;
                self.send(ctx, MSG_PROMPT_UPDATE_MORNING, None).await
            }
            CallbackToken::ChangeEvening => {
                self.state_repo
                    .set(
                        ctx.telegram_user_id,
                        ConversationStep::WaitingUpdateEveningTime,
                        json!({}),
                    )
                    .await?;
                self.send(ctx, MSG_PROMPT_UPDATE_EVENING, None).await
            }
            CallbackToken::Disable => {
                self.subscriber_repo.set_active(subscriber.id, false).await?;
                self.send(ctx, MSG_DISABLED, None).await
            }
            CallbackToken::Enable => {
                self.subscriber_repo.set_active(subscriber.id, true).await?;
                self.send(ctx, MSG_ENABLED, None).await
            }
        }
    }

    async fn handle_location(&self, ctx: EventContext, lat: f64, lon: f64) -> Result<()> {
        // Coordinate-based timezone detection is out of scope; keep whatever
        // the profile already has, otherwise the system default.
        let timezone = self
            .subscriber_repo
            .find_by_telegram_user_id(ctx.telegram_user_id)
            .await?
            .map(|subscriber| subscriber.timezone)
            .filter(|tz| local_time::parse_timezone(tz).is_some())
            .unwrap_or_else(|| self.default_timezone.clone());

        self.subscriber_repo
            .save_location(LocationUpdate {
                telegram_user_id: ctx.telegram_user_id,
                telegram_chat_id: ctx.telegram_chat_id,
                lat,
                lon,
                timezone: timezone.clone(),
            })
            .await?;
        self.state_repo.clear(ctx.telegram_user_id).await?;

        let text = format!(
            "Location saved: {:.4}, {:.4}.\nTimezone: {}.",
            lat, lon, timezone
        );
        self.send(ctx, &text, None).await
    }

    async fn handle_text(&self, ctx: EventContext, text: String) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }

        // The cancel keyword wins over whatever step is pending.
        if text.eq_ignore_ascii_case(CANCEL_KEYWORD) {
            self.state_repo.clear(ctx.telegram_user_id).await?;
            return self.send(ctx, MSG_CANCELLED, None).await;
        }

        let Some(state) = self.state_repo.get(ctx.telegram_user_id).await? else {
            return Ok(());
        };
        let step = ConversationStep::from_str(&state.step);
        if step == ConversationStep::Idle {
            return Ok(());
        }

        self.handle_step_input(ctx, step, state.payload, text).await
    }

    /// Free text is only meaningful in the context of the pending step.
    async fn handle_step_input(
        &self,
        ctx: EventContext,
        step: ConversationStep,
        payload: serde_json::Value,
        text: &str,
    ) -> Result<()> {
        if step == ConversationStep::WaitingLocation {
            return self.send(ctx, MSG_PROMPT_LOCATION, None).await;
        }

        if !local_time::is_valid_hh_mm(text) {
            // Self-loop: step and payload stay untouched.
            return self.send(ctx, MSG_INVALID_TIME, None).await;
        }

        match step {
            ConversationStep::WaitingMorningTime => {
                self.state_repo
                    .set(
                        ctx.telegram_user_id,
                        ConversationStep::WaitingEveningTime,
                        json!({ PAYLOAD_MORNING_TIME: text }),
                    )
                    .await?;
                self.send(ctx, MSG_PROMPT_EVENING, None).await
            }
            ConversationStep::WaitingEveningTime => {
                self.commit_onboarding(ctx, &payload, text).await
            }
            ConversationStep::WaitingUpdateMorningTime => {
                let Some(subscriber) = self.require_subscriber(ctx).await? else {
                    return Ok(());
                };
                self.subscriber_repo
                    .update_morning_time(subscriber.id, text.to_string())
                    .await?;
                self.state_repo.clear(ctx.telegram_user_id).await?;
                self.send(ctx, &format!("Morning time updated: {}", text), None)
                    .await
            }
            ConversationStep::WaitingUpdateEveningTime => {
                let Some(subscriber) = self.require_subscriber(ctx).await? else {
                    return Ok(());
                };
                self.subscriber_repo
                    .update_evening_time(subscriber.id, text.to_string())
                    .await?;
                self.state_repo.clear(ctx.telegram_user_id).await?;
                self.send(ctx, &format!("Evening time updated: {}", text), None)
                    .await
            }
            ConversationStep::Idle | ConversationStep::WaitingLocation => Ok(()),
        }
    }

    /// Final onboarding step. The carried morning time is re-checked here so
    /// a partial or invalid pair never reaches the subscriber store.
    async fn commit_onboarding(
        &self,
        ctx: EventContext,
        payload: &serde_json::Value,
        evening_time: &str,
    ) -> Result<()> {
        let morning_time = payload
            .get(PAYLOAD_MORNING_TIME)
            .and_then(|value| value.as_str())
            .filter(|value| local_time::is_valid_hh_mm(value));

        let Some(morning_time) = morning_time else {
            warn!(
                telegram_user_id = ctx.telegram_user_id,
                "Carried morning time missing or invalid; regressing"
            );
            self.state_repo
                .set(
                    ctx.telegram_user_id,
                    ConversationStep::WaitingMorningTime,
                    json!({}),
                )
                .await?;
            return self.send(ctx, MSG_MORNING_FIRST, None).await;
        };

        // A timezone chosen earlier (location or /settimezone) survives the
        // commit; otherwise the system default applies.
        let timezone = self
            .subscriber_repo
            .find_by_telegram_user_id(ctx.telegram_user_id)
            .await?
            .map(|subscriber| subscriber.timezone)
            .filter(|tz| local_time::parse_timezone(tz).is_some())
            .unwrap_or_else(|| self.default_timezone.clone());

        self.subscriber_repo
            .upsert_onboarding(OnboardingProfile {
                telegram_user_id: ctx.telegram_user_id,
                telegram_chat_id: ctx.telegram_chat_id,
                timezone: timezone.clone(),
                morning_time: morning_time.to_string(),
                evening_time: evening_time.to_string(),
            })
            .await?;
        self.state_repo.clear(ctx.telegram_user_id).await?;

        let text = format!(
            "Done. Settings saved:\nMorning: {}\nEvening: {}\nTimezone: {}",
            morning_time, evening_time, timezone
        );
        self.send(ctx, &text, None).await
    }

    async fn handle_on_demand(&self, ctx: EventContext, mode: ContentMode) -> Result<()> {
        let Some(subscriber) = self.require_subscriber(ctx).await? else {
            return Ok(());
        };

        let timezone =
            local_time::resolve_timezone(&subscriber.timezone, &self.default_timezone);
        let now = Utc::now();
        let date = match mode {
            ContentMode::Today => local_time::local_date(now, timezone),
            ContentMode::Tomorrow => local_time::local_date_tomorrow(now, timezone),
        };

        match self.content_provider.generate(date, timezone, mode).await {
            Ok(text) => self.send(ctx, &text, None).await,
            Err(ContentError::RateLimited) => self.send(ctx, MSG_TRY_LATER, None).await,
            Err(ContentError::Other(e)) => {
                error!(
                    telegram_user_id = ctx.telegram_user_id,
                    "On-demand content failed: {}", e
                );
                self.send(ctx, MSG_CONTENT_FAILED, None).await
            }
        }
    }

    async fn handle_set_timezone(&self, ctx: EventContext, arg: Option<String>) -> Result<()> {
        let Some(raw) = arg else {
            return self.send(ctx, MSG_TIMEZONE_USAGE, None).await;
        };

        if local_time::parse_timezone(&raw).is_none() {
            return self.send(ctx, MSG_INVALID_TIMEZONE, None).await;
        }

        self.subscriber_repo
            .save_timezone(TimezoneUpdate {
                telegram_user_id: ctx.telegram_user_id,
                telegram_chat_id: ctx.telegram_chat_id,
                timezone: raw.clone(),
            })
            .await?;
        self.state_repo.clear(ctx.telegram_user_id).await?;
        self.send(ctx, &format!("Timezone saved: {}", raw), None)
            .await
    }

    /// Looks up the subscriber; replies with the onboarding hint when there is
    /// none, so command handlers can simply bail out.
    async fn require_subscriber(&self, ctx: EventContext) -> Result<Option<SubscriberEntity>> {
        let subscriber = self
            .subscriber_repo
            .find_by_telegram_user_id(ctx.telegram_user_id)
            .await?;
        if subscriber.is_none() {
            self.send(ctx, MSG_NOT_ONBOARDED, None).await?;
        }
        Ok(subscriber)
    }

    async fn send(&self, ctx: EventContext, text: &str, markup: Option<ReplyMarkup>) -> Result<()> {
        self.dispatcher
            .send(ctx.telegram_chat_id, text, markup)
            .await
    }
}

fn settings_summary(subscriber: &SubscriberEntity) -> String {
    let field = |value: &Option<String>| value.clone().unwrap_or_else(|| "not set".to_string());
    format!(
        "Current settings:\nMorning: {}\nEvening: {}\nTimezone: {}\nActive: {}",
        field(&subscriber.morning_time),
        field(&subscriber.evening_time),
        subscriber.timezone,
        if subscriber.is_active { "yes" } else { "no" },
    )
}

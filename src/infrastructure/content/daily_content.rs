use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Weekday};
use chrono_tz::Tz;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::application::interfaces::content_provider::{
    ContentError, ContentMode, ContentProvider,
};

/// Mean length of the lunar cycle in days.
const SYNODIC_MONTH: f64 = 29.530588853;

/// Reference new moon: 2000-01-06 18:14 UTC.
const NEW_MOON_EPOCH_UNIX: i64 = 947_182_440;

#[derive(Debug, Clone)]
pub struct LlmApiConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

/// Builds the daily notification body. When an upstream text API is
/// configured it is tried first; any failure short of a rate limit falls back
/// to the local composer, so scheduled sends degrade instead of dying.
pub struct DailyContentProvider {
    http: reqwest::Client,
    llm: Option<LlmApiConfig>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Option<Vec<ChatCompletionChoice>>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: Option<ChatCompletionMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    content: Option<String>,
}

impl DailyContentProvider {
    pub fn new(llm: Option<LlmApiConfig>) -> Self {
        Self {
            http: reqwest::Client::new(),
            llm,
        }
    }

    async fn generate_remote(
        &self,
        llm: &LlmApiConfig,
        date: NaiveDate,
        mode: ContentMode,
    ) -> Result<String, ContentError> {
        let moon = MoonSnapshot::for_local_noon(date);
        let prompt = format!(
            "Write a short, warm daily guidance message for {} ({}). \
             Moon phase: {} (age {:.1} days, {:.0}% illuminated). \
             Weekday theme: {}. Two or three sentences, no headings.",
            date.format("%Y-%m-%d"),
            match mode {
                ContentMode::Today => "today",
                ContentMode::Tomorrow => "tomorrow",
            },
            moon.phase_name,
            moon.age_days,
            moon.illumination_pct,
            weekday_theme(date.weekday()),
        );

        let response = self
            .http
            .post(format!(
                "{}/chat/completions",
                llm.base_url.trim_end_matches('/')
            ))
            .bearer_auth(&llm.api_key)
            .json(&json!({
                "model": llm.model,
                "messages": [
                    { "role": "system", "content": "You write gentle daily guidance messages." },
                    { "role": "user", "content": prompt },
                ],
                "temperature": 0.7,
            }))
            .send()
            .await
            .map_err(|e| ContentError::Other(e.into()))?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(ContentError::RateLimited);
        }
        if !response.status().is_success() {
            return Err(ContentError::Other(anyhow!(
                "content api returned {}",
                response.status()
            )));
        }

        let completion = response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|e| ContentError::Other(e.into()))?;

        completion
            .choices
            .and_then(|mut choices| choices.drain(..).next())
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| ContentError::Other(anyhow!("content api returned an empty choice")))
    }
}

#[async_trait]
impl ContentProvider for DailyContentProvider {
    async fn generate(
        &self,
        date: NaiveDate,
        _timezone: Tz,
        mode: ContentMode,
    ) -> Result<String, ContentError> {
        if let Some(llm) = &self.llm {
            match self.generate_remote(llm, date, mode).await {
                Ok(text) => return Ok(text),
                Err(ContentError::RateLimited) => return Err(ContentError::RateLimited),
                Err(ContentError::Other(e)) => {
                    warn!("Remote content generation failed, composing locally: {}", e);
                }
            }
        }

        Ok(compose_local(date, mode))
    }
}

#[derive(Debug, Clone)]
struct MoonSnapshot {
    phase_name: &'static str,
    age_days: f64,
    illumination_pct: f64,
}

impl MoonSnapshot {
    /// Approximation from the mean synodic month, evaluated at local noon of
    /// the target date. Good to about a day, which is enough for phase names.
    fn for_local_noon(date: NaiveDate) -> Self {
        let noon_unix = date
            .and_hms_opt(12, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or(NEW_MOON_EPOCH_UNIX);

        let days_since_epoch = (noon_unix - NEW_MOON_EPOCH_UNIX) as f64 / 86_400.0;
        let age_days = days_since_epoch.rem_euclid(SYNODIC_MONTH);

        let phase_fraction = age_days / SYNODIC_MONTH;
        let illumination_pct =
            (1.0 - (2.0 * std::f64::consts::PI * phase_fraction).cos()) / 2.0 * 100.0;

        Self {
            phase_name: phase_name(age_days),
            age_days,
            illumination_pct,
        }
    }
}

fn phase_name(age_days: f64) -> &'static str {
    // Eight equal bands of the synodic month, centered bands for the
    // principal phases.
    let band = SYNODIC_MONTH / 8.0;
    match age_days {
        a if a < band * 0.5 => "New Moon",
        a if a < band * 1.5 => "Waxing Crescent",
        a if a < band * 2.5 => "First Quarter",
        a if a < band * 3.5 => "Waxing Gibbous",
        a if a < band * 4.5 => "Full Moon",
        a if a < band * 5.5 => "Waning Gibbous",
        a if a < band * 6.5 => "Last Quarter",
        a if a < band * 7.5 => "Waning Crescent",
        _ => "New Moon",
    }
}

fn weekday_theme(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "a clean start: set the week's single most important intention",
        Weekday::Tue => "momentum: act on the hardest task while energy is high",
        Weekday::Wed => "exchange: conversations and messages land well today",
        Weekday::Thu => "growth: study, plan, and widen the horizon",
        Weekday::Fri => "warmth: tend to relationships and shared pleasures",
        Weekday::Sat => "structure: tidy spaces, finish lingering chores",
        Weekday::Sun => "rest: slow down and take stock without guilt",
    }
}

fn compose_local(date: NaiveDate, mode: ContentMode) -> String {
    let moon = MoonSnapshot::for_local_noon(date);
    let heading = match mode {
        ContentMode::Today => format!("Guidance for {}", date.format("%Y-%m-%d")),
        ContentMode::Tomorrow => format!("Looking ahead to {}", date.format("%Y-%m-%d")),
    };

    format!(
        "{}\n\nMoon: {} (age {:.1} days, {:.0}% illuminated).\nFocus: {}.",
        heading,
        moon.phase_name,
        moon.age_days,
        moon.illumination_pct,
        weekday_theme(date.weekday()),
    )
}

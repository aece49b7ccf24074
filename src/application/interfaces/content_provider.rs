use async_trait::async_trait;
use chrono::NaiveDate;
use chrono_tz::Tz;
use mockall::automock;
use thiserror::Error;

/// Whether the message covers the target date as "today" or as a look-ahead
/// for "tomorrow" (the evening slot).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentMode {
    Today,
    Tomorrow,
}

#[derive(Debug, Error)]
pub enum ContentError {
    /// Upstream told us to back off. Surfaced to the user as a distinct
    /// "try again later" reply, never retry-looped.
    #[error("content provider rate limited")]
    RateLimited,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Produces the finished notification body. How many strategies it tries
/// internally is its own business; callers only see success or failure.
#[async_trait]
#[automock]
pub trait ContentProvider {
    async fn generate(
        &self,
        date: NaiveDate,
        timezone: Tz,
        mode: ContentMode,
    ) -> Result<String, ContentError>;
}

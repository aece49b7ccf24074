use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

/// Keyboards the engine can attach to a reply. Rendering to the transport's
/// wire format happens in the infrastructure layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyMarkup {
    JoinButton,
    SettingsMenu,
}

/// Delivers text to a subscriber's channel. Transport failures come back as
/// plain errors; the callers decide whether they are terminal.
#[async_trait]
#[automock]
pub trait MessageDispatcher {
    async fn send(&self, chat_id: i64, text: &str, markup: Option<ReplyMarkup>) -> Result<()>;
}

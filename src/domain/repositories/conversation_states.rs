use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::entities::conversation_states::ConversationStateEntity;
use crate::domain::value_objects::enums::conversation_steps::ConversationStep;

#[async_trait]
#[automock]
pub trait ConversationStateRepository {
    async fn get(&self, telegram_user_id: i64) -> Result<Option<ConversationStateEntity>>;

    /// Overwrites the step and the whole payload bag for this subscriber.
    async fn set(
        &self,
        telegram_user_id: i64,
        step: ConversationStep,
        payload: serde_json::Value,
    ) -> Result<()>;

    /// Resets to `Idle` with an empty payload.
    async fn clear(&self, telegram_user_id: i64) -> Result<()>;
}

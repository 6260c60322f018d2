mod actor;

pub use actor::{keys, RedisActor, RedisActorHandle};

use crate::dialogs::state::ConversationState;
use crate::error::BotResult;
use crate::host::StateStore;
use async_trait::async_trait;

#[async_trait]
impl StateStore for RedisActorHandle {
    async fn load(&self, conversation_id: &str) -> BotResult<Option<ConversationState>> {
        self.load_conversation(conversation_id).await
    }

    async fn save(&self, conversation_id: &str, state: &ConversationState) -> BotResult<()> {
        self.save_conversation(conversation_id, state).await
    }

    async fn delete(&self, conversation_id: &str) -> BotResult<()> {
        self.delete_conversation(conversation_id).await
    }
}

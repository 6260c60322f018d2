//! Turn processing for a transport: one turn at a time per conversation,
//! with state loaded from and saved to a [`StateStore`].

use crate::dialogs::{Activity, ConversationState, MainDialog, SessionState, Turn, TurnKind};
use crate::error::{store_error, BotResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Key-value persistence of conversation state
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn load(&self, conversation_id: &str) -> BotResult<Option<ConversationState>>;
    async fn save(&self, conversation_id: &str, state: &ConversationState) -> BotResult<()>;
    async fn delete(&self, conversation_id: &str) -> BotResult<()>;
}

/// In-process store, serialized the same way as the Redis one
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    states: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn load(&self, conversation_id: &str) -> BotResult<Option<ConversationState>> {
        let states = self.states.lock().await;
        match states.get(conversation_id) {
            Some(json) => serde_json::from_str(json)
                .map(Some)
                .map_err(|e| store_error(&format!("Corrupt state for {}: {}", conversation_id, e))),
            None => Ok(None),
        }
    }

    async fn save(&self, conversation_id: &str, state: &ConversationState) -> BotResult<()> {
        let json = serde_json::to_string(state)?;
        self.states
            .lock()
            .await
            .insert(conversation_id.to_string(), json);
        Ok(())
    }

    async fn delete(&self, conversation_id: &str) -> BotResult<()> {
        self.states.lock().await.remove(conversation_id);
        Ok(())
    }
}

/// Runs turns through the main dialog
pub struct SkillHost {
    dialog: MainDialog,
    store: Arc<dyn StateStore>,
    /// Session every new conversation starts from
    defaults: SessionState,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SkillHost {
    pub fn new(dialog: MainDialog, store: Arc<dyn StateStore>, defaults: SessionState) -> Self {
        Self {
            dialog,
            store,
            defaults,
            locks: Mutex::new(HashMap::new()),
        }
    }

    async fn lock_for(&self, conversation_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        Arc::clone(
            locks
                .entry(conversation_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }

    /// Forget a conversation's lock once nobody else holds or waits on it
    async fn release(&self, conversation_id: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().await;
        // one reference in the map, one here
        if Arc::strong_count(&lock) <= 2 {
            locks.remove(conversation_id);
        }
    }

    /// Conversations with a turn in progress or queued
    pub async fn busy_conversations(&self) -> usize {
        self.locks.lock().await.len()
    }

    async fn load_or_new(&self, conversation_id: &str) -> BotResult<(ConversationState, bool)> {
        Ok(match self.store.load(conversation_id).await? {
            Some(state) => (state, false),
            None => (ConversationState::new(self.defaults.clone()), true),
        })
    }

    /// Process a turn and return the replies to render.
    ///
    /// State is only saved when the turn succeeds.
    pub async fn handle_turn(&self, turn: Turn) -> BotResult<Vec<Activity>> {
        let lock = self.lock_for(&turn.conversation_id).await;
        let guard = lock.lock().await;
        let result = self.run_turn(&turn).await;
        drop(guard);
        self.release(&turn.conversation_id, lock).await;
        result
    }

    async fn run_turn(&self, turn: &Turn) -> BotResult<Vec<Activity>> {
        let (mut state, fresh) = self.load_or_new(&turn.conversation_id).await?;
        let mut activities = Vec::new();

        if fresh && turn.kind != TurnKind::ConversationStart {
            info!("New conversation {}", turn.conversation_id);
            let start = Turn {
                kind: TurnKind::ConversationStart,
                ..turn.clone()
            };
            activities.extend(self.dialog.on_turn(&mut state, &start).await?);
        }

        activities.extend(self.dialog.on_turn(&mut state, turn).await?);
        self.store.save(&turn.conversation_id, &state).await?;
        debug!(
            "Turn for {} produced {} activities, {} dialog(s) active",
            turn.conversation_id,
            activities.len(),
            state.stack.len()
        );

        Ok(activities)
    }

    /// Change session settings outside of a dialog turn
    pub async fn update_session<F>(&self, conversation_id: &str, update: F) -> BotResult<()>
    where
        F: FnOnce(&mut SessionState) + Send,
    {
        let lock = self.lock_for(conversation_id).await;
        let guard = lock.lock().await;
        let result = match self.load_or_new(conversation_id).await {
            Ok((mut state, _)) => {
                update(&mut state.session);
                self.store.save(conversation_id, &state).await
            }
            Err(e) => Err(e),
        };
        drop(guard);
        self.release(conversation_id, lock).await;
        result
    }

    pub async fn state(&self, conversation_id: &str) -> BotResult<Option<ConversationState>> {
        self.store.load(conversation_id).await
    }
}

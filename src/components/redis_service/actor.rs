use crate::config::Config;
use crate::dialogs::state::ConversationState;
use crate::error::{store_error, BotResult};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client as RedisClient};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info};

// Redis key constants
pub mod keys {
    pub const CONVERSATION_PREFIX: &str = "calendar_skill:conversation:";

    /// Key of a persisted conversation
    pub fn conversation(conversation_id: &str) -> String {
        format!("{}{}", CONVERSATION_PREFIX, conversation_id)
    }

    /// Key of a user's token for an OAuth connection
    pub fn token(connection_name: &str, user_id: &str) -> String {
        format!("{}:token:{}", connection_name, user_id)
    }
}

/// The Redis actor that processes messages
pub struct RedisActor {
    config: Arc<RwLock<Config>>,
    connection: Option<ConnectionManager>,
    command_rx: mpsc::Receiver<RedisCommand>,
}

/// Commands that can be sent to the Redis actor
pub enum RedisCommand {
    SaveConversation(String, Box<ConversationState>, mpsc::Sender<BotResult<()>>),
    LoadConversation(String, mpsc::Sender<BotResult<Option<ConversationState>>>),
    DeleteConversation(String, mpsc::Sender<BotResult<()>>),
    GetToken(String, mpsc::Sender<BotResult<Option<Value>>>),
    SaveToken(String, Value, mpsc::Sender<BotResult<()>>),
    DeleteToken(String, mpsc::Sender<BotResult<()>>),
    Shutdown,
}

/// Handle for communicating with the Redis actor
#[derive(Clone)]
pub struct RedisActorHandle {
    command_tx: mpsc::Sender<RedisCommand>,
}

impl RedisActorHandle {
    async fn request<T>(
        &self,
        command: impl FnOnce(mpsc::Sender<BotResult<T>>) -> RedisCommand,
    ) -> BotResult<T> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(command(response_tx))
            .await
            .map_err(|e| store_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| store_error("Response channel closed"))?
    }

    /// Save a conversation to Redis
    pub async fn save_conversation(&self, conversation_id: &str, state: &ConversationState) -> BotResult<()> {
        let id = conversation_id.to_string();
        let state = Box::new(state.clone());
        self.request(|tx| RedisCommand::SaveConversation(id, state, tx))
            .await
    }

    /// Load a conversation from Redis
    pub async fn load_conversation(&self, conversation_id: &str) -> BotResult<Option<ConversationState>> {
        let id = conversation_id.to_string();
        self.request(|tx| RedisCommand::LoadConversation(id, tx)).await
    }

    /// Forget a conversation
    pub async fn delete_conversation(&self, conversation_id: &str) -> BotResult<()> {
        let id = conversation_id.to_string();
        self.request(|tx| RedisCommand::DeleteConversation(id, tx)).await
    }

    /// Get a token stored under the given key
    pub async fn get_token(&self, key: &str) -> BotResult<Option<Value>> {
        let key = key.to_string();
        self.request(|tx| RedisCommand::GetToken(key, tx)).await
    }

    /// Save a token under the given key
    pub async fn save_token(&self, key: &str, token: Value) -> BotResult<()> {
        let key = key.to_string();
        self.request(|tx| RedisCommand::SaveToken(key, token, tx)).await
    }

    /// Remove a token
    pub async fn delete_token(&self, key: &str) -> BotResult<()> {
        let key = key.to_string();
        self.request(|tx| RedisCommand::DeleteToken(key, tx)).await
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> BotResult<()> {
        let _ = self.command_tx.send(RedisCommand::Shutdown).await;
        Ok(())
    }
}

impl RedisActor {
    /// Create a new actor and return its handle
    pub fn new(config: Arc<RwLock<Config>>) -> (Self, RedisActorHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);

        // The connection is opened lazily on the first command
        let actor = Self {
            config,
            connection: None,
            command_rx,
        };

        let handle = RedisActorHandle { command_tx };

        (actor, handle)
    }

    /// Start the actor's processing loop
    pub async fn run(&mut self) {
        info!("Redis actor started");

        // Process commands
        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                RedisCommand::SaveConversation(id, state, response_tx) => {
                    let result = self.save_conversation(&id, &state).await;
                    let _ = response_tx.send(result).await;
                }
                RedisCommand::LoadConversation(id, response_tx) => {
                    let result = self.load_conversation(&id).await;
                    let _ = response_tx.send(result).await;
                }
                RedisCommand::DeleteConversation(id, response_tx) => {
                    let result = self.delete_key(&keys::conversation(&id)).await;
                    let _ = response_tx.send(result).await;
                }
                RedisCommand::GetToken(key, response_tx) => {
                    let result = self.get_token(&key).await;
                    let _ = response_tx.send(result).await;
                }
                RedisCommand::SaveToken(key, token, response_tx) => {
                    let result = self.set_string(&key, token.to_string()).await;
                    let _ = response_tx.send(result).await;
                }
                RedisCommand::DeleteToken(key, response_tx) => {
                    let result = self.delete_key(&key).await;
                    let _ = response_tx.send(result).await;
                }
                RedisCommand::Shutdown => {
                    info!("Redis actor shutting down");
                    break;
                }
            }
        }

        info!("Redis actor shut down");
    }

    /// Get a redis connection
    async fn get_redis_connection(&mut self) -> BotResult<ConnectionManager> {
        if let Some(connection) = &self.connection {
            return Ok(connection.clone());
        }

        // Get Redis URL from config
        let redis_url = {
            let config_guard = self.config.read().await;
            config_guard.redis_url.clone()
        };

        let client = RedisClient::open(redis_url)
            .map_err(|e| store_error(&format!("Failed to create Redis client: {}", e)))?;
        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| store_error(&format!("Failed to connect to Redis: {}", e)))?;

        self.connection = Some(connection.clone());
        Ok(connection)
    }

    async fn get_string(&mut self, key: &str) -> BotResult<Option<String>> {
        let mut redis_conn = self.get_redis_connection().await?;

        redis_conn
            .get(key)
            .await
            .map_err(|e| store_error(&format!("Failed to read {} from Redis: {}", key, e)))
    }

    async fn set_string(&mut self, key: &str, value: String) -> BotResult<()> {
        let mut redis_conn = self.get_redis_connection().await?;

        () = redis_conn
            .set(key, value)
            .await
            .map_err(|e| store_error(&format!("Failed to save {} to Redis: {}", key, e)))?;

        Ok(())
    }

    async fn delete_key(&mut self, key: &str) -> BotResult<()> {
        let mut redis_conn = self.get_redis_connection().await?;

        () = redis_conn
            .del(key)
            .await
            .map_err(|e| store_error(&format!("Failed to delete {} from Redis: {}", key, e)))?;

        Ok(())
    }

    /// Save a conversation as JSON
    async fn save_conversation(&mut self, id: &str, state: &ConversationState) -> BotResult<()> {
        let json = serde_json::to_string(state)
            .map_err(|e| store_error(&format!("Failed to serialize conversation: {}", e)))?;

        debug!("Saving conversation {}", id);
        self.set_string(&keys::conversation(id), json).await
    }

    /// Load a conversation, `None` when it has never been saved
    async fn load_conversation(&mut self, id: &str) -> BotResult<Option<ConversationState>> {
        let Some(json) = self.get_string(&keys::conversation(id)).await? else {
            return Ok(None);
        };

        let state = serde_json::from_str(&json)
            .map_err(|e| store_error(&format!("Failed to deserialize conversation: {}", e)))?;

        Ok(Some(state))
    }

    /// Get token from Redis
    async fn get_token(&mut self, key: &str) -> BotResult<Option<Value>> {
        let Some(token_json) = self.get_string(key).await? else {
            return Ok(None);
        };

        let token: Value = serde_json::from_str(&token_json)
            .map_err(|e| store_error(&format!("Failed to deserialize token: {}", e)))?;

        Ok(Some(token))
    }
}

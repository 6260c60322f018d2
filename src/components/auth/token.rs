use super::Authenticator;
use crate::components::redis_service::{keys, RedisActorHandle};
use crate::config::Config;
use crate::error::{auth_error, BotResult};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use rust_i18n::t;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Lifetime assumed for tokens that arrive without an expiry
const DEFAULT_EXPIRES_IN: i64 = 3600;

/// Per-user OAuth tokens kept in Redis
#[derive(Clone)]
pub struct TokenManager {
    config: Arc<RwLock<Config>>,
    redis: RedisActorHandle,
    client: Client,
}

impl TokenManager {
    pub fn new(config: Arc<RwLock<Config>>, redis: RedisActorHandle) -> Self {
        Self {
            config,
            redis,
            client: Client::new(),
        }
    }

    async fn key_for(&self, user_id: &str) -> String {
        let config_read = self.config.read().await;
        keys::token(&config_read.auth_connection_name, user_id)
    }

    /// Store a token for a user, stamping `expires_at` when missing
    pub async fn set_token(&self, user_id: &str, mut token_json: Value) -> BotResult<()> {
        let obj = token_json
            .as_object_mut()
            .ok_or_else(|| auth_error("Token data is not an object"))?;
        if !obj.contains_key("access_token") {
            return Err(auth_error("Token data missing 'access_token' field"));
        }
        if !obj.contains_key("expires_at") {
            let expires_in = obj
                .get("expires_in")
                .and_then(|v| v.as_i64())
                .unwrap_or(DEFAULT_EXPIRES_IN);
            obj.insert(
                "expires_at".to_string(),
                json!(Utc::now().timestamp() + expires_in),
            );
        }

        let key = self.key_for(user_id).await;
        self.redis.save_token(&key, token_json).await
    }

    /// Refresh an expired token
    async fn refresh_token(&self, user_id: &str, token: &Value) -> BotResult<Value> {
        let refresh_token = token
            .get("refresh_token")
            .and_then(|v| v.as_str())
            .ok_or_else(|| auth_error("No refresh token in token data"))?;

        let (client_id, client_secret) = {
            let config_read = self.config.read().await;
            (
                config_read.google_client_id.clone(),
                config_read.google_client_secret.clone(),
            )
        };
        if client_id.is_empty() {
            return Err(auth_error("GOOGLE_CLIENT_ID is not configured"));
        }

        let params = [
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("refresh_token", refresh_token.to_string()),
            ("grant_type", "refresh_token".to_string()),
        ];

        let response = self
            .client
            .post("https://oauth2.googleapis.com/token")
            .form(&params)
            .send()
            .await
            .map_err(|e| auth_error(&format!("Failed to refresh token: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(auth_error(&format!(
                "Failed to refresh token: HTTP {} - {}",
                status, error_body
            )));
        }

        let new_token: Value = response
            .json()
            .await
            .map_err(|e| auth_error(&format!("Failed to parse token response: {}", e)))?;

        let access_token = new_token
            .get("access_token")
            .cloned()
            .ok_or_else(|| auth_error("Token response missing 'access_token' field"))?;
        let expires_in = new_token
            .get("expires_in")
            .and_then(|v| v.as_i64())
            .unwrap_or(DEFAULT_EXPIRES_IN);

        // Combine new access token with existing refresh token
        let token_json = json!({
            "access_token": access_token,
            "refresh_token": refresh_token,
            "expires_at": Utc::now().timestamp() + expires_in,
        });

        let key = self.key_for(user_id).await;
        self.redis.save_token(&key, token_json.clone()).await?;
        info!("Refreshed calendar token for user {}", user_id);

        Ok(token_json)
    }
}

#[async_trait]
impl Authenticator for TokenManager {
    async fn token(&self, user_id: &str) -> BotResult<Option<String>> {
        let key = self.key_for(user_id).await;
        let Some(token) = self.redis.get_token(&key).await? else {
            return Ok(None);
        };

        let expired = token
            .get("expires_at")
            .and_then(|v| v.as_i64())
            .map(|expiry| expiry <= Utc::now().timestamp())
            .unwrap_or(false);

        let token = if expired {
            match self.refresh_token(user_id, &token).await {
                Ok(refreshed) => refreshed,
                Err(e) => {
                    // the user has to sign in again
                    warn!("Dropping unusable token for user {}: {}", user_id, e);
                    return Ok(None);
                }
            }
        } else {
            token
        };

        Ok(token
            .get("access_token")
            .and_then(|t| t.as_str())
            .map(|t| t.to_string()))
    }

    fn sign_in_prompt(&self, _user_id: &str) -> Option<String> {
        Some(t!("sign_in_prompt", command = "/calendar_token").to_string())
    }

    async fn sign_out(&self, user_id: &str, connection_name: &str) -> BotResult<()> {
        self.redis
            .delete_token(&keys::token(connection_name, user_id))
            .await?;
        info!("Signed out user {} from {}", user_id, connection_name);
        Ok(())
    }
}

pub mod token;

pub use token::TokenManager;

use crate::error::BotResult;
use async_trait::async_trait;

/// Access to the user's calendar credentials
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// A valid access token for the user, if one is available without asking them
    async fn token(&self, user_id: &str) -> BotResult<Option<String>>;

    /// Text asking the user to sign in; `None` when interactive sign-in is not supported
    fn sign_in_prompt(&self, user_id: &str) -> Option<String>;

    /// Drop the user's credentials for the given connection
    async fn sign_out(&self, user_id: &str, connection_name: &str) -> BotResult<()>;
}

use miette::{Diagnostic, Result};
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Discord API error: {0}")]
    #[diagnostic(code(calendar_skill::discord_api))]
    DiscordApi(#[from] serenity::Error),

    #[error("Boxed error: {0}")]
    #[diagnostic(code(calendar_skill::boxed))]
    Boxed(#[from] Box<dyn std::error::Error + Send + Sync>),

    #[error("Environment error: {0}")]
    #[diagnostic(code(calendar_skill::environment))]
    Environment(String),

    /// Missing or broken setup; a turn hitting this cannot be recovered.
    #[error("Configuration error: {0}")]
    #[diagnostic(
        code(calendar_skill::config),
        help("check INTENTS_CONFIG and the recognizer domains it defines")
    )]
    Config(String),

    #[error("Calendar provider error: {0}")]
    #[diagnostic(code(calendar_skill::calendar))]
    Calendar(String),

    #[error("State store error: {0}")]
    #[diagnostic(code(calendar_skill::store))]
    Store(String),

    #[error("Authentication error: {0}")]
    #[diagnostic(code(calendar_skill::auth))]
    Auth(String),

    #[error("Dialog error: {0}")]
    #[diagnostic(code(calendar_skill::dialog))]
    Dialog(String),

    #[error(transparent)]
    #[diagnostic(code(calendar_skill::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(calendar_skill::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(calendar_skill::other))]
    Other(String),
}

impl Error {
    /// Fatal errors abort the turn instead of being turned into a dialog fault
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}

// Implement From for TOML deserialization errors
impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Calendar(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type BotResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Missing environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create calendar provider errors
pub fn calendar_error(message: &str) -> Error {
    Error::Calendar(message.to_string())
}

/// Helper to create state store errors
pub fn store_error(message: &str) -> Error {
    Error::Store(message.to_string())
}

/// Helper to create authentication errors
pub fn auth_error(message: &str) -> Error {
    Error::Auth(message.to_string())
}

/// Helper to create dialog errors
pub fn dialog_error(message: &str) -> Error {
    Error::Dialog(message.to_string())
}

/// Helper to create other errors
pub fn other_error(message: &str) -> Error {
    Error::Other(message.to_string())
}

use crate::components::calendar::EventSource;
use crate::error::{env_error, BotResult};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::env;

/// Default activity text for the bot
pub const DEFAULT_ACTIVITY: &str = "Keeping your calendar";

/// Default location of the recognizer phrase tables
pub const DEFAULT_INTENTS_CONFIG: &str = "config/intents.toml";

/// Main configuration structure for the skill host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Discord bot token
    pub discord_token: String,
    /// Run embedded inside a larger assistant instead of standalone
    pub skill_mode: bool,
    /// Name of the OAuth connection tokens are stored under
    pub auth_connection_name: String,
    /// Google OAuth client ID, used for refreshing user tokens
    pub google_client_id: String,
    /// Google OAuth client secret
    pub google_client_secret: String,
    /// Redis connection URL
    pub redis_url: String,
    /// Default time zone for new conversations
    pub timezone: String,
    /// Default calendar backend for new conversations
    pub event_source: EventSource,
    /// Locale for user-facing messages
    pub bot_locale: String,
    /// Bot activity status text
    pub activity: String,
    /// Only listen in this channel when set (direct messages are always accepted)
    pub skill_channel_id: Option<u64>,
    /// Path to the recognizer phrase tables
    pub intents_path: String,
}

impl Config {
    /// Load configuration from environment
    pub fn load() -> BotResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let discord_token = env::var("DISCORD_TOKEN").map_err(|_| env_error("DISCORD_TOKEN"))?;

        let skill_mode = match env::var("SKILL_MODE") {
            Ok(value) => parse_bool(&value).ok_or_else(|| env_error("Invalid SKILL_MODE format"))?,
            Err(_) => false,
        };

        let event_source = match env::var("EVENT_SOURCE") {
            Ok(value) => value
                .parse::<EventSource>()
                .map_err(|_| env_error("Invalid EVENT_SOURCE value"))?,
            Err(_) => EventSource::Google,
        };

        let skill_channel_id = match env::var("SKILL_CHANNEL_ID") {
            Ok(value) => Some(
                value
                    .parse::<u64>()
                    .map_err(|_| env_error("Invalid SKILL_CHANNEL_ID format"))?,
            ),
            Err(_) => None,
        };

        let timezone = env::var("TIMEZONE").unwrap_or_else(|_| String::from("UTC"));
        if timezone.parse::<chrono_tz::Tz>().is_err() {
            return Err(env_error("Invalid TIMEZONE value"));
        }

        Ok(Config {
            discord_token,
            skill_mode,
            auth_connection_name: env::var("AUTH_CONNECTION_NAME")
                .unwrap_or_else(|_| String::from("calendar")),
            google_client_id: env::var("GOOGLE_CLIENT_ID").unwrap_or_default(),
            google_client_secret: env::var("GOOGLE_CLIENT_SECRET").unwrap_or_default(),
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| String::from("redis://127.0.0.1:6379")),
            timezone,
            event_source,
            bot_locale: env::var("BOT_LOCALE").unwrap_or_else(|_| String::from("en")),
            activity: env::var("BOT_ACTIVITY").unwrap_or_else(|_| String::from(DEFAULT_ACTIVITY)),
            skill_channel_id,
            intents_path: env::var("INTENTS_CONFIG")
                .unwrap_or_else(|_| String::from(DEFAULT_INTENTS_CONFIG)),
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

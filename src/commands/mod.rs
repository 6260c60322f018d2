use crate::components::TokenManager;
use crate::config::Config;
use crate::error::BotResult;
use crate::host::SkillHost;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tokio::sync::RwLock;

pub mod calendar;

/// Shared context for all commands and the message handler
pub struct CommandContext {
    pub config: Arc<RwLock<Config>>,
    pub host: Arc<SkillHost>,
    pub tokens: TokenManager,
}

impl CommandContext {
    pub fn new(config: Arc<RwLock<Config>>, host: Arc<SkillHost>, tokens: TokenManager) -> Self {
        Self {
            config,
            host,
            tokens,
        }
    }
}

impl std::fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandContext").finish_non_exhaustive()
    }
}

/// Type alias for command result
pub type CommandResult = BotResult<()>;

/// Type alias for poise context
pub type Context<'a> = poise::Context<'a, CommandContext, crate::error::Error>;

pub fn create_error_embed(title: &str, description: &str) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title(title)
        .description(description)
        .colour(serenity::Colour::RED)
}

pub fn create_success_embed(title: &str, description: &str) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title(title)
        .description(description)
        .colour(serenity::Colour::DARK_GREEN)
}

/// All application commands
pub fn get_all_application_commands() -> Vec<poise::Command<CommandContext, crate::error::Error>> {
    vec![
        calendar::calendar_token(),
        calendar::timezone(),
        calendar::calendar_source(),
    ]
}

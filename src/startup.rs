use crate::commands::{create_error_embed, get_all_application_commands, CommandContext};
use crate::components::redis_service::RedisActor;
use crate::components::{CalendarHandle, Domain, RecognizerRegistry, TokenManager};
use crate::config::Config;
use crate::dialogs::{MainDialog, Services, SessionState};
use crate::error::Error;
use crate::host::SkillHost;
use crate::{handlers, shutdown};
use poise::serenity_prelude as serenity;
use rust_i18n::t;
use serenity::model::user::OnlineStatus;
use std::sync::Arc;
use tokio::sync::{oneshot, RwLock};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,serenity=warn,poise=warn")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load and initialize the application config
pub async fn load_config() -> miette::Result<Arc<RwLock<Config>>> {
    match Config::load() {
        Ok(config) => Ok(Arc::new(RwLock::new(config))),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Load the recognizers, refusing to start without every domain
fn load_recognizers(path: &str) -> miette::Result<RecognizerRegistry> {
    let registry = RecognizerRegistry::from_path(path)?;
    registry.validate(&Domain::ALL)?;
    info!("Loaded recognizers from {}", path);
    Ok(registry)
}

/// Initialize and start the Discord bot
pub async fn start_bot(config: Arc<RwLock<Config>>) -> miette::Result<()> {
    let settings = config.read().await.clone();

    crate::utils::i18n::set_locale(&settings.bot_locale);
    info!("Setting locale to {}", settings.bot_locale);

    let recognizers = load_recognizers(&settings.intents_path)?;

    // Initialize Redis service
    let (mut redis_actor, redis_handle) = RedisActor::new(Arc::clone(&config));
    tokio::spawn(async move {
        redis_actor.run().await;
    });

    let calendar = CalendarHandle::new();
    let tokens = TokenManager::new(Arc::clone(&config), redis_handle.clone());

    let services = Services::new(
        recognizers,
        Arc::new(calendar.clone()),
        Arc::new(tokens.clone()),
        settings.auth_connection_name.clone(),
    );
    let dialog = MainDialog::new(services, settings.skill_mode);
    let host = Arc::new(SkillHost::new(
        dialog,
        Arc::new(redis_handle.clone()),
        SessionState::new(settings.event_source, &settings.timezone),
    ));
    info!(
        "Skill mode {}, default source {}, default time zone {}",
        settings.skill_mode, settings.event_source, settings.timezone
    );

    let command_data = CommandContext::new(Arc::clone(&config), host, tokens);

    let options = poise::FrameworkOptions {
        commands: get_all_application_commands(),
        on_error: |error| Box::pin(on_error(error)),
        event_handler: |ctx, event, framework, data| {
            Box::pin(handlers::event_handler(ctx, event, framework, data))
        },
        ..Default::default()
    };

    // Plain messages drive the dialogs, so message content is needed
    let intents =
        serenity::GatewayIntents::non_privileged() | serenity::GatewayIntents::MESSAGE_CONTENT;

    let (shutdown_send, shutdown_recv) = oneshot::channel();
    let shutdown_calendar = calendar.clone();
    let shutdown_redis = redis_handle.clone();
    tokio::spawn(async move {
        shutdown::handle_signals(shutdown_send, shutdown_calendar, shutdown_redis).await;
    });

    let activity = settings.activity.clone();
    let client_result = serenity::ClientBuilder::new(settings.discord_token.clone(), intents)
        .framework(poise::Framework::new(options, move |ctx, ready, framework| {
            Box::pin(async move {
                info!("{} is connected!", ready.user.name);

                ctx.set_presence(
                    Some(serenity::ActivityData::playing(&activity)),
                    OnlineStatus::Online,
                );
                info!("Setting activity to {}", activity);

                if let Err(e) =
                    poise::builtins::register_globally(ctx, &framework.options().commands).await
                {
                    error!("Failed to register slash commands: {:?}", e);
                } else {
                    info!("Slash commands registered successfully");
                }

                Ok(command_data)
            })
        }))
        .await;

    info!("Starting bot...");
    let mut client = client_result.map_err(Error::from)?;

    let client_handle = tokio::spawn(async move {
        if let Err(e) = client.start().await {
            Err(Error::from(e))
        } else {
            Ok(())
        }
    });

    tokio::select! {
        result = client_handle => {
            info!("Bot process ended");
            match result {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(e.into()),
                Err(e) => {
                    error!("Client task error: {:?}", e);
                    Err(Error::Other(format!("Client task error: {}", e)).into())
                }
            }
        }
        _ = shutdown_recv => {
            info!("Received shutdown signal, shutting down bot...");
            Ok(())
        }
    }
}

/// Handle errors from commands
async fn on_error(error: poise::FrameworkError<'_, CommandContext, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Error during setup: {:?}", error);
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command '{}': {:?}", ctx.command().name, error);
            if let Err(e) = ctx
                .send(
                    poise::CreateReply::default()
                        .embed(create_error_embed(
                            &t!("error_title", context = "command"),
                            &format!("{}", error),
                        ))
                        .ephemeral(true),
                )
                .await
            {
                error!("Error while sending error message: {:?}", e);
            }
        }
        poise::FrameworkError::EventHandler { error, event, .. } => {
            error!("Error handling {}: {:?}", event.snake_case_name(), error);
        }
        error => {
            error!("Other error: {:?}", error);
        }
    }
}

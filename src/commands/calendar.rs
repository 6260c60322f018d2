use crate::commands::{create_error_embed, create_success_embed, CommandResult, Context};
use crate::components::calendar::EventSource;
use crate::dialogs::{Turn, TurnKind};
use crate::handlers::{conversation_id, send_activities};
use chrono_tz::Tz;
use serde_json::json;
use tracing::info;

/// Hand the skill a calendar access token
#[poise::command(slash_command)]
pub async fn calendar_token(
    ctx: Context<'_>,
    #[description = "Access token from your calendar provider"] access_token: String,
    #[description = "Refresh token, if you have one"] refresh_token: Option<String>,
    #[description = "Seconds until the access token expires"] expires_in: Option<i64>,
) -> CommandResult {
    let user_id = ctx.author().id.to_string();

    let mut token = json!({ "access_token": access_token.clone() });
    if let Some(refresh_token) = refresh_token {
        token["refresh_token"] = json!(refresh_token);
    }
    if let Some(expires_in) = expires_in {
        token["expires_in"] = json!(expires_in);
    }
    ctx.data().tokens.set_token(&user_id, token).await?;
    info!("Stored calendar token for user {}", user_id);

    ctx.send(
        poise::CreateReply::default()
            .embed(create_success_embed(
                &t!("token_saved_title"),
                &t!("token_saved"),
            ))
            .ephemeral(true),
    )
    .await?;

    // A dialog waiting on sign-in picks up where it left off
    let turn = Turn::new(
        conversation_id(ctx.channel_id(), ctx.author().id),
        user_id,
        TurnKind::TokenResponse(access_token),
    );
    let activities = ctx.data().host.handle_turn(turn).await?;
    send_activities(ctx.serenity_context(), ctx.channel_id(), &activities).await
}

/// Set the time zone your meetings are shown in
#[poise::command(slash_command)]
pub async fn timezone(
    ctx: Context<'_>,
    #[description = "Time zone name (e.g. 'Europe/Helsinki')"] zone: String,
) -> CommandResult {
    if zone.parse::<Tz>().is_err() {
        ctx.send(
            poise::CreateReply::default()
                .embed(create_error_embed(
                    &t!("error_title", context = "timezone"),
                    &t!("calendar_invalid_timezone", timezone = zone),
                ))
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    let conversation = conversation_id(ctx.channel_id(), ctx.author().id);
    let time_zone = zone.clone();
    ctx.data()
        .host
        .update_session(&conversation, move |session| session.time_zone = time_zone)
        .await?;
    info!("Time zone for {} set to {}", conversation, zone);

    ctx.send(
        poise::CreateReply::default()
            .embed(create_success_embed(
                &t!("settings_saved_title"),
                &t!("timezone_set", timezone = zone),
            ))
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Choose which calendar the skill reads from
#[poise::command(slash_command)]
pub async fn calendar_source(
    ctx: Context<'_>,
    #[description = "'google' or 'microsoft'"] source: String,
) -> CommandResult {
    let event_source = match source.parse::<EventSource>() {
        Ok(event_source) => event_source,
        Err(e) => {
            ctx.send(
                poise::CreateReply::default()
                    .embed(create_error_embed(&t!("error_title", context = "source"), &e))
                    .ephemeral(true),
            )
            .await?;
            return Ok(());
        }
    };

    let conversation = conversation_id(ctx.channel_id(), ctx.author().id);
    ctx.data()
        .host
        .update_session(&conversation, move |session| session.event_source = event_source)
        .await?;
    info!("Event source for {} set to {}", conversation, event_source);

    ctx.send(
        poise::CreateReply::default()
            .embed(create_success_embed(
                &t!("settings_saved_title"),
                &t!("source_set", source = event_source.to_string()),
            ))
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

//! Discord side of the skill: turns incoming messages into turns and
//! renders the resulting activities.

use crate::commands::CommandContext;
use crate::components::calendar::CalendarEvent;
use crate::dialogs::{Activity, Turn};
use crate::error::{BotResult, Error};
use crate::utils::time::{format_date, format_time, parse_time_zone};
use chrono_tz::Tz;
use poise::serenity_prelude as serenity;
use serenity::{ChannelId, UserId};
use tracing::{debug, error};

/// One conversation per user and channel
pub fn conversation_id(channel_id: ChannelId, user_id: UserId) -> String {
    format!("{}:{}", channel_id, user_id)
}

pub async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, CommandContext, Error>,
    data: &CommandContext,
) -> Result<(), Error> {
    if let serenity::FullEvent::Message { new_message } = event {
        handle_message(ctx, new_message, data).await?;
    }
    Ok(())
}

async fn handle_message(
    ctx: &serenity::Context,
    msg: &serenity::Message,
    data: &CommandContext,
) -> BotResult<()> {
    if msg.author.bot {
        return Ok(());
    }

    let bot_id = ctx.cache.current_user().id;
    let skill_channel = data.config.read().await.skill_channel_id;
    let accepted = msg.guild_id.is_none()
        || skill_channel == Some(msg.channel_id.get())
        || msg.mentions_user_id(bot_id);
    if !accepted {
        return Ok(());
    }

    let text = strip_mention(&msg.content, bot_id);
    if text.is_empty() {
        return Ok(());
    }

    let turn = Turn::message(
        conversation_id(msg.channel_id, msg.author.id),
        msg.author.id.to_string(),
        text,
    );

    let typing = msg.channel_id.start_typing(&ctx.http);
    let result = data.host.handle_turn(turn).await;
    typing.stop();

    match result {
        Ok(activities) => send_activities(ctx, msg.channel_id, &activities).await,
        Err(e) => {
            error!("Turn failed in {}: {:?}", msg.channel_id, e);
            msg.channel_id.say(ctx, t!("calendar_error")).await?;
            Ok(())
        }
    }
}

fn strip_mention(content: &str, bot_id: UserId) -> String {
    content
        .replace(&format!("<@{}>", bot_id), "")
        .replace(&format!("<@!{}>", bot_id), "")
        .trim()
        .to_string()
}

/// Post the activities of a turn to a channel, in order
pub async fn send_activities(
    ctx: &serenity::Context,
    channel_id: ChannelId,
    activities: &[Activity],
) -> BotResult<()> {
    for activity in activities {
        match render(activity) {
            Some(message) => {
                channel_id.send_message(ctx, message).await?;
            }
            None => debug!("Conversation in {} handed back to the parent", channel_id),
        }
    }
    Ok(())
}

fn render(activity: &Activity) -> Option<serenity::CreateMessage> {
    let message = serenity::CreateMessage::new();
    match activity {
        Activity::Message(text) => Some(message.content(text)),
        Activity::SignInPrompt(text) => Some(
            message.embed(
                serenity::CreateEmbed::new()
                    .title(t!("sign_in_title"))
                    .description(text)
                    .colour(serenity::Colour::ORANGE),
            ),
        ),
        Activity::MeetingList {
            events,
            time_zone,
            show_date,
        } => {
            let tz = parse_time_zone(time_zone);
            let embed = events.iter().enumerate().fold(
                serenity::CreateEmbed::new()
                    .title(t!("meeting_list_title"))
                    .colour(serenity::Colour::BLUE),
                |embed, (index, event)| {
                    embed.field(
                        format!("{}. {}", index + 1, event.title),
                        event_details(event, tz, *show_date),
                        false,
                    )
                },
            );
            Some(message.embed(embed))
        }
        Activity::EventCard {
            event,
            time_zone,
            join_button,
        } => {
            let tz = parse_time_zone(time_zone);
            let mut embed = serenity::CreateEmbed::new()
                .title(&event.title)
                .description(event_details(event, tz, true))
                .colour(serenity::Colour::BLUE);
            if !event.attendees.is_empty() {
                let attendees = event
                    .attendees
                    .iter()
                    .map(|a| a.display_name.clone().unwrap_or_else(|| a.email.clone()))
                    .collect::<Vec<_>>()
                    .join(", ");
                embed = embed.field(t!("attendees"), attendees, false);
            }

            let message = message.embed(embed);
            match (&event.online_meeting_url, join_button) {
                (Some(url), true) => Some(message.components(vec![serenity::CreateActionRow::Buttons(
                    vec![serenity::CreateButton::new_link(url).label(t!("join_meeting"))],
                )])),
                _ => Some(message),
            }
        }
        Activity::EndOfConversation => None,
    }
}

/// When and where, one line each
fn event_details(event: &CalendarEvent, tz: Tz, show_date: bool) -> String {
    let span = if event.is_all_day {
        t!("duration_all_day").to_string()
    } else {
        format!("{} - {}", format_time(event.start, tz), format_time(event.end, tz))
    };
    let when = if show_date {
        format!("{}, {}", format_date(event.start, tz), span)
    } else {
        span
    };
    match &event.location {
        Some(location) if !location.is_empty() => format!("{}\n{}", when, location),
        _ => when,
    }
}

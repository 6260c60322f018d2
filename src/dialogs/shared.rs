//! Steps several sub-flows share.

use super::activity::Activity;
use super::engine::{StepContext, StepOutcome};
use super::intents::CalendarIntent;
use super::listing::{narrow_by_title, select_event};
use super::state::{StepValue, PAGE_SIZE};
use crate::error::{auth_error, BotResult};
use rust_i18n::t;
use tracing::debug;

/// Use the session token, a stored one, or ask the user to sign in
pub async fn get_auth_token(sc: &mut StepContext<'_>) -> BotResult<StepOutcome> {
    if let Some(token) = sc.session.auth_token.clone() {
        return Ok(StepOutcome::Next(StepValue::Token(token)));
    }

    let user_id = sc.user_id().to_string();
    if let Some(token) = sc.services.auth.token(&user_id).await? {
        return Ok(StepOutcome::Next(StepValue::Token(token)));
    }

    match sc.services.auth.sign_in_prompt(&user_id) {
        Some(prompt) => Ok(StepOutcome::Prompt(Activity::SignInPrompt(prompt))),
        None => Ok(StepOutcome::Next(StepValue::None)),
    }
}

/// Answer to the sign-in prompt: only a delivered token counts
pub fn resume_auth_token(input: StepValue) -> StepOutcome {
    match input {
        StepValue::Token(token) => StepOutcome::Next(StepValue::Token(token)),
        _ => StepOutcome::Next(StepValue::None),
    }
}

/// Keep the token, or end quietly when the user is not signed in
pub fn after_get_auth_token(sc: &mut StepContext<'_>, value: StepValue) -> StepOutcome {
    match value {
        StepValue::Token(token) => {
            sc.session.auth_token = Some(token);
            StepOutcome::Next(StepValue::None)
        }
        _ => {
            debug!("No calendar token for user {}", sc.user_id());
            StepOutcome::End(StepValue::None)
        }
    }
}

/// Token stored by the sign-in steps
pub fn require_token(sc: &StepContext<'_>) -> BotResult<String> {
    sc.session
        .auth_token
        .clone()
        .ok_or_else(|| auth_error("Calendar step reached without a token"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Confirmation {
    Yes,
    No,
    Unclear,
}

async fn confirmation(sc: &StepContext<'_>) -> BotResult<Confirmation> {
    let intent = sc.services.calendar_intent(sc.utterance()).await?;
    Ok(match intent {
        CalendarIntent::ConfirmYes => Confirmation::Yes,
        CalendarIntent::ConfirmNo | CalendarIntent::Reject => Confirmation::No,
        _ => Confirmation::Unclear,
    })
}

/// Pick the event to change from the upcoming ones, asking when it is ambiguous
pub async fn find_target_event(sc: &mut StepContext<'_>) -> BotResult<StepOutcome> {
    let token = require_token(sc)?;
    let upcoming = sc
        .services
        .calendar
        .list_upcoming(&token, sc.session.event_source)
        .await?;
    let active = upcoming.into_iter().filter(|e| !e.is_cancelled).collect();
    let mut candidates = narrow_by_title(active, sc.utterance());

    match candidates.len() {
        0 => {
            sc.say(t!("no_meetings"));
            sc.session.clear();
            Ok(StepOutcome::End(StepValue::Done(false)))
        }
        1 => {
            sc.session.target_event = candidates.pop();
            Ok(StepOutcome::Next(StepValue::None))
        }
        _ => {
            candidates.truncate(PAGE_SIZE);
            let time_zone = sc.session.time_zone.clone();
            sc.send(Activity::MeetingList {
                events: candidates.clone(),
                time_zone,
                show_date: true,
            });
            sc.session.candidate_events = candidates;
            Ok(StepOutcome::Prompt(Activity::Message(
                t!("choose_event").to_string(),
            )))
        }
    }
}

/// Answer to the "which one" prompt
pub fn resume_target_choice(sc: &mut StepContext<'_>, input: &StepValue) -> StepOutcome {
    let answer = input.as_text().unwrap_or_default();
    match select_event(answer, &sc.session.candidate_events) {
        Some(index) => {
            let chosen = sc.session.candidate_events.swap_remove(index);
            sc.session.candidate_events.clear();
            sc.session.target_event = Some(chosen);
            StepOutcome::Next(StepValue::None)
        }
        None => StepOutcome::Prompt(Activity::Message(t!("choose_event_retry").to_string())),
    }
}

/// Acknowledge a declined confirmation and wrap up
pub fn declined(sc: &mut StepContext<'_>) -> StepOutcome {
    sc.say(t!("action_cancelled"));
    sc.session.clear();
    StepOutcome::End(StepValue::Done(false))
}

/// Answer to a yes/no prompt before changing the calendar
pub async fn resume_confirmation(sc: &mut StepContext<'_>) -> BotResult<StepOutcome> {
    Ok(match confirmation(sc).await? {
        Confirmation::Yes => StepOutcome::Next(StepValue::None),
        Confirmation::No => declined(sc),
        Confirmation::Unclear => {
            StepOutcome::Prompt(Activity::Message(t!("confirm_retry").to_string()))
        }
    })
}

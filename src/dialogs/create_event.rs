use super::activity::Activity;
use super::engine::{step_at, StepContext, StepOutcome, Waterfall};
use super::shared::{after_get_auth_token, get_auth_token, require_token, resume_auth_token, resume_confirmation};
use super::state::{DialogId, StepValue};
use crate::components::calendar::EventDraft;
use crate::error::{dialog_error, BotResult};
use crate::utils::time::{format_time, parse_attendees, parse_duration, parse_start};
use async_trait::async_trait;
use rust_i18n::t;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    GetAuthToken,
    AfterGetAuthToken,
    CollectTitle,
    CollectStart,
    CollectDuration,
    CollectAttendees,
    ConfirmBeforeCreate,
    CreateEvent,
}

const STEPS: [Step; 8] = [
    Step::GetAuthToken,
    Step::AfterGetAuthToken,
    Step::CollectTitle,
    Step::CollectStart,
    Step::CollectDuration,
    Step::CollectAttendees,
    Step::ConfirmBeforeCreate,
    Step::CreateEvent,
];

fn prompt(key: &str) -> StepOutcome {
    StepOutcome::Prompt(Activity::Message(t!(key).to_string()))
}

/// Schedules a new meeting, asking for whatever is missing
pub struct CreateEventDialog;

impl CreateEventDialog {
    fn draft<'s>(sc: &'s mut StepContext<'_>) -> &'s mut EventDraft {
        sc.session.draft.get_or_insert_with(EventDraft::default)
    }

    /// Ask for a slot unless it is already filled
    fn collect(&self, sc: &mut StepContext<'_>, step: Step) -> StepOutcome {
        let draft = Self::draft(sc);
        let (filled, key) = match step {
            Step::CollectTitle => (draft.title.is_some(), "create_ask_title"),
            Step::CollectStart => (draft.start.is_some(), "create_ask_start"),
            Step::CollectDuration => (draft.duration_minutes.is_some(), "create_ask_duration"),
            _ => (draft.attendees.is_some(), "create_ask_attendees"),
        };
        if filled {
            StepOutcome::Next(StepValue::None)
        } else {
            prompt(key)
        }
    }

    /// Validate an answer into its slot, asking again when it does not parse
    fn fill(&self, sc: &mut StepContext<'_>, step: Step, answer: &str) -> StepOutcome {
        let (now, tz) = (sc.now(), sc.tz());
        let draft = Self::draft(sc);

        match step {
            Step::CollectTitle => {
                let title = answer.trim();
                if title.is_empty() {
                    return prompt("create_ask_title");
                }
                draft.title = Some(title.to_string());
            }
            Step::CollectStart => match parse_start(answer, now, tz) {
                Some(start) if start > now => draft.start = Some(start),
                Some(_) => return prompt("create_start_in_past"),
                None => return prompt("create_start_retry"),
            },
            Step::CollectDuration => match parse_duration(answer) {
                Some(minutes) => draft.duration_minutes = Some(minutes),
                None => return prompt("create_duration_retry"),
            },
            _ => match parse_attendees(answer) {
                Some(attendees) => draft.attendees = Some(attendees),
                None => return prompt("create_attendees_retry"),
            },
        }
        StepOutcome::Next(StepValue::None)
    }

    fn confirm_before_create(&self, sc: &mut StepContext<'_>) -> BotResult<StepOutcome> {
        let time_zone = sc.session.time_zone.clone();
        let event = Self::draft(sc)
            .to_new_event(&time_zone)
            .ok_or_else(|| dialog_error("Draft is missing slots at confirmation"))?;

        sc.send(Activity::EventCard {
            event: event.preview(),
            time_zone,
            join_button: false,
        });
        Ok(prompt("create_confirm"))
    }

    async fn create_event(&self, sc: &mut StepContext<'_>) -> BotResult<StepOutcome> {
        let token = require_token(sc)?;
        let time_zone = sc.session.time_zone.clone();
        let event = Self::draft(sc)
            .to_new_event(&time_zone)
            .ok_or_else(|| dialog_error("Draft is missing slots at creation"))?;

        let created = sc
            .services
            .calendar
            .create_event(&token, sc.session.event_source, &event)
            .await?;
        info!("Created event {} for user {}", created.id, sc.user_id());

        let message = t!(
            "create_done",
            title = created.title,
            time = format_time(created.start, sc.tz())
        );
        sc.say(message);
        sc.session.clear();
        Ok(StepOutcome::End(StepValue::Done(true)))
    }
}

#[async_trait]
impl Waterfall for CreateEventDialog {
    fn id(&self) -> DialogId {
        DialogId::CreateEvent
    }

    fn step_count(&self) -> usize {
        STEPS.len()
    }

    async fn run_step(
        &self,
        step: usize,
        sc: &mut StepContext<'_>,
        value: StepValue,
    ) -> BotResult<StepOutcome> {
        match step_at(&STEPS, step, self.id())? {
            Step::GetAuthToken => get_auth_token(sc).await,
            Step::AfterGetAuthToken => Ok(after_get_auth_token(sc, value)),
            step @ (Step::CollectTitle
            | Step::CollectStart
            | Step::CollectDuration
            | Step::CollectAttendees) => Ok(self.collect(sc, step)),
            Step::ConfirmBeforeCreate => self.confirm_before_create(sc),
            Step::CreateEvent => self.create_event(sc).await,
        }
    }

    async fn resume(
        &self,
        step: usize,
        sc: &mut StepContext<'_>,
        input: StepValue,
    ) -> BotResult<StepOutcome> {
        match step_at(&STEPS, step, self.id())? {
            Step::GetAuthToken => Ok(resume_auth_token(input)),
            step @ (Step::CollectTitle
            | Step::CollectStart
            | Step::CollectDuration
            | Step::CollectAttendees) => {
                let answer = input.as_text().unwrap_or_default();
                Ok(self.fill(sc, step, answer))
            }
            Step::ConfirmBeforeCreate => resume_confirmation(sc).await,
            Step::AfterGetAuthToken | Step::CreateEvent => Ok(StepOutcome::Next(input)),
        }
    }
}

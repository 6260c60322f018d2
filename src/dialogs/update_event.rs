use super::activity::Activity;
use super::engine::{step_at, StepContext, StepOutcome, Waterfall};
use super::shared::{
    after_get_auth_token, find_target_event, get_auth_token, require_token, resume_auth_token,
    resume_confirmation, resume_target_choice,
};
use super::state::{DialogId, StepValue};
use crate::error::{dialog_error, BotResult};
use crate::utils::time::{format_time, parse_start};
use async_trait::async_trait;
use rust_i18n::t;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    GetAuthToken,
    AfterGetAuthToken,
    FindTargetEvent,
    CollectNewStart,
    ConfirmBeforeUpdate,
    UpdateEvent,
}

const STEPS: [Step; 6] = [
    Step::GetAuthToken,
    Step::AfterGetAuthToken,
    Step::FindTargetEvent,
    Step::CollectNewStart,
    Step::ConfirmBeforeUpdate,
    Step::UpdateEvent,
];

/// Moves an upcoming meeting to a new start time
pub struct UpdateEventDialog;

impl UpdateEventDialog {
    fn collect_new_start(&self, sc: &mut StepContext<'_>) -> BotResult<StepOutcome> {
        if sc.session.new_start.is_some() {
            return Ok(StepOutcome::Next(StepValue::None));
        }
        let title = sc
            .session
            .target_event
            .as_ref()
            .map(|e| e.title.clone())
            .ok_or_else(|| dialog_error("No event picked for update"))?;
        Ok(StepOutcome::Prompt(Activity::Message(
            t!("update_ask_start", title = title).to_string(),
        )))
    }

    fn fill_new_start(&self, sc: &mut StepContext<'_>, answer: &str) -> StepOutcome {
        let now = sc.now();
        match parse_start(answer, now, sc.tz()) {
            Some(start) if start > now => {
                sc.session.new_start = Some(start);
                StepOutcome::Next(StepValue::None)
            }
            Some(_) => StepOutcome::Prompt(Activity::Message(t!("create_start_in_past").to_string())),
            None => StepOutcome::Prompt(Activity::Message(t!("create_start_retry").to_string())),
        }
    }

    fn confirm_before_update(&self, sc: &mut StepContext<'_>) -> BotResult<StepOutcome> {
        let (Some(event), Some(start)) = (sc.session.target_event.as_ref(), sc.session.new_start) else {
            return Err(dialog_error("Update confirmation without event or start"));
        };
        let message = t!(
            "update_confirm",
            title = event.title,
            time = format_time(start, sc.tz())
        )
        .to_string();
        Ok(StepOutcome::Prompt(Activity::Message(message)))
    }

    async fn update_event(&self, sc: &mut StepContext<'_>) -> BotResult<StepOutcome> {
        let token = require_token(sc)?;
        let (Some(event), Some(start)) = (sc.session.target_event.clone(), sc.session.new_start) else {
            return Err(dialog_error("Update without event or start"));
        };

        let updated = sc
            .services
            .calendar
            .update_event_start(&token, sc.session.event_source, &event, start)
            .await?;
        info!("Moved event {} for user {}", updated.id, sc.user_id());

        let message = t!(
            "update_done",
            title = updated.title,
            time = format_time(updated.start, sc.tz())
        );
        sc.say(message);
        let time_zone = sc.session.time_zone.clone();
        sc.send(Activity::EventCard {
            join_button: updated.online_meeting_url.is_some(),
            event: updated,
            time_zone,
        });
        sc.session.clear();
        Ok(StepOutcome::End(StepValue::Done(true)))
    }
}

#[async_trait]
impl Waterfall for UpdateEventDialog {
    fn id(&self) -> DialogId {
        DialogId::UpdateEvent
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
            Step::FindTargetEvent => find_target_event(sc).await,
            Step::CollectNewStart => self.collect_new_start(sc),
            Step::ConfirmBeforeUpdate => self.confirm_before_update(sc),
            Step::UpdateEvent => self.update_event(sc).await,
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
            Step::FindTargetEvent => Ok(resume_target_choice(sc, &input)),
            Step::CollectNewStart => {
                let answer = input.as_text().unwrap_or_default();
                Ok(self.fill_new_start(sc, answer))
            }
            Step::ConfirmBeforeUpdate => resume_confirmation(sc).await,
            Step::AfterGetAuthToken | Step::UpdateEvent => Ok(StepOutcome::Next(input)),
        }
    }
}

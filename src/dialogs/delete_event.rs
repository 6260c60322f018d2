use super::activity::Activity;
use super::engine::{step_at, StepContext, StepOutcome, Waterfall};
use super::shared::{
    after_get_auth_token, find_target_event, get_auth_token, require_token, resume_auth_token,
    resume_confirmation, resume_target_choice,
};
use super::state::{DialogId, StepValue};
use crate::error::{dialog_error, BotResult};
use crate::utils::time::format_time;
use async_trait::async_trait;
use rust_i18n::t;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    GetAuthToken,
    AfterGetAuthToken,
    FindTargetEvent,
    ConfirmBeforeDelete,
    DeleteEvent,
}

const STEPS: [Step; 5] = [
    Step::GetAuthToken,
    Step::AfterGetAuthToken,
    Step::FindTargetEvent,
    Step::ConfirmBeforeDelete,
    Step::DeleteEvent,
];

/// Removes an upcoming meeting
pub struct DeleteEventDialog;

impl DeleteEventDialog {
    fn confirm_before_delete(&self, sc: &mut StepContext<'_>) -> BotResult<StepOutcome> {
        let event = sc
            .session
            .target_event
            .clone()
            .ok_or_else(|| dialog_error("No event picked for deletion"))?;
        let message = t!(
            "delete_confirm",
            title = event.title,
            time = format_time(event.start, sc.tz())
        )
        .to_string();

        let time_zone = sc.session.time_zone.clone();
        sc.send(Activity::EventCard {
            event,
            time_zone,
            join_button: false,
        });
        Ok(StepOutcome::Prompt(Activity::Message(message)))
    }

    async fn delete_event(&self, sc: &mut StepContext<'_>) -> BotResult<StepOutcome> {
        let token = require_token(sc)?;
        let event = sc
            .session
            .target_event
            .clone()
            .ok_or_else(|| dialog_error("No event picked for deletion"))?;

        sc.services
            .calendar
            .delete_event(&token, sc.session.event_source, &event.id)
            .await?;
        info!("Deleted event {} for user {}", event.id, sc.user_id());

        sc.say(t!("delete_done", title = event.title));
        sc.session.clear();
        Ok(StepOutcome::End(StepValue::Done(true)))
    }
}

#[async_trait]
impl Waterfall for DeleteEventDialog {
    fn id(&self) -> DialogId {
        DialogId::DeleteEvent
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
            Step::ConfirmBeforeDelete => self.confirm_before_delete(sc),
            Step::DeleteEvent => self.delete_event(sc).await,
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
            Step::ConfirmBeforeDelete => resume_confirmation(sc).await,
            Step::AfterGetAuthToken | Step::DeleteEvent => Ok(StepOutcome::Next(input)),
        }
    }
}

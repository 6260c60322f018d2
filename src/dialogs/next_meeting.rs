use super::activity::Activity;
use super::engine::{step_at, StepContext, StepOutcome, Waterfall};
use super::listing::{next_meeting_group, next_meeting_message};
use super::shared::{after_get_auth_token, get_auth_token, require_token, resume_auth_token};
use super::state::{DialogId, StepValue};
use crate::error::BotResult;
use async_trait::async_trait;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    GetAuthToken,
    AfterGetAuthToken,
    ShowNextEvent,
}

const STEPS: [Step; 3] = [Step::GetAuthToken, Step::AfterGetAuthToken, Step::ShowNextEvent];

/// "What's my next meeting?"
pub struct NextMeetingDialog;

impl NextMeetingDialog {
    async fn show_next_event(&self, sc: &mut StepContext<'_>) -> BotResult<StepOutcome> {
        let token = require_token(sc)?;
        let upcoming = sc
            .services
            .calendar
            .list_upcoming(&token, sc.session.event_source)
            .await?;
        let group = next_meeting_group(&upcoming);
        debug!("Next meeting group has {} event(s)", group.len());

        let message = next_meeting_message(&group, sc.tz());
        sc.say(message);
        if !group.is_empty() {
            let time_zone = sc.session.time_zone.clone();
            sc.send(Activity::MeetingList {
                events: group,
                time_zone,
                show_date: false,
            });
        }

        sc.session.clear();
        Ok(StepOutcome::End(StepValue::Done(true)))
    }
}

#[async_trait]
impl Waterfall for NextMeetingDialog {
    fn id(&self) -> DialogId {
        DialogId::NextMeeting
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
            Step::ShowNextEvent => self.show_next_event(sc).await,
        }
    }

    async fn resume(
        &self,
        step: usize,
        _sc: &mut StepContext<'_>,
        input: StepValue,
    ) -> BotResult<StepOutcome> {
        match step_at(&STEPS, step, self.id())? {
            Step::GetAuthToken => Ok(resume_auth_token(input)),
            _ => Ok(StepOutcome::Next(input)),
        }
    }
}

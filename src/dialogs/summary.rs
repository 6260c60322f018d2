use super::activity::Activity;
use super::engine::{step_at, StepContext, StepOutcome, Waterfall};
use super::intents::CalendarIntent;
use super::listing::{has_next_page, page, page_bounds, select_event, summary_announcement, upcoming_in_window};
use super::shared::{after_get_auth_token, get_auth_token, require_token, resume_auth_token};
use super::state::{DialogId, StepValue};
use crate::error::{dialog_error, BotResult};
use crate::utils::time::{day_window, local_date};
use async_trait::async_trait;
use rust_i18n::t;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    ResolveContext,
    GetAuthToken,
    AfterGetAuthToken,
    ShowEventsSummary,
    PromptToRead,
    CallReadEvent,
    AfterReadEvent,
}

const STEPS: [Step; 7] = [
    Step::ResolveContext,
    Step::GetAuthToken,
    Step::AfterGetAuthToken,
    Step::ShowEventsSummary,
    Step::PromptToRead,
    Step::CallReadEvent,
    Step::AfterReadEvent,
];

/// Intents that move through the summary instead of reading from it
fn is_browsing(intent: CalendarIntent) -> bool {
    matches!(
        intent,
        CalendarIntent::Summary | CalendarIntent::ShowNext | CalendarIntent::ShowPrevious
    )
}

/// Today's meetings, one page at a time
pub struct SummaryDialog;

impl SummaryDialog {
    async fn resolve_context(&self, sc: &mut StepContext<'_>, value: StepValue) -> BotResult<StepOutcome> {
        let intent = sc.services.calendar_intent(sc.utterance()).await?;

        match intent {
            CalendarIntent::Summary => sc.session.clear_summary(),
            CalendarIntent::ShowNext => {
                let index = sc.session.show_event_index;
                let more = sc
                    .session
                    .summary_events
                    .as_ref()
                    .map(|events| has_next_page(events.len(), index))
                    .unwrap_or(false);
                if !more {
                    sc.say(t!("no_more_events"));
                    return Ok(StepOutcome::CancelAll);
                }
                sc.session.show_event_index += 1;
            }
            CalendarIntent::ShowPrevious => {
                if sc.session.summary_events.is_none() || sc.session.show_event_index == 0 {
                    sc.say(t!("no_previous_events"));
                    return Ok(StepOutcome::CancelAll);
                }
                sc.session.show_event_index -= 1;
            }
            _ => {}
        }

        Ok(StepOutcome::Next(value))
    }

    async fn show_events_summary(&self, sc: &mut StepContext<'_>) -> BotResult<StepOutcome> {
        let token = require_token(sc)?;
        let tz = sc.tz();
        let time_zone = sc.session.time_zone.clone();

        if let Some(events) = &sc.session.summary_events {
            let Some(range) = page_bounds(events.len(), sc.session.show_event_index) else {
                sc.say(t!("no_more_events"));
                return Ok(StepOutcome::CancelAll);
            };
            let events = events[range].to_vec();
            sc.send(Activity::MeetingList {
                events,
                time_zone,
                show_date: false,
            });
            return Ok(StepOutcome::Next(StepValue::None));
        }

        let now = sc.now();
        let (start, end) = day_window(local_date(now, tz), tz)
            .ok_or_else(|| dialog_error("Could not resolve today's window"))?;
        let events = sc
            .services
            .calendar
            .list_events_in_range(&token, sc.session.event_source, start, end)
            .await?;
        let events = upcoming_in_window(events, now, start);
        debug!("{} event(s) left today", events.len());

        if events.is_empty() {
            sc.say(t!("no_meetings"));
            return Ok(StepOutcome::End(StepValue::Done(false)));
        }

        sc.say(summary_announcement(&events, tz));
        sc.send(Activity::MeetingList {
            events: page(&events, 0).to_vec(),
            time_zone,
            show_date: false,
        });
        sc.session.summary_events = Some(events);
        sc.session.show_event_index = 0;

        Ok(StepOutcome::Next(StepValue::None))
    }

    fn after_read_event(&self, sc: &mut StepContext<'_>, value: StepValue) -> StepOutcome {
        match value {
            // the reader handed back a paging request
            StepValue::Text(_) => StepOutcome::Replace(DialogId::Summary, StepValue::Options(sc.options)),
            _ => {
                sc.session.auth_token = None;
                sc.session.clear_summary();
                StepOutcome::End(StepValue::Done(true))
            }
        }
    }
}

#[async_trait]
impl Waterfall for SummaryDialog {
    fn id(&self) -> DialogId {
        DialogId::Summary
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
            Step::ResolveContext => self.resolve_context(sc, value).await,
            Step::GetAuthToken => get_auth_token(sc).await,
            Step::AfterGetAuthToken => Ok(after_get_auth_token(sc, value)),
            Step::ShowEventsSummary => self.show_events_summary(sc).await,
            Step::PromptToRead => Ok(StepOutcome::Prompt(Activity::Message(
                t!("read_out_prompt").to_string(),
            ))),
            Step::CallReadEvent => Ok(StepOutcome::Begin(DialogId::SummaryRead, StepValue::None)),
            Step::AfterReadEvent => Ok(self.after_read_event(sc, value)),
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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadStep {
    ReadEvent,
    AfterReadOutEvent,
}

const READ_STEPS: [ReadStep; 2] = [ReadStep::ReadEvent, ReadStep::AfterReadOutEvent];

/// Reads events of the current summary page aloud
pub struct ReadEventDialog;

impl ReadEventDialog {
    /// Position on the current page the utterance points at
    fn selection(sc: &StepContext<'_>) -> Option<usize> {
        let events = sc.session.summary_events.as_ref()?;
        select_event(sc.utterance(), page(events, sc.session.show_event_index))
    }

    async fn read_event(&self, sc: &mut StepContext<'_>) -> BotResult<StepOutcome> {
        let intent = sc.services.calendar_intent(sc.utterance()).await?;

        match intent {
            CalendarIntent::ConfirmNo | CalendarIntent::Reject => {
                sc.say(t!("read_out_cancelled"));
                return Ok(StepOutcome::End(StepValue::Done(false)));
            }
            intent if is_browsing(intent) => {
                return Ok(StepOutcome::End(StepValue::Text(sc.utterance().to_string())));
            }
            _ => {}
        }

        if let Some(index) = Self::selection(sc) {
            let events = sc.session.summary_events.as_deref().unwrap_or_default();
            let chosen = page(events, sc.session.show_event_index)[index].clone();
            sc.session.read_queue.push_back(chosen);
        }

        let wants_reading = matches!(intent, CalendarIntent::ReadAloud | CalendarIntent::ConfirmYes);
        if wants_reading && sc.session.read_queue.is_empty() {
            return Ok(StepOutcome::Prompt(Activity::Message(
                t!("read_out_which").to_string(),
            )));
        }

        if let Some(event) = sc.session.read_queue.pop_front() {
            let join_button = event.online_meeting_url.is_some();
            let time_zone = sc.session.time_zone.clone();
            sc.send(Activity::EventCard {
                event,
                time_zone,
                join_button,
            });
            return Ok(StepOutcome::Prompt(Activity::Message(
                t!("read_out_more").to_string(),
            )));
        }

        Ok(StepOutcome::Next(StepValue::None))
    }

    async fn after_read_out_event(&self, sc: &mut StepContext<'_>) -> BotResult<StepOutcome> {
        let intent = sc.services.calendar_intent(sc.utterance()).await?;

        if matches!(intent, CalendarIntent::ReadAloud | CalendarIntent::ConfirmYes)
            || Self::selection(sc).is_some()
        {
            return Ok(StepOutcome::Replace(DialogId::SummaryRead, StepValue::None));
        }
        if is_browsing(intent) {
            return Ok(StepOutcome::End(StepValue::Text(sc.utterance().to_string())));
        }
        Ok(StepOutcome::End(StepValue::Done(true)))
    }
}

#[async_trait]
impl Waterfall for ReadEventDialog {
    fn id(&self) -> DialogId {
        DialogId::SummaryRead
    }

    fn step_count(&self) -> usize {
        READ_STEPS.len()
    }

    async fn run_step(
        &self,
        step: usize,
        sc: &mut StepContext<'_>,
        _value: StepValue,
    ) -> BotResult<StepOutcome> {
        match step_at(&READ_STEPS, step, self.id())? {
            ReadStep::ReadEvent => self.read_event(sc).await,
            ReadStep::AfterReadOutEvent => self.after_read_out_event(sc).await,
        }
    }
}

//! Waterfall executor.
//!
//! A sub-flow is an ordered list of steps. The engine keeps the position of
//! every active sub-flow in a [`DialogStack`] so a conversation can stop at a
//! prompt and pick up at the same step on the next turn, even in another
//! process.

use super::activity::{Activity, Turn};
use super::services::Services;
use super::state::{ConversationState, DialogFrame, DialogId, DialogOptions, SessionState, StepValue};
use crate::error::{dialog_error, BotResult, Error};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use rust_i18n::t;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error};

/// What a step asks the engine to do next
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Run the following step with this value
    Next(StepValue),
    /// Send the prompt and wait for the next turn at this step
    Prompt(Activity),
    /// Start a nested sub-flow; this one continues at its next step when it ends
    Begin(DialogId, StepValue),
    /// Finish this sub-flow, handing the value to whoever started it
    End(StepValue),
    /// Swap this sub-flow for a fresh run of another
    Replace(DialogId, StepValue),
    /// Unwind every active sub-flow
    CancelAll,
}

/// Result of driving the stack for one turn
#[derive(Debug, Clone, PartialEq)]
pub enum DialogTurnStatus {
    /// Nothing was active
    Empty,
    /// A step is waiting for user input
    Waiting,
    /// The outermost sub-flow finished
    Complete(StepValue),
    /// Everything was unwound
    Cancelled,
}

/// What a step sees of the turn
pub struct StepContext<'a> {
    pub session: &'a mut SessionState,
    pub services: &'a Services,
    pub turn: &'a Turn,
    pub options: DialogOptions,
    outbox: &'a mut Vec<Activity>,
}

impl<'a> StepContext<'a> {
    pub fn new(
        session: &'a mut SessionState,
        services: &'a Services,
        turn: &'a Turn,
        options: DialogOptions,
        outbox: &'a mut Vec<Activity>,
    ) -> Self {
        Self {
            session,
            services,
            turn,
            options,
            outbox,
        }
    }

    pub fn send(&mut self, activity: Activity) {
        self.outbox.push(activity);
    }

    pub fn say(&mut self, text: impl Into<String>) {
        self.send(Activity::Message(text.into()));
    }

    /// Text the user sent this turn
    pub fn utterance(&self) -> &str {
        self.turn.text()
    }

    pub fn user_id(&self) -> &str {
        &self.turn.user_id
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.turn.timestamp
    }

    pub fn tz(&self) -> Tz {
        self.session.tz()
    }
}

/// A sub-flow made of ordered steps
#[async_trait]
pub trait Waterfall: Send + Sync {
    fn id(&self) -> DialogId;

    fn step_count(&self) -> usize;

    async fn run_step(
        &self,
        step: usize,
        sc: &mut StepContext<'_>,
        value: StepValue,
    ) -> BotResult<StepOutcome>;

    /// Called with the user's answer when the turn arrives for a step that prompted.
    /// By default the answer goes on to the next step.
    async fn resume(
        &self,
        _step: usize,
        _sc: &mut StepContext<'_>,
        input: StepValue,
    ) -> BotResult<StepOutcome> {
        Ok(StepOutcome::Next(input))
    }

    /// Recover from a failed step
    fn on_fault(&self, sc: &mut StepContext<'_>, _error: &Error) -> StepOutcome {
        sc.say(t!("calendar_error"));
        sc.session.clear();
        StepOutcome::CancelAll
    }
}

/// Look up a dialog's step by index
pub fn step_at<T: Copy>(steps: &[T], index: usize, dialog: DialogId) -> BotResult<T> {
    steps
        .get(index)
        .copied()
        .ok_or_else(|| dialog_error(&format!("{:?} has no step {}", dialog, index)))
}

enum Action {
    Run(StepValue),
    Resume(StepValue),
}

/// Registered sub-flows and the loop that drives them
#[derive(Clone, Default)]
pub struct DialogEngine {
    dialogs: HashMap<DialogId, Arc<dyn Waterfall>>,
}

impl DialogEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, dialog: Arc<dyn Waterfall>) {
        self.dialogs.insert(dialog.id(), dialog);
    }

    fn dialog(&self, id: DialogId) -> BotResult<Arc<dyn Waterfall>> {
        self.dialogs
            .get(&id)
            .cloned()
            .ok_or_else(|| dialog_error(&format!("Dialog {:?} is not registered", id)))
    }

    /// Push a sub-flow and run it until it waits or ends
    pub async fn begin(
        &self,
        dialog: DialogId,
        value: StepValue,
        state: &mut ConversationState,
        services: &Services,
        turn: &Turn,
        options: DialogOptions,
        outbox: &mut Vec<Activity>,
    ) -> BotResult<DialogTurnStatus> {
        debug!("Beginning {:?}", dialog);
        state.stack.push(DialogFrame::new(dialog, value.clone()));
        self.drive(Action::Run(value), state, services, turn, options, outbox)
            .await
    }

    /// Feed the turn's input to the waiting step
    pub async fn continue_active(
        &self,
        input: StepValue,
        state: &mut ConversationState,
        services: &Services,
        turn: &Turn,
        options: DialogOptions,
        outbox: &mut Vec<Activity>,
    ) -> BotResult<DialogTurnStatus> {
        if state.stack.is_empty() {
            return Ok(DialogTurnStatus::Empty);
        }
        self.drive(Action::Resume(input), state, services, turn, options, outbox)
            .await
    }

    async fn drive(
        &self,
        mut action: Action,
        state: &mut ConversationState,
        services: &Services,
        turn: &Turn,
        options: DialogOptions,
        outbox: &mut Vec<Activity>,
    ) -> BotResult<DialogTurnStatus> {
        loop {
            let Some(frame) = state.stack.last() else {
                return Ok(DialogTurnStatus::Empty);
            };
            let (id, step) = (frame.dialog, frame.step);
            let dialog = self.dialog(id)?;

            let outcome = if step >= dialog.step_count() {
                // ran past the last step
                let value = match action {
                    Action::Run(value) | Action::Resume(value) => value,
                };
                StepOutcome::End(value)
            } else {
                let mut sc = StepContext::new(&mut state.session, services, turn, options, outbox);
                let result = match action {
                    Action::Run(value) => {
                        debug!("{:?} step {}", id, step);
                        dialog.run_step(step, &mut sc, value).await
                    }
                    Action::Resume(input) => {
                        debug!("{:?} resuming step {}", id, step);
                        dialog.resume(step, &mut sc, input).await
                    }
                };
                match result {
                    Ok(outcome) => outcome,
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(e) => {
                        error!("{:?} failed at step {}: {:?}", id, step, e);
                        dialog.on_fault(&mut sc, &e)
                    }
                }
            };

            match outcome {
                StepOutcome::Next(value) => {
                    advance(state, value.clone());
                    action = Action::Run(value);
                }
                StepOutcome::Prompt(activity) => {
                    outbox.push(activity);
                    return Ok(DialogTurnStatus::Waiting);
                }
                StepOutcome::Begin(child, value) => {
                    debug!("{:?} begins {:?}", id, child);
                    advance(state, StepValue::None);
                    state.stack.push(DialogFrame::new(child, value.clone()));
                    action = Action::Run(value);
                }
                StepOutcome::Replace(next, value) => {
                    debug!("{:?} replaced by {:?}", id, next);
                    state.stack.pop();
                    state.stack.push(DialogFrame::new(next, value.clone()));
                    action = Action::Run(value);
                }
                StepOutcome::End(value) => {
                    debug!("{:?} ended", id);
                    state.stack.pop();
                    if state.stack.is_empty() {
                        return Ok(DialogTurnStatus::Complete(value));
                    }
                    action = Action::Run(value);
                }
                StepOutcome::CancelAll => {
                    debug!("Cancelling {} active dialog(s)", state.stack.len());
                    state.stack.clear();
                    return Ok(DialogTurnStatus::Cancelled);
                }
            }
        }
    }
}

fn advance(state: &mut ConversationState, value: StepValue) {
    if let Some(frame) = state.stack.last_mut() {
        frame.step += 1;
        frame.value = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::auth::Authenticator;
    use crate::components::calendar::{CalendarEvent, CalendarService, EventSource, NewEvent};
    use crate::components::recognizer::RecognizerRegistry;
    use crate::error::calendar_error;

    struct NoCalendar;

    #[async_trait]
    impl CalendarService for NoCalendar {
        async fn list_events_in_range(
            &self,
            _token: &str,
            _source: EventSource,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
        ) -> BotResult<Vec<CalendarEvent>> {
            Ok(Vec::new())
        }

        async fn list_upcoming(&self, _token: &str, _source: EventSource) -> BotResult<Vec<CalendarEvent>> {
            Ok(Vec::new())
        }

        async fn create_event(&self, _token: &str, _source: EventSource, event: &NewEvent) -> BotResult<CalendarEvent> {
            Ok(event.preview())
        }

        async fn delete_event(&self, _token: &str, _source: EventSource, _event_id: &str) -> BotResult<()> {
            Ok(())
        }

        async fn update_event_start(
            &self,
            _token: &str,
            _source: EventSource,
            event: &CalendarEvent,
            _start: DateTime<Utc>,
        ) -> BotResult<CalendarEvent> {
            Ok(event.clone())
        }
    }

    struct NoAuth;

    #[async_trait]
    impl Authenticator for NoAuth {
        async fn token(&self, _user_id: &str) -> BotResult<Option<String>> {
            Ok(None)
        }

        fn sign_in_prompt(&self, _user_id: &str) -> Option<String> {
            None
        }

        async fn sign_out(&self, _user_id: &str, _connection_name: &str) -> BotResult<()> {
            Ok(())
        }
    }

    /// Counts answers: step 0 prompts, step 1 asks again until it gets "done",
    /// step 2 begins a child, step 3 fails when told to.
    struct Counter;

    #[async_trait]
    impl Waterfall for Counter {
        fn id(&self) -> DialogId {
            DialogId::Summary
        }

        fn step_count(&self) -> usize {
            4
        }

        async fn run_step(
            &self,
            step: usize,
            sc: &mut StepContext<'_>,
            value: StepValue,
        ) -> BotResult<StepOutcome> {
            match step {
                0 => Ok(StepOutcome::Prompt(Activity::Message("first?".into()))),
                1 => {
                    sc.say(format!("got {:?}", value));
                    Ok(StepOutcome::Prompt(Activity::Message("more?".into())))
                }
                2 => Ok(StepOutcome::Begin(DialogId::SummaryRead, StepValue::None)),
                _ => match value {
                    StepValue::Done(true) => Ok(StepOutcome::End(StepValue::Text("finished".into()))),
                    _ => Err(calendar_error("child did not finish")),
                },
            }
        }

        async fn resume(
            &self,
            step: usize,
            _sc: &mut StepContext<'_>,
            input: StepValue,
        ) -> BotResult<StepOutcome> {
            match (step, input.as_text()) {
                (1, Some("again")) => Ok(StepOutcome::Prompt(Activity::Message("more?".into()))),
                _ => Ok(StepOutcome::Next(input)),
            }
        }
    }

    struct Child;

    #[async_trait]
    impl Waterfall for Child {
        fn id(&self) -> DialogId {
            DialogId::SummaryRead
        }

        fn step_count(&self) -> usize {
            1
        }

        async fn run_step(
            &self,
            _step: usize,
            sc: &mut StepContext<'_>,
            _value: StepValue,
        ) -> BotResult<StepOutcome> {
            let ok = sc.utterance() != "fail";
            Ok(StepOutcome::Next(StepValue::Done(ok)))
        }
    }

    fn setup() -> (DialogEngine, Services) {
        let mut engine = DialogEngine::new();
        engine.register(Arc::new(Counter));
        engine.register(Arc::new(Child));
        let services = Services::new(
            RecognizerRegistry::new(),
            Arc::new(NoCalendar),
            Arc::new(NoAuth),
            "calendar",
        );
        (engine, services)
    }

    #[tokio::test]
    async fn test_prompt_suspends_and_resumes_at_same_step() {
        let (engine, services) = setup();
        let mut state = ConversationState::default();
        let mut outbox = Vec::new();
        let options = DialogOptions::default();

        let turn = Turn::message("c", "u", "start");
        let status = engine
            .begin(DialogId::Summary, StepValue::None, &mut state, &services, &turn, options, &mut outbox)
            .await
            .unwrap();
        assert_eq!(status, DialogTurnStatus::Waiting);
        assert_eq!(state.stack[0].step, 0);

        let turn = Turn::message("c", "u", "one");
        let status = engine
            .continue_active(StepValue::Text("one".into()), &mut state, &services, &turn, options, &mut outbox)
            .await
            .unwrap();
        assert_eq!(status, DialogTurnStatus::Waiting);
        assert_eq!(state.stack[0].step, 1);

        // re-prompt keeps the position
        let turn = Turn::message("c", "u", "again");
        engine
            .continue_active(StepValue::Text("again".into()), &mut state, &services, &turn, options, &mut outbox)
            .await
            .unwrap();
        assert_eq!(state.stack[0].step, 1);

        // child runs, parent finishes with its value
        let turn = Turn::message("c", "u", "ok");
        let status = engine
            .continue_active(StepValue::Text("ok".into()), &mut state, &services, &turn, options, &mut outbox)
            .await
            .unwrap();
        assert_eq!(status, DialogTurnStatus::Complete(StepValue::Text("finished".into())));
        assert!(state.stack.is_empty());
        assert!(outbox.contains(&Activity::Message("got Text(\"one\")".into())));
    }

    #[tokio::test]
    async fn test_fault_clears_session_and_unwinds() {
        let (engine, services) = setup();
        let mut state = ConversationState::default();
        state.session.auth_token = Some("token".into());
        state.stack.push(DialogFrame {
            dialog: DialogId::Summary,
            step: 1,
            value: StepValue::None,
        });
        let mut outbox = Vec::new();

        let turn = Turn::message("c", "u", "fail");
        let status = engine
            .continue_active(
                StepValue::Text("fail".into()),
                &mut state,
                &services,
                &turn,
                DialogOptions::default(),
                &mut outbox,
            )
            .await
            .unwrap();

        assert_eq!(status, DialogTurnStatus::Cancelled);
        assert!(state.stack.is_empty());
        assert_eq!(state.session.auth_token, None);
        assert_eq!(outbox, vec![Activity::Message(t!("calendar_error").to_string())]);
    }

    #[tokio::test]
    async fn test_continue_without_active_dialog_is_empty() {
        let (engine, services) = setup();
        let mut state = ConversationState::default();
        let mut outbox = Vec::new();
        let turn = Turn::message("c", "u", "hi");

        let status = engine
            .continue_active(StepValue::None, &mut state, &services, &turn, DialogOptions::default(), &mut outbox)
            .await
            .unwrap();
        assert_eq!(status, DialogTurnStatus::Empty);
        assert!(outbox.is_empty());
    }
}

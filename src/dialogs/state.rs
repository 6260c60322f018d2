use crate::components::calendar::{CalendarEvent, EventDraft, EventSource};
use crate::utils::time::parse_time_zone;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Number of events shown per page while browsing a summary
pub const PAGE_SIZE: usize = 5;

/// Per-invocation parameters of a sub-flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DialogOptions {
    /// Embedded in a larger assistant: completion is signalled with an
    /// end-of-conversation activity instead of a chat reply
    pub skill_mode: bool,
}

/// Everything the skill remembers about one conversation between turns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub auth_token: Option<String>,
    pub event_source: EventSource,
    /// IANA zone name used for "today" and for formatting times
    pub time_zone: String,
    /// Cached result set of the current summary; `None` until fetched
    pub summary_events: Option<Vec<CalendarEvent>>,
    /// Zero-based page cursor into `summary_events`
    pub show_event_index: usize,
    pub read_queue: VecDeque<CalendarEvent>,
    /// Slots collected by the create flow
    pub draft: Option<EventDraft>,
    /// Events offered when the user has to pick one
    pub candidate_events: Vec<CalendarEvent>,
    /// Event picked for deletion or update
    pub target_event: Option<CalendarEvent>,
    /// New start collected by the update flow
    pub new_start: Option<DateTime<Utc>>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(EventSource::default(), "UTC")
    }
}

impl SessionState {
    pub fn new(event_source: EventSource, time_zone: impl Into<String>) -> Self {
        Self {
            auth_token: None,
            event_source,
            time_zone: time_zone.into(),
            summary_events: None,
            show_event_index: 0,
            read_queue: VecDeque::new(),
            draft: None,
            candidate_events: Vec::new(),
            target_event: None,
            new_start: None,
        }
    }

    /// Back to baseline; the user's calendar source and zone survive
    pub fn clear(&mut self) {
        *self = Self::new(self.event_source, std::mem::take(&mut self.time_zone));
    }

    /// Forget the summary being browsed
    pub fn clear_summary(&mut self) {
        self.summary_events = None;
        self.show_event_index = 0;
        self.read_queue.clear();
    }

    pub fn tz(&self) -> Tz {
        parse_time_zone(&self.time_zone)
    }
}

/// Identifies a registered sub-flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DialogId {
    Summary,
    SummaryRead,
    NextMeeting,
    CreateEvent,
    DeleteEvent,
    UpdateEvent,
    Cancel,
}

/// Value threaded from one step to the next
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum StepValue {
    #[default]
    None,
    Options(DialogOptions),
    /// Text of the user's answer to a prompt
    Text(String),
    /// Access token delivered by sign-in
    Token(String),
    Done(bool),
}

impl StepValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            StepValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// One active sub-flow: which dialog, where it stands, and what it was handed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogFrame {
    pub dialog: DialogId,
    pub step: usize,
    pub value: StepValue,
}

impl DialogFrame {
    pub fn new(dialog: DialogId, value: StepValue) -> Self {
        Self {
            dialog,
            step: 0,
            value,
        }
    }
}

/// Active sub-flows, innermost last
pub type DialogStack = Vec<DialogFrame>;

/// Unit of persistence: the session plus the dialog stack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ConversationState {
    pub session: SessionState,
    pub stack: DialogStack,
}

impl ConversationState {
    pub fn new(session: SessionState) -> Self {
        Self {
            session,
            stack: DialogStack::new(),
        }
    }

    pub fn active_dialog(&self) -> Option<DialogId> {
        self.stack.last().map(|frame| frame.dialog)
    }
}

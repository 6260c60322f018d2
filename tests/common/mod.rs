#![allow(dead_code)]

use async_trait::async_trait;
use calendar_skill::components::auth::Authenticator;
use calendar_skill::components::calendar::{
    Attendee, CalendarEvent, CalendarService, EventSource, NewEvent,
};
use calendar_skill::components::recognizer::{Domain, Recognition, Recognizer, RecognizerRegistry};
use calendar_skill::dialogs::{Activity, MainDialog, Services, SessionState, Turn};
use calendar_skill::error::{calendar_error, BotResult};
use calendar_skill::host::{MemoryStore, SkillHost};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const CONVERSATION: &str = "channel:user";
pub const USER: &str = "user-1";
pub const TOKEN: &str = "token-abc";

/// 2026-10-16 at the given UTC time
pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 16, hour, minute, 0).unwrap()
}

pub fn event(title: &str, start: DateTime<Utc>, minutes: i64) -> CalendarEvent {
    CalendarEvent {
        id: title.to_lowercase().replace(' ', "-"),
        title: title.to_string(),
        start,
        end: start + Duration::minutes(minutes),
        time_zone: "UTC".to_string(),
        ..Default::default()
    }
}

pub fn with_attendees(mut event: CalendarEvent, emails: &[&str]) -> CalendarEvent {
    event.attendees = emails
        .iter()
        .map(|email| Attendee {
            email: email.to_string(),
            display_name: None,
        })
        .collect();
    event
}

/// Calls seen by the mock calendar
#[derive(Debug, Clone, PartialEq)]
pub enum CalendarCall {
    ListRange(DateTime<Utc>, DateTime<Utc>),
    ListUpcoming,
    Create(NewEvent),
    Delete(String),
    UpdateStart(String, DateTime<Utc>),
}

/// In-memory calendar with call recording and failure injection
#[derive(Default)]
pub struct MockCalendar {
    events: Mutex<Vec<CalendarEvent>>,
    calls: Mutex<Vec<CalendarCall>>,
    tokens: Mutex<Vec<String>>,
    fail: Mutex<bool>,
}

impl MockCalendar {
    pub fn with_events(events: Vec<CalendarEvent>) -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(events),
            ..Default::default()
        })
    }

    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    pub fn calls(&self) -> Vec<CalendarCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn tokens(&self) -> Vec<String> {
        self.tokens.lock().unwrap().clone()
    }

    pub fn events(&self) -> Vec<CalendarEvent> {
        self.events.lock().unwrap().clone()
    }

    fn record(&self, token: &str, call: CalendarCall) -> BotResult<()> {
        self.calls.lock().unwrap().push(call);
        self.tokens.lock().unwrap().push(token.to_string());
        if *self.fail.lock().unwrap() {
            return Err(calendar_error("provider unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl CalendarService for MockCalendar {
    async fn list_events_in_range(
        &self,
        token: &str,
        _source: EventSource,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> BotResult<Vec<CalendarEvent>> {
        self.record(token, CalendarCall::ListRange(start, end))?;
        let mut events: Vec<CalendarEvent> = self
            .events()
            .into_iter()
            .filter(|e| e.end > start && e.start <= end)
            .collect();
        events.sort_by_key(|e| e.start);
        Ok(events)
    }

    async fn list_upcoming(&self, token: &str, _source: EventSource) -> BotResult<Vec<CalendarEvent>> {
        self.record(token, CalendarCall::ListUpcoming)?;
        let mut events = self.events();
        events.sort_by_key(|e| e.start);
        Ok(events)
    }

    async fn create_event(
        &self,
        token: &str,
        _source: EventSource,
        event: &NewEvent,
    ) -> BotResult<CalendarEvent> {
        self.record(token, CalendarCall::Create(event.clone()))?;
        let mut created = event.preview();
        created.id = format!("created-{}", self.events().len());
        self.events.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn delete_event(&self, token: &str, _source: EventSource, event_id: &str) -> BotResult<()> {
        self.record(token, CalendarCall::Delete(event_id.to_string()))?;
        self.events.lock().unwrap().retain(|e| e.id != event_id);
        Ok(())
    }

    async fn update_event_start(
        &self,
        token: &str,
        _source: EventSource,
        event: &CalendarEvent,
        start: DateTime<Utc>,
    ) -> BotResult<CalendarEvent> {
        self.record(token, CalendarCall::UpdateStart(event.id.clone(), start))?;
        let mut updated = event.clone();
        updated.end = start + (event.end - event.start);
        updated.start = start;
        Ok(updated)
    }
}

/// Authenticator backed by a single optional token
pub struct MockAuthenticator {
    token: Mutex<Option<String>>,
    interactive: bool,
    signed_out: Mutex<Vec<(String, String)>>,
}

impl MockAuthenticator {
    pub fn signed_in() -> Arc<Self> {
        Arc::new(Self {
            token: Mutex::new(Some(TOKEN.to_string())),
            interactive: true,
            signed_out: Mutex::new(Vec::new()),
        })
    }

    /// No stored token; prompts for sign-in unless `interactive` is false
    pub fn signed_out(interactive: bool) -> Arc<Self> {
        Arc::new(Self {
            token: Mutex::new(None),
            interactive,
            signed_out: Mutex::new(Vec::new()),
        })
    }

    pub fn sign_outs(&self) -> Vec<(String, String)> {
        self.signed_out.lock().unwrap().clone()
    }
}

#[async_trait]
impl Authenticator for MockAuthenticator {
    async fn token(&self, _user_id: &str) -> BotResult<Option<String>> {
        Ok(self.token.lock().unwrap().clone())
    }

    fn sign_in_prompt(&self, _user_id: &str) -> Option<String> {
        self.interactive.then(|| "Please sign in".to_string())
    }

    async fn sign_out(&self, user_id: &str, connection_name: &str) -> BotResult<()> {
        *self.token.lock().unwrap() = None;
        self.signed_out
            .lock()
            .unwrap()
            .push((user_id.to_string(), connection_name.to_string()));
        Ok(())
    }
}

/// Recognizer answering from a fixed utterance -> intent table
#[derive(Default)]
pub struct ScriptedRecognizer {
    intents: HashMap<String, String>,
}

impl ScriptedRecognizer {
    pub fn new(entries: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            intents: entries
                .iter()
                .map(|(utterance, intent)| (utterance.to_string(), intent.to_string()))
                .collect(),
        })
    }
}

#[async_trait]
impl Recognizer for ScriptedRecognizer {
    async fn recognize(&self, utterance: &str) -> BotResult<Recognition> {
        Ok(match self.intents.get(utterance) {
            Some(intent) => Recognition {
                intent: intent.clone(),
                score: 0.9,
            },
            None => Recognition::none(),
        })
    }
}

pub fn calendar_script() -> Arc<ScriptedRecognizer> {
    ScriptedRecognizer::new(&[
        ("what's on today", "Summary"),
        ("find my meeting", "FindCalendarEntry"),
        ("next", "ShowNext"),
        ("previous", "ShowPrevious"),
        ("what's my next meeting", "NextMeeting"),
        ("schedule a meeting", "CreateCalendarEntry"),
        ("cancel my meeting", "DeleteCalendarEntry"),
        ("cancel my standup", "DeleteCalendarEntry"),
        ("move my meeting", "ChangeCalendarEntry"),
        ("am i free", "CheckAvailability"),
        ("yes", "ConfirmYes"),
        ("read it", "ReadAloud"),
        ("no", "ConfirmNo"),
    ])
}

pub fn general_script() -> Arc<ScriptedRecognizer> {
    ScriptedRecognizer::new(&[
        ("never mind", "Cancel"),
        ("help", "Help"),
        ("log out", "Logout"),
    ])
}

pub struct Harness {
    pub host: SkillHost,
    pub calendar: Arc<MockCalendar>,
    pub auth: Arc<MockAuthenticator>,
}

impl Harness {
    pub fn new(calendar: Arc<MockCalendar>, auth: Arc<MockAuthenticator>, skill_mode: bool) -> Self {
        let recognizers = RecognizerRegistry::new()
            .with(Domain::Calendar, calendar_script())
            .with(Domain::General, general_script());
        Self::with_recognizers(calendar, auth, recognizers, skill_mode)
    }

    pub fn with_recognizers(
        calendar: Arc<MockCalendar>,
        auth: Arc<MockAuthenticator>,
        recognizers: RecognizerRegistry,
        skill_mode: bool,
    ) -> Self {
        let services = Services::new(recognizers, calendar.clone(), auth.clone(), "calendar");
        let host = SkillHost::new(
            MainDialog::new(services, skill_mode),
            Arc::new(MemoryStore::new()),
            SessionState::new(EventSource::Google, "UTC"),
        );
        Self {
            host,
            calendar,
            auth,
        }
    }

    /// Send a message at the given time and collect the replies
    pub async fn say(&self, text: &str, now: DateTime<Utc>) -> Vec<Activity> {
        self.host
            .handle_turn(Turn::message(CONVERSATION, USER, text).at(now))
            .await
            .unwrap()
    }
}

pub fn texts(activities: &[Activity]) -> Vec<String> {
    activities
        .iter()
        .filter_map(|a| a.text().map(str::to_string))
        .collect()
}

pub fn meeting_lists(activities: &[Activity]) -> Vec<Vec<String>> {
    activities
        .iter()
        .filter_map(|a| match a {
            Activity::MeetingList { events, .. } => {
                Some(events.iter().map(|e| e.title.clone()).collect())
            }
            _ => None,
        })
        .collect()
}

pub fn event_cards(activities: &[Activity]) -> Vec<CalendarEvent> {
    activities
        .iter()
        .filter_map(|a| match a {
            Activity::EventCard { event, .. } => Some(event.clone()),
            _ => None,
        })
        .collect()
}

pub fn ends_conversation(activities: &[Activity]) -> bool {
    activities.contains(&Activity::EndOfConversation)
}

mod actor;
mod google;
mod handle;
mod microsoft;
pub mod models;

pub use handle::CalendarHandle;
pub use models::{Attendee, CalendarEvent, EventDraft, NewEvent};

use crate::error::BotResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How far ahead "upcoming" events are looked up
pub const UPCOMING_HORIZON_DAYS: i64 = 7;

/// Maximum number of upcoming events fetched at once
pub const MAX_UPCOMING_EVENTS: usize = 20;

/// Calendar backend a conversation reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EventSource {
    #[default]
    Google,
    Microsoft,
}

impl FromStr for EventSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "google" => Ok(EventSource::Google),
            "microsoft" | "outlook" | "graph" => Ok(EventSource::Microsoft),
            other => Err(format!("Unknown event source: {}", other)),
        }
    }
}

impl fmt::Display for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventSource::Google => write!(f, "google"),
            EventSource::Microsoft => write!(f, "microsoft"),
        }
    }
}

/// Calendar operations the dialogs rely on
#[async_trait]
pub trait CalendarService: Send + Sync {
    /// Events overlapping the given UTC window, ordered by start time
    async fn list_events_in_range(
        &self,
        token: &str,
        source: EventSource,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> BotResult<Vec<CalendarEvent>>;

    /// Events starting from now on, ordered by start time
    async fn list_upcoming(&self, token: &str, source: EventSource)
        -> BotResult<Vec<CalendarEvent>>;

    async fn create_event(
        &self,
        token: &str,
        source: EventSource,
        event: &NewEvent,
    ) -> BotResult<CalendarEvent>;

    async fn delete_event(&self, token: &str, source: EventSource, event_id: &str)
        -> BotResult<()>;

    /// Move an event to a new start, keeping its duration
    async fn update_event_start(
        &self,
        token: &str,
        source: EventSource,
        event: &CalendarEvent,
        start: DateTime<Utc>,
    ) -> BotResult<CalendarEvent>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_source_parsing() {
        assert_eq!("Google".parse::<EventSource>(), Ok(EventSource::Google));
        assert_eq!("outlook".parse::<EventSource>(), Ok(EventSource::Microsoft));
        assert!("ical".parse::<EventSource>().is_err());
        assert_eq!(EventSource::Microsoft.to_string(), "microsoft");
    }
}

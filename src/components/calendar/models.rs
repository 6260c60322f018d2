use chrono::{DateTime, Duration, Utc};
use rust_i18n::t;
use serde::{Deserialize, Serialize};

/// Someone invited to an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Attendee {
    pub email: String,
    pub display_name: Option<String>,
}

/// Provider-neutral calendar event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Time zone the event was scheduled in
    pub time_zone: String,
    pub location: Option<String>,
    pub attendees: Vec<Attendee>,
    pub is_cancelled: bool,
    /// Join link for online meetings
    pub online_meeting_url: Option<String>,
    pub is_all_day: bool,
}

impl CalendarEvent {
    /// Length of the event in whole minutes
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes().max(0)
    }

    /// Spoken form of the event length, e.g. "1 hour 30 minutes"
    pub fn to_duration_string(&self) -> String {
        if self.is_all_day {
            return t!("duration_all_day").to_string();
        }

        let minutes = self.duration_minutes();
        let (hours, minutes) = (minutes / 60, minutes % 60);
        match (hours, minutes) {
            (0, m) => t!("duration_minutes", minutes = m).to_string(),
            (h, 0) => t!("duration_hours", hours = h).to_string(),
            (h, m) => t!("duration_hours_minutes", hours = h, minutes = m).to_string(),
        }
    }

    /// Whether the title is mentioned in the given text
    pub fn is_mentioned_in(&self, text: &str) -> bool {
        let title = self.title.trim().to_lowercase();
        !title.is_empty() && text.to_lowercase().contains(&title)
    }
}

/// Slots collected while creating an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EventDraft {
    pub title: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i64>,
    pub attendees: Option<Vec<String>>,
    pub location: Option<String>,
}

impl EventDraft {
    /// Turn the draft into a request once every required slot is filled
    pub fn to_new_event(&self, time_zone: &str) -> Option<NewEvent> {
        let title = self.title.clone()?;
        let start = self.start?;
        let duration = self.duration_minutes?;
        Some(NewEvent {
            title,
            start,
            end: start + Duration::minutes(duration),
            time_zone: time_zone.to_string(),
            attendees: self.attendees.clone().unwrap_or_default(),
            location: self.location.clone(),
        })
    }
}

/// Fully specified event to create at the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub time_zone: String,
    pub attendees: Vec<String>,
    pub location: Option<String>,
}

impl NewEvent {
    /// Preview of the event before it exists at the provider
    pub fn preview(&self) -> CalendarEvent {
        CalendarEvent {
            id: String::new(),
            title: self.title.clone(),
            start: self.start,
            end: self.end,
            time_zone: self.time_zone.clone(),
            location: self.location.clone(),
            attendees: self
                .attendees
                .iter()
                .map(|email| Attendee {
                    email: email.clone(),
                    display_name: None,
                })
                .collect(),
            ..Default::default()
        }
    }
}

use crate::components::calendar::CalendarEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What arrived from the transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TurnKind {
    Message(String),
    /// Out-of-band result of a sign-in
    TokenResponse(String),
    /// A new conversation was opened
    ConversationStart,
}

/// One inbound turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub conversation_id: String,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    pub kind: TurnKind,
}

impl Turn {
    pub fn new(conversation_id: impl Into<String>, user_id: impl Into<String>, kind: TurnKind) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            user_id: user_id.into(),
            timestamp: Utc::now(),
            kind,
        }
    }

    pub fn message(
        conversation_id: impl Into<String>,
        user_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self::new(conversation_id, user_id, TurnKind::Message(text.into()))
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Text of a message turn, empty for anything else
    pub fn text(&self) -> &str {
        match &self.kind {
            TurnKind::Message(text) => text,
            _ => "",
        }
    }
}

/// One outbound reply for the transport to render
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Activity {
    Message(String),
    /// Ask the user to sign in to their calendar
    SignInPrompt(String),
    MeetingList {
        events: Vec<CalendarEvent>,
        time_zone: String,
        show_date: bool,
    },
    EventCard {
        event: CalendarEvent,
        time_zone: String,
        /// Render a join button for the meeting link
        join_button: bool,
    },
    /// Hand control back to the parent assistant
    EndOfConversation,
}

impl Activity {
    pub fn text(&self) -> Option<&str> {
        match self {
            Activity::Message(text) | Activity::SignInPrompt(text) => Some(text),
            _ => None,
        }
    }
}

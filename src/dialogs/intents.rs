use crate::components::recognizer::Recognition;
use serde::{Deserialize, Serialize};

/// Intents of the calendar domain model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CalendarIntent {
    None,
    CheckAvailability,
    ChangeCalendarEntry,
    ConfirmNo,
    ConfirmYes,
    CreateCalendarEntry,
    DeleteCalendarEntry,
    FindCalendarEntry,
    FindCalendarWhen,
    FindCalendarWhere,
    FindCalendarWho,
    FindDuration,
    FindMeetingRoom,
    GoBack,
    NextMeeting,
    ReadAloud,
    Reject,
    ShowNext,
    ShowPrevious,
    Summary,
    TimeRemaining,
}

impl CalendarIntent {
    pub const ALL: [CalendarIntent; 21] = [
        CalendarIntent::None,
        CalendarIntent::CheckAvailability,
        CalendarIntent::ChangeCalendarEntry,
        CalendarIntent::ConfirmNo,
        CalendarIntent::ConfirmYes,
        CalendarIntent::CreateCalendarEntry,
        CalendarIntent::DeleteCalendarEntry,
        CalendarIntent::FindCalendarEntry,
        CalendarIntent::FindCalendarWhen,
        CalendarIntent::FindCalendarWhere,
        CalendarIntent::FindCalendarWho,
        CalendarIntent::FindDuration,
        CalendarIntent::FindMeetingRoom,
        CalendarIntent::GoBack,
        CalendarIntent::NextMeeting,
        CalendarIntent::ReadAloud,
        CalendarIntent::Reject,
        CalendarIntent::ShowNext,
        CalendarIntent::ShowPrevious,
        CalendarIntent::Summary,
        CalendarIntent::TimeRemaining,
    ];

    /// Intent by model name; anything unknown counts as `None`
    pub fn from_name(name: &str) -> Self {
        match name {
            "CheckAvailability" => CalendarIntent::CheckAvailability,
            "ChangeCalendarEntry" => CalendarIntent::ChangeCalendarEntry,
            "ConfirmNo" => CalendarIntent::ConfirmNo,
            "ConfirmYes" => CalendarIntent::ConfirmYes,
            "CreateCalendarEntry" => CalendarIntent::CreateCalendarEntry,
            "DeleteCalendarEntry" => CalendarIntent::DeleteCalendarEntry,
            "FindCalendarEntry" => CalendarIntent::FindCalendarEntry,
            "FindCalendarWhen" => CalendarIntent::FindCalendarWhen,
            "FindCalendarWhere" => CalendarIntent::FindCalendarWhere,
            "FindCalendarWho" => CalendarIntent::FindCalendarWho,
            "FindDuration" => CalendarIntent::FindDuration,
            "FindMeetingRoom" => CalendarIntent::FindMeetingRoom,
            "GoBack" => CalendarIntent::GoBack,
            "NextMeeting" => CalendarIntent::NextMeeting,
            "ReadAloud" => CalendarIntent::ReadAloud,
            "Reject" => CalendarIntent::Reject,
            "ShowNext" => CalendarIntent::ShowNext,
            "ShowPrevious" => CalendarIntent::ShowPrevious,
            "Summary" => CalendarIntent::Summary,
            "TimeRemaining" => CalendarIntent::TimeRemaining,
            _ => CalendarIntent::None,
        }
    }
}

impl From<&Recognition> for CalendarIntent {
    fn from(recognition: &Recognition) -> Self {
        Self::from_name(&recognition.intent)
    }
}

/// Intents that can interrupt any sub-flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeneralIntent {
    Cancel,
    Help,
    Logout,
    None,
}

impl GeneralIntent {
    pub fn from_name(name: &str) -> Self {
        match name {
            "Cancel" => GeneralIntent::Cancel,
            "Help" => GeneralIntent::Help,
            "Logout" => GeneralIntent::Logout,
            _ => GeneralIntent::None,
        }
    }
}

impl From<&Recognition> for GeneralIntent {
    fn from(recognition: &Recognition) -> Self {
        Self::from_name(&recognition.intent)
    }
}

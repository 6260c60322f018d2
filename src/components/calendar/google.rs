use super::models::{Attendee, CalendarEvent, NewEvent};
use crate::error::{calendar_error, BotResult};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use url::Url;

const EVENTS_URL: &str = "https://www.googleapis.com/calendar/v3/calendars/primary/events";

#[derive(Debug, Deserialize)]
struct EventList {
    #[serde(default)]
    items: Vec<GoogleEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleEvent {
    id: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    status: Option<String>,
    start: EventTime,
    end: EventTime,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    attendees: Vec<GoogleAttendee>,
    #[serde(default)]
    hangout_link: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventTime {
    #[serde(default)]
    date_time: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    time_zone: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleAttendee {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
}

/// List events of the primary calendar between the given instants
pub async fn list_events(
    client: &Client,
    token: &str,
    time_min: DateTime<Utc>,
    time_max: DateTime<Utc>,
    max_results: Option<usize>,
) -> BotResult<Vec<CalendarEvent>> {
    let mut url = Url::parse(EVENTS_URL)
        .map_err(|e| calendar_error(&format!("Failed to parse URL: {}", e)))?;

    url.query_pairs_mut()
        .append_pair("timeMin", &time_min.to_rfc3339())
        .append_pair("timeMax", &time_max.to_rfc3339())
        .append_pair("singleEvents", "true")
        .append_pair("orderBy", "startTime")
        .append_pair("showDeleted", "false");
    if let Some(max) = max_results {
        url.query_pairs_mut()
            .append_pair("maxResults", &max.to_string());
    }

    let response = client
        .get(url)
        .bearer_auth(token)
        .send()
        .await
        .map_err(|e| calendar_error(&format!("Failed to fetch events: {}", e)))?;

    let list: EventList = check_status(response, "fetch events")
        .await?
        .json()
        .await
        .map_err(|e| calendar_error(&format!("Failed to parse events response: {}", e)))?;

    list.items.into_iter().map(convert_event).collect()
}

/// Create an event in the primary calendar
pub async fn create_event(client: &Client, token: &str, event: &NewEvent) -> BotResult<CalendarEvent> {
    let body = json!({
        "summary": event.title,
        "location": event.location,
        "start": { "dateTime": event.start.to_rfc3339(), "timeZone": event.time_zone },
        "end": { "dateTime": event.end.to_rfc3339(), "timeZone": event.time_zone },
        "attendees": event.attendees.iter().map(|email| json!({ "email": email })).collect::<Vec<_>>(),
    });

    let response = client
        .post(EVENTS_URL)
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .map_err(|e| calendar_error(&format!("Failed to create event: {}", e)))?;

    let created: GoogleEvent = check_status(response, "create event")
        .await?
        .json()
        .await
        .map_err(|e| calendar_error(&format!("Failed to parse created event: {}", e)))?;

    convert_event(created)
}

/// Delete an event by id
pub async fn delete_event(client: &Client, token: &str, event_id: &str) -> BotResult<()> {
    let response = client
        .delete(format!("{}/{}", EVENTS_URL, event_id))
        .bearer_auth(token)
        .send()
        .await
        .map_err(|e| calendar_error(&format!("Failed to delete event: {}", e)))?;

    check_status(response, "delete event").await?;
    Ok(())
}

/// Move an event to new start and end instants
pub async fn patch_event_times(
    client: &Client,
    token: &str,
    event: &CalendarEvent,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> BotResult<CalendarEvent> {
    let body = json!({
        "start": { "dateTime": start.to_rfc3339(), "timeZone": event.time_zone },
        "end": { "dateTime": end.to_rfc3339(), "timeZone": event.time_zone },
    });

    let response = client
        .patch(format!("{}/{}", EVENTS_URL, event.id))
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .map_err(|e| calendar_error(&format!("Failed to update event: {}", e)))?;

    let updated: GoogleEvent = check_status(response, "update event")
        .await?
        .json()
        .await
        .map_err(|e| calendar_error(&format!("Failed to parse updated event: {}", e)))?;

    convert_event(updated)
}

async fn check_status(response: Response, action: &str) -> BotResult<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let error_body = response
        .text()
        .await
        .unwrap_or_else(|_| "Could not read error response".to_string());
    Err(calendar_error(&format!(
        "Failed to {}: HTTP {} - {}",
        action, status, error_body
    )))
}

fn convert_event(event: GoogleEvent) -> BotResult<CalendarEvent> {
    let time_zone = event
        .start
        .time_zone
        .clone()
        .unwrap_or_else(|| "UTC".to_string());
    let is_all_day = event.start.date_time.is_none() && event.start.date.is_some();
    let start = parse_event_time(&event.start, &time_zone)?;
    let end = parse_event_time(&event.end, &time_zone)?;

    Ok(CalendarEvent {
        id: event.id,
        title: event.summary.unwrap_or_default(),
        start,
        end,
        time_zone,
        location: event.location.filter(|l| !l.trim().is_empty()),
        attendees: event
            .attendees
            .into_iter()
            .filter_map(|a| {
                a.email.map(|email| Attendee {
                    email,
                    display_name: a.display_name,
                })
            })
            .collect(),
        is_cancelled: event.status.as_deref() == Some("cancelled"),
        online_meeting_url: event.hangout_link,
        is_all_day,
    })
}

fn parse_event_time(time: &EventTime, time_zone: &str) -> BotResult<DateTime<Utc>> {
    if let Some(date_time) = &time.date_time {
        return DateTime::parse_from_rfc3339(date_time)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| calendar_error(&format!("Failed to parse datetime: {}", e)));
    }

    let date = time
        .date
        .as_deref()
        .ok_or_else(|| calendar_error("Event time has neither dateTime nor date"))?;
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|e| calendar_error(&format!("Failed to parse date: {}", e)))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| calendar_error("Failed to create datetime"))?;
    let tz: Tz = time_zone.parse().unwrap_or(Tz::UTC);

    tz.from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| calendar_error("Invalid local time"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_timed_event() {
        let raw = serde_json::json!({
            "id": "abc",
            "summary": "Design review",
            "status": "confirmed",
            "start": { "dateTime": "2026-10-16T10:00:00+03:00", "timeZone": "Europe/Helsinki" },
            "end": { "dateTime": "2026-10-16T11:00:00+03:00", "timeZone": "Europe/Helsinki" },
            "location": "Room 1",
            "attendees": [{ "email": "a@example.com" }, { "displayName": "no mail" }],
            "hangoutLink": "https://meet.google.com/xyz"
        });
        let event = convert_event(serde_json::from_value(raw).unwrap()).unwrap();

        assert_eq!(event.title, "Design review");
        assert_eq!(event.start, Utc.with_ymd_and_hms(2026, 10, 16, 7, 0, 0).unwrap());
        assert_eq!(event.duration_minutes(), 60);
        assert_eq!(event.attendees.len(), 1);
        assert!(!event.is_cancelled);
        assert_eq!(event.online_meeting_url.as_deref(), Some("https://meet.google.com/xyz"));
    }

    #[test]
    fn test_convert_cancelled_all_day_event() {
        let raw = serde_json::json!({
            "id": "def",
            "status": "cancelled",
            "start": { "date": "2026-10-16" },
            "end": { "date": "2026-10-17" }
        });
        let event = convert_event(serde_json::from_value(raw).unwrap()).unwrap();

        assert!(event.is_cancelled);
        assert!(event.is_all_day);
        assert_eq!(event.title, "");
        assert_eq!(event.duration_minutes(), 24 * 60);
    }

    #[test]
    fn test_convert_rejects_missing_times() {
        let raw = serde_json::json!({
            "id": "ghi",
            "start": {},
            "end": {}
        });
        assert!(convert_event(serde_json::from_value(raw).unwrap()).is_err());
    }
}

use super::models::{Attendee, CalendarEvent, NewEvent};
use crate::error::{calendar_error, BotResult};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;
use url::Url;

const GRAPH_URL: &str = "https://graph.microsoft.com/v1.0/me";

/// Graph returns naive date-times in the zone asked for with this header
const PREFER_UTC: &str = "outlook.timezone=\"UTC\"";

#[derive(Debug, Deserialize)]
struct EventList {
    #[serde(default)]
    value: Vec<GraphEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphEvent {
    id: String,
    #[serde(default)]
    subject: Option<String>,
    start: GraphDateTime,
    end: GraphDateTime,
    #[serde(default)]
    original_start_time_zone: Option<String>,
    #[serde(default)]
    location: Option<GraphLocation>,
    #[serde(default)]
    attendees: Vec<GraphAttendee>,
    #[serde(default)]
    is_cancelled: bool,
    #[serde(default)]
    is_all_day: bool,
    #[serde(default)]
    online_meeting: Option<GraphOnlineMeeting>,
    #[serde(default)]
    online_meeting_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphDateTime {
    date_time: String,
    #[serde(default)]
    time_zone: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphLocation {
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphAttendee {
    email_address: GraphEmail,
}

#[derive(Debug, Deserialize)]
struct GraphEmail {
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphOnlineMeeting {
    #[serde(default)]
    join_url: Option<String>,
}

/// List calendar view entries between the given instants
pub async fn list_events(
    client: &Client,
    token: &str,
    time_min: DateTime<Utc>,
    time_max: DateTime<Utc>,
    max_results: Option<usize>,
) -> BotResult<Vec<CalendarEvent>> {
    let mut url = Url::parse(&format!("{}/calendarView", GRAPH_URL))
        .map_err(|e| calendar_error(&format!("Failed to parse URL: {}", e)))?;

    url.query_pairs_mut()
        .append_pair("startDateTime", &time_min.to_rfc3339())
        .append_pair("endDateTime", &time_max.to_rfc3339())
        .append_pair("$orderby", "start/dateTime");
    if let Some(max) = max_results {
        url.query_pairs_mut().append_pair("$top", &max.to_string());
    }

    let response = authorized(client.get(url), token)
        .send()
        .await
        .map_err(|e| calendar_error(&format!("Failed to fetch events: {}", e)))?;

    let list: EventList = check_status(response, "fetch events")
        .await?
        .json()
        .await
        .map_err(|e| calendar_error(&format!("Failed to parse events response: {}", e)))?;

    list.value.into_iter().map(convert_event).collect()
}

/// Create an event in the default calendar
pub async fn create_event(client: &Client, token: &str, event: &NewEvent) -> BotResult<CalendarEvent> {
    let mut body = json!({
        "subject": event.title,
        "start": graph_time(event.start),
        "end": graph_time(event.end),
        "attendees": event.attendees.iter().map(|email| json!({
            "emailAddress": { "address": email },
            "type": "required",
        })).collect::<Vec<_>>(),
    });
    if let Some(location) = &event.location {
        body["location"] = json!({ "displayName": location });
    }

    let response = authorized(client.post(format!("{}/events", GRAPH_URL)), token)
        .json(&body)
        .send()
        .await
        .map_err(|e| calendar_error(&format!("Failed to create event: {}", e)))?;

    let created: GraphEvent = check_status(response, "create event")
        .await?
        .json()
        .await
        .map_err(|e| calendar_error(&format!("Failed to parse created event: {}", e)))?;

    convert_event(created)
}

/// Delete an event by id
pub async fn delete_event(client: &Client, token: &str, event_id: &str) -> BotResult<()> {
    let response = authorized(
        client.delete(format!("{}/events/{}", GRAPH_URL, event_id)),
        token,
    )
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
        "start": graph_time(start),
        "end": graph_time(end),
    });

    let response = authorized(
        client.patch(format!("{}/events/{}", GRAPH_URL, event.id)),
        token,
    )
    .json(&body)
    .send()
    .await
    .map_err(|e| calendar_error(&format!("Failed to update event: {}", e)))?;

    let updated: GraphEvent = check_status(response, "update event")
        .await?
        .json()
        .await
        .map_err(|e| calendar_error(&format!("Failed to parse updated event: {}", e)))?;

    convert_event(updated)
}

fn authorized(request: RequestBuilder, token: &str) -> RequestBuilder {
    request.bearer_auth(token).header("Prefer", PREFER_UTC)
}

fn graph_time(instant: DateTime<Utc>) -> serde_json::Value {
    json!({
        "dateTime": instant.format("%Y-%m-%dT%H:%M:%S").to_string(),
        "timeZone": "UTC",
    })
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

fn convert_event(event: GraphEvent) -> BotResult<CalendarEvent> {
    let start = parse_graph_time(&event.start)?;
    let end = parse_graph_time(&event.end)?;
    let online_meeting_url = event
        .online_meeting
        .and_then(|m| m.join_url)
        .or(event.online_meeting_url)
        .filter(|url| !url.is_empty());

    Ok(CalendarEvent {
        id: event.id,
        title: event.subject.unwrap_or_default(),
        start,
        end,
        time_zone: event
            .original_start_time_zone
            .unwrap_or_else(|| "UTC".to_string()),
        location: event
            .location
            .and_then(|l| l.display_name)
            .filter(|l| !l.trim().is_empty()),
        attendees: event
            .attendees
            .into_iter()
            .filter_map(|a| {
                a.email_address.address.map(|email| Attendee {
                    email,
                    display_name: a.email_address.name,
                })
            })
            .collect(),
        is_cancelled: event.is_cancelled,
        online_meeting_url,
        is_all_day: event.is_all_day,
    })
}

fn parse_graph_time(time: &GraphDateTime) -> BotResult<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(&time.date_time, "%Y-%m-%dT%H:%M:%S%.f")
        .map_err(|e| calendar_error(&format!("Failed to parse datetime: {}", e)))?;

    match time.time_zone.as_deref() {
        None | Some("UTC") => Ok(naive.and_utc()),
        Some(zone) => {
            let tz: Tz = zone
                .parse()
                .map_err(|_| calendar_error(&format!("Unknown time zone: {}", zone)))?;
            tz.from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
                .ok_or_else(|| calendar_error("Invalid local time"))
        }
    }
}

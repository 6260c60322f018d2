use super::state::PAGE_SIZE;
use crate::components::calendar::CalendarEvent;
use crate::utils::time::format_time;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use rust_i18n::t;
use std::ops::Range;

const ORDINALS: [(&str, &str, &str); 10] = [
    ("first", "1st", "one"),
    ("second", "2nd", "two"),
    ("third", "3rd", "three"),
    ("fourth", "4th", "four"),
    ("fifth", "5th", "five"),
    ("sixth", "6th", "six"),
    ("seventh", "7th", "seven"),
    ("eighth", "8th", "eight"),
    ("ninth", "9th", "nine"),
    ("tenth", "10th", "ten"),
];

/// Index range of page `index`, or `None` when it starts past the end
pub fn page_bounds(len: usize, index: usize) -> Option<Range<usize>> {
    let start = index.checked_mul(PAGE_SIZE)?;
    if start >= len {
        return None;
    }
    Some(start..start + PAGE_SIZE.min(len - start))
}

pub fn page(events: &[CalendarEvent], index: usize) -> &[CalendarEvent] {
    match page_bounds(events.len(), index) {
        Some(range) => &events[range],
        None => &[],
    }
}

pub fn has_next_page(len: usize, index: usize) -> bool {
    (index + 1)
        .checked_mul(PAGE_SIZE)
        .map(|next_start| next_start < len)
        .unwrap_or(false)
}

/// Events worth summarizing: still ahead, inside the window, not cancelled
pub fn upcoming_in_window(
    events: Vec<CalendarEvent>,
    now: DateTime<Utc>,
    window_start: DateTime<Utc>,
) -> Vec<CalendarEvent> {
    events
        .into_iter()
        .filter(|e| e.start > now && e.start >= window_start && !e.is_cancelled)
        .collect()
}

/// Every non-cancelled event starting at the earliest non-cancelled start
pub fn next_meeting_group(events: &[CalendarEvent]) -> Vec<CalendarEvent> {
    let active = events.iter().filter(|e| !e.is_cancelled);
    let Some(first_start) = active.clone().map(|e| e.start).min() else {
        return Vec::new();
    };
    active.filter(|e| e.start == first_start).cloned().collect()
}

/// Spoken overview of the day's events
pub fn summary_announcement(events: &[CalendarEvent], tz: Tz) -> String {
    let (Some(first), Some(last)) = (events.first(), events.last()) else {
        return t!("no_meetings").to_string();
    };

    if events.len() == 1 {
        return t!(
            "summary_one",
            title = first.title,
            duration = first.to_duration_string()
        )
        .to_string();
    }

    t!(
        "summary_many",
        count = events.len(),
        first_title = first.title,
        first_duration = first.to_duration_string(),
        last_title = last.title,
        last_time = format_time(last.start, tz)
    )
    .to_string()
}

/// Reply describing the next meeting group
pub fn next_meeting_message(group: &[CalendarEvent], tz: Tz) -> String {
    match group {
        [] => t!("no_meetings").to_string(),
        [event] => match event.location.as_deref().filter(|l| !l.trim().is_empty()) {
            Some(location) => t!(
                "next_meeting_with_location",
                title = event.title,
                time = format_time(event.start, tz),
                attendees = event.attendees.len(),
                location = location
            )
            .to_string(),
            None => t!(
                "next_meeting",
                title = event.title,
                time = format_time(event.start, tz),
                attendees = event.attendees.len()
            )
            .to_string(),
        },
        _ => t!("next_meeting_multiple", count = group.len()).to_string(),
    }
}

/// Position in `events` the user refers to, by ordinal, number, "last" or title
pub fn select_event(utterance: &str, events: &[CalendarEvent]) -> Option<usize> {
    if events.is_empty() {
        return None;
    }
    let text = utterance.to_lowercase();
    let words: Vec<&str> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    if words.contains(&"last") {
        return Some(events.len() - 1);
    }

    for word in &words {
        let position = word.parse::<usize>().ok().or_else(|| {
            ORDINALS
                .iter()
                .position(|(long, short, cardinal)| word == long || word == short || word == cardinal)
                .map(|i| i + 1)
        });
        if let Some(position) = position {
            if (1..=events.len()).contains(&position) {
                return Some(position - 1);
            }
        }
    }

    events.iter().position(|e| e.is_mentioned_in(utterance))
}

/// Events whose titles the utterance mentions; all of them when none is mentioned
pub fn narrow_by_title(events: Vec<CalendarEvent>, utterance: &str) -> Vec<CalendarEvent> {
    let mentioned: Vec<CalendarEvent> = events
        .iter()
        .filter(|e| e.is_mentioned_in(utterance))
        .cloned()
        .collect();
    if mentioned.is_empty() {
        events
    } else {
        mentioned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, hour, minute, 0).unwrap()
    }

    fn event(title: &str, start: DateTime<Utc>, cancelled: bool) -> CalendarEvent {
        CalendarEvent {
            id: title.to_lowercase(),
            title: title.to_string(),
            start,
            end: start + Duration::minutes(30),
            is_cancelled: cancelled,
            ..Default::default()
        }
    }

    #[test]
    fn test_page_bounds() {
        assert_eq!(page_bounds(3, 0), Some(0..3));
        assert_eq!(page_bounds(12, 1), Some(5..10));
        assert_eq!(page_bounds(12, 2), Some(10..12));
        assert_eq!(page_bounds(12, 3), None);
        assert_eq!(page_bounds(0, 0), None);
        assert_eq!(page_bounds(5, usize::MAX), None);
    }

    #[test]
    fn test_has_next_page() {
        assert!(!has_next_page(5, 0));
        assert!(has_next_page(6, 0));
        assert!(!has_next_page(6, 1));
        assert!(!has_next_page(6, usize::MAX));
    }

    #[test]
    fn test_next_meeting_group_ties() {
        let events = vec![
            event("A", at(10, 0), false),
            event("B", at(10, 0), false),
            event("C", at(11, 0), false),
        ];
        let group = next_meeting_group(&events);
        assert_eq!(group.iter().map(|e| e.title.as_str()).collect::<Vec<_>>(), ["A", "B"]);
    }

    #[test]
    fn test_next_meeting_group_skips_cancelled() {
        let events = vec![
            event("Cancelled", at(9, 0), true),
            event("Late", at(11, 0), false),
            event("Also cancelled", at(11, 0), true),
            event("Later", at(12, 0), false),
        ];
        let group = next_meeting_group(&events);
        assert_eq!(group.len(), 1);
        assert_eq!(group[0].title, "Late");

        let all_cancelled = vec![event("X", at(9, 0), true), event("Y", at(10, 0), true)];
        assert!(next_meeting_group(&all_cancelled).is_empty());
        assert!(next_meeting_group(&[]).is_empty());
    }

    #[test]
    fn test_next_meeting_group_unsorted_input() {
        let events = vec![
            event("Late", at(15, 0), false),
            event("Early", at(8, 0), false),
            event("Early too", at(8, 0), false),
        ];
        let titles: Vec<String> = next_meeting_group(&events).into_iter().map(|e| e.title).collect();
        assert_eq!(titles, ["Early", "Early too"]);
    }

    #[test]
    fn test_upcoming_in_window() {
        let now = at(12, 0);
        let events = vec![
            event("Past", at(9, 0), false),
            event("Now", at(12, 0), false),
            event("Cancelled", at(13, 0), true),
            event("Soon", at(13, 0), false),
        ];
        let kept = upcoming_in_window(events, now, at(0, 0));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "Soon");
    }

    #[test]
    fn test_select_event() {
        let events = vec![
            event("Standup", at(9, 0), false),
            event("Design review", at(10, 0), false),
            event("Retro", at(11, 0), false),
        ];
        assert_eq!(select_event("the second one", &events), Some(1));
        assert_eq!(select_event("3", &events), Some(2));
        assert_eq!(select_event("read the last", &events), Some(2));
        assert_eq!(select_event("what about the design review?", &events), Some(1));
        assert_eq!(select_event("the fifth", &events), None);
        assert_eq!(select_event("nothing", &events), None);
        assert_eq!(select_event("first", &[]), None);
    }

    #[test]
    fn test_narrow_by_title() {
        let events = vec![event("Standup", at(9, 0), false), event("Retro", at(11, 0), false)];
        assert_eq!(narrow_by_title(events.clone(), "delete the retro").len(), 1);
        assert_eq!(narrow_by_title(events, "delete a meeting").len(), 2);
    }
}

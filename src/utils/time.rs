use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::warn;

/// Longest event the create flow accepts
pub const MAX_DURATION_MINUTES: i64 = 24 * 60;

/// Parse time string in HH:MM format
pub fn parse_time(time_str: &str) -> Option<(u32, u32)> {
    let parts: Vec<&str> = time_str.split(':').collect();
    if parts.len() != 2 {
        return None;
    }
    let hour = parts[0].parse::<u32>().ok()?;
    let minute = parts[1].parse::<u32>().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Some((hour, minute))
}

/// Resolve an IANA zone name, falling back to UTC
pub fn parse_time_zone(name: &str) -> Tz {
    name.parse::<Tz>().unwrap_or_else(|_| {
        warn!("Unknown time zone '{}', using UTC", name);
        Tz::UTC
    })
}

/// Calendar date of `now` in the given zone
pub fn local_date(now: DateTime<Utc>, tz: Tz) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

/// UTC bounds of a local day: midnight to 23:59:59.
///
/// When the clocks skip midnight the day starts at its first valid local time.
pub fn day_window(date: NaiveDate, tz: Tz) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = (0..24).find_map(|hour| {
        tz.from_local_datetime(&date.and_hms_opt(hour, 0, 0)?)
            .earliest()
    })?;
    let end = tz
        .from_local_datetime(&date.and_hms_opt(23, 59, 59)?)
        .latest()?;
    Some((start.with_timezone(&Utc), end.with_timezone(&Utc)))
}

/// Clock time as spoken to the user, e.g. "9:05 AM"
pub fn format_time(time: DateTime<Utc>, tz: Tz) -> String {
    time.with_timezone(&tz).format("%-I:%M %p").to_string()
}

/// Date heading, e.g. "Friday, October 16"
pub fn format_date(time: DateTime<Utc>, tz: Tz) -> String {
    time.with_timezone(&tz).format("%A, %B %-d").to_string()
}

/// Parse a clock time: "14:30", "2pm", "2:30 pm", "at 9am"
pub fn parse_clock(text: &str) -> Option<NaiveTime> {
    let text = text.trim().to_lowercase();
    let text = text.strip_prefix("at ").unwrap_or(&text).trim();

    let (body, meridiem) = if let Some(body) = text.strip_suffix("am") {
        (body.trim(), Some(false))
    } else if let Some(body) = text.strip_suffix("pm") {
        (body.trim(), Some(true))
    } else {
        (text, None)
    };

    let (hour, minute) = match meridiem {
        None => parse_time(body)?,
        Some(is_pm) => {
            let (hour, minute) = match body.split_once(':') {
                Some((h, m)) => (h.parse::<u32>().ok()?, m.parse::<u32>().ok()?),
                None => (body.parse::<u32>().ok()?, 0),
            };
            if hour == 0 || hour > 12 || minute > 59 {
                return None;
            }
            let hour = match (hour, is_pm) {
                (12, false) => 0,
                (12, true) => 12,
                (h, true) => h + 12,
                (h, false) => h,
            };
            (hour, minute)
        }
    };

    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Parse a start time in the user's zone.
///
/// Accepts "YYYY-MM-DD HH:MM", "today <clock>", "tomorrow <clock>" or a bare
/// clock time, which means the next occurrence of that time.
pub fn parse_start(text: &str, now: DateTime<Utc>, tz: Tz) -> Option<DateTime<Utc>> {
    let text = text.trim().to_lowercase();
    let today = local_date(now, tz);

    if let Ok(naive) = NaiveDateTime::parse_from_str(&text, "%Y-%m-%d %H:%M") {
        return to_utc(naive, tz);
    }

    if let Some(rest) = text.strip_prefix("tomorrow") {
        let date = today.succ_opt()?;
        return to_utc(date.and_time(parse_clock(rest)?), tz);
    }

    if let Some(rest) = text.strip_prefix("today") {
        return to_utc(today.and_time(parse_clock(rest)?), tz);
    }

    let clock = parse_clock(&text)?;
    let candidate = to_utc(today.and_time(clock), tz)?;
    if candidate > now {
        Some(candidate)
    } else {
        to_utc(today.succ_opt()?.and_time(clock), tz)
    }
}

fn to_utc(naive: NaiveDateTime, tz: Tz) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse a meeting length in minutes: "45", "90 min", "1h", "1h30", "2 hours"
pub fn parse_duration(text: &str) -> Option<i64> {
    let text = text.trim().to_lowercase();
    let mut tokens: Vec<String> = Vec::new();
    let mut current = String::new();

    // split into runs of digits and runs of letters
    for c in text.chars() {
        let same_kind = current
            .chars()
            .last()
            .map(|last| last.is_ascii_digit() == c.is_ascii_digit())
            .unwrap_or(true);
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            continue;
        }
        if !same_kind {
            tokens.push(std::mem::take(&mut current));
        }
        current.push(c);
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    let mut total = 0i64;
    let mut pending: Option<i64> = None;
    let mut last_unit = 1i64;

    for token in tokens {
        if let Ok(number) = token.parse::<i64>() {
            if let Some(previous) = pending.replace(number) {
                total = previous.checked_mul(last_unit)?.checked_add(total)?;
            }
            continue;
        }
        let unit = match token.as_str() {
            "h" | "hr" | "hrs" | "hour" | "hours" => 60,
            "m" | "min" | "mins" | "minute" | "minutes" => 1,
            "and" => continue,
            _ => return None,
        };
        total = pending.take()?.checked_mul(unit)?.checked_add(total)?;
        last_unit = unit;
    }

    // a trailing bare number after hours means minutes ("1h30")
    if let Some(number) = pending {
        total = total.checked_add(number)?;
    }

    (total > 0 && total <= MAX_DURATION_MINUTES).then_some(total)
}

/// Parse an attendee list of e-mail addresses; "nobody" means an empty list
pub fn parse_attendees(text: &str) -> Option<Vec<String>> {
    let text = text.trim().to_lowercase();
    if matches!(text.as_str(), "nobody" | "none" | "no one" | "no" | "skip") {
        return Some(Vec::new());
    }

    let attendees: Vec<String> = text
        .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .filter(|part| !part.is_empty() && *part != "and")
        .map(|part| part.to_string())
        .collect();

    if attendees.is_empty() || !attendees.iter().all(|a| is_email(a)) {
        return None;
    }
    Some(attendees)
}

fn is_email(text: &str) -> bool {
    match text.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn helsinki() -> Tz {
        "Europe/Helsinki".parse().unwrap()
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time("00:00"), Some((0, 0)));
        assert_eq!(parse_time("23:59"), Some((23, 59)));
        assert_eq!(parse_time("24:00"), None);
        assert_eq!(parse_time("12:30:45"), None);
        assert_eq!(parse_time("ab:30"), None);
    }

    #[test]
    fn test_day_window_in_zone() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let (start, end) = day_window(date, helsinki()).unwrap();
        // UTC+3 in October
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 10, 15, 21, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 10, 16, 20, 59, 59).unwrap());
    }

    #[test]
    fn test_day_window_on_dst_change() {
        // clocks go back on 2026-10-25, the day lasts 25 hours
        let date = NaiveDate::from_ymd_opt(2026, 10, 25).unwrap();
        let (start, end) = day_window(date, helsinki()).unwrap();
        assert_eq!((end - start).num_seconds(), 25 * 3600 - 1);
    }

    #[test]
    fn test_day_window_when_midnight_is_skipped() {
        // Santiago springs forward at local midnight on 2026-09-06
        let santiago: Tz = "America/Santiago".parse().unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 9, 6).unwrap();
        let (start, end) = day_window(date, santiago).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 9, 6, 4, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 9, 7, 2, 59, 59).unwrap());
    }

    #[test]
    fn test_format_time() {
        let time = Utc.with_ymd_and_hms(2026, 10, 16, 6, 5, 0).unwrap();
        assert_eq!(format_time(time, helsinki()), "9:05 AM");
        assert_eq!(format_time(time, Tz::UTC), "6:05 AM");
        let evening = Utc.with_ymd_and_hms(2026, 10, 16, 19, 30, 0).unwrap();
        assert_eq!(format_time(evening, Tz::UTC), "7:30 PM");
    }

    #[test]
    fn test_parse_clock() {
        assert_eq!(parse_clock("14:30"), NaiveTime::from_hms_opt(14, 30, 0));
        assert_eq!(parse_clock("2pm"), NaiveTime::from_hms_opt(14, 0, 0));
        assert_eq!(parse_clock("at 9:15 am"), NaiveTime::from_hms_opt(9, 15, 0));
        assert_eq!(parse_clock("12am"), NaiveTime::from_hms_opt(0, 0, 0));
        assert_eq!(parse_clock("13pm"), None);
        assert_eq!(parse_clock("noonish"), None);
    }

    #[test]
    fn test_parse_start() {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();

        assert_eq!(
            parse_start("tomorrow 9am", now, Tz::UTC),
            Some(Utc.with_ymd_and_hms(2026, 10, 17, 9, 0, 0).unwrap())
        );
        assert_eq!(
            parse_start("today 15:00", now, helsinki()),
            Some(Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap())
        );
        assert_eq!(
            parse_start("2026-11-02 08:30", now, Tz::UTC),
            Some(Utc.with_ymd_and_hms(2026, 11, 2, 8, 30, 0).unwrap())
        );
        // bare time already passed today rolls over to tomorrow
        assert_eq!(
            parse_start("10:00", now, Tz::UTC),
            Some(Utc.with_ymd_and_hms(2026, 10, 17, 10, 0, 0).unwrap())
        );
        assert_eq!(
            parse_start("4pm", now, Tz::UTC),
            Some(Utc.with_ymd_and_hms(2026, 10, 16, 16, 0, 0).unwrap())
        );
        assert_eq!(parse_start("someday", now, Tz::UTC), None);
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("45"), Some(45));
        assert_eq!(parse_duration("90 min"), Some(90));
        assert_eq!(parse_duration("1h"), Some(60));
        assert_eq!(parse_duration("1h30"), Some(90));
        assert_eq!(parse_duration("2 hours"), Some(120));
        assert_eq!(parse_duration("1 hour and 15 minutes"), Some(75));
        assert_eq!(parse_duration("0"), None);
        assert_eq!(parse_duration("forever"), None);
        assert_eq!(parse_duration("48 hours"), None);
        assert_eq!(parse_duration("999999999999999999 hours"), None);
        assert_eq!(parse_duration("9223372036854775807 min 1"), None);
    }

    #[test]
    fn test_parse_attendees() {
        assert_eq!(parse_attendees("nobody"), Some(vec![]));
        assert_eq!(
            parse_attendees("anna@example.com, bo@example.org and cy@example.net"),
            Some(vec![
                "anna@example.com".to_string(),
                "bo@example.org".to_string(),
                "cy@example.net".to_string(),
            ])
        );
        assert_eq!(parse_attendees("anna"), None);
        assert_eq!(parse_attendees("anna@localhost"), None);
        assert_eq!(parse_attendees(""), None);
    }
}

//! Free-text weekly opening hours.
//!
//! Hours arrive as lines like `"Monday: 9:00 AM – 5:00 PM"`, `"Sunday: Closed"`
//! or `"Friday: Open 24 hours"`. Days may be missing. Status is always
//! evaluated in one fixed timezone, the one of the city the locations are in.

use chrono::{DateTime, Datelike, NaiveTime, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use serde::Serialize;

/// Stored marker for locations without known hours.
pub const NOT_AVAILABLE: &str = "N/A";

const CLOSED: &str = "closed";
const OPEN_24_HOURS: &str = "open 24 hours";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OpenStatus {
    Open,
    Closed,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpeningHours {
    NotAvailable,
    Weekly(Vec<String>),
}

/// Consecutive days sharing the same hour text, e.g. `Monday - Friday`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HoursGroup {
    pub days: String,
    pub hours: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum DayHours {
    Closed,
    AllDay,
    Ranges(Vec<TimeRange>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TimeRange {
    start: NaiveTime,
    end: NaiveTime,
}

impl TimeRange {
    /// Both endpoints are inclusive. An end before the start means the range
    /// runs past midnight.
    fn contains(&self, time: NaiveTime) -> bool {
        if self.start <= self.end {
            self.start <= time && time <= self.end
        } else {
            time >= self.start || time <= self.end
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Meridiem {
    Am,
    Pm,
}

impl OpeningHours {
    pub fn from_entries(entries: Option<Vec<String>>) -> Self {
        match entries {
            None => OpeningHours::NotAvailable,
            Some(entries)
                if entries.is_empty()
                    || entries.iter().all(|e| e.trim().eq_ignore_ascii_case(NOT_AVAILABLE)) =>
            {
                OpeningHours::NotAvailable
            }
            Some(entries) => OpeningHours::Weekly(entries),
        }
    }

    pub fn status_at(&self, timezone: Tz, now: DateTime<Utc>) -> OpenStatus {
        let entries = match self {
            OpeningHours::NotAvailable => return OpenStatus::Unknown,
            OpeningHours::Weekly(entries) => entries,
        };

        let days: Vec<(Weekday, &str)> = entries.iter().filter_map(|e| split_entry(e)).collect();
        if days.is_empty() {
            return OpenStatus::Unknown;
        }

        let local = now.with_timezone(&timezone);
        let Some(time) = NaiveTime::from_hms_opt(local.hour(), local.minute(), 0) else {
            return OpenStatus::Unknown;
        };

        let Some((_, text)) = days.iter().find(|(day, _)| *day == local.weekday()) else {
            return OpenStatus::Closed;
        };

        match parse_day_hours(text) {
            None => OpenStatus::Unknown,
            Some(DayHours::Closed) => OpenStatus::Closed,
            Some(DayHours::AllDay) => OpenStatus::Open,
            Some(DayHours::Ranges(ranges)) => {
                if ranges.iter().any(|r| r.contains(time)) {
                    OpenStatus::Open
                } else {
                    OpenStatus::Closed
                }
            }
        }
    }

    /// Monday-first rendering with runs of identical days merged.
    pub fn grouped(&self) -> Vec<HoursGroup> {
        let OpeningHours::Weekly(entries) = self else {
            return vec![];
        };

        let mut days: Vec<(Weekday, &str)> = entries.iter().filter_map(|e| split_entry(e)).collect();
        days.sort_by_key(|(day, _)| day.num_days_from_monday());

        let mut runs: Vec<(Weekday, Weekday, &str)> = Vec::new();
        for (day, text) in days {
            match runs.last_mut() {
                Some((_, last, hours)) if last.succ() == day && *hours == text => *last = day,
                _ => runs.push((day, day, text)),
            }
        }

        runs.into_iter()
            .map(|(first, last, hours)| HoursGroup {
                days: if first == last {
                    day_name(first).to_string()
                } else {
                    format!("{} - {}", day_name(first), day_name(last))
                },
                hours: hours.to_string(),
            })
            .collect()
    }
}

fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// `"Monday: 9:00 AM – 5:00 PM"` -> `(Mon, "9:00 AM – 5:00 PM")`.
fn split_entry(entry: &str) -> Option<(Weekday, &str)> {
    let (day, hours) = entry.split_once(':')?;
    let day = day.trim().parse::<Weekday>().ok()?;
    Some((day, hours.trim()))
}

fn parse_day_hours(text: &str) -> Option<DayHours> {
    let text = normalize_spaces(text);
    let lowered = text.to_lowercase();

    if lowered == CLOSED {
        return Some(DayHours::Closed);
    }
    if lowered == OPEN_24_HOURS {
        return Some(DayHours::AllDay);
    }

    let ranges = text
        .split(',')
        .map(parse_range)
        .collect::<Option<Vec<_>>>()?;

    Some(DayHours::Ranges(ranges))
}

fn normalize_spaces(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{202f}' | '\u{2009}' | '\u{00a0}' => ' ',
            other => other,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Tries, in order: both ends with a meridiem, only the end with one (shared
/// by both), neither (both read as PM).
fn parse_range(text: &str) -> Option<TimeRange> {
    let (start, end) = split_range(text)?;
    let (start_hour, start_minute, start_meridiem) = parse_clock(start)?;
    let (end_hour, end_minute, end_meridiem) = parse_clock(end)?;

    let (start_meridiem, end_meridiem) = match (start_meridiem, end_meridiem) {
        (Some(s), Some(e)) => (s, e),
        (None, Some(e)) => (e, e),
        (None, None) => (Meridiem::Pm, Meridiem::Pm),
        (Some(_), None) => return None,
    };

    Some(TimeRange {
        start: to_time(start_hour, start_minute, start_meridiem)?,
        end: to_time(end_hour, end_minute, end_meridiem)?,
    })
}

fn split_range(text: &str) -> Option<(&str, &str)> {
    ['–', '—']
        .iter()
        .find_map(|sep| text.split_once(*sep))
        .or_else(|| text.split_once(" to "))
        .or_else(|| text.split_once('-'))
}

/// `"9:30 PM"` -> `(9, 30, Some(Pm))`, `"9:30"` -> `(9, 30, None)`.
fn parse_clock(text: &str) -> Option<(u32, u32, Option<Meridiem>)> {
    let text = text.trim().to_ascii_uppercase();

    let (clock, meridiem) = if let Some(rest) = text.strip_suffix("AM") {
        (rest.trim(), Some(Meridiem::Am))
    } else if let Some(rest) = text.strip_suffix("PM") {
        (rest.trim(), Some(Meridiem::Pm))
    } else {
        (text.as_str(), None)
    };

    let (hour, minute) = clock.split_once(':')?;
    let hour: u32 = hour.trim().parse().ok()?;
    let minute: u32 = minute.trim().parse().ok()?;

    if !(1..=12).contains(&hour) || minute > 59 {
        return None;
    }

    Some((hour, minute, meridiem))
}

fn to_time(hour: u32, minute: u32, meridiem: Meridiem) -> Option<NaiveTime> {
    let hour = match meridiem {
        Meridiem::Am => hour % 12,
        Meridiem::Pm => hour % 12 + 12,
    };
    NaiveTime::from_hms_opt(hour, minute, 0)
}

//! Human readable descriptions of an occurrence window.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Timelike, Utc, Weekday};
use chrono_tz::Tz;

use crate::model::TimeString;

/// Describe the window `start..end`.
///
/// With a `reference_day` the description is anchored to that calendar day and
/// ignores `now`; windows touching neither end of the day are unresolvable.
/// Without one the description is relative to `now`. A window ending before
/// it starts is always unresolvable.
pub fn format_window(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    reference_day: Option<NaiveDate>,
    now: DateTime<Utc>,
    tz: Tz,
) -> Option<TimeString> {
    if end < start {
        return None;
    }

    let local_start = start.with_timezone(&tz);
    let local_end = end.with_timezone(&tz);
    let range = format!(
        "{}-{}",
        clock_label(local_start.time()),
        clock_label(local_end.time())
    );
    let length = duration_label(end - start);

    if let Some(day) = reference_day {
        let starts_on_day = local_start.date_naive() == day;
        if !starts_on_day && local_end.date_naive() != day {
            return None;
        }
        let short = if starts_on_day {
            range.clone()
        } else {
            format!("Until {}", clock_label(local_end.time()))
        };
        let long = format!("{} {} ({})", weekday_name(local_start.weekday()), range, length);
        return Some(TimeString { short, long });
    }

    if start < now && now <= end {
        let until = clock_label(local_end.time());
        return Some(TimeString {
            short: format!("Until {until}"),
            long: format!("Now until {until} ({} left)", duration_label(end - now)),
        });
    }

    let today = now.with_timezone(&tz).date_naive();
    let date = local_start.date_naive();
    let (short_day, long_day) = if date == today {
        ("Today".to_string(), "Today".to_string())
    } else if today.succ_opt() == Some(date) {
        ("Tomorrow".to_string(), "Tomorrow".to_string())
    } else {
        let name = weekday_name(date.weekday());
        (name[..3].to_string(), name.to_string())
    };

    let long = if end < now {
        format!("{long_day} {range} (ended)")
    } else {
        format!("{long_day} {range} ({length})")
    };
    Some(TimeString {
        short: format!("{short_day} {range}"),
        long,
    })
}

/// `9am`, `9:30pm`, `noon` or `midnight`.
pub fn clock_label(time: NaiveTime) -> String {
    let (hour, minute) = (time.hour(), time.minute());
    match (hour, minute) {
        (0, 0) => "midnight".to_string(),
        (12, 0) => "noon".to_string(),
        _ => {
            let suffix = if hour < 12 { "am" } else { "pm" };
            let hour12 = match hour % 12 {
                0 => 12,
                other => other,
            };
            if minute == 0 {
                format!("{hour12}{suffix}")
            } else {
                format!("{hour12}:{minute:02}{suffix}")
            }
        }
    }
}

pub fn duration_label(duration: Duration) -> String {
    let minutes = duration.num_minutes().max(0);
    if minutes < 60 {
        return if minutes == 1 {
            "1 min".to_string()
        } else {
            format!("{minutes} mins")
        };
    }
    let (hours, rest) = (minutes / 60, minutes % 60);
    match (hours, rest) {
        (1, 0) => "1 hour".to_string(),
        (_, 0) => format!("{hours} hours"),
        _ => format!("{hours}h {rest}m"),
    }
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

type CacheKey = (DateTime<Utc>, DateTime<Utc>, Option<NaiveDate>);

/// Memoized [`format_window`] results for one population epoch.
///
/// Keys only carry the window and reference day, so the cache must be cleared
/// whenever the epoch's `now` moves.
#[derive(Debug, Default)]
pub struct TimeStringCache {
    entries: HashMap<CacheKey, Option<TimeString>>,
    computations: usize,
}

impl TimeStringCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compute<F>(
        &mut self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        reference_day: Option<NaiveDate>,
        compute: F,
    ) -> Option<TimeString>
    where
        F: FnOnce() -> Option<TimeString>,
    {
        match self.entries.entry((start, end, reference_day)) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => {
                self.computations += 1;
                entry.insert(compute()).clone()
            }
        }
    }

    pub fn describe(
        &mut self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        reference_day: Option<NaiveDate>,
        now: DateTime<Utc>,
        tz: Tz,
    ) -> Option<TimeString> {
        self.get_or_compute(start, end, reference_day, || {
            format_window(start, end, reference_day, now, tz)
        })
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of underlying computations since the cache was created.
    pub fn computations(&self) -> usize {
        self.computations
    }
}

//! Finds open meeting windows in a day and ranks them by a heuristic
//! confidence score.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Timelike};
use chrono_tz::Tz;
use serde::Serialize;
use serde_json::Value;

use crate::calendar::CalendarEvent;

/// Hour-of-day bounds for the working window. Fractional hours are
/// allowed, e.g. 9.5 is 09:30.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HourRange {
    pub start_hour: f64,
    pub end_hour: f64,
}

impl HourRange {
    /// Lenient decode from whatever shape the intent extractor sent
    /// back: either `{"start_hour": 9, "end_hour": 17}` or `[9, 17]`.
    /// Anything else is treated as "no preference" rather than an
    /// error.
    pub fn from_value(value: &Value) -> Option<Self> {
        fn hour(v: &Value) -> Option<f64> {
            match v {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            }
        }

        match value {
            Value::Object(map) => {
                let start_hour = hour(map.get("start_hour")?)?;
                let end_hour = hour(map.get("end_hour")?)?;
                Some(Self {
                    start_hour,
                    end_hour,
                })
            }
            Value::Array(items) if items.len() == 2 => {
                let start_hour = hour(&items[0])?;
                let end_hour = hour(&items[1])?;
                Some(Self {
                    start_hour,
                    end_hour,
                })
            }
            _ => None,
        }
    }
}

/// A candidate meeting window of exactly the requested duration.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSlot {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    pub confidence: f64,
}

impl TimeSlot {
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            self.start.format("%A, %B %d at %I:%M %p"),
            self.end.format("%I:%M %p")
        )
    }
}

// Default working hours when the request carries no time preference
const WORK_START_HOUR: f64 = 9.0;
const WORK_END_HOUR: f64 = 17.0;

/// Resolve a fractional hour-of-day on `date` to a timezone-aware
/// timestamp. Returns `None` for hours that don't exist on that day
/// (nonsense input or a DST gap).
fn at_hour(date: NaiveDate, hours: f64, tz: Tz) -> Option<DateTime<Tz>> {
    if !hours.is_finite() || hours < 0.0 {
        return None;
    }
    let h = hours.trunc() as u32;
    let m = ((hours - hours.trunc()) * 60.0) as u32;
    let naive = date.and_hms_opt(h, m, 0)?;
    tz.from_local_datetime(&naive).earliest()
}

/// The working window for the day: the preferred range when one was
/// given and is usable, the 09:00-17:00 default otherwise.
fn day_window(
    date: NaiveDate,
    preferred: Option<HourRange>,
    tz: Tz,
) -> Option<(DateTime<Tz>, DateTime<Tz>)> {
    if let Some(range) = preferred
        && let Some(start) = at_hour(date, range.start_hour, tz)
        && let Some(end) = at_hour(date, range.end_hour, tz)
        && start < end
    {
        return Some((start, end));
    }
    let start = at_hour(date, WORK_START_HOUR, tz)?;
    let end = at_hour(date, WORK_END_HOUR, tz)?;
    Some((start, end))
}

/// Find open slots of exactly `duration_minutes` on `target_date`,
/// ranked by confidence (descending, ties keep earlier-in-day order)
/// and truncated to `max_slots`.
///
/// Pure over its inputs: the same busy intervals always produce the
/// same slots, regardless of wall-clock time.
pub fn find_slots(
    events: &[CalendarEvent],
    target_date: NaiveDate,
    duration_minutes: i64,
    preferred_range: Option<HourRange>,
    max_slots: usize,
    tz: Tz,
) -> Vec<TimeSlot> {
    let Some((window_start, window_end)) = day_window(target_date, preferred_range, tz) else {
        return Vec::new();
    };
    if duration_minutes <= 0 {
        return Vec::new();
    }
    let duration = Duration::minutes(duration_minutes);

    let mut busy: Vec<&CalendarEvent> = events.iter().collect();
    busy.sort_by_key(|e| e.start);

    let mut slots = Vec::new();
    let mut cursor = window_start;

    for event in &busy {
        // Space before this event?
        if event.start - cursor >= duration {
            let slot_end = cursor + duration;
            if slot_end <= event.start {
                let confidence = slot_confidence(cursor, duration_minutes, events);
                slots.push(TimeSlot {
                    start: cursor,
                    end: slot_end,
                    confidence,
                });
            }
        }
        if event.end > cursor {
            cursor = event.end;
        }
    }

    // Trailing gap after the last event
    if window_end - cursor >= duration {
        let slot_end = cursor + duration;
        if slot_end <= window_end {
            let confidence = slot_confidence(cursor, duration_minutes, events);
            slots.push(TimeSlot {
                start: cursor,
                end: slot_end,
                confidence,
            });
        }
    }

    // Stable sort so equal scores keep encounter order
    slots.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });
    slots.truncate(max_slots);
    slots
}

/// Additive desirability score for a slot starting at `start`.
/// Starts at 1.0: +0.2 for the morning sweet spot (10-11), +0.1 for
/// the afternoon one (14-15), -0.3 outside 09:00-17:00, -0.1 in the
/// post-lunch hours (12-13), and -0.2 for every existing event within
/// 15 minutes of either edge of the slot. Floored at 0.1.
pub fn slot_confidence(
    start: DateTime<Tz>,
    duration_minutes: i64,
    events: &[CalendarEvent],
) -> f64 {
    let mut confidence: f64 = 1.0;

    let hour = start.hour();
    if (10..=11).contains(&hour) {
        confidence += 0.2;
    } else if (14..=15).contains(&hour) {
        confidence += 0.1;
    } else if !(9..=17).contains(&hour) {
        confidence -= 0.3;
    }

    if (12..=13).contains(&hour) {
        confidence -= 0.1;
    }

    let slot_end = start + Duration::minutes(duration_minutes);
    for event in events {
        let minutes_after_event = (start - event.end).num_seconds() as f64 / 60.0;
        let minutes_before_event = (event.start - slot_end).num_seconds() as f64 / 60.0;

        if minutes_after_event > 0.0 && minutes_after_event < 15.0 {
            confidence -= 0.2;
        }
        if minutes_before_event > 0.0 && minutes_before_event < 15.0 {
            confidence -= 0.2;
        }
    }

    confidence.max(0.1)
}

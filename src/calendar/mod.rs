//! Calendar collaborator contract and the busy-interval projection the
//! scheduling core works over.

pub mod google;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

use crate::scheduling::TimeSlot;

pub use google::GoogleCalendar;

/// A read-only projection of an existing busy interval. Fetched per
/// query and never cached across calls.
#[derive(Debug, Clone)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    pub attendees: Vec<String>,
}

/// The narrow contract the dialogue core needs from a calendar
/// backend: list busy intervals in a range (recurring events expanded,
/// sorted by start) and insert a new event.
#[async_trait]
pub trait CalendarService: Send + Sync {
    async fn list_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>>;

    /// Book a meeting in the given slot. Attendees are notified when
    /// any are present, otherwise nobody is.
    async fn schedule_meeting(
        &self,
        slot: &TimeSlot,
        title: &str,
        attendees: &[String],
        description: &str,
    ) -> Result<()>;
}

/// The UTC instants bounding a local calendar day, half-open.
pub fn day_bounds(date: NaiveDate, tz: Tz) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let start = tz
        .from_local_datetime(&date.and_hms_opt(0, 0, 0).ok_or_else(|| anyhow!("bad date"))?)
        .earliest()
        .ok_or_else(|| anyhow!("no midnight on {} in {}", date, tz))?;
    let end = start + Duration::days(1);
    Ok((start.with_timezone(&Utc), end.with_timezone(&Utc)))
}

/// All events on a single local calendar day.
pub async fn events_for_date(
    calendar: &dyn CalendarService,
    date: NaiveDate,
    tz: Tz,
) -> Result<Vec<CalendarEvent>> {
    let (start, end) = day_bounds(date, tz)?;
    calendar.list_events(start, end).await
}

/// Spoken-friendly summary of a day's agenda.
pub async fn day_summary(
    calendar: &dyn CalendarService,
    date: NaiveDate,
    tz: Tz,
) -> Result<String> {
    let events = events_for_date(calendar, date, tz).await?;
    let day = date.format("%A, %d %B");

    if events.is_empty() {
        return Ok(format!("You have no events scheduled on {}.", day));
    }

    let mut summary = format!("You have {} event(s) on {}:\n", events.len(), day);
    for event in &events {
        summary.push_str(&format!(
            "- {} at {}\n",
            event.title,
            event.start.format("%I:%M %p")
        ));
    }
    Ok(summary)
}

//! Google Calendar API client for listing events and inserting new
//! ones. Only the handful of fields the scheduler needs are modeled.

use anyhow::Result;
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

pub const API_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";

/// Event boundary from the API: timed events carry `dateTime`,
/// all-day events carry `date`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDateTime {
    #[serde(rename = "dateTime")]
    pub date_time: Option<DateTime<FixedOffset>>,
    pub date: Option<NaiveDate>,
    #[serde(rename = "timeZone")]
    pub time_zone: Option<String>,
}

impl EventDateTime {
    /// Resolve to a concrete timestamp in `tz`. All-day events map to
    /// local midnight.
    pub fn resolve(&self, tz: Tz) -> Option<DateTime<Tz>> {
        if let Some(dt) = self.date_time {
            return Some(dt.with_timezone(&tz));
        }
        let date = self.date?;
        tz.from_local_datetime(&date.and_hms_opt(0, 0, 0)?).earliest()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attendee {
    pub email: String,
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub summary: Option<String>,
    pub start: EventDateTime,
    pub end: EventDateTime,
    pub attendees: Option<Vec<Attendee>>,
}

#[derive(Debug, Deserialize)]
struct EventsListResponse {
    items: Option<Vec<Event>>,
}

/// List events in `[time_min, time_max)` for one calendar, with
/// recurring events expanded and results ordered by start time.
pub async fn list_events(
    base_url: &str,
    access_token: &str,
    calendar_id: &str,
    time_min: DateTime<Utc>,
    time_max: DateTime<Utc>,
) -> Result<Vec<Event>> {
    let mut url = reqwest::Url::parse(&format!(
        "{}/calendars/{}/events",
        base_url.trim_end_matches('/'),
        calendar_id
    ))?;
    url.query_pairs_mut()
        .append_pair("timeMin", &time_min.to_rfc3339())
        .append_pair("timeMax", &time_max.to_rfc3339())
        .append_pair("singleEvents", "true")
        .append_pair("orderBy", "startTime")
        .append_pair("maxResults", "250");

    let resp: EventsListResponse = reqwest::Client::new()
        .get(url.as_str())
        .bearer_auth(access_token)
        .header("Content-Type", "application/json")
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    Ok(resp.items.unwrap_or_default())
}

#[derive(Debug, Serialize)]
pub struct InsertEventTime {
    #[serde(rename = "dateTime")]
    pub date_time: String,
    #[serde(rename = "timeZone")]
    pub time_zone: String,
}

#[derive(Debug, Serialize)]
pub struct InsertAttendee {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct InsertEvent {
    pub summary: String,
    pub description: String,
    pub start: InsertEventTime,
    pub end: InsertEventTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendees: Option<Vec<InsertAttendee>>,
}

/// Insert a new event. `send_updates` follows the API's values:
/// "all" to notify attendees, "none" otherwise.
pub async fn insert_event(
    base_url: &str,
    access_token: &str,
    calendar_id: &str,
    body: &InsertEvent,
    send_updates: &str,
) -> Result<Event> {
    let mut url = reqwest::Url::parse(&format!(
        "{}/calendars/{}/events",
        base_url.trim_end_matches('/'),
        calendar_id
    ))?;
    url.query_pairs_mut().append_pair("sendUpdates", send_updates);

    let event = reqwest::Client::new()
        .post(url.as_str())
        .bearer_auth(access_token)
        .header("Content-Type", "application/json")
        .json(body)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    Ok(event)
}

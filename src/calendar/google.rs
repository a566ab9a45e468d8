//! Google Calendar backed implementation of [`CalendarService`].

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::google::gcal;
use crate::google::oauth::refresh_access_token;
use crate::scheduling::TimeSlot;

use super::{CalendarEvent, CalendarService};

pub struct GoogleCalendar {
    client_id: String,
    client_secret: String,
    refresh_token: String,
    calendar_id: String,
    tz: Tz,
    base_url: String,
}

impl GoogleCalendar {
    pub fn new(
        client_id: &str,
        client_secret: &str,
        refresh_token: &str,
        calendar_id: &str,
        tz: Tz,
    ) -> Self {
        Self {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            refresh_token: refresh_token.to_string(),
            calendar_id: calendar_id.to_string(),
            tz,
            base_url: gcal::API_BASE_URL.to_string(),
        }
    }

    // Access tokens are short lived so each call refreshes one rather
    // than tracking expiry
    async fn access_token(&self) -> Result<String> {
        let oauth =
            refresh_access_token(&self.client_id, &self.client_secret, &self.refresh_token)
                .await?;
        Ok(oauth.access_token)
    }
}

#[async_trait]
impl CalendarService for GoogleCalendar {
    async fn list_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>> {
        let access_token = self.access_token().await?;
        let events =
            gcal::list_events(&self.base_url, &access_token, &self.calendar_id, start, end)
                .await?;

        let mut projected: Vec<CalendarEvent> = events
            .into_iter()
            .filter_map(|event| {
                let start = event.start.resolve(self.tz)?;
                let end = event.end.resolve(self.tz)?;
                Some(CalendarEvent {
                    id: event.id,
                    title: event.summary.unwrap_or_else(|| "Untitled Event".to_string()),
                    start,
                    end,
                    attendees: event
                        .attendees
                        .unwrap_or_default()
                        .into_iter()
                        .map(|a| a.email)
                        .collect(),
                })
            })
            .collect();

        // The API orders by start time already; sorting again keeps
        // the contract independent of the backend
        projected.sort_by_key(|e| e.start);
        Ok(projected)
    }

    async fn schedule_meeting(
        &self,
        slot: &TimeSlot,
        title: &str,
        attendees: &[String],
        description: &str,
    ) -> Result<()> {
        let access_token = self.access_token().await?;

        let attendee_list = if attendees.is_empty() {
            None
        } else {
            Some(
                attendees
                    .iter()
                    .map(|email| gcal::InsertAttendee {
                        email: email.clone(),
                    })
                    .collect(),
            )
        };
        let send_updates = if attendees.is_empty() { "none" } else { "all" };

        let body = gcal::InsertEvent {
            summary: title.to_string(),
            description: description.to_string(),
            start: gcal::InsertEventTime {
                date_time: slot.start.to_rfc3339(),
                time_zone: self.tz.name().to_string(),
            },
            end: gcal::InsertEventTime {
                date_time: slot.end.to_rfc3339(),
                time_zone: self.tz.name().to_string(),
            },
            attendees: attendee_list,
        };

        let event = gcal::insert_event(
            &self.base_url,
            &access_token,
            &self.calendar_id,
            &body,
            send_updates,
        )
        .await?;

        tracing::info!("Meeting scheduled: {}", event.id);
        Ok(())
    }
}

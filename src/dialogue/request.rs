//! The mutable accumulator of what is known about the meeting being
//! scheduled, and the lenient decoding of extractor output into it.

use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use crate::scheduling::HourRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Flexibility {
    Flexible,
    SomewhatFlexible,
    Rigid,
}

/// Accumulates scheduling details across turns. Fields only move from
/// unknown to known, or get overwritten by a newer non-null
/// extraction; nothing is cleared outside an explicit conversation
/// reset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeetingRequest {
    pub duration_minutes: Option<i64>,
    pub preferred_date: Option<NaiveDate>,
    pub time_range: Option<HourRange>,
    pub title: String,
    pub attendees: Vec<String>,
    pub urgency: Urgency,
    pub flexibility: Flexibility,
}

impl Default for MeetingRequest {
    fn default() -> Self {
        Self {
            duration_minutes: None,
            preferred_date: None,
            time_range: None,
            title: "Scheduled Meeting".to_string(),
            attendees: Vec::new(),
            urgency: Urgency::Medium,
            flexibility: Flexibility::Flexible,
        }
    }
}

impl MeetingRequest {
    /// New non-null extracted fields override what's already here;
    /// nulls leave the existing values alone.
    pub fn merge(&mut self, intent: &ExtractedIntent) {
        if let Some(duration) = intent.duration_minutes {
            self.duration_minutes = Some(duration);
        }
        if let Some(date) = intent.preferred_date {
            self.preferred_date = Some(date);
        }
        if let Some(range) = intent.time_range {
            self.time_range = Some(range);
        }
        if let Some(urgency) = intent.urgency {
            self.urgency = urgency;
        }
        if let Some(flexibility) = intent.flexibility {
            self.flexibility = flexibility;
        }
    }
}

/// Structured scheduling fields pulled out of one utterance by the
/// language model. Every field is optional; absence means the
/// utterance said nothing about it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedIntent {
    pub duration_minutes: Option<i64>,
    pub preferred_date: Option<NaiveDate>,
    pub time_range: Option<HourRange>,
    pub urgency: Option<Urgency>,
    pub flexibility: Option<Flexibility>,
    pub meeting_type: Option<String>,
}

impl ExtractedIntent {
    /// Decode the extractor's JSON leniently: individually malformed
    /// fields become `None`, but an error sentinel or a non-object
    /// payload is an extraction failure.
    pub fn from_json(value: &Value) -> Result<Self> {
        let Some(map) = value.as_object() else {
            bail!("extraction response is not a JSON object: {value}");
        };
        if let Some(err) = map.get("error") {
            bail!("extractor returned an error: {err}");
        }

        let duration_minutes = map.get("duration_minutes").and_then(Value::as_i64);
        let preferred_date = map
            .get("preferred_date")
            .and_then(Value::as_str)
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());
        let time_range = map.get("time_range").and_then(HourRange::from_value);
        let urgency = map
            .get("urgency")
            .and_then(Value::as_str)
            .and_then(|s| match s {
                "high" => Some(Urgency::High),
                "medium" => Some(Urgency::Medium),
                "low" => Some(Urgency::Low),
                _ => None,
            });
        let flexibility =
            map.get("flexibility")
                .and_then(Value::as_str)
                .and_then(|s| match s {
                    "flexible" => Some(Flexibility::Flexible),
                    "somewhat_flexible" => Some(Flexibility::SomewhatFlexible),
                    "rigid" => Some(Flexibility::Rigid),
                    _ => None,
                });
        let meeting_type = map
            .get("meeting_type")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Self {
            duration_minutes,
            preferred_date,
            time_range,
            urgency,
            flexibility,
            meeting_type,
        })
    }
}

use anyhow::{Result, anyhow};
use chrono::Utc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::calendar::{GoogleCalendar, events_for_date};
use crate::core::AppConfig;
use crate::scheduling::{HourRange, dates, find_slots};

pub async fn run(date: &str, duration: i64, from: Option<f64>, to: Option<f64>) -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=debug", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::default();
    let today = Utc::now().with_timezone(&config.timezone).date_naive();
    let target = dates::resolve(date, today).ok_or_else(|| anyhow!("Unrecognized date: {date}"))?;

    let preferred_range = match (from, to) {
        (Some(start_hour), Some(end_hour)) => Some(HourRange {
            start_hour,
            end_hour,
        }),
        (None, None) => None,
        _ => return Err(anyhow!("--from and --to must be given together")),
    };

    let calendar = GoogleCalendar::new(
        &config.google_client_id,
        &config.google_client_secret,
        &config.google_refresh_token,
        &config.calendar_id,
        config.timezone,
    );
    let events = events_for_date(&calendar, target, config.timezone).await?;
    let slots = find_slots(
        &events,
        target,
        duration,
        preferred_range,
        config.max_slots,
        config.timezone,
    );

    if slots.is_empty() {
        println!(
            "No {duration}-minute slots open on {}.",
            target.format("%A, %B %d")
        );
        return Ok(());
    }

    for (i, slot) in slots.iter().enumerate() {
        println!("{}. {} (confidence {:.2})", i + 1, slot, slot.confidence);
    }

    Ok(())
}

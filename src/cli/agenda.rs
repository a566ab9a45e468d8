use anyhow::{Result, anyhow};
use chrono::Utc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::calendar::{GoogleCalendar, day_summary};
use crate::core::AppConfig;
use crate::scheduling::dates;

pub async fn run(date: &str) -> Result<()> {
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

    let calendar = GoogleCalendar::new(
        &config.google_client_id,
        &config.google_client_secret,
        &config.google_refresh_token,
        &config.calendar_id,
        config.timezone,
    );
    let summary = day_summary(&calendar, target, config.timezone).await?;
    println!("{summary}");

    Ok(())
}

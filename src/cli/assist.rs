use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::agent::{Session, SessionConfig};
use crate::calendar::GoogleCalendar;
use crate::core::AppConfig;
use crate::dialogue::Conversation;
use crate::nlp::LlmIntentExtractor;
use crate::voice::{ConsoleVoice, VoiceIo, VoiceServiceClient};

pub async fn run(text: bool) -> Result<()> {
    // Logs share the terminal with the conversation, so default quiet
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=warn", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::default();

    let calendar = Arc::new(GoogleCalendar::new(
        &config.google_client_id,
        &config.google_client_secret,
        &config.google_refresh_token,
        &config.calendar_id,
        config.timezone,
    ));
    let nlp = Arc::new(LlmIntentExtractor::new(
        &config.llm_api_hostname,
        &config.llm_api_key,
        &config.llm_model,
    ));
    let voice: Arc<dyn VoiceIo> = if text {
        Arc::new(ConsoleVoice::new()?)
    } else {
        Arc::new(VoiceServiceClient::new(&config.voice_api_url))
    };

    let conversation = Conversation::new(calendar, nlp, config.timezone, config.max_slots);
    let mut session = Session::new(
        voice,
        conversation,
        SessionConfig {
            listen_timeout_secs: config.listen_timeout_secs,
            phrase_time_limit_secs: config.phrase_time_limit_secs,
            max_consecutive_errors: config.max_consecutive_errors,
        },
    );

    session.run().await
}

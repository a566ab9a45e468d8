use std::env;

use chrono_tz::Tz;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub llm_api_hostname: String,
    pub llm_api_key: String,
    pub llm_model: String,
    pub google_client_id: String,
    pub google_client_secret: String,
    pub google_refresh_token: String,
    pub calendar_id: String,
    pub timezone: Tz,
    pub voice_api_url: String,
    pub listen_timeout_secs: u64,
    pub phrase_time_limit_secs: u64,
    pub max_consecutive_errors: u32,
    pub max_slots: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        let llm_api_hostname =
            env::var("HUDDLE_LLM_HOST").unwrap_or_else(|_| "https://api.openai.com".to_string());
        let llm_api_key =
            env::var("OPENAI_API_KEY").unwrap_or_else(|_| "thiswontworkforopenai".to_string());
        let llm_model = env::var("HUDDLE_LLM_MODEL").unwrap_or_else(|_| "gpt-4.1-mini".to_string());
        let google_client_id =
            env::var("HUDDLE_GOOGLE_CLIENT_ID").expect("Missing HUDDLE_GOOGLE_CLIENT_ID");
        let google_client_secret =
            env::var("HUDDLE_GOOGLE_CLIENT_SECRET").expect("Missing HUDDLE_GOOGLE_CLIENT_SECRET");
        let google_refresh_token =
            env::var("HUDDLE_GOOGLE_REFRESH_TOKEN").expect("Missing HUDDLE_GOOGLE_REFRESH_TOKEN");
        let calendar_id = env::var("HUDDLE_CALENDAR_ID").unwrap_or_else(|_| "primary".to_string());
        let timezone = env::var("HUDDLE_TIMEZONE")
            .unwrap_or_else(|_| "America/New_York".to_string())
            .parse()
            .expect("Invalid HUDDLE_TIMEZONE");
        let voice_api_url = env::var("HUDDLE_VOICE_API_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:7722".to_string());
        let listen_timeout_secs = env_number("HUDDLE_LISTEN_TIMEOUT_SECS", 10);
        let phrase_time_limit_secs = env_number("HUDDLE_PHRASE_TIME_LIMIT_SECS", 15);
        let max_consecutive_errors = env_number("HUDDLE_MAX_CONSECUTIVE_ERRORS", 5);
        let max_slots = env_number("HUDDLE_MAX_SLOTS", 5);

        Self {
            llm_api_hostname,
            llm_api_key,
            llm_model,
            google_client_id,
            google_client_secret,
            google_refresh_token,
            calendar_id,
            timezone,
            voice_api_url,
            listen_timeout_secs,
            phrase_time_limit_secs,
            max_consecutive_errors,
            max_slots,
        }
    }
}

fn env_number<T: std::str::FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(value) => value
            .parse()
            .unwrap_or_else(|_| panic!("Invalid {name}: {value}")),
        Err(_) => default,
    }
}

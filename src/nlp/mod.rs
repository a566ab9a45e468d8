//! Intent extraction and response generation via a language model.

pub mod llm;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

use crate::dialogue::request::ExtractedIntent;
use llm::{Message, Role, completion, strip_code_fences};

/// Contract for turning free text into structured scheduling fields
/// and for generating conversational replies.
#[async_trait]
pub trait IntentExtractor: Send + Sync {
    /// Extract scheduling fields from one utterance. An `Err` means
    /// the extraction failed (network, parse, model refusal); callers
    /// treat that as "no new information", never as fatal.
    async fn extract_meeting_info(
        &self,
        user_input: &str,
        context: &Value,
    ) -> Result<ExtractedIntent>;

    /// Free-form reply for the given dialogue state and context.
    async fn generate_response(
        &self,
        state: &str,
        context: &Value,
        user_input: &str,
    ) -> Result<String>;
}

const EXTRACTION_PROMPT: &str = "You are a smart assistant that extracts meeting info from natural language.
Return data in JSON with:
- duration_minutes (int or null)
- preferred_date (YYYY-MM-DD or null)
- time_range (dict with start_hour and end_hour or null)
- urgency (high, medium, low)
- flexibility (flexible, somewhat_flexible, rigid)
- meeting_type (brief, standard, long, all-day)";

/// Extractor backed by an OpenAI compatible chat-completion API.
pub struct LlmIntentExtractor {
    api_hostname: String,
    api_key: String,
    model: String,
}

impl LlmIntentExtractor {
    pub fn new(api_hostname: &str, api_key: &str, model: &str) -> Self {
        Self {
            api_hostname: api_hostname.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let messages = vec![Message::new(Role::User, prompt)];
        let resp = completion(&messages, &self.api_hostname, &self.api_key, &self.model).await?;
        let content = resp["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| anyhow!("completion response missing content: {resp}"))?;
        Ok(content.to_string())
    }
}

#[async_trait]
impl IntentExtractor for LlmIntentExtractor {
    async fn extract_meeting_info(
        &self,
        user_input: &str,
        context: &Value,
    ) -> Result<ExtractedIntent> {
        let prompt = format!(
            "{EXTRACTION_PROMPT}\n\nUser input: \"{user_input}\"\nToday's date: {}\nContext: {}",
            Utc::now().date_naive(),
            context
        );

        let content = self.complete(&prompt).await?;
        let cleaned = strip_code_fences(&content);
        let value: Value = serde_json::from_str(cleaned)?;
        ExtractedIntent::from_json(&value)
    }

    async fn generate_response(
        &self,
        state: &str,
        context: &Value,
        user_input: &str,
    ) -> Result<String> {
        let prompt = format!(
            "You are a friendly scheduling assistant.\n\nState: {state}\nContext: {context}\nUser said: \"{user_input}\"\n\nReply helpfully and clearly based on the context."
        );

        let content = self.complete(&prompt).await?;
        Ok(content.trim().to_string())
    }
}

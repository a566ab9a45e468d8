//! Voice input and output. The assistant only ever sees `Heard`
//! values; how speech gets recognized is the implementation's problem.

pub mod console;
pub mod http;

use anyhow::Result;
use async_trait::async_trait;

pub use console::ConsoleVoice;
pub use http::VoiceServiceClient;

/// Outcome of one listen attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Heard {
    /// Recognized speech, lowercased and trimmed.
    Utterance(String),
    /// Nothing was said before the timeout.
    Silence,
    /// Audio was captured but could not be transcribed.
    Unintelligible,
    /// The recognition backend failed.
    RecognitionError,
}

#[async_trait]
pub trait VoiceIo: Send + Sync {
    async fn speak(&self, text: &str) -> Result<()>;

    async fn listen(&self, timeout_secs: u64, phrase_time_limit_secs: u64) -> Result<Heard>;
}

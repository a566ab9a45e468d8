//! The turn orchestrator: owns the listen/respond loop around one
//! conversation, with speech-error handling and exit detection.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::dialogue::{Conversation, ConversationState, ordinal};
use crate::voice::{Heard, VoiceIo};

const GREETING: &str = "Hello! I'm your smart scheduling assistant. \
                        I can help you find and schedule meetings. What would you like to do?";
const FAREWELL: &str = "Goodbye! Have a great day!";
const REPEAT_PROMPT: &str = "Sorry, I didn't catch that. Could you please repeat?";
const TURN_ERROR: &str = "I encountered an error. Let's try again.";
const GIVING_UP: &str = "I'm having trouble understanding. Let's start over.";
const FRESH_START: &str = "Let's start fresh. What can I help you schedule today?";

const EXIT_WORDS: [&str; 4] = ["goodbye", "exit", "quit", "stop"];

/// One completed turn, kept for the session transcript.
#[derive(Debug, Clone)]
pub struct TurnRecord {
    pub utterance: String,
    pub response: String,
    pub state: ConversationState,
    pub timestamp: DateTime<Utc>,
}

pub struct SessionConfig {
    pub listen_timeout_secs: u64,
    pub phrase_time_limit_secs: u64,
    pub max_consecutive_errors: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            listen_timeout_secs: 10,
            phrase_time_limit_secs: 15,
            max_consecutive_errors: 5,
        }
    }
}

/// Drives the conversation turn by turn. Strictly sequential; the only
/// await points are the collaborator calls.
pub struct Session {
    voice: Arc<dyn VoiceIo>,
    conversation: Conversation,
    history: Vec<TurnRecord>,
    consecutive_errors: u32,
    config: SessionConfig,
}

impl Session {
    pub fn new(voice: Arc<dyn VoiceIo>, conversation: Conversation, config: SessionConfig) -> Self {
        Self {
            voice,
            conversation,
            history: Vec::new(),
            consecutive_errors: 0,
            config,
        }
    }

    pub fn history(&self) -> &[TurnRecord] {
        &self.history
    }

    /// Run the conversation until the user says goodbye, the meeting
    /// is booked, or the voice channel itself fails.
    pub async fn run(&mut self) -> Result<()> {
        self.voice.speak(GREETING).await?;

        while !self.conversation.is_complete() {
            // A transport failure is handled like any other failed
            // listen: re-prompt against the ceiling, never bail
            let heard = match self
                .voice
                .listen(
                    self.config.listen_timeout_secs,
                    self.config.phrase_time_limit_secs,
                )
                .await
            {
                Ok(heard) => heard,
                Err(err) => {
                    tracing::warn!("Listen failed: {err}");
                    self.handle_speech_error().await?;
                    continue;
                }
            };

            let utterance = match heard {
                Heard::Utterance(text) => text,
                other => {
                    tracing::debug!("Speech input failed: {other:?}");
                    self.handle_speech_error().await?;
                    continue;
                }
            };

            if EXIT_WORDS.iter().any(|word| utterance.contains(word)) {
                self.voice.speak(FAREWELL).await?;
                break;
            }

            // Option references book directly off the last offer, no
            // model round trip
            if !self.conversation.last_offered().is_empty()
                && let Some(n) = ordinal::option_reference(&utterance)
                && n >= 1
                && n <= self.conversation.last_offered().len()
            {
                let response = self.conversation.book_offered(n - 1).await;
                self.voice.speak(&response).await?;
                self.record_turn(&utterance, &response);
                self.consecutive_errors = 0;
                continue;
            }

            match self.conversation.process_user_input(&utterance).await {
                Ok(response) => {
                    self.voice.speak(&response).await?;
                    self.record_turn(&utterance, &response);
                    self.consecutive_errors = 0;
                }
                Err(err) => {
                    tracing::error!("Turn failed: {err}");
                    self.voice.speak(TURN_ERROR).await?;
                    self.bump_errors().await?;
                }
            }
        }

        Ok(())
    }

    fn record_turn(&mut self, utterance: &str, response: &str) {
        self.history.push(TurnRecord {
            utterance: utterance.to_string(),
            response: response.to_string(),
            state: self.conversation.state(),
            timestamp: Utc::now(),
        });
    }

    async fn handle_speech_error(&mut self) -> Result<()> {
        self.consecutive_errors += 1;
        if self.consecutive_errors >= self.config.max_consecutive_errors {
            self.reset().await?;
        } else {
            self.voice.speak(REPEAT_PROMPT).await?;
        }
        Ok(())
    }

    async fn bump_errors(&mut self) -> Result<()> {
        self.consecutive_errors += 1;
        if self.consecutive_errors >= self.config.max_consecutive_errors {
            self.reset().await?;
        }
        Ok(())
    }

    async fn reset(&mut self) -> Result<()> {
        self.voice.speak(GIVING_UP).await?;
        self.conversation.reset();
        self.consecutive_errors = 0;
        self.voice.speak(FRESH_START).await?;
        Ok(())
    }
}

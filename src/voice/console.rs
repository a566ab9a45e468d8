//! Text-mode voice replacement for running the assistant in a
//! terminal.

use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use super::{Heard, VoiceIo};

/// Reads utterances from the terminal with rustyline and prints what
/// would be spoken. Ctrl-C and Ctrl-D read as "exit" so the session
/// winds down the same way a spoken goodbye does.
pub struct ConsoleVoice {
    editor: Mutex<DefaultEditor>,
}

impl ConsoleVoice {
    pub fn new() -> Result<Self> {
        Ok(Self {
            editor: Mutex::new(DefaultEditor::new()?),
        })
    }
}

#[async_trait]
impl VoiceIo for ConsoleVoice {
    async fn speak(&self, text: &str) -> Result<()> {
        println!("{text}");
        Ok(())
    }

    async fn listen(&self, _timeout_secs: u64, _phrase_time_limit_secs: u64) -> Result<Heard> {
        let mut editor = self.editor.lock().expect("Editor lock poisoned");
        match editor.readline(">>> ") {
            Ok(line) => {
                let line = line.to_lowercase().trim().to_string();
                if line.is_empty() {
                    Ok(Heard::Silence)
                } else {
                    Ok(Heard::Utterance(line))
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                Ok(Heard::Utterance("exit".to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }
}

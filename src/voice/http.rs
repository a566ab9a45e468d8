//! Client for a local speech service that wraps the microphone and
//! text-to-speech engine behind two HTTP endpoints.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Heard, VoiceIo};

/// Talks to the speech service over HTTP. `POST /speak` plays text
/// aloud; `POST /listen` blocks until speech is recognized or the
/// timeout passes and returns `{"text": ...}` where a null text means
/// silence and the strings "could not understand", "recognition
/// error", and "error" are recognizer failure sentinels.
pub struct VoiceServiceClient {
    base_url: String,
}

#[derive(Serialize)]
struct SpeakRequest<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct ListenRequest {
    timeout: u64,
    phrase_time_limit: u64,
}

#[derive(Deserialize)]
struct ListenResponse {
    text: Option<String>,
}

impl VoiceServiceClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn heard_from_wire(text: Option<String>) -> Heard {
        let Some(text) = text else {
            return Heard::Silence;
        };
        match text.as_str() {
            "could not understand" => Heard::Unintelligible,
            "recognition error" | "error" => Heard::RecognitionError,
            _ => Heard::Utterance(text.to_lowercase().trim().to_string()),
        }
    }
}

#[async_trait]
impl VoiceIo for VoiceServiceClient {
    async fn speak(&self, text: &str) -> Result<()> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        client
            .post(format!("{}/speak", self.base_url))
            .json(&SpeakRequest { text })
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn listen(&self, timeout_secs: u64, phrase_time_limit_secs: u64) -> Result<Heard> {
        // The service holds the connection open for the whole listen
        // window, so the HTTP timeout must outlast it
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs + phrase_time_limit_secs + 30))
            .build()?;
        let resp: ListenResponse = client
            .post(format!("{}/listen", self.base_url))
            .json(&ListenRequest {
                timeout: timeout_secs,
                phrase_time_limit: phrase_time_limit_secs,
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(Self::heard_from_wire(resp.text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_sentinels() {
        assert_eq!(VoiceServiceClient::heard_from_wire(None), Heard::Silence);
        assert_eq!(
            VoiceServiceClient::heard_from_wire(Some("could not understand".to_string())),
            Heard::Unintelligible
        );
        assert_eq!(
            VoiceServiceClient::heard_from_wire(Some("recognition error".to_string())),
            Heard::RecognitionError
        );
        assert_eq!(
            VoiceServiceClient::heard_from_wire(Some("error".to_string())),
            Heard::RecognitionError
        );
    }

    #[test]
    fn test_wire_utterance_normalized() {
        assert_eq!(
            VoiceServiceClient::heard_from_wire(Some("  Schedule a Meeting  ".to_string())),
            Heard::Utterance("schedule a meeting".to_string())
        );
    }

    #[tokio::test]
    async fn test_speak_posts_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/speak")
            .match_body(mockito::Matcher::Json(
                serde_json::json!({"text": "Hello!"}),
            ))
            .with_status(200)
            .create();

        let voice = VoiceServiceClient::new(&server.url());
        voice.speak("Hello!").await.unwrap();
        mock.assert();
    }

    #[tokio::test]
    async fn test_listen_returns_utterance() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/listen")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"text": "book a meeting"}"#)
            .create();

        let voice = VoiceServiceClient::new(&server.url());
        let heard = voice.listen(10, 15).await.unwrap();
        assert_eq!(heard, Heard::Utterance("book a meeting".to_string()));
    }

    #[tokio::test]
    async fn test_listen_silence() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/listen")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"text": null}"#)
            .create();

        let voice = VoiceServiceClient::new(&server.url());
        let heard = voice.listen(10, 15).await.unwrap();
        assert_eq!(heard, Heard::Silence);
    }

    #[tokio::test]
    async fn test_listen_service_error_is_err() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server.mock("POST", "/listen").with_status(500).create();

        let voice = VoiceServiceClient::new(&server.url());
        assert!(voice.listen(10, 15).await.is_err());
    }
}

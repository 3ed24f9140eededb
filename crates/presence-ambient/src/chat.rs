//! Operator speech routing.
//!
//! Recognized speech is echoed into the room, then routed one of two
//! ways: multi-word input (or a known chat keyword) goes to the chat
//! engine for a conversational reply; a single unknown word is treated as
//! a puzzle unlock attempt against the remote game service. An
//! unreachable service is reported to the player as an incorrect attempt,
//! never as an error.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use presence_types::PresenceError;

use crate::sound::{Effect, EffectSender};
use crate::voice::{Voice, VoiceEngine};

/// Single words still routed to the chat engine rather than the puzzle
/// service (greetings plus common stream emotes).
pub const CHAT_KEYWORDS: &[&str] = &[
    "hello",
    "help",
    "Kappa",
    "BibleThump",
    "PJSalt",
    "DansGame",
    "Jebaited",
    "PogChamp",
];

/// Conversational reply source.
#[async_trait]
pub trait ChatEngine: Send + Sync {
    /// A reply to `input`, or `None` when the engine has nothing
    /// confident to say.
    async fn reply(&self, input: &str) -> Option<String>;
}

/// Built-in fallback engine with a handful of canned responses.
pub struct CannedChat;

#[async_trait]
impl ChatEngine for CannedChat {
    async fn reply(&self, input: &str) -> Option<String> {
        let lower = input.to_lowercase();
        if lower.contains("hello") || lower.starts_with("hi") {
            Some("Hello. I am listening.".to_string())
        } else if lower.contains("help") {
            Some("Drive me with the letter keys, or say a single word to attempt an unlock.".to_string())
        } else {
            None
        }
    }
}

#[derive(Debug, Deserialize)]
struct UnlockResponse {
    unlocked: bool,
}

/// Client for the remote puzzle unlock service.
pub struct PuzzleClient {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl PuzzleClient {
    pub fn new(url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            api_key,
        }
    }

    /// POST the attempt. Unlocked only on a `202 Accepted` whose body
    /// confirms it; any other status is a plain rejection.
    pub async fn attempt_unlock(&self, attempt: &str) -> Result<bool, PresenceError> {
        let mut request = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({ "attempt": attempt }));
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }
        let response = request
            .send()
            .await
            .map_err(|e| PresenceError::RemoteServiceUnreachable(e.to_string()))?;

        if response.status() != reqwest::StatusCode::ACCEPTED {
            return Ok(false);
        }
        let body: UnlockResponse = response
            .json()
            .await
            .map_err(|e| PresenceError::Serialization(e.to_string()))?;
        Ok(body.unlocked)
    }
}

/// What the pipeline said back to the room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechReply {
    pub text: String,
    pub unlocked: bool,
}

/// Routes recognized operator speech to chat or the puzzle service and
/// narrates the outcome.
pub struct SpeechPipeline {
    chat: Box<dyn ChatEngine>,
    puzzle: PuzzleClient,
    voice: VoiceEngine,
    effects: Option<EffectSender>,
}

impl SpeechPipeline {
    pub fn new(chat: Box<dyn ChatEngine>, puzzle: PuzzleClient, voice: VoiceEngine) -> Self {
        Self {
            chat,
            puzzle,
            voice,
            effects: None,
        }
    }

    /// Wire up the sound engine so an unlock plays its fanfare.
    pub fn with_effects(mut self, effects: EffectSender) -> Self {
        self.effects = Some(effects);
        self
    }

    /// Process one recognized utterance: echo it, route it, narrate the
    /// reply. The echo blocks so the room hears the input before the
    /// answer; narration is detached.
    pub async fn process(&self, input: &str) -> SpeechReply {
        let input = input.trim();
        if input.is_empty() {
            return SpeechReply {
                text: String::new(),
                unlocked: false,
            };
        }
        self.voice.speak(Voice::Echo, input).await;

        let is_chat = input.split_whitespace().count() > 1 || CHAT_KEYWORDS.contains(&input);
        if is_chat {
            let text = self.chat.reply(input).await.unwrap_or_default();
            if !text.is_empty() {
                self.voice.speak_detached(Voice::Narrator, text.clone());
            }
            return SpeechReply {
                text,
                unlocked: false,
            };
        }

        let unlocked = match self.puzzle.attempt_unlock(input).await {
            Ok(unlocked) => unlocked,
            Err(err) => {
                warn!(%err, "puzzle service error; reporting incorrect attempt");
                false
            }
        };
        let text = if unlocked {
            info!(attempt = input, "puzzle round unlocked");
            if let Some(effects) = &self.effects {
                let _ = effects.try_send(Effect::LevelUnlocked);
            }
            "Task unlocked"
        } else {
            "Incorrect attempt. Try again."
        };
        self.voice.speak_detached(Voice::Narrator, text.to_string());
        SpeechReply {
            text: text.to_string(),
            unlocked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voice::VoiceConfig;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;

    struct ScriptedChat(&'static str);

    #[async_trait]
    impl ChatEngine for ScriptedChat {
        async fn reply(&self, _input: &str) -> Option<String> {
            Some(self.0.to_string())
        }
    }

    fn quiet_voice() -> VoiceEngine {
        VoiceEngine::new(VoiceConfig {
            program: "true".to_string(),
            ..VoiceConfig::default()
        })
    }

    /// One-request HTTP stub: reads a full request, answers with `status`
    /// and `body`, then closes.
    async fn puzzle_stub(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            loop {
                let mut chunk = [0u8; 1024];
                let n = socket.read(&mut chunk).await.unwrap();
                buf.extend_from_slice(&chunk[..n]);
                if let Some(header_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                    let headers = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
                    let content_length: usize = headers
                        .lines()
                        .find_map(|l| l.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse().ok())
                        .unwrap_or(0);
                    if buf.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });
        format!("http://{addr}/game/attemptunlockround/")
    }

    #[tokio::test]
    async fn multi_word_input_goes_to_chat() {
        let puzzle = PuzzleClient::new("http://127.0.0.1:9/unused", None);
        let pipeline =
            SpeechPipeline::new(Box::new(ScriptedChat("nice to meet you")), puzzle, quiet_voice());

        let reply = pipeline.process("hello over there").await;
        assert_eq!(reply.text, "nice to meet you");
        assert!(!reply.unlocked);
    }

    #[tokio::test]
    async fn keyword_goes_to_chat_even_as_single_word() {
        let puzzle = PuzzleClient::new("http://127.0.0.1:9/unused", None);
        let pipeline =
            SpeechPipeline::new(Box::new(ScriptedChat("greetings")), puzzle, quiet_voice());

        let reply = pipeline.process("Kappa").await;
        assert_eq!(reply.text, "greetings");
    }

    #[tokio::test]
    async fn correct_single_word_unlocks_and_plays_fanfare() {
        let url = puzzle_stub("202 Accepted", r#"{"unlocked":true}"#).await;
        let (tx, mut rx) = mpsc::channel(1);
        let pipeline = SpeechPipeline::new(
            Box::new(CannedChat),
            PuzzleClient::new(url, Some("test-key".to_string())),
            quiet_voice(),
        )
        .with_effects(tx);

        let reply = pipeline.process("swordfish").await;
        assert_eq!(reply.text, "Task unlocked");
        assert!(reply.unlocked);
        assert_eq!(rx.recv().await, Some(Effect::LevelUnlocked));
    }

    #[tokio::test]
    async fn rejected_attempt_reads_as_incorrect() {
        let url = puzzle_stub("202 Accepted", r#"{"unlocked":false}"#).await;
        let pipeline = SpeechPipeline::new(
            Box::new(CannedChat),
            PuzzleClient::new(url, None),
            quiet_voice(),
        );

        let reply = pipeline.process("wrongword").await;
        assert_eq!(reply.text, "Incorrect attempt. Try again.");
        assert!(!reply.unlocked);
    }

    #[tokio::test]
    async fn non_accepted_status_is_a_rejection() {
        let url = puzzle_stub("403 Forbidden", "denied").await;
        let client = PuzzleClient::new(url, None);
        assert_eq!(client.attempt_unlock("word").await.unwrap(), false);
    }

    #[tokio::test]
    async fn unreachable_service_reports_incorrect_attempt() {
        // Nothing listens on the discard port.
        let pipeline = SpeechPipeline::new(
            Box::new(CannedChat),
            PuzzleClient::new("http://127.0.0.1:9/game/attemptunlockround/", None),
            quiet_voice(),
        );

        let reply = pipeline.process("swordfish").await;
        assert_eq!(reply.text, "Incorrect attempt. Try again.");
        assert!(!reply.unlocked);
    }

    #[tokio::test]
    async fn empty_input_is_silent() {
        let pipeline = SpeechPipeline::new(
            Box::new(CannedChat),
            PuzzleClient::new("http://127.0.0.1:9/unused", None),
            quiet_voice(),
        );
        let reply = pipeline.process("   ").await;
        assert!(reply.text.is_empty());
    }
}

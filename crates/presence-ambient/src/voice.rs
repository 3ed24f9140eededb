//! Text-to-speech with two personas.
//!
//! The *echo* voice repeats the operator's recognized speech back into the
//! room; the *narrator* voice delivers replies and announcements. Both run
//! through an external synthesizer process.

use tokio::process::Command;
use tracing::{debug, warn};

/// Which persona speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Voice {
    /// Repeats operator input (male voice).
    Echo,
    /// Delivers replies and announcements (female voice).
    Narrator,
}

/// Synthesizer invocation.
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// TTS program; must accept `-v <voice> <text>` (espeak-ng flags).
    pub program: String,
    pub echo_voice: String,
    pub narrator_voice: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            program: "espeak-ng".to_string(),
            echo_voice: "en+m3".to_string(),
            narrator_voice: "en+f3".to_string(),
        }
    }
}

/// Speaks text through the configured synthesizer.
#[derive(Debug, Clone)]
pub struct VoiceEngine {
    config: VoiceConfig,
}

impl VoiceEngine {
    pub fn new(config: VoiceConfig) -> Self {
        Self { config }
    }

    /// Speak `text` and wait for the synthesizer to finish.
    ///
    /// Failures are logged and dropped: losing an utterance is always
    /// preferable to stalling the caller.
    pub async fn speak(&self, voice: Voice, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        let voice_name = match voice {
            Voice::Echo => &self.config.echo_voice,
            Voice::Narrator => &self.config.narrator_voice,
        };
        debug!(?voice, text, "speaking");
        let status = Command::new(&self.config.program)
            .arg("-v")
            .arg(voice_name)
            .arg(text)
            .status()
            .await;
        match status {
            Ok(status) if status.success() => {}
            Ok(status) => warn!(%status, "synthesizer exited abnormally"),
            Err(err) => warn!(%err, "failed to launch synthesizer"),
        }
    }

    /// Speak without waiting: the utterance runs on its own task.
    pub fn speak_detached(&self, voice: Voice, text: String) {
        let engine = self.clone();
        tokio::spawn(async move {
            engine.speak(voice, &text).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_engine() -> VoiceEngine {
        VoiceEngine::new(VoiceConfig {
            program: "true".to_string(),
            ..VoiceConfig::default()
        })
    }

    #[tokio::test]
    async fn empty_text_never_launches_synthesizer() {
        let engine = VoiceEngine::new(VoiceConfig {
            // Would fail loudly if launched.
            program: "presence-no-such-tts".to_string(),
            ..VoiceConfig::default()
        });
        engine.speak(Voice::Echo, "   ").await;
    }

    #[tokio::test]
    async fn missing_synthesizer_is_survivable() {
        let engine = VoiceEngine::new(VoiceConfig {
            program: "presence-no-such-tts".to_string(),
            ..VoiceConfig::default()
        });
        engine.speak(Voice::Narrator, "hello").await;
    }

    #[tokio::test]
    async fn speak_completes_with_working_synthesizer() {
        quiet_engine().speak(Voice::Echo, "testing").await;
    }
}

//! `presence-ambient` – room-level feedback collaborators.
//!
//! The control loop publishes [`AmbientCue`][presence_types::AmbientCue]
//! transitions onto the [`bus::CueBus`]; each collaborator subscribes
//! independently and reacts at its own pace, so a slow light bulb can
//! never stall the 100 ms actuation tick.
//!
//! # Modules
//!
//! - [`bus`] – [`CueBus`]: broadcast fan-out of ambient events.
//! - [`lights`] – [`LightsEngine`]: smart-bulb presets via the `flux_led`
//!   controller process.
//! - [`sound`] – [`SoundEngine`]: looped background beds plus one-shot
//!   effects through an external audio player.
//! - [`voice`] – [`VoiceEngine`]: text-to-speech with two personas, the
//!   echo voice and the narrator voice.
//! - [`chat`] – [`SpeechPipeline`]: routes operator speech to either the
//!   chat engine or the puzzle unlock service.

pub mod bus;
pub mod chat;
pub mod lights;
pub mod sound;
pub mod voice;

pub use bus::{CueBus, CueReceiver};
pub use chat::{CannedChat, ChatEngine, PuzzleClient, SpeechPipeline, SpeechReply};
pub use lights::{LightsConfig, LightsEngine};
pub use sound::{Effect, EffectSender, SoundConfig, SoundEngine};
pub use voice::{Voice, VoiceConfig, VoiceEngine};

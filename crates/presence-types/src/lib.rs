use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Result of a single robot actuator call.
///
/// Every capability call on the robot collaborator returns immediately with
/// one of these three states; nothing ever blocks awaiting completion.
/// `Busy` is an expected, transient condition (the robot is mid-animation)
/// and is never surfaced to a remote caller as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActuatorOutcome {
    /// The robot accepted the command.
    Success,
    /// The robot is mid-action and rejected the command; retry later.
    Busy,
    /// The underlying robot session is gone. Fatal to the process.
    Fatal,
}

/// A deferred one-shot actuator call, held in the session's action queue
/// until the robot accepts it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "payload")]
pub enum QueuedAction {
    /// Speak the given text through the robot's voice.
    Speak(String),
    /// Play a named animation from the robot's animation library.
    PlayAnimation(String),
}

/// Fixed vocabulary shared by every ambient collaborator (lights, sound).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmbientCue {
    /// Free-play state: calm colors, playing loop.
    Normal,
    /// Robot is on the charger contacts.
    Charging,
    /// Low battery while off the charger: siren + red strobe.
    Danger,
}

/// Wrapper routed over the ambient cue bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmbientEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub cue: AmbientCue,
}

impl AmbientEvent {
    /// Stamp a cue with a fresh id and the current wall-clock time.
    pub fn now(cue: AmbientCue) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            cue,
        }
    }
}

/// An event received from the remote-control client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RemoteEvent {
    /// A key press or release. Holding a key may repeat `down: true` events.
    Key {
        key_code: u8,
        shift: bool,
        ctrl: bool,
        alt: bool,
        down: bool,
    },
    /// Mouse position in the 0..1 window range plus deltas since last event.
    Mouse {
        x: f32,
        y: f32,
        dx: f32,
        dy: f32,
        button_down: bool,
    },
    /// Enable or disable mouse-look control of steering and head angle.
    MouseLook { enabled: bool },
    /// Rebind a digit slot to a named animation.
    AssignAnimation { slot: usize, name: String },
    /// Queue text for the robot to speak.
    Say { text: String },
    /// Zero all latched input intent.
    Reset,
    /// Pull the most recently cached camera frame.
    ImageGet,
}

/// Global error type for the rig.
#[derive(Error, Debug)]
pub enum PresenceError {
    /// A remote event arrived before a robot session was attached.
    /// Handlers acknowledge this benignly; it is not an error to the caller.
    #[error("no active robot session")]
    NoActiveSession,

    /// The robot session dropped. Fatal: the process exits and relies on an
    /// external restart loop rather than reconnecting internally.
    #[error("robot connection lost")]
    ConnectionLost,

    /// The puzzle-unlock service could not be reached. Treated as an
    /// incorrect attempt by the caller, never a crash.
    #[error("remote service unreachable: {0}")]
    RemoteServiceUnreachable(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("config error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queued_action_roundtrip() {
        let action = QueuedAction::Speak("Hi there".to_string());
        let json = serde_json::to_string(&action).unwrap();
        let back: QueuedAction = serde_json::from_str(&json).unwrap();
        assert_eq!(action, back);
    }

    #[test]
    fn remote_event_key_roundtrip() {
        let event = RemoteEvent::Key {
            key_code: b'W',
            shift: true,
            ctrl: false,
            alt: false,
            down: true,
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: RemoteEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }

    #[test]
    fn remote_event_uses_snake_case_tag() {
        let json = serde_json::to_string(&RemoteEvent::ImageGet).unwrap();
        assert!(json.contains("image_get"));
    }

    #[test]
    fn ambient_event_stamps_cue() {
        let event = AmbientEvent::now(AmbientCue::Danger);
        assert_eq!(event.cue, AmbientCue::Danger);
        let json = serde_json::to_string(&event).unwrap();
        let back: AmbientEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, event.id);
        assert_eq!(back.cue, AmbientCue::Danger);
    }

    #[test]
    fn ambient_cue_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&AmbientCue::Charging).unwrap(),
            "\"charging\""
        );
    }

    #[test]
    fn presence_error_display() {
        let err = PresenceError::ConnectionLost;
        assert!(err.to_string().contains("connection lost"));

        let err2 = PresenceError::RemoteServiceUnreachable("timeout".to_string());
        assert!(err2.to_string().contains("timeout"));
    }
}

//! Broadcast fan-out of ambient cue transitions.
//!
//! Built on [`tokio::sync::broadcast`] so every subscriber receives every
//! event without any single subscriber blocking the others. Slow
//! subscribers drop old events and keep going; cues are absolute states,
//! so only the most recent one matters.

use presence_types::{AmbientCue, AmbientEvent};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Buffered events per subscriber before the oldest are dropped.
const DEFAULT_CAPACITY: usize = 64;

/// Shared cue bus. Clone it cheaply – all clones share the same underlying
/// broadcast channel.
#[derive(Clone, Debug)]
pub struct CueBus {
    sender: broadcast::Sender<AmbientEvent>,
}

impl CueBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Stamp `cue` into an [`AmbientEvent`] and broadcast it.
    ///
    /// Returns the number of subscribers that were handed the event. Zero
    /// subscribers is a normal condition during startup and shutdown.
    pub fn publish(&self, cue: AmbientCue) -> usize {
        let event = AmbientEvent::now(cue);
        debug!(id = %event.id, ?cue, "publishing ambient cue");
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> CueReceiver {
        CueReceiver {
            receiver: self.sender.subscribe(),
        }
    }
}

impl Default for CueBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// An async receiver of ambient events.
pub struct CueReceiver {
    receiver: broadcast::Receiver<AmbientEvent>,
}

impl CueReceiver {
    /// Wait for the next ambient event.
    ///
    /// Lagged subscribers skip the dropped backlog and resume with the
    /// newest events. Returns `None` once the bus has shut down.
    pub async fn recv(&mut self) -> Option<AmbientEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(lagged_by = n, "cue subscriber lagged; skipping backlog");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

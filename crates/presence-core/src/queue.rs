//! [`ActionQueue`] – bounded FIFO of deferred one-shot actuator calls.
//!
//! Speech and animation requests land here instead of hitting a possibly
//! busy robot directly. Each tick attempts at most one underlying actuator
//! call: the head entry is retried until the robot accepts it, then the
//! queue advances. Under sustained overload the oldest entries are dropped,
//! favouring recency.

use std::collections::VecDeque;

use presence_hal::Robot;
use presence_types::{ActuatorOutcome, PresenceError, QueuedAction};
use tracing::{debug, warn};

/// Maximum number of queued actions. The oldest entry is evicted when a
/// new action arrives at capacity.
pub const CAPACITY: usize = 11;

/// Bounded, lossy-under-overload FIFO of [`QueuedAction`]s.
#[derive(Debug, Default)]
pub struct ActionQueue {
    queue: VecDeque<QueuedAction>,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `action` at the tail, evicting the oldest entry first when
    /// the queue is at capacity.
    pub fn enqueue(&mut self, action: QueuedAction) {
        if self.queue.len() >= CAPACITY {
            if let Some(dropped) = self.queue.pop_front() {
                warn!(?dropped, "action queue full; dropping oldest entry");
            }
        }
        self.queue.push_back(action);
    }

    /// Attempt the head action. At most one actuator call is made.
    ///
    /// `Success` pops the head; `Busy` leaves it in place for the next
    /// tick (never skipped); `Fatal` propagates as
    /// [`PresenceError::ConnectionLost`].
    ///
    /// Returns `true` when an action completed this tick.
    pub fn tick(&mut self, robot: &mut dyn Robot) -> Result<bool, PresenceError> {
        let Some(head) = self.queue.front() else {
            return Ok(false);
        };
        let outcome = match head {
            QueuedAction::Speak(text) => robot.speak(text),
            QueuedAction::PlayAnimation(name) => robot.play_animation(name),
        };
        match outcome {
            ActuatorOutcome::Success => {
                self.queue.pop_front();
                Ok(true)
            }
            ActuatorOutcome::Busy => {
                debug!("robot busy; head action retried next tick");
                Ok(false)
            }
            ActuatorOutcome::Fatal => Err(PresenceError::ConnectionLost),
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Snapshot of the queued actions, head first.
    pub fn entries(&self) -> impl Iterator<Item = &QueuedAction> {
        self.queue.iter()
    }
}

//! [`ControlSession`] – single owner of the robot handle and all control
//! state.
//!
//! Every mutation (remote events, the periodic tick) goes through the
//! session, so callers serialize access with one lock and no actuator
//! command can interleave with another. A [`PresenceError::ConnectionLost`]
//! from any method means the robot session is gone; the caller tears the
//! process down and lets the supervisor restart it.

use presence_hal::Robot;
use presence_types::{AmbientCue, PresenceError, QueuedAction};
use tracing::{debug, info};

use crate::anim::AnimationTable;
use crate::arbiter::ActuationArbiter;
use crate::input::{
    self, InputState, MOUSE_HEAD_MAX_DEG, MOUSE_HEAD_MIN_DEG, MOUSE_TURN_RANGE, Refresh,
};
use crate::power::PowerMonitor;
use crate::queue::ActionQueue;

/// Owns the robot plus the input, arbitration, queue, and power state.
pub struct ControlSession {
    robot: Box<dyn Robot>,
    input: InputState,
    arbiter: ActuationArbiter,
    queue: ActionQueue,
    power: PowerMonitor,
    anims: AnimationTable,
}

impl ControlSession {
    /// Take ownership of a connected robot and build the control state
    /// around it. The animation table is seeded from the robot's reported
    /// animation names.
    pub fn new(robot: Box<dyn Robot>) -> Self {
        let anims = AnimationTable::new(robot.animation_names());
        info!(
            animations = anims.usable().len(),
            "control session established"
        );
        Self {
            robot,
            input: InputState::new(),
            arbiter: ActuationArbiter::new(),
            queue: ActionQueue::new(),
            power: PowerMonitor::new(),
            anims,
        }
    }

    /// Apply one key press or release, recomputing only the actuator
    /// subsystems the key touches. A digit release enqueues the bound
    /// animation.
    pub fn handle_key(
        &mut self,
        key_code: u8,
        shift: bool,
        ctrl: bool,
        alt: bool,
        down: bool,
    ) -> Result<(), PresenceError> {
        let outcome = self.input.apply_key(key_code, shift, ctrl, alt, down);
        self.refresh(outcome.refresh)?;

        if let Some(slot) = outcome.animation_slot {
            match self.anims.for_slot(slot) {
                Some(name) => {
                    let name = name.to_string();
                    debug!(slot, animation = %name, "digit key released");
                    self.queue.enqueue(QueuedAction::PlayAnimation(name));
                    self.queue.tick(self.robot.as_mut())?;
                }
                None => debug!(slot, "no animation bound to slot"),
            }
        }
        Ok(())
    }

    /// Apply a mouse-move event with window-normalized coordinates in
    /// `0.0..=1.0`. A no-op unless mouse-look is enabled.
    ///
    /// Horizontal position becomes a turn bias folded into the next wheel
    /// command; vertical position becomes a target head angle tracked
    /// proportionally.
    pub fn handle_mouse(&mut self, x: f32, y: f32) -> Result<(), PresenceError> {
        if !self.input.mouse_look_enabled() {
            return Ok(());
        }
        self.input.mouse_turn_bias =
            input::remap_to_range(x, 0.0, 1.0, -MOUSE_TURN_RANGE, MOUSE_TURN_RANGE);
        self.arbiter.update_driving(&self.input, self.robot.as_mut())?;

        let target_deg =
            input::remap_to_range(y, 0.0, 1.0, MOUSE_HEAD_MAX_DEG, MOUSE_HEAD_MIN_DEG);
        self.arbiter.track_head(target_deg, self.robot.as_mut())
    }

    /// Enable or disable mouse-look. On a change, driving and head
    /// commands are recomputed so a stale turn bias or head velocity never
    /// lingers.
    pub fn set_mouse_look(&mut self, enabled: bool) -> Result<(), PresenceError> {
        if self.input.set_mouse_look(enabled) {
            self.arbiter.update_driving(&self.input, self.robot.as_mut())?;
            self.arbiter.update_head(&self.input, self.robot.as_mut())?;
        }
        Ok(())
    }

    /// Queue a text-to-speech utterance and give the queue one immediate
    /// pump so speech starts without waiting for the next tick.
    pub fn say_text(&mut self, text: &str) -> Result<(), PresenceError> {
        self.queue.enqueue(QueuedAction::Speak(text.to_string()));
        self.queue.tick(self.robot.as_mut())?;
        Ok(())
    }

    /// Queue a named animation and give the queue one immediate pump.
    pub fn play_animation(&mut self, name: &str) -> Result<(), PresenceError> {
        self.queue
            .enqueue(QueuedAction::PlayAnimation(name.to_string()));
        self.queue.tick(self.robot.as_mut())?;
        Ok(())
    }

    /// Zero all latched input and bring every actuator to rest.
    pub fn reset(&mut self) -> Result<(), PresenceError> {
        info!("input reset");
        self.input.reset();
        self.refresh(Refresh::ALL)
    }

    /// Periodic tick: pump the action queue, run anti-tip recovery, then
    /// poll the power state machine.
    ///
    /// Returns the ambient cue for a power-state transition, if one
    /// happened this tick.
    pub fn tick(&mut self) -> Result<Option<AmbientCue>, PresenceError> {
        self.queue.tick(self.robot.as_mut())?;
        self.arbiter.check_tilt(self.robot.as_mut())?;
        let on_charger = self.robot.is_on_charger();
        let volts = self.robot.battery_voltage();
        Ok(self.power.poll(on_charger, volts))
    }

    /// Latest camera frame from the robot, if one has arrived yet.
    pub fn latest_frame(&mut self) -> Option<Vec<u8>> {
        self.robot.latest_frame()
    }

    pub fn animations(&self) -> &AnimationTable {
        &self.anims
    }

    pub fn animations_mut(&mut self) -> &mut AnimationTable {
        &mut self.anims
    }

    fn refresh(&mut self, refresh: Refresh) -> Result<(), PresenceError> {
        if refresh.driving {
            self.arbiter.update_driving(&self.input, self.robot.as_mut())?;
        }
        if refresh.head {
            self.arbiter.update_head(&self.input, self.robot.as_mut())?;
        }
        if refresh.lift {
            self.arbiter.update_lift(&self.input, self.robot.as_mut())?;
        }
        Ok(())
    }
}

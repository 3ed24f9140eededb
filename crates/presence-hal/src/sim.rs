//! In-process simulated robot for headless tests and demo runs.
//!
//! [`SimRobot`] records every command it receives and returns plausible
//! sensor state, so the full rig runs in CI without a physical robot.
//! Tests obtain a [`SimRobotHandle`] to inspect the command log, script
//! `Busy` rejections for one-shot calls, and drive the sensor values.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use presence_types::ActuatorOutcome;

use crate::robot::Robot;

/// A single recorded actuator command.
#[derive(Debug, Clone, PartialEq)]
pub enum SimCommand {
    DriveWheels { l: f32, r: f32, l_accel: f32, r_accel: f32 },
    MoveHead(f32),
    MoveLift(f32),
    Speak(String),
    PlayAnimation(String),
    DriveOffCharger,
}

struct SimState {
    log: Vec<SimCommand>,
    /// Outcomes consumed (front first) by one-shot calls: speak,
    /// play_animation, drive_off_charger. Empty script → `Success`.
    one_shot_script: VecDeque<ActuatorOutcome>,
    /// When set, every call reports `Fatal` (session dropped).
    connection_lost: bool,
    on_charger: bool,
    battery_voltage: f32,
    tilt_angle_deg: f32,
    head_angle_deg: f32,
    animation_names: Vec<String>,
    frame: Option<Vec<u8>>,
}

impl Default for SimState {
    fn default() -> Self {
        Self {
            log: Vec::new(),
            one_shot_script: VecDeque::new(),
            connection_lost: false,
            on_charger: false,
            battery_voltage: 4.0,
            tilt_angle_deg: 0.0,
            head_angle_deg: 0.0,
            animation_names: Vec::new(),
            frame: None,
        }
    }
}

/// Simulated robot session. Always accepts continuous velocity commands;
/// one-shot calls follow the scripted outcome queue.
pub struct SimRobot {
    state: Arc<Mutex<SimState>>,
}

/// Shared handle into a [`SimRobot`]'s internal state, for test assertions
/// and sensor injection.
#[derive(Clone)]
pub struct SimRobotHandle {
    state: Arc<Mutex<SimState>>,
}

fn lock(state: &Arc<Mutex<SimState>>) -> MutexGuard<'_, SimState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

impl SimRobot {
    /// Create a simulated robot and a handle into its shared state.
    pub fn new() -> (Self, SimRobotHandle) {
        let state = Arc::new(Mutex::new(SimState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            SimRobotHandle { state },
        )
    }
}

impl SimRobotHandle {
    /// All commands recorded so far, oldest first.
    pub fn commands(&self) -> Vec<SimCommand> {
        lock(&self.state).log.clone()
    }

    /// Clear the recorded command log.
    pub fn clear_commands(&self) {
        lock(&self.state).log.clear();
    }

    /// Append outcomes for upcoming one-shot calls (consumed front first).
    pub fn script_one_shot(&self, outcomes: impl IntoIterator<Item = ActuatorOutcome>) {
        lock(&self.state).one_shot_script.extend(outcomes);
    }

    /// Make every subsequent call report [`ActuatorOutcome::Fatal`].
    pub fn drop_connection(&self) {
        lock(&self.state).connection_lost = true;
    }

    pub fn set_on_charger(&self, on: bool) {
        lock(&self.state).on_charger = on;
    }

    pub fn set_battery_voltage(&self, volts: f32) {
        lock(&self.state).battery_voltage = volts;
    }

    pub fn set_tilt_angle_deg(&self, deg: f32) {
        lock(&self.state).tilt_angle_deg = deg;
    }

    pub fn set_head_angle_deg(&self, deg: f32) {
        lock(&self.state).head_angle_deg = deg;
    }

    pub fn set_animation_names(&self, names: Vec<String>) {
        lock(&self.state).animation_names = names;
    }

    pub fn set_frame(&self, bytes: Vec<u8>) {
        lock(&self.state).frame = Some(bytes);
    }
}

impl SimRobot {
    fn record(&mut self, cmd: SimCommand) -> ActuatorOutcome {
        let mut state = lock(&self.state);
        if state.connection_lost {
            return ActuatorOutcome::Fatal;
        }
        state.log.push(cmd);
        ActuatorOutcome::Success
    }

    fn record_one_shot(&mut self, cmd: SimCommand) -> ActuatorOutcome {
        let mut state = lock(&self.state);
        if state.connection_lost {
            return ActuatorOutcome::Fatal;
        }
        let outcome = state
            .one_shot_script
            .pop_front()
            .unwrap_or(ActuatorOutcome::Success);
        if outcome == ActuatorOutcome::Success {
            state.log.push(cmd);
        }
        outcome
    }
}

impl Robot for SimRobot {
    fn drive_wheels(&mut self, l: f32, r: f32, l_accel: f32, r_accel: f32) -> ActuatorOutcome {
        self.record(SimCommand::DriveWheels {
            l,
            r,
            l_accel,
            r_accel,
        })
    }

    fn move_head(&mut self, vel: f32) -> ActuatorOutcome {
        self.record(SimCommand::MoveHead(vel))
    }

    fn move_lift(&mut self, vel: f32) -> ActuatorOutcome {
        self.record(SimCommand::MoveLift(vel))
    }

    fn speak(&mut self, text: &str) -> ActuatorOutcome {
        self.record_one_shot(SimCommand::Speak(text.to_string()))
    }

    fn play_animation(&mut self, name: &str) -> ActuatorOutcome {
        self.record_one_shot(SimCommand::PlayAnimation(name.to_string()))
    }

    fn drive_off_charger(&mut self) -> ActuatorOutcome {
        self.record_one_shot(SimCommand::DriveOffCharger)
    }

    fn is_on_charger(&self) -> bool {
        lock(&self.state).on_charger
    }

    fn battery_voltage(&self) -> f32 {
        lock(&self.state).battery_voltage
    }

    fn tilt_angle_deg(&self) -> f32 {
        lock(&self.state).tilt_angle_deg
    }

    fn head_angle_deg(&self) -> f32 {
        lock(&self.state).head_angle_deg
    }

    fn animation_names(&self) -> Vec<String> {
        lock(&self.state).animation_names.clone()
    }

    fn latest_frame(&mut self) -> Option<Vec<u8>> {
        lock(&self.state).frame.clone()
    }
}

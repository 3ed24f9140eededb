//! [`ActuationArbiter`] – resolves latched input intent into velocity
//! commands for the wheels, head, and lift.
//!
//! The arbiter is recomputed after every input event that touches a
//! subsystem, and its safety checks (charger interlock, anti-tip recovery)
//! run from the periodic tick. `Busy` rejections from the robot are
//! swallowed and naturally retried on the next recompute; `Fatal` outcomes
//! propagate as [`PresenceError::ConnectionLost`].

use presence_hal::Robot;
use presence_types::{ActuatorOutcome, PresenceError};
use tracing::{debug, warn};

use crate::input::InputState;

/// One speed value per modifier tier.
#[derive(Debug, Clone, Copy)]
pub struct SpeedTiers {
    pub fast: f32,
    pub mid: f32,
    pub slow: f32,
}

/// Forward drive speed, mm/s.
pub const FORWARD_SPEED: SpeedTiers = SpeedTiers {
    fast: 150.0,
    mid: 75.0,
    slow: 50.0,
};
/// Differential turn speed, mm/s.
pub const TURN_SPEED: SpeedTiers = SpeedTiers {
    fast: 100.0,
    mid: 50.0,
    slow: 30.0,
};
/// Lift velocity.
pub const LIFT_SPEED: SpeedTiers = SpeedTiers {
    fast: 8.0,
    mid: 4.0,
    slow: 2.0,
};
/// Head velocity.
pub const HEAD_SPEED: SpeedTiers = SpeedTiers {
    fast: 2.0,
    mid: 1.0,
    slow: 0.5,
};

/// Wheel acceleration is commanded at this multiple of the wheel speed,
/// a fixed ramp heuristic.
const ACCEL_RATIO: f32 = 4.0;

/// Default body tilt (degrees) beyond which anti-tip recovery fires.
const DEFAULT_TILT_THRESHOLD_DEG: f32 = 30.0;

/// Fixed anti-tip recovery maneuver: brief reverse at this wheel speed,
/// then a lift raise and lower to shift weight back.
const RECOVERY_REVERSE_SPEED: f32 = 50.0;
const RECOVERY_LIFT_SPEED: f32 = 8.0;

/// Select the speed for the current fast/slow modifier state.
/// Fast wins when both modifiers are held.
fn pick_speed(input: &InputState, tiers: SpeedTiers) -> f32 {
    if input.go_fast {
        tiers.fast
    } else if input.go_slow {
        tiers.slow
    } else {
        tiers.mid
    }
}

/// Swallow `Busy`, surface `Fatal` as [`PresenceError::ConnectionLost`].
fn issue(outcome: ActuatorOutcome) -> Result<(), PresenceError> {
    match outcome {
        ActuatorOutcome::Success => Ok(()),
        ActuatorOutcome::Busy => {
            debug!("actuator busy; command retried on next recompute");
            Ok(())
        }
        ActuatorOutcome::Fatal => Err(PresenceError::ConnectionLost),
    }
}

/// Converts [`InputState`] into actuator commands and applies the safety
/// overrides.
pub struct ActuationArbiter {
    tilt_threshold_deg: f32,
}

impl Default for ActuationArbiter {
    fn default() -> Self {
        Self {
            tilt_threshold_deg: DEFAULT_TILT_THRESHOLD_DEG,
        }
    }
}

impl ActuationArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the anti-tip threshold (builder-style).
    pub fn with_tilt_threshold(mut self, deg: f32) -> Self {
        self.tilt_threshold_deg = deg;
        self
    }

    /// Recompute and issue the differential wheel command.
    ///
    /// Driving forward while physically on the charger first issues an
    /// explicit drive-off-charger action (`Busy` swallowed, retried on the
    /// next drive impulse). Steering is inverted while reversing, which
    /// feels more natural to operators.
    pub fn update_driving(
        &self,
        input: &InputState,
        robot: &mut dyn Robot,
    ) -> Result<(), PresenceError> {
        let drive_dir = flag_axis(input.drive_forward, input.drive_back);

        if drive_dir > 0.1 && robot.is_on_charger() {
            // Stuck on the charger while the operator pushes forward.
            issue(robot.drive_off_charger())?;
        }

        let mut turn_dir = flag_axis(input.turn_right, input.turn_left) + input.mouse_turn_bias;
        if drive_dir < 0.0 {
            turn_dir = -turn_dir;
        }

        let forward_speed = pick_speed(input, FORWARD_SPEED);
        let turn_speed = pick_speed(input, TURN_SPEED);

        let l = drive_dir * forward_speed + turn_speed * turn_dir;
        let r = drive_dir * forward_speed - turn_speed * turn_dir;

        issue(robot.drive_wheels(l, r, l * ACCEL_RATIO, r * ACCEL_RATIO))
    }

    /// Recompute and issue the head velocity command. Skipped while
    /// mouse-look proportional control owns the head.
    pub fn update_head(
        &self,
        input: &InputState,
        robot: &mut dyn Robot,
    ) -> Result<(), PresenceError> {
        if input.mouse_look_enabled() {
            return Ok(());
        }
        let vel = flag_axis(input.head_up, input.head_down) * pick_speed(input, HEAD_SPEED);
        issue(robot.move_head(vel))
    }

    /// Proportional head tracking for mouse-look: command a velocity toward
    /// `target_deg` scaled by the mouse-look gain.
    pub fn track_head(
        &self,
        target_deg: f32,
        robot: &mut dyn Robot,
    ) -> Result<(), PresenceError> {
        let vel = (target_deg - robot.head_angle_deg()) * crate::input::MOUSE_HEAD_GAIN;
        issue(robot.move_head(vel))
    }

    /// Recompute and issue the lift velocity command.
    pub fn update_lift(
        &self,
        input: &InputState,
        robot: &mut dyn Robot,
    ) -> Result<(), PresenceError> {
        let vel = flag_axis(input.lift_up, input.lift_down) * pick_speed(input, LIFT_SPEED);
        issue(robot.move_lift(vel))
    }

    /// Poll the tilt sensor; past the threshold, issue the fixed recovery
    /// maneuver (brief reverse drive, lift raise, lift lower).
    ///
    /// Returns `true` when recovery was issued this tick.
    pub fn check_tilt(&self, robot: &mut dyn Robot) -> Result<bool, PresenceError> {
        let tilt = robot.tilt_angle_deg();
        if tilt.abs() <= self.tilt_threshold_deg {
            return Ok(false);
        }
        warn!(tilt_deg = tilt, "tilt past threshold; issuing anti-tip recovery");
        issue(robot.drive_wheels(
            -RECOVERY_REVERSE_SPEED,
            -RECOVERY_REVERSE_SPEED,
            -RECOVERY_REVERSE_SPEED * ACCEL_RATIO,
            -RECOVERY_REVERSE_SPEED * ACCEL_RATIO,
        ))?;
        issue(robot.move_lift(RECOVERY_LIFT_SPEED))?;
        issue(robot.move_lift(-RECOVERY_LIFT_SPEED))?;
        Ok(true)
    }
}

/// `+1.0` when only `pos` is held, `-1.0` when only `neg`, `0.0` otherwise.
fn flag_axis(pos: bool, neg: bool) -> f32 {
    (pos as i8 - neg as i8) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use presence_hal::sim::{SimCommand, SimRobot, SimRobotHandle};

    fn rig() -> (ActuationArbiter, SimRobot, SimRobotHandle) {
        let (robot, handle) = SimRobot::new();
        (ActuationArbiter::new(), robot, handle)
    }

    fn last_drive(handle: &SimRobotHandle) -> (f32, f32) {
        match handle
            .commands()
            .into_iter()
            .rev()
            .find(|c| matches!(c, SimCommand::DriveWheels { .. }))
        {
            Some(SimCommand::DriveWheels { l, r, .. }) => (l, r),
            other => panic!("expected a DriveWheels command, got {other:?}"),
        }
    }

    #[test]
    fn forward_drives_both_wheels_at_mid_tier() {
        let (arbiter, mut robot, handle) = rig();
        let mut input = InputState::new();
        input.drive_forward = true;

        arbiter.update_driving(&input, &mut robot).unwrap();
        assert_eq!(last_drive(&handle), (75.0, 75.0));
    }

    #[test]
    fn fast_tier_when_shift_held_even_with_alt() {
        let (arbiter, mut robot, handle) = rig();
        let mut input = InputState::new();
        input.drive_forward = true;
        input.go_fast = true;
        input.go_slow = true; // fast wins

        arbiter.update_driving(&input, &mut robot).unwrap();
        assert_eq!(last_drive(&handle), (150.0, 150.0));
    }

    #[test]
    fn slow_tier_when_only_alt_held() {
        let (arbiter, mut robot, handle) = rig();
        let mut input = InputState::new();
        input.drive_forward = true;
        input.go_slow = true;

        arbiter.update_driving(&input, &mut robot).unwrap();
        assert_eq!(last_drive(&handle), (50.0, 50.0));
    }

    #[test]
    fn turn_right_adds_differential() {
        let (arbiter, mut robot, handle) = rig();
        let mut input = InputState::new();
        input.drive_forward = true;
        input.turn_right = true;

        arbiter.update_driving(&input, &mut robot).unwrap();
        // 75 forward ± 50 turn.
        assert_eq!(last_drive(&handle), (125.0, 25.0));
    }

    #[test]
    fn reversing_inverts_steering() {
        let (arbiter, mut robot, handle) = rig();
        let mut input = InputState::new();
        input.drive_back = true;
        input.turn_right = true;

        arbiter.update_driving(&input, &mut robot).unwrap();
        let (l_rev, r_rev) = last_drive(&handle);

        handle.clear_commands();
        input.drive_back = false;
        input.drive_forward = true;
        arbiter.update_driving(&input, &mut robot).unwrap();
        let (l_fwd, r_fwd) = last_drive(&handle);

        // Identical turn-key state: the turn component flips sign relative
        // to the forward case.
        assert_eq!(l_fwd - 75.0, -(l_rev + 75.0));
        assert_eq!(r_fwd - 75.0, -(r_rev + 75.0));
    }

    #[test]
    fn wheel_speeds_bounded_for_all_flag_combinations() {
        let (arbiter, mut robot, handle) = rig();
        let max = FORWARD_SPEED.fast + TURN_SPEED.fast * (1.0 + crate::input::MOUSE_TURN_RANGE);
        for bits in 0u8..64 {
            let mut input = InputState::new();
            input.drive_forward = bits & 1 != 0;
            input.drive_back = bits & 2 != 0;
            input.turn_left = bits & 4 != 0;
            input.turn_right = bits & 8 != 0;
            input.go_fast = bits & 16 != 0;
            input.go_slow = bits & 32 != 0;
            input.mouse_turn_bias = crate::input::MOUSE_TURN_RANGE;

            arbiter.update_driving(&input, &mut robot).unwrap();
            let (l, r) = last_drive(&handle);
            assert!(l.is_finite() && r.is_finite());
            assert!(l.abs() <= max && r.abs() <= max);
        }
    }

    #[test]
    fn acceleration_is_four_times_speed() {
        let (arbiter, mut robot, handle) = rig();
        let mut input = InputState::new();
        input.drive_forward = true;

        arbiter.update_driving(&input, &mut robot).unwrap();
        match handle.commands().pop() {
            Some(SimCommand::DriveWheels {
                l, l_accel, r, r_accel,
            }) => {
                assert_eq!(l_accel, l * 4.0);
                assert_eq!(r_accel, r * 4.0);
            }
            other => panic!("expected DriveWheels, got {other:?}"),
        }
    }

    #[test]
    fn forward_on_charger_issues_drive_off_first() {
        let (arbiter, mut robot, handle) = rig();
        handle.set_on_charger(true);
        let mut input = InputState::new();
        input.drive_forward = true;

        arbiter.update_driving(&input, &mut robot).unwrap();
        let commands = handle.commands();
        assert_eq!(commands[0], SimCommand::DriveOffCharger);
        assert!(matches!(commands[1], SimCommand::DriveWheels { .. }));
    }

    #[test]
    fn busy_drive_off_charger_is_swallowed() {
        let (arbiter, mut robot, handle) = rig();
        handle.set_on_charger(true);
        handle.script_one_shot([ActuatorOutcome::Busy]);
        let mut input = InputState::new();
        input.drive_forward = true;

        // Must not error; wheel command still issued.
        arbiter.update_driving(&input, &mut robot).unwrap();
        assert!(matches!(
            handle.commands().as_slice(),
            [SimCommand::DriveWheels { .. }]
        ));
    }

    #[test]
    fn reverse_on_charger_does_not_drive_off() {
        let (arbiter, mut robot, handle) = rig();
        handle.set_on_charger(true);
        let mut input = InputState::new();
        input.drive_back = true;

        arbiter.update_driving(&input, &mut robot).unwrap();
        assert!(
            !handle
                .commands()
                .contains(&SimCommand::DriveOffCharger)
        );
    }

    #[test]
    fn head_update_skipped_while_mouse_look_active() {
        let (arbiter, mut robot, handle) = rig();
        let mut input = InputState::new();
        input.set_mouse_look(true);
        input.head_up = true;

        arbiter.update_head(&input, &mut robot).unwrap();
        assert!(handle.commands().is_empty());

        input.set_mouse_look(false);
        arbiter.update_head(&input, &mut robot).unwrap();
        assert_eq!(handle.commands(), vec![SimCommand::MoveHead(1.0)]);
    }

    #[test]
    fn lift_velocity_follows_tier() {
        let (arbiter, mut robot, handle) = rig();
        let mut input = InputState::new();
        input.lift_down = true;
        input.go_fast = true;

        arbiter.update_lift(&input, &mut robot).unwrap();
        assert_eq!(handle.commands(), vec![SimCommand::MoveLift(-8.0)]);
    }

    #[test]
    fn tilt_under_threshold_is_quiet() {
        let (arbiter, mut robot, handle) = rig();
        handle.set_tilt_angle_deg(10.0);
        assert!(!arbiter.check_tilt(&mut robot).unwrap());
        assert!(handle.commands().is_empty());
    }

    #[test]
    fn tilt_past_threshold_issues_recovery() {
        let (arbiter, mut robot, handle) = rig();
        handle.set_tilt_angle_deg(45.0);
        assert!(arbiter.check_tilt(&mut robot).unwrap());
        let commands = handle.commands();
        assert!(matches!(
            commands[0],
            SimCommand::DriveWheels { l, r, .. } if l < 0.0 && r < 0.0
        ));
        assert_eq!(commands[1], SimCommand::MoveLift(RECOVERY_LIFT_SPEED));
        assert_eq!(commands[2], SimCommand::MoveLift(-RECOVERY_LIFT_SPEED));
    }

    #[test]
    fn fatal_outcome_becomes_connection_lost() {
        let (arbiter, mut robot, handle) = rig();
        handle.drop_connection();
        let input = InputState::new();
        let result = arbiter.update_driving(&input, &mut robot);
        assert!(matches!(result, Err(PresenceError::ConnectionLost)));
    }
}

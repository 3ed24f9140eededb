//! The `Robot` trait – capability surface of the physical robot session.
//!
//! Drivers wrap a vendor SDK session and implement this trait; the control
//! loop only ever talks to the trait, so the sim stub and a real robot are
//! interchangeable.

use presence_types::ActuatorOutcome;

/// A connected robot session.
///
/// Every actuator call returns an [`ActuatorOutcome`] *immediately*:
/// `Success` when the command was accepted, `Busy` when the robot is
/// mid-action (the caller retries on a later tick), `Fatal` when the
/// underlying session has dropped. No call awaits completion of the
/// physical motion.
pub trait Robot: Send {
    /// Command differential wheel speeds (mm/s) with per-wheel acceleration.
    fn drive_wheels(&mut self, l: f32, r: f32, l_accel: f32, r_accel: f32) -> ActuatorOutcome;

    /// Command head angular velocity (deg/s equivalent units).
    fn move_head(&mut self, vel: f32) -> ActuatorOutcome;

    /// Command lift velocity.
    fn move_lift(&mut self, vel: f32) -> ActuatorOutcome;

    /// Speak `text` through the robot's voice. One-shot; may report `Busy`.
    fn speak(&mut self, text: &str) -> ActuatorOutcome;

    /// Play a named animation. One-shot; may report `Busy`.
    fn play_animation(&mut self, name: &str) -> ActuatorOutcome;

    /// Drive forward off the charger contacts. May report `Busy`.
    fn drive_off_charger(&mut self) -> ActuatorOutcome;

    /// `true` while the robot sits on its charger contacts.
    fn is_on_charger(&self) -> bool;

    /// Most recent battery voltage reading.
    fn battery_voltage(&self) -> f32;

    /// Body tilt from level, in degrees. Used by the anti-tip interlock.
    fn tilt_angle_deg(&self) -> f32;

    /// Current head angle in degrees. Used by mouse-look proportional control.
    fn head_angle_deg(&self) -> f32;

    /// Names of every animation the robot's engine knows.
    fn animation_names(&self) -> Vec<String>;

    /// The most recent camera frame as already-encoded PNG/JPEG bytes, or
    /// `None` before the first frame arrives.
    fn latest_frame(&mut self) -> Option<Vec<u8>>;
}

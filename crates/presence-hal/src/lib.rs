//! `presence-hal` – the robot collaborator boundary.
//!
//! The rig never implements motor control, camera capture, or the animation
//! engine itself; those belong to the vendor SDK. This crate defines the
//! narrow capability surface the control loop consumes:
//!
//! - [`robot`] – the [`Robot`][robot::Robot] trait: wheel/head/lift velocity
//!   commands, one-shot speech/animation calls, and the sensor reads
//!   (charger contact, battery voltage, tilt, head angle) the safety
//!   interlocks poll.
//! - [`sim`] – [`SimRobot`][sim::SimRobot]: an in-process stub that records
//!   every command and supports scripted `Busy` rejections, so the full
//!   stack runs in headless tests without a physical robot.

pub mod robot;
pub mod sim;

pub use robot::Robot;
pub use sim::{SimRobot, SimRobotHandle};

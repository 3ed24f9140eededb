//! `presence-core` – the input-to-actuation control loop.
//!
//! Merges discrete key/mouse events and timer ticks into continuous
//! differential-drive, head, and lift velocity commands, arbitrated against
//! queued one-shot actions (speech, animation) and safety interrupts
//! (anti-tip recovery, charger interlock, low-battery cues).
//!
//! # Modules
//!
//! - [`input`] – [`InputState`][input::InputState]: latched boolean/analog
//!   intent flags derived from key and mouse events, plus the speed
//!   modifiers and the mouse-look turn bias.
//! - [`arbiter`] – [`ActuationArbiter`][arbiter::ActuationArbiter]: turns
//!   the input state into wheel/head/lift velocity commands, applying the
//!   three-tier speed table, reverse-steering inversion, the charger
//!   interlock, and anti-tip recovery.
//! - [`queue`] – [`ActionQueue`][queue::ActionQueue]: bounded FIFO of
//!   one-shot actions; the head entry is retried each tick until the robot
//!   accepts it.
//! - [`power`] – [`PowerMonitor`][power::PowerMonitor]: edge-triggered
//!   Normal/Charging/LowBattery state machine emitting ambient cues.
//! - [`anim`] – [`AnimationTable`][anim::AnimationTable]: digit-key →
//!   animation-name bindings, filtered against the known-bad list.
//! - [`session`] – [`ControlSession`][session::ControlSession]: the single
//!   owner of all of the above plus the robot handle. All mutation goes
//!   through it; callers serialize access with one lock.

pub mod anim;
pub mod arbiter;
pub mod input;
pub mod power;
pub mod queue;
pub mod session;

pub use anim::AnimationTable;
pub use arbiter::ActuationArbiter;
pub use input::{InputState, KeyOutcome, Refresh};
pub use power::{PowerMonitor, PowerState};
pub use queue::ActionQueue;
pub use session::ControlSession;

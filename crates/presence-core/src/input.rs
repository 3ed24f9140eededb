//! [`InputState`] – latched intent flags derived from key and mouse events.
//!
//! Every flag has "held" semantics: `true` while the physical key is down.
//! The state is owned exclusively by the control session and mutated only by
//! its event handlers; it never persists and is zeroed by an explicit reset.
//!
//! # Key map (canonical, safety-interlocked revision)
//!
//! | Key | Intent |
//! |---|---|
//! | `W` / `S` | drive forward / back |
//! | `A` / `D` | turn left / right |
//! | `R` / `F` | lift up / down |
//! | `T` / `G` | head up / down |
//! | Shift / Alt | go fast / go slow (fast wins when both are held) |
//! | `0`–`9` (release) | play the animation bound to that digit slot |

/// Horizontal mouse position maps linearly to a turn bias in this range.
pub const MOUSE_TURN_RANGE: f32 = 1.5;
/// Vertical mouse position maps linearly to a target head angle between
/// these two degrees (top of window = up).
pub const MOUSE_HEAD_MAX_DEG: f32 = 45.0;
pub const MOUSE_HEAD_MIN_DEG: f32 = -25.0;
/// Proportional gain from head-angle error (degrees) to head velocity.
pub const MOUSE_HEAD_GAIN: f32 = 0.03;

/// Which actuator subsystems must be recomputed after an input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Refresh {
    pub driving: bool,
    pub head: bool,
    pub lift: bool,
}

impl Refresh {
    /// Refresh every subsystem (a speed modifier changed).
    pub const ALL: Refresh = Refresh {
        driving: true,
        head: true,
        lift: true,
    };

    /// `true` if any subsystem needs recomputing.
    pub fn any(&self) -> bool {
        self.driving || self.head || self.lift
    }
}

/// Result of applying one key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyOutcome {
    /// Subsystems whose velocity commands must be recomputed.
    pub refresh: Refresh,
    /// A digit key was released: play the animation bound to this slot.
    pub animation_slot: Option<usize>,
}

/// Latched boolean/analog intent flags.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    pub drive_forward: bool,
    pub drive_back: bool,
    pub turn_left: bool,
    pub turn_right: bool,
    pub lift_up: bool,
    pub lift_down: bool,
    pub head_up: bool,
    pub head_down: bool,
    /// Shift held: select the fast speed tier. Wins over `go_slow`.
    pub go_fast: bool,
    /// Alt held: select the slow speed tier.
    pub go_slow: bool,
    /// Signed turn bias from mouse-look; zero while mouse-look is disabled.
    pub mouse_turn_bias: f32,
    mouse_look_enabled: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one key press or release.
    ///
    /// Updates exactly the flags whose physical key matches `key_code` and
    /// always refreshes `go_fast`/`go_slow` from the shift/alt modifiers.
    /// Unmapped key codes are a no-op for the intent flags but still trigger
    /// the speed-modifier check; a modifier change refreshes every subsystem
    /// since speed affects all of them.
    pub fn apply_key(
        &mut self,
        key_code: u8,
        shift: bool,
        _ctrl: bool,
        alt: bool,
        down: bool,
    ) -> KeyOutcome {
        let speed_changed = self.go_fast != shift || self.go_slow != alt;
        self.go_fast = shift;
        self.go_slow = alt;

        let mut refresh = if speed_changed {
            Refresh::ALL
        } else {
            Refresh::default()
        };

        match key_code {
            b'W' => {
                self.drive_forward = down;
                refresh.driving = true;
            }
            b'S' => {
                self.drive_back = down;
                refresh.driving = true;
            }
            b'A' => {
                self.turn_left = down;
                refresh.driving = true;
            }
            b'D' => {
                self.turn_right = down;
                refresh.driving = true;
            }
            b'R' => {
                self.lift_up = down;
                refresh.lift = true;
            }
            b'F' => {
                self.lift_down = down;
                refresh.lift = true;
            }
            b'T' => {
                self.head_up = down;
                refresh.head = true;
            }
            b'G' => {
                self.head_down = down;
                refresh.head = true;
            }
            _ => {}
        }

        let animation_slot = if !down && key_code.is_ascii_digit() {
            Some((key_code - b'0') as usize)
        } else {
            None
        };

        KeyOutcome {
            refresh,
            animation_slot,
        }
    }

    /// `true` while mouse-look proportional control owns the head and the
    /// turn bias.
    pub fn mouse_look_enabled(&self) -> bool {
        self.mouse_look_enabled
    }

    /// Enable or disable mouse-look. Disabling cancels any current
    /// mouse-driven turning.
    ///
    /// Returns `true` when the mode actually changed (the caller then
    /// recomputes driving and head commands).
    pub fn set_mouse_look(&mut self, enabled: bool) -> bool {
        let was = self.mouse_look_enabled;
        self.mouse_look_enabled = enabled;
        if !enabled {
            self.mouse_turn_bias = 0.0;
        }
        was != enabled
    }

    /// Zero every latched flag and the mouse turn bias. Mouse-look mode
    /// itself is left as configured.
    pub fn reset(&mut self) {
        let mouse_look = self.mouse_look_enabled;
        *self = Self::default();
        self.mouse_look_enabled = mouse_look;
    }
}

/// Convert `x` (in `x_min..x_max`) linearly into `out_min..out_max`,
/// clamping outside the input range.
pub fn remap_to_range(x: f32, x_min: f32, x_max: f32, out_min: f32, out_max: f32) -> f32 {
    if x < x_min {
        out_min
    } else if x > x_max {
        out_max
    } else {
        let ratio = (x - x_min) / (x_max - x_min);
        out_min + ratio * (out_max - out_min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drive_key_latches_and_releases() {
        let mut input = InputState::new();
        let out = input.apply_key(b'W', false, false, false, true);
        assert!(input.drive_forward);
        assert!(out.refresh.driving);
        assert!(!out.refresh.head && !out.refresh.lift);

        let out = input.apply_key(b'W', false, false, false, false);
        assert!(!input.drive_forward);
        assert!(out.refresh.driving);
    }

    #[test]
    fn unmapped_key_is_flag_noop() {
        let mut input = InputState::new();
        let out = input.apply_key(b'Q', false, false, false, true);
        assert!(!out.refresh.any());
        assert!(!input.drive_forward && !input.turn_left && !input.lift_up && !input.head_up);
    }

    #[test]
    fn speed_modifier_change_refreshes_everything() {
        let mut input = InputState::new();
        // Shift goes down with an unmapped key: still refreshes all three.
        let out = input.apply_key(b'Q', true, false, false, true);
        assert!(input.go_fast);
        assert_eq!(out.refresh, Refresh::ALL);

        // Same modifiers again: nothing to refresh.
        let out = input.apply_key(b'Q', true, false, false, true);
        assert!(!out.refresh.any());
    }

    #[test]
    fn lift_and_head_keys_touch_only_their_subsystem() {
        let mut input = InputState::new();
        let out = input.apply_key(b'R', false, false, false, true);
        assert!(out.refresh.lift && !out.refresh.driving && !out.refresh.head);

        let out = input.apply_key(b'G', false, false, false, true);
        assert!(out.refresh.head && !out.refresh.driving && !out.refresh.lift);
        assert!(input.lift_up && input.head_down);
    }

    #[test]
    fn digit_release_yields_animation_slot() {
        let mut input = InputState::new();
        // Key-down: no slot yet.
        let out = input.apply_key(b'3', false, false, false, true);
        assert_eq!(out.animation_slot, None);
        // Release: slot 3.
        let out = input.apply_key(b'3', false, false, false, false);
        assert_eq!(out.animation_slot, Some(3));
    }

    #[test]
    fn reset_zeroes_flags_but_keeps_mouse_look_mode() {
        let mut input = InputState::new();
        input.set_mouse_look(true);
        input.apply_key(b'W', true, false, false, true);
        input.mouse_turn_bias = 0.8;

        input.reset();
        assert!(!input.drive_forward && !input.go_fast);
        assert_eq!(input.mouse_turn_bias, 0.0);
        assert!(input.mouse_look_enabled());
    }

    #[test]
    fn disabling_mouse_look_cancels_turn_bias() {
        let mut input = InputState::new();
        input.set_mouse_look(true);
        input.mouse_turn_bias = 1.2;
        assert!(input.set_mouse_look(false));
        assert_eq!(input.mouse_turn_bias, 0.0);
        // No change when already disabled.
        assert!(!input.set_mouse_look(false));
    }

    #[test]
    fn remap_is_linear_and_clamped() {
        assert_eq!(remap_to_range(0.5, 0.0, 1.0, -1.5, 1.5), 0.0);
        assert_eq!(remap_to_range(0.0, 0.0, 1.0, 45.0, -25.0), 45.0);
        assert_eq!(remap_to_range(1.0, 0.0, 1.0, 45.0, -25.0), -25.0);
        // Clamped outside the input range.
        assert_eq!(remap_to_range(-2.0, 0.0, 1.0, -1.5, 1.5), -1.5);
        assert_eq!(remap_to_range(9.0, 0.0, 1.0, -1.5, 1.5), 1.5);
    }
}

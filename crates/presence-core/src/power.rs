//! [`PowerMonitor`] – edge-triggered battery/charging state machine.
//!
//! Polled once per tick with the latest sensor readings; emits an ambient
//! cue only on a state transition so downstream collaborators (lights,
//! sound) are never spammed with steady-state repeats.

use presence_types::AmbientCue;
use tracing::info;

/// Below this pack voltage the rig is considered low on battery.
pub const LOW_BATTERY_VOLTS: f32 = 3.6;

/// Observed power condition, most specific first: being on the charger
/// outranks a low voltage reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    Normal,
    Charging,
    LowBattery,
}

impl PowerState {
    fn cue(self) -> AmbientCue {
        match self {
            PowerState::Normal => AmbientCue::Normal,
            PowerState::Charging => AmbientCue::Charging,
            PowerState::LowBattery => AmbientCue::Danger,
        }
    }
}

/// Tracks the power state across ticks and reports transitions.
#[derive(Debug)]
pub struct PowerMonitor {
    state: PowerState,
}

impl Default for PowerMonitor {
    fn default() -> Self {
        Self {
            state: PowerState::Normal,
        }
    }
}

impl PowerMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PowerState {
        self.state
    }

    /// Fold the latest sensor readings into the state machine.
    ///
    /// Returns the ambient cue for the new state on a transition, `None`
    /// while the state is unchanged.
    pub fn poll(&mut self, on_charger: bool, volts: f32) -> Option<AmbientCue> {
        let next = if on_charger {
            PowerState::Charging
        } else if volts < LOW_BATTERY_VOLTS {
            PowerState::LowBattery
        } else {
            PowerState::Normal
        };
        if next == self.state {
            return None;
        }
        info!(from = ?self.state, to = ?next, volts, "power state changed");
        self.state = next;
        Some(next.cue())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steady_normal_emits_nothing() {
        let mut monitor = PowerMonitor::new();
        for _ in 0..5 {
            assert_eq!(monitor.poll(false, 4.0), None);
        }
        assert_eq!(monitor.state(), PowerState::Normal);
    }

    #[test]
    fn placing_on_charger_fires_once() {
        let mut monitor = PowerMonitor::new();
        assert_eq!(monitor.poll(true, 4.0), Some(AmbientCue::Charging));
        // Steady state: no repeat.
        assert_eq!(monitor.poll(true, 4.0), None);
        assert_eq!(monitor.state(), PowerState::Charging);
    }

    #[test]
    fn low_voltage_maps_to_danger_cue() {
        let mut monitor = PowerMonitor::new();
        assert_eq!(monitor.poll(false, 3.5), Some(AmbientCue::Danger));
        assert_eq!(monitor.poll(false, 3.5), None);
        assert_eq!(monitor.state(), PowerState::LowBattery);
    }

    #[test]
    fn charger_outranks_low_voltage() {
        let mut monitor = PowerMonitor::new();
        // Low battery, then dropped on the charger while still below 3.6 V.
        assert_eq!(monitor.poll(false, 3.4), Some(AmbientCue::Danger));
        assert_eq!(monitor.poll(true, 3.4), Some(AmbientCue::Charging));
        assert_eq!(monitor.state(), PowerState::Charging);
    }

    #[test]
    fn recovery_to_normal_fires_normal_cue() {
        let mut monitor = PowerMonitor::new();
        monitor.poll(true, 3.4);
        // Lifted off the charger with a healthy pack.
        assert_eq!(monitor.poll(false, 3.9), Some(AmbientCue::Normal));
        assert_eq!(monitor.poll(false, 3.9), None);
    }

    #[test]
    fn threshold_is_strictly_below() {
        let mut monitor = PowerMonitor::new();
        // Exactly 3.6 V is still Normal.
        assert_eq!(monitor.poll(false, LOW_BATTERY_VOLTS), None);
        assert_eq!(monitor.state(), PowerState::Normal);
    }
}

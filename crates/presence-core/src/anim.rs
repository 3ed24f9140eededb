//! [`AnimationTable`] – digit-key → animation-name bindings.
//!
//! The robot exposes a few hundred named canned animations, some of which
//! misbehave when triggered out of context (they re-localize, drive blind,
//! or require a cube in view). Those are filtered out up front; the ten
//! digit slots then start with a curated default set and can be rebound at
//! runtime.

use tracing::warn;

/// Animations excluded from triggering: they move the robot unpredictably
/// or stall waiting for objects that are not there.
const EXCLUDED_ANIMATIONS: &[&str] = &[
    "ANIMATION_TEST",
    "ID_AlignToObject_Content_Drive",
    "ID_AlignToObject_Content_Start",
    "ID_AlignToObject_Content_Stop",
    "ID_AlignToObject_Frustrated_Drive",
    "ID_AlignToObject_Frustrated_Start",
    "ID_AlignToObject_Frustrated_Stop",
    "ID_catch_start",
    "ID_end",
    "ID_reactTppl_Surprise",
    "ID_test",
    "ID_wake_openEyes",
    "ID_wake_sleeping",
    "LiftEffortPickup",
    "LiftEffortPlaceHigh",
    "LiftEffortPlaceLow",
    "LiftEffortRoll",
    "soundTestAnim",
    "testSound",
];

/// Default binding for each digit slot 0–9.
const DEFAULT_SLOT_ANIMATIONS: [&str; 10] = [
    "anim_bored_01",
    "anim_freeplay_falloffcliff",
    "id_poked_giggle",
    "anim_pounce_success_02",
    "anim_bored_event_02",
    "anim_bored_event_03",
    "anim_sparking_reacttoface_01",
    "anim_reacttoface_unidentified_02",
    "anim_upgrade_reaction_lift_01",
    "anim_speedtap_wingame_intensity02_01",
];

/// `true` if `name` is safe to trigger from a digit key.
fn is_usable(name: &str) -> bool {
    !EXCLUDED_ANIMATIONS.contains(&name)
}

/// Digit-slot bindings over the robot's usable animation names.
#[derive(Debug)]
pub struct AnimationTable {
    usable: Vec<String>,
    slots: [String; 10],
}

impl AnimationTable {
    /// Build the table from the robot's reported animation names.
    ///
    /// Unsafe names are filtered out and the remainder sorted. Each digit
    /// slot takes its curated default when the robot knows that animation,
    /// falling back to the nth usable name otherwise.
    pub fn new(names: Vec<String>) -> Self {
        let mut usable: Vec<String> = names.into_iter().filter(|n| is_usable(n)).collect();
        usable.sort();

        let slots = std::array::from_fn(|slot| {
            let default = DEFAULT_SLOT_ANIMATIONS[slot];
            if usable.iter().any(|n| n == default) {
                default.to_string()
            } else {
                match usable.get(slot) {
                    Some(name) => {
                        warn!(slot, default, fallback = %name, "default animation unavailable");
                        name.clone()
                    }
                    None => {
                        warn!(slot, default, "no animation available for slot");
                        String::new()
                    }
                }
            }
        });

        Self { usable, slots }
    }

    /// The animation bound to digit `slot`, if any.
    pub fn for_slot(&self, slot: usize) -> Option<&str> {
        self.slots
            .get(slot)
            .map(String::as_str)
            .filter(|name| !name.is_empty())
    }

    /// Rebind digit `slot` to a usable animation name.
    pub fn assign(&mut self, slot: usize, name: &str) -> bool {
        if slot >= self.slots.len() || !self.usable.iter().any(|n| n == name) {
            return false;
        }
        self.slots[slot] = name.to_string();
        true
    }

    /// All usable animation names, sorted.
    pub fn usable(&self) -> &[String] {
        &self.usable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(extra: &[&str]) -> Vec<String> {
        DEFAULT_SLOT_ANIMATIONS
            .iter()
            .chain(extra)
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn defaults_bind_when_available() {
        let table = AnimationTable::new(names(&[]));
        for (slot, default) in DEFAULT_SLOT_ANIMATIONS.iter().enumerate() {
            assert_eq!(table.for_slot(slot), Some(*default));
        }
    }

    #[test]
    fn excluded_animations_are_filtered_out() {
        let table = AnimationTable::new(names(&[
            "ANIMATION_TEST",
            "LiftEffortPickup",
            "ID_wake_sleeping",
            "anim_keepalive_eyes_01",
        ]));
        assert!(!table.usable().iter().any(|n| n == "ANIMATION_TEST"));
        assert!(!table.usable().iter().any(|n| n == "LiftEffortPickup"));
        assert!(!table.usable().iter().any(|n| n == "ID_wake_sleeping"));
        assert!(table.usable().iter().any(|n| n == "anim_keepalive_eyes_01"));
    }

    #[test]
    fn missing_default_falls_back_to_nth_usable() {
        // Robot only knows three animations, none of them defaults.
        let table = AnimationTable::new(vec![
            "anim_alpha".to_string(),
            "anim_beta".to_string(),
            "anim_gamma".to_string(),
        ]);
        assert_eq!(table.for_slot(0), Some("anim_alpha"));
        assert_eq!(table.for_slot(2), Some("anim_gamma"));
        // No fourth usable name: slot is unbound.
        assert_eq!(table.for_slot(3), None);
    }

    #[test]
    fn assign_rejects_unknown_names_and_bad_slots() {
        let mut table = AnimationTable::new(names(&["anim_extra"]));
        assert!(table.assign(4, "anim_extra"));
        assert_eq!(table.for_slot(4), Some("anim_extra"));

        assert!(!table.assign(4, "anim_not_loaded"));
        assert!(!table.assign(10, "anim_extra"));
        assert_eq!(table.for_slot(4), Some("anim_extra"));
    }

    #[test]
    fn out_of_range_slot_is_none() {
        let table = AnimationTable::new(names(&[]));
        assert_eq!(table.for_slot(10), None);
    }
}

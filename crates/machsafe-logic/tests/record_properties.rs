//! Property tests for the safety record's episode and throttle rules.
//!
//! All tests are pure logic - no world, no collaborators.

use std::collections::HashSet;
use std::time::Duration;

use machsafe_logic::{SafetyConfig, SafetyRecord, Warning};
use proptest::prelude::*;

fn record_with_budget(seconds: f32) -> SafetyRecord {
    SafetyRecord::from_config(&SafetyConfig::default().with_max_overheat_seconds(seconds))
}

proptest! {
    #[test]
    fn elapsed_counts_one_per_tick(ticks in 1usize..800) {
        let mut r = SafetyRecord::default();
        r.begin_overheat();
        for i in 1..=ticks {
            r.accumulate_overheat();
            prop_assert_eq!(r.overheat_elapsed(), Duration::from_secs(i as u64));
        }
        prop_assert_eq!(r.overheat_expired(), ticks > 600);
    }

    #[test]
    fn warnings_fire_once_and_stay_set(budget in 1.0f32..900.0, ticks in 1usize..1000) {
        let mut r = record_with_budget(budget.floor());
        r.begin_overheat();
        let mut seen = HashSet::new();
        let mut fired_before = 0;
        for _ in 0..ticks {
            r.accumulate_overheat();
            if let Some(w) = r.take_due_warning() {
                prop_assert!(seen.insert(w), "{:?} fired twice", w);
            }
            let fired = r.warnings().fired();
            prop_assert!(fired >= fired_before);
            prop_assert!(fired - fired_before <= 1);
            fired_before = fired;
        }
    }

    #[test]
    fn warnings_fire_in_ladder_order(budget in 1u32..900, ticks in 1usize..1000) {
        let mut r = record_with_budget(budget as f32);
        r.begin_overheat();
        let mut order = Vec::new();
        for _ in 0..ticks {
            r.accumulate_overheat();
            if let Some(w) = r.take_due_warning() {
                order.push(w);
            }
        }
        let expected: Vec<Warning> = Warning::LADDER.iter().copied().take(order.len()).collect();
        prop_assert_eq!(order, expected);
    }

    #[test]
    fn claimed_alerts_are_ten_seconds_apart(gaps in prop::collection::vec(0u64..25, 1..200)) {
        let mut r = SafetyRecord::default();
        let mut now = Duration::ZERO;
        let mut claimed = Vec::new();
        for gap in gaps {
            now += Duration::from_secs(gap);
            if r.try_claim_alert(now) {
                claimed.push(now);
            }
        }
        prop_assert!(!claimed.is_empty());
        for pair in claimed.windows(2) {
            prop_assert!(pair[1] - pair[0] >= Duration::from_secs(10));
        }
    }

    #[test]
    fn ending_an_episode_always_resets(ticks in 0usize..700) {
        let mut r = record_with_budget(600.0);
        r.begin_overheat();
        for _ in 0..ticks {
            r.accumulate_overheat();
            r.take_due_warning();
        }
        r.end_overheat();
        prop_assert!(!r.is_overheating());
        prop_assert_eq!(r.overheat_elapsed(), Duration::ZERO);
        prop_assert!(!r.warnings().any());
    }
}

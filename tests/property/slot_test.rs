// tests/property/slot_test.rs

//! Property-based tests for the single-assignment identity slot.

use helloprint::core::fingerprint::{IdentitySlot, SlotHandle};
use proptest::prelude::*;
use std::sync::Arc;

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 100,
        ..ProptestConfig::default()
    })]

    #[test]
    fn test_only_the_first_write_ever_lands(
        values in prop::collection::vec("[ -~]{0,64}", 1..=20)
    ) {
        let slot = IdentitySlot::new();
        let expected = values[0].clone();

        for (i, value) in values.iter().enumerate() {
            let wrote = slot.try_set(value.clone());
            prop_assert_eq!(wrote, i == 0);
            prop_assert_eq!(slot.get(), Some(expected.as_str()));
        }
    }

    #[test]
    fn test_concurrent_writers_agree_on_one_value(
        values in prop::collection::hash_set("[a-z0-9]{1,16}", 2..=8)
    ) {
        let slot = Arc::new(IdentitySlot::new());
        let values: Vec<String> = values.into_iter().collect();

        let threads: Vec<_> = values
            .iter()
            .cloned()
            .map(|value| {
                let slot = slot.clone();
                std::thread::spawn(move || (value.clone(), slot.try_set(value)))
            })
            .collect();
        let results: Vec<(String, bool)> =
            threads.into_iter().map(|t| t.join().unwrap()).collect();

        // Exactly one writer won, and the stored value is that writer's.
        let winners: Vec<&String> = results
            .iter()
            .filter(|(_, wrote)| *wrote)
            .map(|(v, _)| v)
            .collect();
        prop_assert_eq!(winners.len(), 1);
        prop_assert_eq!(slot.get(), Some(winners[0].as_str()));
    }

    #[test]
    fn test_every_handle_clone_observes_the_same_slot(clones in 1usize..16) {
        let handle = SlotHandle::new();
        let first = handle.get_or_create();

        for _ in 0..clones {
            let clone = handle.clone();
            prop_assert!(Arc::ptr_eq(&clone.get_or_create(), &first));
        }
    }
}

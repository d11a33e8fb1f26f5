use proptest::prelude::*;

/// Property-based invariants of the oximetry pipeline under arbitrary input.

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::OximeterConfig;
    use crate::oximeter::{HeartRateData, PulseOximeter};
    use crate::window::SAMPLE_MASK;

    fn feed(samples: &[(u32, u32)]) -> PulseOximeter<ManualClock> {
        let clock = ManualClock::new(1);
        let mut ox = PulseOximeter::with_clock(OximeterConfig::default(), clock.clone());
        for &(red, ir) in samples {
            clock.advance(10);
            ox.add_sample(red, ir);
        }
        ox
    }

    // =========================================================================
    // Output ranges
    // =========================================================================
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn test_outputs_stay_in_range(
            samples in prop::collection::vec((any::<u32>(), any::<u32>()), 100..400)
        ) {
            let ox = feed(&samples);
            let r = ox.readings();

            prop_assert!((0.0..=100.0).contains(&r.signal_quality));
            prop_assert!(r.spo2 == 0.0 || (70.0..=100.0).contains(&r.spo2),
                "spo2 out of range: {}", r.spo2);
            prop_assert!(r.heart_rate == 0.0 || (40.0..=200.0).contains(&r.heart_rate),
                "bpm out of range: {}", r.heart_rate);
            prop_assert!(!r.valid_reading || r.finger_detected);
        }

        #[test]
        fn test_masked_window_stats(
            samples in prop::collection::vec((any::<u32>(), any::<u32>()), 100..150)
        ) {
            let d = feed(&samples).diagnostics();
            prop_assert!(d.ir.max <= SAMPLE_MASK);
            prop_assert!(d.red.max <= SAMPLE_MASK);
            prop_assert!(d.ir.min <= d.ir.mean && d.ir.mean <= d.ir.max);
        }
    }

    // =========================================================================
    // Fill invariant
    // =========================================================================
    proptest! {
        #[test]
        fn test_never_valid_before_fill(
            samples in prop::collection::vec((0u32..=SAMPLE_MASK, 0u32..=SAMPLE_MASK), 0..100)
        ) {
            let ox = feed(&samples);
            prop_assert!(!ox.is_ready());
            prop_assert_eq!(ox.readings(), HeartRateData::default());
        }
    }

    // =========================================================================
    // Reset idempotence
    // =========================================================================
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn test_reset_restores_initial_state(
            samples in prop::collection::vec((0u32..=SAMPLE_MASK, 0u32..=SAMPLE_MASK), 0..300),
            resets in 1usize..4
        ) {
            let mut ox = feed(&samples);
            for _ in 0..resets {
                ox.reset();
            }
            prop_assert!(!ox.is_ready());
            prop_assert_eq!(ox.readings(), HeartRateData::default());
            prop_assert_eq!(ox.diagnostics().beat.peak_count, 0);
        }
    }
}

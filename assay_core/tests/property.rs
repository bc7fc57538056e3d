use assay_core::{Analyte, Cartridge, Sample, Severity, classify, synthesize};
use assay_traits::SystemEntropy;
use proptest::prelude::*;

fn sample(v: f64) -> Sample {
    Sample {
        timestamp_ms: 0,
        current_ua: 1.2,
        temperature_c: 36.5,
        raw_value: v,
        processed_value: v,
    }
}

proptest! {
    // The three severity regions tile the value line exactly as the policy
    // states, for every analyte.
    #[test]
    fn classifier_partitions_the_value_line(
        value in -50.0f64..2000.0,
        kind_idx in 0usize..Analyte::ALL.len(),
    ) {
        let kind = Analyte::ALL[kind_idx];
        let r = kind.reference();
        let m = classify(&[sample(value)], r).unwrap();

        let v = m.value;
        let expected = if v >= r.min && v <= r.max {
            Severity::Normal
        } else if v < r.min * 0.8 || v > r.max * 1.2 {
            Severity::Critical
        } else {
            Severity::Warning
        };
        prop_assert_eq!(m.status, expected);
        // One-decimal quantization.
        prop_assert!((v * 10.0 - (v * 10.0).round()).abs() < 1e-6);
    }

    #[test]
    fn classifier_value_is_the_rounded_mean(
        values in prop::collection::vec(0.0f64..500.0, 1..64),
    ) {
        let batch: Vec<Sample> = values.iter().copied().map(sample).collect();
        let m = classify(&batch, Analyte::Food.reference()).unwrap();

        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let rounded = (mean * 10.0).round() / 10.0;
        prop_assert!((m.value - rounded).abs() < 1e-9);
    }

    #[test]
    fn generator_respects_its_envelope(seed in any::<u64>(), step in 0u64..512) {
        let entropy = SystemEntropy::with_seed(seed);
        let s = synthesize(step, 0, &entropy);

        // Carrier 85 ± 15 plus noise ± 4.
        prop_assert!((66.0..=104.0).contains(&s.raw_value));
        prop_assert!((1.0..=1.5).contains(&s.current_ua));
        prop_assert!((36.0..=37.0).contains(&s.temperature_c));
        prop_assert_eq!(s.processed_value, (s.raw_value * 10.0).round() / 10.0);
    }

    #[test]
    fn minted_cartridges_stay_in_bounds(seed in any::<u64>()) {
        let entropy = SystemEntropy::with_seed(seed);
        let c = Cartridge::mint(&entropy, chrono::Utc::now());

        prop_assert!((5..=15).contains(&c.uses_remaining));
        prop_assert_eq!(c.lot.len(), 12);
        prop_assert_eq!(c.calibration_code.len(), 6);
        prop_assert!(!c.is_depleted());
    }
}

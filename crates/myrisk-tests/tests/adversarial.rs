//! Property-based tests over hostile numeric inputs.
//!
//! Inputs mix huge magnitudes, NaN and infinities, constant columns and tiny
//! samples. The engine must stay total: no panics, bounded finite outputs,
//! and errors only for the documented contract violations.

use myrisk_core::types::{ClaimRecord, FeatureColumn, FeatureMatrix};
use myrisk_engine::{
    combine_scores, compute_family_scores, detect_provider_outliers, explain_scores,
    rank_provider_outliers, robust_z,
};
use proptest::prelude::*;

fn cell() -> impl Strategy<Value = f64> {
    prop_oneof![
        8 => -1e6f64..1e6,
        1 => Just(f64::NAN),
        1 => Just(f64::INFINITY),
        1 => Just(0.0),
    ]
}

fn matrix() -> impl Strategy<Value = FeatureMatrix> {
    (0usize..30, 1usize..5).prop_flat_map(|(rows, cols)| {
        proptest::collection::vec(proptest::collection::vec(cell(), rows), cols).prop_map(
            |columns| {
                let columns = columns
                    .into_iter()
                    .enumerate()
                    .map(|(i, values)| FeatureColumn::new(format!("c{i}"), values))
                    .collect();
                FeatureMatrix::new(columns).expect("generated columns share a length")
            },
        )
    })
}

fn claims() -> impl Strategy<Value = Vec<ClaimRecord>> {
    proptest::collection::vec((0u64..8, 0f64..1e5), 0..60)
        .prop_map(|v| v.into_iter().map(|(p, a)| ClaimRecord::new(p, a)).collect())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn family_scores_are_total_and_bounded(m in matrix()) {
        let scores = compute_family_scores(&m);
        prop_assert_eq!(scores.len(), 3);
        for s in scores.values() {
            prop_assert!(s.score.is_finite() && (0.0..=100.0).contains(&s.score));
            prop_assert!((0.0..=1.0).contains(&s.confidence));
        }
        let c = combine_scores(&scores);
        prop_assert!((0.0..=100.0).contains(&c.score));
        prop_assert!(c.confidence <= 0.9);
    }

    #[test]
    fn explanations_are_finite_and_ranked(m in matrix()) {
        let e = explain_scores(&m);
        prop_assert!(e.drivers.len() <= 10);
        prop_assert_eq!(e.drivers.len(), e.rationales.len());
        for pair in e.drivers.windows(2) {
            prop_assert!(pair[0].strength >= pair[1].strength);
        }
        prop_assert!(e.drivers.iter().all(|d| d.strength.is_finite()));
    }

    #[test]
    fn robust_z_is_always_finite(values in proptest::collection::vec(cell(), 0..50)) {
        prop_assert!(robust_z(&values).iter().all(|z| z.is_finite()));
    }

    #[test]
    fn provider_scores_cover_every_provider(claims in claims()) {
        let scores = detect_provider_outliers(&claims).unwrap();
        let mut ids: Vec<_> = claims.iter().map(|c| c.provider_id.clone()).collect();
        ids.sort();
        ids.dedup();
        prop_assert_eq!(scores.len(), ids.len());
        prop_assert!(scores.iter().all(|s| (0.0..=100.0).contains(&s.score)));

        let ranked = rank_provider_outliers(scores, 3);
        prop_assert!(ranked.len() <= 3);
        for pair in ranked.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn any_non_finite_amount_is_rejected(
        mut claims in claims(),
        bad in prop_oneof![Just(f64::NAN), Just(f64::INFINITY), Just(f64::NEG_INFINITY)],
    ) {
        claims.push(ClaimRecord::new(99u64, bad));
        let err = detect_provider_outliers(&claims).unwrap_err();
        prop_assert_eq!(err.field(), "claim_amount");
    }
}

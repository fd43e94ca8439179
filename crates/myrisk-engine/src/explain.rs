//! Driver explanation.
//!
//! Uses plain mean/standard-deviation z-scores, not the robust z-scores the
//! scorers use: `z = (x - mean) / (std + 1e-6)` with sample standard
//! deviation. A feature's strength is its mean `|z|` over finite cells.

use std::cmp::Reverse;

use myrisk_core::constants::{DRIVER_TOP_N, EXPLAIN_EPSILON, NOTABLE_DRIVER_Z, STRONG_DRIVER_Z};
use myrisk_core::types::{DriverEntry, Explanation, FeatureMatrix};
use ordered_float::OrderedFloat;

/// Mean and sample standard deviation. Fewer than two values gives a
/// standard deviation of 0.
fn mean_std(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if values.len() < 2 {
        return (mean, 0.0);
    }
    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / (n - 1.0);
    (mean, var.sqrt())
}

/// Mean absolute standard z of one column, or `None` if the column has no
/// finite values.
///
/// Columns whose moments overflow are standardized after dividing by their
/// largest magnitude, with the epsilon scaled to match, so the result is the
/// same z the unscaled formula would give.
pub fn driver_strength(values: &[f64]) -> Option<f64> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return None;
    }

    let (mut mean, mut std) = mean_std(&finite);
    let mut scale = 1.0;
    if !(mean.is_finite() && std.is_finite()) {
        scale = finite.iter().fold(0.0f64, |m, v| m.max(v.abs()));
        let scaled: Vec<f64> = finite.iter().map(|v| v / scale).collect();
        (mean, std) = mean_std(&scaled);
    }

    let denom = std + EXPLAIN_EPSILON / scale;
    let z: Vec<f64> = finite
        .iter()
        .map(|v| ((v / scale - mean) / denom).abs())
        .filter(|z| z.is_finite())
        .collect();
    if z.is_empty() {
        return None;
    }
    Some(z.iter().sum::<f64>() / z.len() as f64)
}

/// Plain-language gloss for a driver strength.
pub fn rationale(driver: &DriverEntry) -> String {
    let gloss = if driver.strength >= STRONG_DRIVER_Z {
        "is driving risk strongly"
    } else if driver.strength >= NOTABLE_DRIVER_Z {
        "is a notable risk factor"
    } else {
        "has a mild influence"
    };
    format!("{} {} (|z|~{:.1}).", driver.feature, gloss, driver.strength)
}

/// Rank features by strength and keep the strongest `top_n`.
///
/// Ties are broken by feature name. Columns with no finite values are not
/// drivers. An empty matrix yields an empty explanation.
pub fn explain_top(matrix: &FeatureMatrix, top_n: usize) -> Explanation {
    if matrix.is_empty() {
        return Explanation::default();
    }

    let mut drivers: Vec<DriverEntry> = matrix
        .columns()
        .iter()
        .filter_map(|c| {
            driver_strength(&c.values).map(|strength| DriverEntry { feature: c.name.clone(), strength })
        })
        .collect();
    drivers.sort_by(|a, b| {
        Reverse(OrderedFloat(a.strength))
            .cmp(&Reverse(OrderedFloat(b.strength)))
            .then_with(|| a.feature.cmp(&b.feature))
    });
    drivers.truncate(top_n);

    let rationales = drivers.iter().map(rationale).collect();
    Explanation { drivers, rationales }
}

/// Explain `matrix` with the default top 10 drivers.
pub fn explain_scores(matrix: &FeatureMatrix) -> Explanation {
    explain_top(matrix, DRIVER_TOP_N)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(feature: &str, strength: f64) -> DriverEntry {
        DriverEntry { feature: feature.to_string(), strength }
    }

    // --- strengths ---

    #[test]
    fn constant_column_has_zero_strength() {
        assert_eq!(driver_strength(&[5.0; 10]), Some(0.0));
    }

    #[test]
    fn single_value_has_zero_strength() {
        assert_eq!(driver_strength(&[5.0]), Some(0.0));
    }

    #[test]
    fn all_nan_column_is_not_a_driver() {
        assert_eq!(driver_strength(&[f64::NAN, f64::NAN]), None);
    }

    #[test]
    fn two_point_strength() {
        // mean 1, sample std sqrt(2), |z| = 1/sqrt(2) for both
        let s = driver_strength(&[0.0, 2.0]).unwrap();
        assert!((s - 1.0 / 2f64.sqrt()).abs() < 1e-5);
    }

    #[test]
    fn extreme_magnitudes_keep_a_finite_strength() {
        let s = driver_strength(&[f64::MAX, -f64::MAX, 0.0, 0.0]).unwrap();
        assert!(s.is_finite() && s > 0.0);
        // same shape at ordinary scale
        let t = driver_strength(&[1.0, -1.0, 0.0, 0.0]).unwrap();
        assert!((s - t).abs() < 1e-5);
    }

    // --- rationales ---

    #[test]
    fn rationale_thresholds() {
        assert_eq!(rationale(&entry("debt", 3.0)), "debt is driving risk strongly (|z|~3.0).");
        assert_eq!(rationale(&entry("debt", 2.04)), "debt is a notable risk factor (|z|~2.0).");
        assert_eq!(rationale(&entry("debt", 0.26)), "debt has a mild influence (|z|~0.3).");
    }

    // --- explain ---

    #[test]
    fn empty_matrix_explains_nothing() {
        let e = explain_scores(&FeatureMatrix::empty());
        assert!(e.drivers.is_empty());
        assert!(e.rationales.is_empty());
    }

    #[test]
    fn spike_outranks_constant() {
        let mut spike = vec![1.0; 20];
        spike[13] = 500.0;
        let m = FeatureMatrix::from_pairs([("flat", vec![1.0; 20]), ("spike", spike)]).unwrap();
        let e = explain_scores(&m);
        assert_eq!(e.drivers[0].feature, "spike");
        assert!(e.drivers[0].strength > e.drivers[1].strength);
        assert_eq!(e.rationales.len(), e.drivers.len());
    }

    #[test]
    fn ties_break_by_name() {
        let m = FeatureMatrix::from_pairs([("b", vec![1.0, 2.0]), ("a", vec![1.0, 2.0])]).unwrap();
        let names: Vec<_> = explain_scores(&m).drivers.into_iter().map(|d| d.feature).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn keeps_top_n() {
        let cols: Vec<(String, Vec<f64>)> = (0..15)
            .map(|i| (format!("f{i:02}"), vec![0.0, i as f64]))
            .collect();
        let m = FeatureMatrix::from_pairs(cols).unwrap();
        assert_eq!(explain_scores(&m).drivers.len(), 10);
        assert_eq!(explain_top(&m, 3).rationales.len(), 3);
    }

    #[test]
    fn overflowing_column_still_ranks() {
        let mut spike = vec![1e308; 30];
        spike[3] = -1e308;
        let m = FeatureMatrix::from_pairs([("constant", vec![10.0; 30]), ("spike", spike)]).unwrap();
        let e = explain_scores(&m);
        assert_eq!(e.drivers.len(), 2);
        assert_eq!(e.drivers[0].feature, "spike");
        assert!(e.drivers[0].strength > 0.0);
    }

    #[test]
    fn dead_columns_are_skipped() {
        let m = FeatureMatrix::from_pairs([
            ("dead", vec![f64::NAN; 4]),
            ("live", vec![1.0, 2.0, 3.0, 10.0]),
        ])
        .unwrap();
        let e = explain_scores(&m);
        assert_eq!(e.drivers.len(), 1);
        assert_eq!(e.drivers[0].feature, "live");
    }
}

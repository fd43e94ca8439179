//! Confidence-weighted combination of family scores.

use myrisk_core::constants::{clamp_score, COMBINED_CONFIDENCE_CAP, EMPTY_COMBINED};
use myrisk_core::error::InputError;
use myrisk_core::types::{CombinedIndex, FamilyScore, FamilyScores, FamilyWeights};

/// Combine family scores into one index.
///
/// `score = Σ(score·conf) / Σconf` and `confidence = min(0.9, Σconf / n)`.
/// A zero confidence total is replaced by 1.0 in both formulas. No families
/// at all yields the fixed default `(45, 0.5)`.
///
/// # Examples
///
/// ```
/// use myrisk_core::types::{FamilyScore, FamilyScores, RiskFamily};
/// use myrisk_engine::combine_scores;
///
/// let scores = FamilyScores::from([
///     (RiskFamily::FinancialHealth, FamilyScore::new(80.0, 0.9)),
///     (RiskFamily::ComplianceReputation, FamilyScore::new(20.0, 0.1)),
/// ]);
/// let combined = combine_scores(&scores);
/// assert!((combined.score - 74.0).abs() < 1e-9);
/// assert_eq!(combined.confidence, 0.5);
/// ```
pub fn combine_scores(scores: &FamilyScores) -> CombinedIndex {
    if scores.is_empty() {
        let (score, confidence) = EMPTY_COMBINED;
        return CombinedIndex { score, confidence };
    }

    let numerator: f64 = scores.values().map(|s| s.score * s.confidence).sum();
    let total: f64 = scores.values().map(|s| s.confidence).sum();
    let denominator = if total == 0.0 { 1.0 } else { total };

    CombinedIndex {
        score: clamp_score(numerator / denominator),
        confidence: (denominator / scores.len() as f64).min(COMBINED_CONFIDENCE_CAP),
    }
}

/// Apply what-if multipliers to each family's score, clamping the result.
///
/// Confidences are left untouched. Factors must be finite and
/// non-negative.
pub fn apply_weights(
    scores: &FamilyScores,
    weights: &FamilyWeights,
) -> Result<FamilyScores, InputError> {
    scores
        .iter()
        .map(|(family, s)| {
            let factor = weights.factor(*family);
            if !factor.is_finite() || factor < 0.0 {
                return Err(InputError::invalid(
                    format!("weights.{}", family.label()),
                    format!("factor must be finite and >= 0, got {factor}"),
                ));
            }
            Ok((*family, FamilyScore::new(s.score * factor, s.confidence)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use myrisk_core::types::RiskFamily;
    use proptest::prelude::*;

    fn scores(entries: &[(RiskFamily, f64, f64)]) -> FamilyScores {
        entries.iter().map(|(f, s, c)| (*f, FamilyScore::new(*s, *c))).collect()
    }

    #[test]
    fn empty_is_default() {
        let c = combine_scores(&FamilyScores::new());
        assert_eq!(c, CombinedIndex { score: 45.0, confidence: 0.5 });
    }

    #[test]
    fn weighted_mean() {
        let c = combine_scores(&scores(&[
            (RiskFamily::FinancialHealth, 80.0, 0.9),
            (RiskFamily::OperationalOutlier, 20.0, 0.1),
        ]));
        assert!((c.score - 74.0).abs() < 1e-9);
        assert!((c.confidence - 0.5).abs() < 1e-12);
    }

    #[test]
    fn confidence_is_capped() {
        let c = combine_scores(&scores(&[
            (RiskFamily::FinancialHealth, 10.0, 1.0),
            (RiskFamily::ComplianceReputation, 30.0, 1.0),
        ]));
        assert_eq!(c.confidence, 0.9);
        assert_eq!(c.score, 20.0);
    }

    #[test]
    fn zero_confidence_uses_unit_denominator() {
        let c = combine_scores(&scores(&[
            (RiskFamily::FinancialHealth, 60.0, 0.0),
            (RiskFamily::ComplianceReputation, 90.0, 0.0),
        ]));
        assert_eq!(c.score, 0.0);
        assert_eq!(c.confidence, 0.5);
    }

    #[test]
    fn default_family_scores_combine_to_known_value() {
        // (40*0.5 + 35*0.5 + 50*0.5) / 1.5
        let c = combine_scores(&scores(&[
            (RiskFamily::FinancialHealth, 40.0, 0.5),
            (RiskFamily::ComplianceReputation, 35.0, 0.5),
            (RiskFamily::OperationalOutlier, 50.0, 0.5),
        ]));
        assert!((c.score - 125.0 / 3.0).abs() < 1e-9);
        assert_eq!(c.confidence, 0.5);
    }

    // --- apply_weights ---

    #[test]
    fn identity_weights_change_nothing() {
        let s = scores(&[(RiskFamily::FinancialHealth, 42.0, 0.65)]);
        assert_eq!(apply_weights(&s, &FamilyWeights::default()).unwrap(), s);
    }

    #[test]
    fn weights_scale_and_clamp() {
        let s = scores(&[
            (RiskFamily::FinancialHealth, 60.0, 0.65),
            (RiskFamily::ComplianceReputation, 30.0, 0.6),
        ]);
        let w = FamilyWeights { financial: 2.0, compliance: 0.5, ..FamilyWeights::default() };
        let out = apply_weights(&s, &w).unwrap();
        assert_eq!(out[&RiskFamily::FinancialHealth], FamilyScore::new(100.0, 0.65));
        assert_eq!(out[&RiskFamily::ComplianceReputation], FamilyScore::new(15.0, 0.6));
    }

    #[test]
    fn negative_weight_is_rejected() {
        let s = scores(&[(RiskFamily::OperationalOutlier, 50.0, 0.6)]);
        let w = FamilyWeights { operational: -1.0, ..FamilyWeights::default() };
        let err = apply_weights(&s, &w).unwrap_err();
        assert_eq!(err.field(), "weights.Operational and Outlier Risk");
    }

    #[test]
    fn weight_for_absent_family_is_ignored() {
        let s = scores(&[(RiskFamily::FinancialHealth, 50.0, 0.6)]);
        let w = FamilyWeights { provider: f64::NAN, ..FamilyWeights::default() };
        assert!(apply_weights(&s, &w).is_ok());
    }

    proptest! {
        #[test]
        fn bounded(
            entries in proptest::collection::vec((0f64..=100.0, 0f64..=1.0), 0..4),
        ) {
            let s: FamilyScores = RiskFamily::MATRIX_FAMILIES
                .into_iter()
                .chain([RiskFamily::ProviderBillingOutlier])
                .zip(entries)
                .map(|(f, (score, conf))| (f, FamilyScore::new(score, conf)))
                .collect();
            let c = combine_scores(&s);
            prop_assert!((0.0..=100.0).contains(&c.score));
            prop_assert!((0.0..=0.9).contains(&c.confidence));
        }
    }
}

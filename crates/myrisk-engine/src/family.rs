//! Family score composition.
//!
//! Each matrix family is scored by exactly one [`AnomalyScorer`] and paired
//! with a fixed confidence. The composer only sees the trait, so scorers can
//! be swapped without touching composition.

use myrisk_core::constants::{EMPTY_COMPLIANCE, EMPTY_FINANCIAL, EMPTY_OPERATIONAL};
use myrisk_core::traits::AnomalyScorer;
use myrisk_core::types::{FamilyScore, FamilyScores, FeatureMatrix, RiskFamily};
use tracing::debug;

use crate::config::EngineConfig;

struct FamilySlot {
    family: RiskFamily,
    scorer: Box<dyn AnomalyScorer>,
    confidence: f64,
    empty_default: (f64, f64),
}

/// Maps a feature matrix to the three matrix risk families.
pub struct FamilyComposer {
    slots: Vec<FamilySlot>,
    seed: u64,
}

impl FamilyComposer {
    /// Default wiring: top-k deviation for financial health, density for
    /// compliance, isolation forest for operational risk.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::with_scorers(
            [
                (Box::new(config.topk()) as Box<dyn AnomalyScorer>, config.financial_confidence),
                (Box::new(config.density()) as Box<dyn AnomalyScorer>, config.compliance_confidence),
                (Box::new(config.isolation()) as Box<dyn AnomalyScorer>, config.operational_confidence),
            ],
            config.seed,
        )
    }

    /// Wire custom scorers, in financial / compliance / operational order.
    pub fn with_scorers(scorers: [(Box<dyn AnomalyScorer>, f64); 3], seed: u64) -> Self {
        let defaults = [EMPTY_FINANCIAL, EMPTY_COMPLIANCE, EMPTY_OPERATIONAL];
        let slots = RiskFamily::MATRIX_FAMILIES
            .into_iter()
            .zip(scorers)
            .zip(defaults)
            .map(|((family, (scorer, confidence)), empty_default)| FamilySlot {
                family,
                scorer,
                confidence,
                empty_default,
            })
            .collect();
        Self { slots, seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Score every family. An empty matrix (no columns or no rows) yields
    /// the fixed per-family defaults without running any scorer.
    pub fn compose(&self, matrix: &FeatureMatrix) -> FamilyScores {
        if matrix.is_empty() {
            debug!(cols = matrix.n_cols(), rows = matrix.n_rows(), "compose: empty matrix, using defaults");
            return self
                .slots
                .iter()
                .map(|slot| (slot.family, FamilyScore::from(slot.empty_default)))
                .collect();
        }

        self.slots
            .iter()
            .map(|slot| {
                let score = slot.scorer.score(matrix, self.seed);
                debug!(family = %slot.family, scorer = slot.scorer.name(), score, "compose: family scored");
                (slot.family, FamilyScore::new(score, slot.confidence))
            })
            .collect()
    }
}

impl Default for FamilyComposer {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

/// Family scores of `matrix` under the default calibration.
pub fn compute_family_scores(matrix: &FeatureMatrix) -> FamilyScores {
    FamilyComposer::default().compose(matrix)
}

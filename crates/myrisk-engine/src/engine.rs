//! Engine facade.
//!
//! [`RiskEngine`] binds one [`EngineConfig`] to every operation and
//! assembles the full [`RiskReport`]. It holds no state beyond the
//! calibration, so one instance can serve concurrent callers.

use myrisk_core::error::InputError;
use myrisk_core::types::{
    ClaimRecord, CombinedIndex, Explanation, FamilyScores, FamilyWeights, FeatureMatrix,
    ProviderOutlierScore, RiskFamily, RiskReport,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::combine::{apply_weights, combine_scores};
use crate::config::EngineConfig;
use crate::explain::explain_top;
use crate::family::FamilyComposer;
use crate::provider::{provider_family_score_with, rank_provider_outliers, ProviderOutlierDetector};
use crate::recency::recency_score;

/// Everything [`RiskEngine::assess`] needs for one organization and period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssessmentInput {
    pub features: FeatureMatrix,
    /// Per-claim records; empty means no provider family.
    #[serde(default)]
    pub claims: Vec<ClaimRecord>,
    /// Event ages in days; `None` means no recency score.
    #[serde(default)]
    pub event_ages_days: Option<Vec<f64>>,
    #[serde(default)]
    pub weights: FamilyWeights,
}

/// Stateless risk engine over a fixed calibration.
pub struct RiskEngine {
    config: EngineConfig,
    composer: FamilyComposer,
    detector: ProviderOutlierDetector,
}

impl RiskEngine {
    /// Create an engine after validating `config`.
    pub fn new(config: EngineConfig) -> Result<Self, InputError> {
        config.validate()?;
        let composer = FamilyComposer::from_config(&config);
        let detector = ProviderOutlierDetector::new(config.provider_score_scale);
        Ok(Self { config, composer, detector })
    }

    /// Use a custom family composer, e.g. one wired with alternative
    /// scorers.
    pub fn with_composer(mut self, composer: FamilyComposer) -> Self {
        self.composer = composer;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn compute_family_scores(&self, matrix: &FeatureMatrix) -> FamilyScores {
        self.composer.compose(matrix)
    }

    pub fn combine_scores(&self, scores: &FamilyScores) -> CombinedIndex {
        combine_scores(scores)
    }

    pub fn explain_scores(&self, matrix: &FeatureMatrix) -> Explanation {
        explain_top(matrix, self.config.driver_top_n)
    }

    pub fn detect_provider_outliers(
        &self,
        claims: &[ClaimRecord],
    ) -> Result<Vec<ProviderOutlierScore>, InputError> {
        self.detector.detect(claims)
    }

    /// Provider scores ranked highest first, capped at the configured top-N.
    pub fn top_provider_outliers(
        &self,
        claims: &[ClaimRecord],
    ) -> Result<Vec<ProviderOutlierScore>, InputError> {
        Ok(rank_provider_outliers(self.detector.detect(claims)?, self.config.provider_top_n))
    }

    pub fn recency_score(&self, ages_days: &[f64]) -> Result<f64, InputError> {
        recency_score(ages_days, self.config.recency_lambda)
    }

    /// Assemble a full report.
    ///
    /// Matrix families are always present. The provider family joins the
    /// combination only when claims are supplied. Weights apply to every
    /// family before combining; event recency is reported alongside and
    /// does not enter the combined index.
    pub fn assess(&self, input: &AssessmentInput) -> Result<RiskReport, InputError> {
        let mut families = self.composer.compose(&input.features);

        let provider_scores = self.detector.detect(&input.claims)?;
        let provider_family =
            provider_family_score_with(&provider_scores, self.config.provider_confidence);
        if let Some(score) = provider_family {
            families.insert(RiskFamily::ProviderBillingOutlier, score);
        }

        if !input.weights.is_identity() {
            debug!(weights = ?input.weights, "assess: applying what-if weights");
        }
        let families = apply_weights(&families, &input.weights)?;
        let combined = combine_scores(&families);

        let event_recency = input
            .event_ages_days
            .as_deref()
            .map(|ages| self.recency_score(ages))
            .transpose()?;

        let score_of = |family: RiskFamily| families.get(&family).map(|s| s.score).unwrap_or_default();
        let report = RiskReport {
            financial: score_of(RiskFamily::FinancialHealth),
            compliance: score_of(RiskFamily::ComplianceReputation),
            operational: score_of(RiskFamily::OperationalOutlier),
            provider_outlier: families.get(&RiskFamily::ProviderBillingOutlier).map(|s| s.score),
            event_recency,
            combined: combined.score,
            confidence: combined.confidence,
            explanation: self.explain_scores(&input.features),
            families,
        };

        info!(
            rows = input.features.n_rows(),
            cols = input.features.n_cols(),
            providers = provider_scores.len(),
            combined = report.combined,
            confidence = report.confidence,
            "assessment complete"
        );
        Ok(report)
    }
}

impl Default for RiskEngine {
    fn default() -> Self {
        let config = EngineConfig::default();
        Self {
            composer: FamilyComposer::from_config(&config),
            detector: ProviderOutlierDetector::new(config.provider_score_scale),
            config,
        }
    }
}

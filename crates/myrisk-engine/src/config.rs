//! Engine calibration.
//!
//! Provides [`EngineConfig`] holding every policy constant the scorers use.
//! Defaults reproduce the reference calibration exactly; callers override
//! individual fields to recalibrate without touching algorithm code.

use myrisk_core::constants::{
    COMPLIANCE_CONFIDENCE, DEFAULT_SEED, DENSITY_FALLBACK_SCORE, DENSITY_SCALE, DRIVER_TOP_N,
    FINANCIAL_CONFIDENCE, ISOLATION_CONTAMINATION, ISOLATION_FALLBACK_SCORE,
    ISOLATION_MAX_SAMPLES, ISOLATION_SCALE, ISOLATION_TREES, LOF_MAX_NEIGHBORS,
    LOF_OUTLIER_THRESHOLD, MIN_MODEL_ROWS, OPERATIONAL_CONFIDENCE, PROVIDER_CONFIDENCE,
    PROVIDER_SCORE_SCALE, PROVIDER_TOP_N, RECENCY_LAMBDA, TOPK_DEFAULT_K, TOPK_SCALE,
};
use myrisk_core::error::InputError;
use serde::{Deserialize, Serialize};

use crate::density::{DensityScorer, LocalOutlierFactor};
use crate::isolation::{IsolationForest, IsolationScorer};
use crate::topk::TopKDeviation;

/// Configuration for a [`RiskEngine`](crate::RiskEngine) instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seed for every randomized scorer.
    pub seed: u64,
    /// Rows required before the density and isolation models are fitted.
    pub min_model_rows: usize,

    pub topk_k: usize,
    pub topk_scale: f64,

    pub lof_max_neighbors: usize,
    pub lof_threshold: f64,
    pub density_scale: f64,
    pub density_fallback: f64,

    pub isolation_trees: usize,
    pub isolation_max_samples: usize,
    pub isolation_contamination: f64,
    pub isolation_scale: f64,
    pub isolation_fallback: f64,

    pub financial_confidence: f64,
    pub compliance_confidence: f64,
    pub operational_confidence: f64,
    pub provider_confidence: f64,

    /// Drivers kept by the explainer.
    pub driver_top_n: usize,
    pub provider_score_scale: f64,
    /// Providers kept when ranking.
    pub provider_top_n: usize,
    /// Decay rate per day for event recency.
    pub recency_lambda: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            min_model_rows: MIN_MODEL_ROWS,
            topk_k: TOPK_DEFAULT_K,
            topk_scale: TOPK_SCALE,
            lof_max_neighbors: LOF_MAX_NEIGHBORS,
            lof_threshold: LOF_OUTLIER_THRESHOLD,
            density_scale: DENSITY_SCALE,
            density_fallback: DENSITY_FALLBACK_SCORE,
            isolation_trees: ISOLATION_TREES,
            isolation_max_samples: ISOLATION_MAX_SAMPLES,
            isolation_contamination: ISOLATION_CONTAMINATION,
            isolation_scale: ISOLATION_SCALE,
            isolation_fallback: ISOLATION_FALLBACK_SCORE,
            financial_confidence: FINANCIAL_CONFIDENCE,
            compliance_confidence: COMPLIANCE_CONFIDENCE,
            operational_confidence: OPERATIONAL_CONFIDENCE,
            provider_confidence: PROVIDER_CONFIDENCE,
            driver_top_n: DRIVER_TOP_N,
            provider_score_scale: PROVIDER_SCORE_SCALE,
            provider_top_n: PROVIDER_TOP_N,
            recency_lambda: RECENCY_LAMBDA,
        }
    }
}

fn check_unit(field: &str, value: f64) -> Result<(), InputError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(InputError::invalid(field, format!("must be in [0, 1], got {value}")))
    }
}

fn check_non_negative(field: &str, value: f64) -> Result<(), InputError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(InputError::invalid(field, format!("must be finite and >= 0, got {value}")))
    }
}

impl EngineConfig {
    /// Reject calibrations the scorers cannot honor.
    pub fn validate(&self) -> Result<(), InputError> {
        check_non_negative("topk_scale", self.topk_scale)?;
        check_non_negative("lof_threshold", self.lof_threshold)?;
        check_non_negative("density_scale", self.density_scale)?;
        check_non_negative("isolation_scale", self.isolation_scale)?;
        check_non_negative("provider_score_scale", self.provider_score_scale)?;
        check_non_negative("recency_lambda", self.recency_lambda)?;
        check_unit("isolation_contamination", self.isolation_contamination)?;
        check_unit("financial_confidence", self.financial_confidence)?;
        check_unit("compliance_confidence", self.compliance_confidence)?;
        check_unit("operational_confidence", self.operational_confidence)?;
        check_unit("provider_confidence", self.provider_confidence)?;
        if self.isolation_trees == 0 {
            return Err(InputError::invalid("isolation_trees", "must be at least 1"));
        }
        if self.isolation_max_samples == 0 {
            return Err(InputError::invalid("isolation_max_samples", "must be at least 1"));
        }
        if self.lof_max_neighbors == 0 {
            return Err(InputError::invalid("lof_max_neighbors", "must be at least 1"));
        }
        for (field, fallback) in [
            ("density_fallback", self.density_fallback),
            ("isolation_fallback", self.isolation_fallback),
        ] {
            if !(0.0..=100.0).contains(&fallback) {
                return Err(InputError::invalid(field, format!("must be in [0, 100], got {fallback}")));
            }
        }
        Ok(())
    }

    pub fn topk(&self) -> TopKDeviation {
        TopKDeviation::new(self.topk_k, self.topk_scale)
    }

    pub fn density(&self) -> DensityScorer {
        DensityScorer {
            lof: LocalOutlierFactor::new(self.lof_max_neighbors, self.lof_threshold),
            min_rows: self.min_model_rows,
            fallback: self.density_fallback,
            scale: self.density_scale,
        }
    }

    pub fn isolation(&self) -> IsolationScorer {
        IsolationScorer {
            forest: IsolationForest::new(
                self.isolation_trees,
                self.isolation_max_samples,
                self.isolation_contamination,
            ),
            min_rows: self.min_model_rows,
            fallback: self.isolation_fallback,
            scale: self.isolation_scale,
        }
    }
}

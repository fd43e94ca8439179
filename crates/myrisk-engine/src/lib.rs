//! # myrisk-engine — Risk scoring and outlier detection.
//!
//! Stateless, pure computation over caller-supplied snapshots:
//! - **Robust statistics**: median/MAD z-scores shared by every scorer.
//! - **Anomaly scorers**: top-k deviation, local-outlier-factor density and
//!   isolation forest, all behind [`myrisk_core::traits::AnomalyScorer`].
//! - **Family composition**: three named risk families, each a
//!   `(score, confidence)` pair, combined into a confidence-weighted index.
//! - **Explanation**: standard-z driver strengths with plain-language
//!   rationales.
//! - **Provider outliers**: per-provider claim aggregates screened with
//!   robust z-scores.
//! - **Recency**: exponentially decayed event weighting.
//!
//! The isolation forest is randomized; every fit is seeded explicitly so
//! results are bit-reproducible.

pub mod combine;
pub mod config;
pub mod density;
pub mod engine;
pub mod explain;
pub mod family;
pub mod isolation;
pub mod provider;
pub mod recency;
pub mod robust;
pub mod topk;

pub use combine::{apply_weights, combine_scores};
pub use config::EngineConfig;
pub use density::{DensityScorer, LocalOutlierFactor};
pub use engine::{AssessmentInput, RiskEngine};
pub use explain::{explain_scores, explain_top};
pub use family::{compute_family_scores, FamilyComposer};
pub use isolation::{IsolationForest, IsolationScorer};
pub use provider::{
    aggregate_claims, detect_provider_outliers, provider_family_score, rank_provider_outliers,
    ProviderOutlierDetector,
};
pub use recency::recency_score;
pub use robust::robust_z;
pub use topk::{topk_deviation_score, TopKDeviation};

//! Core value types: feature matrices, family scores, drivers, claims.
//!
//! Every type here is an immutable value produced and consumed within a
//! single engine call. Scores are on a 0–100 scale, confidences on 0–1.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::constants::clamp_score;
use crate::error::InputError;

/// A named top-level risk category scored independently before combination.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RiskFamily {
    #[serde(rename = "Financial Health Risk")]
    FinancialHealth,
    #[serde(rename = "Compliance and Reputation Risk")]
    ComplianceReputation,
    #[serde(rename = "Operational and Outlier Risk")]
    OperationalOutlier,
    /// Only present when claims are assessed alongside the feature matrix.
    #[serde(rename = "Provider Billing Outlier Risk")]
    ProviderBillingOutlier,
}

impl RiskFamily {
    /// The three families derived from a feature matrix, in report order.
    pub const MATRIX_FAMILIES: [RiskFamily; 3] = [
        RiskFamily::FinancialHealth,
        RiskFamily::ComplianceReputation,
        RiskFamily::OperationalOutlier,
    ];

    /// Human-readable family name as used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::FinancialHealth => "Financial Health Risk",
            Self::ComplianceReputation => "Compliance and Reputation Risk",
            Self::OperationalOutlier => "Operational and Outlier Risk",
            Self::ProviderBillingOutlier => "Provider Billing Outlier Risk",
        }
    }
}

impl fmt::Display for RiskFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A family's bounded score and the confidence attached to it.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct FamilyScore {
    /// Score in `[0, 100]`.
    pub score: f64,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
}

impl FamilyScore {
    /// Create a family score, clamping both fields into range.
    pub fn new(score: f64, confidence: f64) -> Self {
        let confidence = if confidence.is_nan() { 0.0 } else { confidence.clamp(0.0, 1.0) };
        Self { score: clamp_score(score), confidence }
    }
}

impl From<(f64, f64)> for FamilyScore {
    fn from((score, confidence): (f64, f64)) -> Self {
        Self::new(score, confidence)
    }
}

/// Family scores keyed by family. Ordered so iteration is deterministic.
pub type FamilyScores = BTreeMap<RiskFamily, FamilyScore>;

/// Confidence-weighted aggregate of all family scores.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct CombinedIndex {
    pub score: f64,
    pub confidence: f64,
}

/// One named numeric column of a [`FeatureMatrix`].
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FeatureColumn {
    pub name: String,
    pub values: Vec<f64>,
}

impl FeatureColumn {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self { name: name.into(), values }
    }
}

/// Ordered named numeric columns, all of the same length.
///
/// Built through [`FeatureMatrix::new`], which rejects mismatched column
/// lengths and duplicate names. Non-finite cells are allowed; each scorer
/// decides how to treat them (see [`FeatureMatrix::complete_rows`]).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(try_from = "Vec<FeatureColumn>", into = "Vec<FeatureColumn>")]
pub struct FeatureMatrix {
    columns: Vec<FeatureColumn>,
    n_rows: usize,
}

impl FeatureMatrix {
    /// Validate and wrap `columns`.
    ///
    /// Fails with [`InputError::InvalidInput`] naming the first column whose
    /// length differs from the first column's, or the first repeated name.
    pub fn new(columns: Vec<FeatureColumn>) -> Result<Self, InputError> {
        let n_rows = columns.first().map(|c| c.values.len()).unwrap_or(0);
        let mut seen = HashSet::with_capacity(columns.len());
        for col in &columns {
            if col.values.len() != n_rows {
                return Err(InputError::invalid(
                    &col.name,
                    format!("column has {} rows, expected {}", col.values.len(), n_rows),
                ));
            }
            if !seen.insert(col.name.as_str()) {
                return Err(InputError::invalid(&col.name, "duplicate column name"));
            }
        }
        Ok(Self { columns, n_rows })
    }

    /// Convenience constructor from `(name, values)` pairs.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, InputError>
    where
        I: IntoIterator<Item = (S, Vec<f64>)>,
        S: Into<String>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(name, values)| FeatureColumn::new(name, values))
                .collect(),
        )
    }

    /// A matrix with no columns and no rows.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// `true` when there are no columns or no rows.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.n_rows == 0
    }

    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&FeatureColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Row `index` as a vector of cells in column order.
    pub fn row(&self, index: usize) -> Option<Vec<f64>> {
        (index < self.n_rows).then(|| self.columns.iter().map(|c| c.values[index]).collect())
    }

    /// Rows usable by models that need complete observations.
    ///
    /// Columns without a single finite value are dropped first, then every
    /// row still holding a non-finite cell. The result is row-major.
    pub fn complete_rows(&self) -> Vec<Vec<f64>> {
        let kept: Vec<&FeatureColumn> = self
            .columns
            .iter()
            .filter(|c| c.values.iter().any(|v| v.is_finite()))
            .collect();
        if kept.is_empty() {
            return Vec::new();
        }
        (0..self.n_rows)
            .map(|i| kept.iter().map(|c| c.values[i]).collect::<Vec<f64>>())
            .filter(|row| row.iter().all(|v| v.is_finite()))
            .collect()
    }
}

impl TryFrom<Vec<FeatureColumn>> for FeatureMatrix {
    type Error = InputError;

    fn try_from(columns: Vec<FeatureColumn>) -> Result<Self, Self::Error> {
        Self::new(columns)
    }
}

impl From<FeatureMatrix> for Vec<FeatureColumn> {
    fn from(matrix: FeatureMatrix) -> Self {
        matrix.columns
    }
}

/// A feature and its mean absolute z-score across rows.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DriverEntry {
    pub feature: String,
    pub strength: f64,
}

/// Ranked drivers plus one plain-language rationale per driver.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct Explanation {
    pub drivers: Vec<DriverEntry>,
    pub rationales: Vec<String>,
}

/// Opaque, ordered provider identifier.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ProviderId(pub String);

impl ProviderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProviderId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ProviderId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for ProviderId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<i64> for ProviderId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

/// A single claim billed by a provider.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ClaimRecord {
    pub provider_id: ProviderId,
    pub claim_amount: f64,
}

impl ClaimRecord {
    pub fn new(provider_id: impl Into<ProviderId>, claim_amount: f64) -> Self {
        Self { provider_id: provider_id.into(), claim_amount }
    }
}

/// Per-provider claim totals, recomputed from each claims batch.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ProviderAggregate {
    pub provider_id: ProviderId,
    pub total_amount: f64,
    pub avg_amount: f64,
    pub n_claims: usize,
}

/// Composite outlier score for one provider.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ProviderOutlierScore {
    pub provider_id: ProviderId,
    /// Score in `[0, 100]`.
    pub score: f64,
    /// Component robust z-scores keyed `z_total_amount`, `z_avg_amount`,
    /// `z_n_claims`.
    pub details: BTreeMap<String, f64>,
}

/// Multiplicative what-if factors applied to family scores before they
/// are combined.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct FamilyWeights {
    pub financial: f64,
    pub compliance: f64,
    pub operational: f64,
    pub provider: f64,
}

impl FamilyWeights {
    /// Factor applied to `family`.
    pub fn factor(&self, family: RiskFamily) -> f64 {
        match family {
            RiskFamily::FinancialHealth => self.financial,
            RiskFamily::ComplianceReputation => self.compliance,
            RiskFamily::OperationalOutlier => self.operational,
            RiskFamily::ProviderBillingOutlier => self.provider,
        }
    }

    /// `true` when every factor is exactly 1.0.
    pub fn is_identity(&self) -> bool {
        [self.financial, self.compliance, self.operational, self.provider]
            .iter()
            .all(|w| *w == 1.0)
    }
}

impl Default for FamilyWeights {
    fn default() -> Self {
        Self { financial: 1.0, compliance: 1.0, operational: 1.0, provider: 1.0 }
    }
}

/// Everything the engine says about one organization and period.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RiskReport {
    pub financial: f64,
    pub compliance: f64,
    pub operational: f64,
    pub provider_outlier: Option<f64>,
    pub event_recency: Option<f64>,
    pub combined: f64,
    pub confidence: f64,
    pub families: FamilyScores,
    pub explanation: Explanation,
}

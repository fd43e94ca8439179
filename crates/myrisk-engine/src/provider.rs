//! Provider billing outliers.
//!
//! Claims are grouped per provider into `(total, average, count)`. Each
//! aggregate is robust-standardized across providers, so a provider is
//! judged against its peers rather than against its own history.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use myrisk_core::constants::{
    clamp_score, PROVIDER_CONFIDENCE, PROVIDER_SCORE_SCALE, Z_AVG_AMOUNT, Z_N_CLAIMS, Z_TOTAL_AMOUNT,
};
use myrisk_core::error::InputError;
use myrisk_core::types::{
    ClaimRecord, FamilyScore, ProviderAggregate, ProviderId, ProviderOutlierScore,
};
use ordered_float::OrderedFloat;
use tracing::debug;

use crate::robust::robust_z;
use crate::topk::TopKDeviation;

/// Providers considered by the billing family score.
const PROVIDER_FAMILY_TOP_K: usize = 5;

/// Group claims by provider, ordered by provider id.
///
/// Fails on the first non-finite claim amount.
pub fn aggregate_claims(claims: &[ClaimRecord]) -> Result<Vec<ProviderAggregate>, InputError> {
    let mut groups: BTreeMap<&ProviderId, (f64, usize)> = BTreeMap::new();
    for (i, claim) in claims.iter().enumerate() {
        if !claim.claim_amount.is_finite() {
            return Err(InputError::invalid(
                "claim_amount",
                format!("non-finite value {} at record {i}", claim.claim_amount),
            ));
        }
        let entry = groups.entry(&claim.provider_id).or_insert((0.0, 0));
        entry.0 += claim.claim_amount;
        entry.1 += 1;
    }

    Ok(groups
        .into_iter()
        .map(|(id, (total, n))| ProviderAggregate {
            provider_id: id.clone(),
            total_amount: total,
            avg_amount: total / n as f64,
            n_claims: n,
        })
        .collect())
}

/// Scores providers from their claims.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProviderOutlierDetector {
    pub scale: f64,
}

impl Default for ProviderOutlierDetector {
    fn default() -> Self {
        Self { scale: PROVIDER_SCORE_SCALE }
    }
}

impl ProviderOutlierDetector {
    pub fn new(scale: f64) -> Self {
        Self { scale }
    }

    /// One score per provider, ordered by provider id. Empty claims give an
    /// empty result.
    pub fn detect(&self, claims: &[ClaimRecord]) -> Result<Vec<ProviderOutlierScore>, InputError> {
        let aggregates = aggregate_claims(claims)?;
        if aggregates.is_empty() {
            return Ok(Vec::new());
        }

        let z_total = robust_z(&aggregates.iter().map(|a| a.total_amount).collect::<Vec<_>>());
        let z_avg = robust_z(&aggregates.iter().map(|a| a.avg_amount).collect::<Vec<_>>());
        let z_n = robust_z(&aggregates.iter().map(|a| a.n_claims as f64).collect::<Vec<_>>());

        let scores: Vec<ProviderOutlierScore> = aggregates
            .into_iter()
            .enumerate()
            .map(|(i, agg)| {
                let mean_abs = (z_total[i].abs() + z_avg[i].abs() + z_n[i].abs()) / 3.0;
                let details = BTreeMap::from([
                    (Z_TOTAL_AMOUNT.to_string(), z_total[i]),
                    (Z_AVG_AMOUNT.to_string(), z_avg[i]),
                    (Z_N_CLAIMS.to_string(), z_n[i]),
                ]);
                ProviderOutlierScore {
                    provider_id: agg.provider_id,
                    score: clamp_score(mean_abs * self.scale),
                    details,
                }
            })
            .collect();

        debug!(claims = claims.len(), providers = scores.len(), "providers: scored");
        Ok(scores)
    }
}

/// Provider outlier scores under the default scale.
pub fn detect_provider_outliers(
    claims: &[ClaimRecord],
) -> Result<Vec<ProviderOutlierScore>, InputError> {
    ProviderOutlierDetector::default().detect(claims)
}

/// Highest scores first (ties by provider id), keeping at most `top_n`.
pub fn rank_provider_outliers(
    mut scores: Vec<ProviderOutlierScore>,
    top_n: usize,
) -> Vec<ProviderOutlierScore> {
    scores.sort_by(|a, b| {
        Reverse(OrderedFloat(a.score))
            .cmp(&Reverse(OrderedFloat(b.score)))
            .then_with(|| a.provider_id.cmp(&b.provider_id))
    });
    scores.truncate(top_n);
    scores
}

/// Billing family score: mean of the five highest provider scores, or
/// `None` when there are no providers.
pub fn provider_family_score(scores: &[ProviderOutlierScore]) -> Option<FamilyScore> {
    provider_family_score_with(scores, PROVIDER_CONFIDENCE)
}

pub(crate) fn provider_family_score_with(
    scores: &[ProviderOutlierScore],
    confidence: f64,
) -> Option<FamilyScore> {
    if scores.is_empty() {
        return None;
    }
    let values: Vec<f64> = scores.iter().map(|s| s.score).collect();
    let score = TopKDeviation::new(PROVIDER_FAMILY_TOP_K, 1.0).score_series(&values);
    Some(FamilyScore::new(score, confidence))
}

//! Recency-weighted event score.
//!
//! Each event weighs `exp(-lambda * age_days)`, so fresh events count fully
//! and old ones fade. The score is the mean weight on a 0–100 scale.

use myrisk_core::constants::{clamp_score, RECENCY_EMPTY_SCORE};
use myrisk_core::error::InputError;

/// Score a batch of event ages (days). No events scores 20.
///
/// # Examples
///
/// ```
/// use myrisk_engine::recency_score;
/// assert_eq!(recency_score(&[0.0, 0.0], 0.01).unwrap(), 100.0);
/// assert_eq!(recency_score(&[], 0.01).unwrap(), 20.0);
/// ```
pub fn recency_score(ages_days: &[f64], lambda: f64) -> Result<f64, InputError> {
    if !lambda.is_finite() || lambda < 0.0 {
        return Err(InputError::invalid("lambda", format!("must be finite and >= 0, got {lambda}")));
    }
    if ages_days.is_empty() {
        return Ok(RECENCY_EMPTY_SCORE);
    }
    if let Some((i, age)) = ages_days.iter().enumerate().find(|(_, a)| !a.is_finite() || **a < 0.0) {
        return Err(InputError::invalid("age_days", format!("invalid age {age} at event {i}")));
    }
    let mean_weight =
        ages_days.iter().map(|a| (-lambda * a).exp()).sum::<f64>() / ages_days.len() as f64;
    Ok(clamp_score(100.0 * mean_weight))
}

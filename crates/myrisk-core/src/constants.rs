//! Scoring policy constants. All scores are on a 0–100 scale, all
//! confidences on 0–1.
//!
//! Fallback scores and scaling factors are calibration values. They are
//! surfaced again through `EngineConfig` in `myrisk-engine` so that a
//! recalibration never touches algorithm code.

/// Lower bound of every score.
pub const SCORE_MIN: f64 = 0.0;

/// Upper bound of every score.
pub const SCORE_MAX: f64 = 100.0;

// --- Robust statistics ---

/// Consistency factor turning a MAD into a standard-deviation estimate
/// for normally distributed data.
pub const MAD_SCALE: f64 = 1.4826;

/// MAD substituted when the median absolute deviation is zero.
pub const MAD_FLOOR: f64 = 1.0;

// --- Small-sample policy ---

/// Minimum number of complete rows before the density and isolation
/// scorers fit anything.
pub const MIN_MODEL_ROWS: usize = 10;

/// Density scorer result when fewer than [`MIN_MODEL_ROWS`] rows exist.
pub const DENSITY_FALLBACK_SCORE: f64 = 35.0;

/// Isolation scorer result when fewer than [`MIN_MODEL_ROWS`] rows exist.
pub const ISOLATION_FALLBACK_SCORE: f64 = 30.0;

// --- Top-k deviation ---

/// Number of largest absolute deviations averaged by the top-k scorer.
pub const TOPK_DEFAULT_K: usize = 5;

/// Multiplier applied to the top-k mean deviation.
pub const TOPK_SCALE: f64 = 10.0;

// --- Density (local outlier factor) ---

/// Upper bound on the neighbor count; the effective count is
/// `min(LOF_MAX_NEIGHBORS, n_rows - 1)`.
pub const LOF_MAX_NEIGHBORS: usize = 20;

/// Rows whose local outlier factor exceeds this are labelled outliers.
pub const LOF_OUTLIER_THRESHOLD: f64 = 1.5;

/// Guard added to the mean reachability distance.
pub const LOF_DENSITY_EPSILON: f64 = 1e-10;

/// Multiplier applied to the mean negated label.
pub const DENSITY_SCALE: f64 = 50.0;

// --- Isolation forest ---

/// Number of isolation trees per fit.
pub const ISOLATION_TREES: usize = 100;

/// Upper bound on rows sampled per tree.
pub const ISOLATION_MAX_SAMPLES: usize = 256;

/// Expected share of anomalous rows, used to place the labelling threshold.
pub const ISOLATION_CONTAMINATION: f64 = 0.1;

/// Multiplier applied to the aggregated anomaly score.
pub const ISOLATION_SCALE: f64 = 10.0;

/// Seed used by randomized scorers unless the caller supplies another.
pub const DEFAULT_SEED: u64 = 42;

// --- Family confidences and empty-input defaults ---

/// Confidence attached to the Financial Health family.
pub const FINANCIAL_CONFIDENCE: f64 = 0.65;

/// Confidence attached to the Compliance and Reputation family.
pub const COMPLIANCE_CONFIDENCE: f64 = 0.6;

/// Confidence attached to the Operational and Outlier family.
pub const OPERATIONAL_CONFIDENCE: f64 = 0.6;

/// Confidence attached to the Provider Billing Outlier family.
pub const PROVIDER_CONFIDENCE: f64 = 0.6;

/// Financial Health `(score, confidence)` for an empty matrix.
pub const EMPTY_FINANCIAL: (f64, f64) = (40.0, 0.5);

/// Compliance and Reputation `(score, confidence)` for an empty matrix.
pub const EMPTY_COMPLIANCE: (f64, f64) = (35.0, 0.5);

/// Operational and Outlier `(score, confidence)` for an empty matrix.
pub const EMPTY_OPERATIONAL: (f64, f64) = (50.0, 0.5);

// --- Combination ---

/// Combined `(score, confidence)` when no family scores are supplied.
pub const EMPTY_COMBINED: (f64, f64) = (45.0, 0.5);

/// Ceiling on the combined confidence.
pub const COMBINED_CONFIDENCE_CAP: f64 = 0.9;

// --- Explanation ---

/// Added to the standard deviation when standardizing for explanation.
pub const EXPLAIN_EPSILON: f64 = 1e-6;

/// Number of drivers kept by the explainer.
pub const DRIVER_TOP_N: usize = 10;

/// Driver strength at or above which a feature is "driving risk strongly".
pub const STRONG_DRIVER_Z: f64 = 3.0;

/// Driver strength at or above which a feature is "a notable risk factor".
pub const NOTABLE_DRIVER_Z: f64 = 2.0;

// --- Provider outliers ---

/// Multiplier applied to the mean absolute aggregate z-score.
pub const PROVIDER_SCORE_SCALE: f64 = 10.0;

/// Number of providers returned by ranked listings.
pub const PROVIDER_TOP_N: usize = 20;

/// Detail key for the robust z of a provider's total amount.
pub const Z_TOTAL_AMOUNT: &str = "z_total_amount";

/// Detail key for the robust z of a provider's average amount.
pub const Z_AVG_AMOUNT: &str = "z_avg_amount";

/// Detail key for the robust z of a provider's claim count.
pub const Z_N_CLAIMS: &str = "z_n_claims";

// --- Event recency ---

/// Daily exponential decay applied to event ages.
pub const RECENCY_LAMBDA: f64 = 0.01;

/// Recency score when no events are supplied.
pub const RECENCY_EMPTY_SCORE: f64 = 20.0;

/// Clamp a score into `[SCORE_MIN, SCORE_MAX]`. NaN maps to [`SCORE_MIN`].
///
/// # Examples
///
/// ```
/// use myrisk_core::constants::clamp_score;
/// assert_eq!(clamp_score(140.0), 100.0);
/// assert_eq!(clamp_score(-3.0), 0.0);
/// assert_eq!(clamp_score(f64::NAN), 0.0);
/// ```
pub fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        SCORE_MIN
    } else {
        value.clamp(SCORE_MIN, SCORE_MAX)
    }
}

//! Density scorer based on the local outlier factor (LOF).
//!
//! Each row is compared with its `k` nearest neighbors (Euclidean). The
//! local reachability density of a row is the inverse of its mean
//! reachability distance, where `reach(p, o) = max(k_dist(o), d(p, o))`.
//! The LOF of a row is the mean density of its neighbors divided by its own
//! density; rows whose LOF exceeds [`LOF_OUTLIER_THRESHOLD`] are labelled
//! outliers.
//!
//! The matrix score negates the `{+1 inlier, -1 outlier}` labels, averages
//! them and scales by [`DENSITY_SCALE`]: a matrix of typical rows scores 0,
//! and the score only rises once outliers are the majority.

use std::collections::BinaryHeap;

use myrisk_core::constants::{
    clamp_score, DENSITY_FALLBACK_SCORE, DENSITY_SCALE, LOF_DENSITY_EPSILON, LOF_MAX_NEIGHBORS,
    LOF_OUTLIER_THRESHOLD, MIN_MODEL_ROWS,
};
use myrisk_core::traits::AnomalyScorer;
use myrisk_core::types::FeatureMatrix;
use ordered_float::OrderedFloat;
use tracing::debug;

use crate::robust::model_rows;

/// Label of a row judged typical.
pub const INLIER: i8 = 1;
/// Label of a row judged anomalous.
pub const OUTLIER: i8 = -1;

/// Local outlier factor over a fixed neighbor count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalOutlierFactor {
    pub n_neighbors: usize,
    pub threshold: f64,
}

/// Per-row factors and labels from one LOF fit.
#[derive(Debug, Clone, PartialEq)]
pub struct LofFit {
    pub factors: Vec<f64>,
    pub labels: Vec<i8>,
}

impl LofFit {
    pub fn n_outliers(&self) -> usize {
        self.labels.iter().filter(|l| **l == OUTLIER).count()
    }
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

impl LocalOutlierFactor {
    pub fn new(n_neighbors: usize, threshold: f64) -> Self {
        Self { n_neighbors, threshold }
    }

    /// Fit on `rows` (row-major, all finite) and label every row.
    ///
    /// The neighbor count is clamped to `rows.len() - 1`. Ties in distance
    /// are broken by row index so the fit is deterministic. Fewer than two
    /// rows yields all inliers with factor 1. Memory is `O(n * k)`.
    pub fn fit(&self, rows: &[Vec<f64>]) -> LofFit {
        let n = rows.len();
        let k = self.n_neighbors.min(n.saturating_sub(1));
        if k == 0 {
            return LofFit { factors: vec![1.0; n], labels: vec![INLIER; n] };
        }

        // Each row keeps only its k nearest (distance, index) pairs.
        let neighbors: Vec<Vec<(f64, usize)>> = (0..n)
            .map(|i| {
                let mut heap: BinaryHeap<(OrderedFloat<f64>, usize)> =
                    BinaryHeap::with_capacity(k + 1);
                for j in (0..n).filter(|&j| j != i) {
                    heap.push((OrderedFloat(euclidean(&rows[i], &rows[j])), j));
                    if heap.len() > k {
                        heap.pop();
                    }
                }
                heap.into_sorted_vec().into_iter().map(|(d, j)| (d.into_inner(), j)).collect()
            })
            .collect();

        let k_distance: Vec<f64> = neighbors.iter().map(|nb| nb[k - 1].0).collect();

        let lrd: Vec<f64> = neighbors
            .iter()
            .map(|nb| {
                let reach = nb.iter().map(|&(d, j)| k_distance[j].max(d)).sum::<f64>() / k as f64;
                1.0 / (reach + LOF_DENSITY_EPSILON)
            })
            .collect();

        let factors: Vec<f64> = (0..n)
            .map(|i| {
                let neighbor_lrd = neighbors[i].iter().map(|&(_, j)| lrd[j]).sum::<f64>() / k as f64;
                neighbor_lrd / lrd[i]
            })
            .collect();

        let labels = factors
            .iter()
            .map(|f| if *f > self.threshold { OUTLIER } else { INLIER })
            .collect();

        LofFit { factors, labels }
    }
}

impl Default for LocalOutlierFactor {
    fn default() -> Self {
        Self::new(LOF_MAX_NEIGHBORS, LOF_OUTLIER_THRESHOLD)
    }
}

/// Compliance-family scorer: share of LOF outliers mapped onto 0–100.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensityScorer {
    pub lof: LocalOutlierFactor,
    pub min_rows: usize,
    pub fallback: f64,
    pub scale: f64,
}

impl DensityScorer {
    /// Score already-cleaned row-major data.
    pub fn score_rows(&self, rows: &[Vec<f64>]) -> f64 {
        if rows.len() < self.min_rows {
            debug!(rows = rows.len(), min_rows = self.min_rows, "density: too few rows, using fallback");
            return self.fallback;
        }
        let fit = self.lof.fit(rows);
        let mean_flipped =
            fit.labels.iter().map(|l| -f64::from(*l)).sum::<f64>() / rows.len() as f64;
        let score = clamp_score(mean_flipped * self.scale);
        debug!(rows = rows.len(), outliers = fit.n_outliers(), score, "density: scored");
        score
    }
}

impl Default for DensityScorer {
    fn default() -> Self {
        Self {
            lof: LocalOutlierFactor::default(),
            min_rows: MIN_MODEL_ROWS,
            fallback: DENSITY_FALLBACK_SCORE,
            scale: DENSITY_SCALE,
        }
    }
}

impl AnomalyScorer for DensityScorer {
    fn name(&self) -> &'static str {
        "density_lof"
    }

    fn score(&self, matrix: &FeatureMatrix, _seed: u64) -> f64 {
        self.score_rows(&model_rows(matrix, self.name()))
    }
}

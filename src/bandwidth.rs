use std::cmp::Ordering;

use log::debug;
use num_traits::Float;
use rand::seq::index::sample;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::distance::DistanceMeasure;
use crate::error::{ClusterError, Result};
use crate::points::PointSet;

/// Smallest bandwidth handed out when every sampled neighbourhood collapses to a point.
pub const MIN_BANDWIDTH: f64 = 1e-6;

/// Estimates a bandwidth as the mean distance from each (sampled) point to its
/// k-th nearest point, with `k = max(1, floor(n * quantile))`. The point itself
/// counts as its own nearest neighbour.
#[derive(Debug, Clone)]
pub struct BandwidthEstimator {
    quantile: f64,
    n_samples: usize,
    seed: u64,
}

impl Default for BandwidthEstimator {
    fn default() -> Self {
        Self {
            quantile: 0.3,
            n_samples: 500,
            seed: 0,
        }
    }
}

impl BandwidthEstimator {
    /// - quantile: fraction of the point set forming each neighbourhood, in `(0, 1]`
    /// - n_samples: maximum number of rows whose neighbourhood is measured
    /// - seed: seed for choosing those rows when `n > n_samples`
    pub fn new(quantile: f64, n_samples: usize, seed: u64) -> Self {
        Self {
            quantile,
            n_samples,
            seed,
        }
    }

    pub fn estimate<F>(&self, points: &PointSet<F>, measure: DistanceMeasure) -> Result<F>
    where
        F: Float + Send + Sync,
    {
        if points.is_empty() {
            return Err(ClusterError::EmptyInput);
        }
        if !(self.quantile > 0. && self.quantile <= 1.) {
            return Err(ClusterError::InvalidParameter {
                name: "quantile",
                message: "must lie in (0, 1]",
            });
        }
        if self.n_samples == 0 {
            return Err(ClusterError::InvalidParameter {
                name: "n_samples",
                message: "must be at least 1",
            });
        }

        let n = points.len();
        let k = ((n as f64 * self.quantile) as usize).clamp(1, n);
        let seeds: Vec<usize> = if n > self.n_samples {
            let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
            let mut chosen = sample(&mut rng, n, self.n_samples).into_vec();
            chosen.sort_unstable();
            chosen
        } else {
            (0..n).collect()
        };

        let kth: Vec<F> = seeds
            .par_iter()
            .map(|&i| {
                let origin = points.row(i);
                let mut distances: Vec<F> = points
                    .rows()
                    .map(|other| measure.between(origin, other))
                    .collect();
                let (_, nth, _) = distances.select_nth_unstable_by(k - 1, |a, b| {
                    a.partial_cmp(b).unwrap_or(Ordering::Equal)
                });
                *nth
            })
            .collect();
        // Summed in index order so the estimate does not depend on the thread count
        let total = kth.iter().fold(F::zero(), |acc, &v| acc + v);
        let bandwidth = total / F::from(kth.len()).unwrap();

        debug!(
            "estimated bandwidth {:?} from {} samples, k={}, measure={}",
            bandwidth.to_f64(),
            kth.len(),
            k,
            measure
        );
        if !bandwidth.is_finite() {
            return Err(ClusterError::InvalidBandwidth(
                bandwidth.to_f64().unwrap_or(f64::NAN),
            ));
        }
        if bandwidth <= F::zero() {
            debug!("all sampled neighbourhoods coincide, using floor bandwidth");
            return Ok(F::from(MIN_BANDWIDTH).unwrap());
        }
        Ok(bandwidth)
    }
}

/// Estimate a bandwidth with the default quantile (0.3), sample cap (500) and seed (0).
pub fn estimate_bandwidth<F>(points: &PointSet<F>, measure: DistanceMeasure) -> Result<F>
where
    F: Float + Send + Sync,
{
    BandwidthEstimator::default().estimate(points, measure)
}

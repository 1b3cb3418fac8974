use log::{debug, info};
use ndarray::{Array2, ArrayView1, ArrayView2, Zip};
use num_traits::Float;

use crate::actors::ActorScheduler;
use crate::aggregate::{aggregate, CenterPolicy};
use crate::bandwidth::BandwidthEstimator;
use crate::distance::{DistanceMeasure, Kernel};
use crate::error::{ClusterError, Result};
use crate::mode::ShiftSettings;
use crate::parallel::{resolve_workers, run, ThreadPoolScheduler};
use crate::points::PointSet;

/// Mean shift clustering.
///
/// ```
/// use ndarray::arr2;
/// use meanshift::{DistanceMeasure, MeanShift};
///
/// let x = arr2(&[[0., 0.], [0.5, 0.], [0., 0.5], [20., 20.], [20.5, 20.], [20., 20.5]]);
/// let fit = MeanShift::new(Some(2.0), 2, DistanceMeasure::Euclidean)
///     .fit(x)
///     .unwrap();
/// assert_eq!(fit.n_clusters(), 2);
/// assert_eq!(fit.labels, vec![0, 0, 0, 1, 1, 1]);
/// ```
#[derive(Debug, Clone)]
pub struct MeanShift<F> {
    bandwidth: Option<F>,
    threads: isize,
    measure: DistanceMeasure,
    kernel: Kernel,
    max_iterations: usize,
    tolerance: F,
    merge_tolerance: Option<F>,
    center_policy: CenterPolicy,
    estimator: BandwidthEstimator,
    use_actors: bool,
}

impl<F> Default for MeanShift<F>
where
    F: Float + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(None, 0, DistanceMeasure::default())
    }
}

impl<F> MeanShift<F>
where
    F: Float + Send + Sync + 'static,
{
    /// - bandwidth: window radius in `measure` units, estimated from the data when `None`
    /// - threads: worker count, `<= 0` uses every available core
    /// - measure: distance measure used for windows, convergence and merging
    pub fn new(bandwidth: Option<F>, threads: isize, measure: DistanceMeasure) -> Self {
        let defaults = ShiftSettings::<F>::default();
        Self {
            bandwidth,
            threads,
            measure,
            kernel: defaults.kernel,
            max_iterations: defaults.max_iterations,
            tolerance: defaults.tolerance,
            merge_tolerance: None,
            center_policy: CenterPolicy::default(),
            estimator: BandwidthEstimator::default(),
            use_actors: false,
        }
    }

    pub fn with_kernel(mut self, kernel: Kernel) -> Self {
        self.kernel = kernel;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Convergence threshold as a fraction of the bandwidth, default `1e-3`.
    pub fn with_tolerance(mut self, tolerance: F) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Maximum distance between two modes of one cluster, default the bandwidth.
    pub fn with_merge_tolerance(mut self, merge_tolerance: F) -> Self {
        self.merge_tolerance = Some(merge_tolerance);
        self
    }

    pub fn with_center_policy(mut self, center_policy: CenterPolicy) -> Self {
        self.center_policy = center_policy;
        self
    }

    /// Estimator used when no bandwidth is given.
    pub fn with_estimator(mut self, estimator: BandwidthEstimator) -> Self {
        self.estimator = estimator;
        self
    }

    /// Run the shift on message-passing actors instead of the thread pool.
    pub fn with_actors(mut self, use_actors: bool) -> Self {
        self.use_actors = use_actors;
        self
    }

    /// Fit on a dense `(n, d)` matrix.
    pub fn fit(&self, x: Array2<F>) -> Result<Clustering<F>> {
        self.validate()?;
        self.shift_and_merge(&PointSet::new(x)?)
    }

    /// Fit on an already validated point set.
    pub fn fit_points(&self, points: &PointSet<F>) -> Result<Clustering<F>> {
        self.validate()?;
        self.shift_and_merge(points)
    }

    fn shift_and_merge(&self, points: &PointSet<F>) -> Result<Clustering<F>> {
        let bandwidth = match self.bandwidth {
            Some(b) => b,
            None => self.estimator.estimate(points, self.measure)?,
        };
        let settings = ShiftSettings {
            kernel: self.kernel,
            max_iterations: self.max_iterations,
            tolerance: self.tolerance,
        };
        let workers = resolve_workers(self.threads);

        let modes = if self.use_actors {
            debug!("actor strategy with {} workers", workers);
            run(
                &ActorScheduler::new(workers),
                points,
                bandwidth,
                self.measure,
                settings,
            )?
        } else {
            debug!("thread-pool strategy with {} workers", workers);
            run(
                &ThreadPoolScheduler::new(workers),
                points,
                bandwidth,
                self.measure,
                settings,
            )?
        };
        let unconverged = modes.iter().filter(|m| !m.converged).count();

        let merge_tolerance = self.merge_tolerance.unwrap_or(bandwidth);
        let (cluster_centers, labels) =
            aggregate(&modes, self.measure, merge_tolerance, self.center_policy);
        info!(
            "nClusters={} nSamples={} bandwidth={:?}",
            cluster_centers.nrows(),
            labels.len(),
            bandwidth.to_f64()
        );

        Ok(Clustering {
            cluster_centers,
            labels,
            bandwidth,
            unconverged,
            measure: self.measure,
        })
    }

    fn validate(&self) -> Result<()> {
        if let Some(b) = self.bandwidth {
            if !(b.is_finite() && b > F::zero()) {
                return Err(ClusterError::InvalidBandwidth(b.to_f64().unwrap_or(f64::NAN)));
            }
        }
        if self.max_iterations == 0 {
            return Err(ClusterError::InvalidParameter {
                name: "max_iterations",
                message: "must be at least 1",
            });
        }
        if !(self.tolerance.is_finite() && self.tolerance > F::zero()) {
            return Err(ClusterError::InvalidParameter {
                name: "tolerance",
                message: "must be positive and finite",
            });
        }
        if let Some(m) = self.merge_tolerance {
            if !(m.is_finite() && m >= F::zero()) {
                return Err(ClusterError::InvalidParameter {
                    name: "merge_tolerance",
                    message: "must be non-negative and finite",
                });
            }
        }
        Ok(())
    }
}

/// Result of a fit: one centre per cluster and one label per input point.
#[derive(Debug, Clone)]
pub struct Clustering<F> {
    /// `(k, d)` matrix; row `i` is the centre of label `i`.
    pub cluster_centers: Array2<F>,
    /// Label of each input point, in `[0, k)`.
    pub labels: Vec<usize>,
    /// Bandwidth used, given or estimated.
    pub bandwidth: F,
    /// Points whose search stopped at the iteration cap.
    pub unconverged: usize,
    measure: DistanceMeasure,
}

impl<F> Clustering<F>
where
    F: Float + Send + Sync,
{
    pub fn n_clusters(&self) -> usize {
        self.cluster_centers.nrows()
    }

    /// Point indices grouped by label.
    pub fn members(&self) -> Vec<Vec<usize>> {
        let mut members = vec![Vec::new(); self.n_clusters()];
        self.labels
            .iter()
            .enumerate()
            .for_each(|(i, &label)| members[label].push(i));
        members
    }

    /// Label new points with their nearest centre (ties go to the lowest label).
    pub fn predict(&self, x: ArrayView2<F>) -> Result<Vec<usize>> {
        if x.ncols() != self.cluster_centers.ncols() {
            return Err(ClusterError::DimensionMismatch {
                expected: self.cluster_centers.ncols(),
                found: x.ncols(),
            });
        }
        let centers = self.cluster_centers.view();
        let measure = self.measure;
        Ok(Zip::from(x.rows())
            .par_map_collect(|row| nearest(row, centers, measure))
            .into_raw_vec())
    }
}

fn nearest<F>(point: ArrayView1<F>, centers: ArrayView2<F>, measure: DistanceMeasure) -> usize
where
    F: Float,
{
    centers
        .rows()
        .into_iter()
        .map(|c| measure.between(point, c))
        .enumerate()
        .fold((0, F::infinity()), |(min_i, min), (i, d)| {
            if d < min {
                (i, d)
            } else {
                (min_i, min)
            }
        })
        .0
}

/// Boundary entry point used by bindings and the CLI.
///
/// - points: dense `(n, d)` matrix of finite values
/// - n_threads: worker count, `<= 0` for every available core
/// - bandwidth: window radius, estimated when `None`
/// - distance_measure: `"euclidean"`, `"squared_euclidean"` or `"manhattan"`
/// - use_actors: run on actors instead of the thread pool
pub fn meanshift_algorithm<F>(
    points: Array2<F>,
    n_threads: isize,
    bandwidth: Option<F>,
    distance_measure: &str,
    use_actors: bool,
) -> Result<(Array2<F>, Vec<usize>)>
where
    F: Float + Send + Sync + 'static,
{
    let measure = distance_measure.parse::<DistanceMeasure>()?;
    let fit = MeanShift::new(bandwidth, n_threads, measure)
        .with_actors(use_actors)
        .fit(points)?;
    Ok((fit.cluster_centers, fit.labels))
}

use ndarray::{Array1, ArrayView1, Zip};
use num_traits::Float;

use crate::distance::{DistanceMeasure, Kernel};
use crate::points::PointSet;

/// Per-run knobs of the shift iteration.
#[derive(Debug, Clone, Copy)]
pub struct ShiftSettings<F> {
    pub kernel: Kernel,
    /// Iteration cap; reaching it returns the last estimate.
    pub max_iterations: usize,
    /// Convergence threshold as a fraction of the bandwidth.
    pub tolerance: F,
}

impl<F> Default for ShiftSettings<F>
where
    F: Float,
{
    fn default() -> Self {
        Self {
            kernel: Kernel::Flat,
            max_iterations: 300,
            tolerance: F::from(1e-3).unwrap(),
        }
    }
}

/// Fixed point reached from one starting point.
#[derive(Debug, Clone, PartialEq)]
pub struct Mode<F> {
    pub center: Array1<F>,
    /// Points inside the window on the last iteration.
    pub support: usize,
    pub iterations: usize,
    /// `false` when the iteration cap ended the search.
    pub converged: bool,
}

/// Shift `start` towards the kernel-weighted mean of the points inside its
/// bandwidth window until the shift falls below the tolerance or the
/// iteration cap is reached.
///
/// An empty window leaves the estimate where it is.
pub fn seek_mode<F>(
    start: ArrayView1<F>,
    points: &PointSet<F>,
    bandwidth: F,
    measure: DistanceMeasure,
    settings: &ShiftSettings<F>,
) -> Mode<F>
where
    F: Float,
{
    let stop = measure.threshold(bandwidth, settings.tolerance);
    let mut current = start.to_owned();
    let mut support = 0;
    let mut iterations = 0;

    while iterations < settings.max_iterations {
        // weighted offsets from `current`; raw sums overflow near F::max_value()
        let mut offset = Array1::<F>::zeros(current.len());
        let mut total = F::zero();
        let mut within = 0;
        for row in points.rows() {
            let weight = settings
                .kernel
                .weight(measure.between(current.view(), row), bandwidth, measure);
            if weight > F::zero() {
                within += 1;
                total = total + weight;
                Zip::from(&mut offset)
                    .and(&row)
                    .and(&current)
                    .for_each(|o, &x, &c| *o = *o + (x - c) * weight);
            }
        }
        iterations += 1;
        support = within;
        if within == 0 {
            return Mode {
                center: current,
                support,
                iterations,
                converged: true,
            };
        }

        let mut next = current.clone();
        next.zip_mut_with(&offset, |n, &o| *n = *n + o / total);
        let shift = measure.between(next.view(), current.view());
        current = next;
        if shift < stop {
            return Mode {
                center: current,
                support,
                iterations,
                converged: true,
            };
        }
    }

    Mode {
        center: current,
        support,
        iterations,
        converged: false,
    }
}

use ndarray::{Array1, Array2};
use num_traits::Float;

use crate::distance::DistanceMeasure;
use crate::mode::Mode;

/// How a cluster's reported centre is derived from the modes merged into it.
/// Labels do not depend on the policy, only reported coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CenterPolicy {
    /// The first mode (in point order) that opened the cluster.
    #[default]
    FirstSeen,
    /// Running mean of every mode merged into the cluster.
    RunningMean,
}

/// Merge modes lying within `merge_tolerance` of an existing centre.
///
/// Modes are visited strictly in point order; a mode joins the closest centre
/// within tolerance (ties go to the earliest centre), otherwise it opens a new
/// one. Labels are dense, starting at 0, in order of first appearance.
pub fn aggregate<F>(
    modes: &[Mode<F>],
    measure: DistanceMeasure,
    merge_tolerance: F,
    policy: CenterPolicy,
) -> (Array2<F>, Vec<usize>)
where
    F: Float,
{
    let mut centers: Vec<Array1<F>> = Vec::new();
    let mut members: Vec<usize> = Vec::new();
    let mut labels = Vec::with_capacity(modes.len());

    for mode in modes {
        let closest = centers
            .iter()
            .map(|c| measure.between(mode.center.view(), c.view()))
            .enumerate()
            .fold(None, |best: Option<(usize, F)>, (i, d)| match best {
                Some((_, min)) if d >= min => best,
                _ => Some((i, d)),
            });

        match closest {
            Some((label, d)) if d <= merge_tolerance => {
                if policy == CenterPolicy::RunningMean {
                    members[label] += 1;
                    let count = F::from(members[label]).unwrap();
                    centers[label].zip_mut_with(&mode.center, |c, &m| {
                        *c = *c + (m - *c) / count;
                    });
                }
                labels.push(label);
            }
            _ => {
                labels.push(centers.len());
                centers.push(mode.center.clone());
                members.push(1);
            }
        }
    }

    let dim = modes.first().map_or(0, |m| m.center.len());
    let mut out = Array2::<F>::zeros((centers.len(), dim));
    out.rows_mut()
        .into_iter()
        .zip(centers.iter())
        .for_each(|(mut row, c)| row.assign(c));
    (out, labels)
}

#[cfg(test)]
mod test {
    use ndarray::{arr1, arr2, Array1};

    use crate::aggregate::{aggregate, CenterPolicy};
    use crate::mode::Mode;
    use crate::DistanceMeasure;

    fn mode(center: Array1<f64>) -> Mode<f64> {
        Mode {
            center,
            support: 1,
            iterations: 1,
            converged: true,
        }
    }

    #[test]
    fn merges_near_duplicates() {
        let modes = vec![
            mode(arr1(&[0., 0.])),
            mode(arr1(&[10., 10.])),
            mode(arr1(&[0.01, 0.])),
            mode(arr1(&[10., 10.02])),
            mode(arr1(&[0., 0.])),
        ];
        let (centers, labels) =
            aggregate(&modes, DistanceMeasure::Euclidean, 0.5, CenterPolicy::FirstSeen);
        assert_eq!(labels, vec![0, 1, 0, 1, 0]);
        assert_eq!(centers, arr2(&[[0., 0.], [10., 10.]]));
    }

    #[test]
    fn running_mean_moves_centres_not_labels() {
        let modes = vec![
            mode(arr1(&[0., 0.])),
            mode(arr1(&[0.2, 0.])),
            mode(arr1(&[0.4, 0.])),
        ];
        let (first, first_labels) =
            aggregate(&modes, DistanceMeasure::Euclidean, 0.5, CenterPolicy::FirstSeen);
        let (mean, mean_labels) =
            aggregate(&modes, DistanceMeasure::Euclidean, 0.5, CenterPolicy::RunningMean);
        assert_eq!(first_labels, mean_labels);
        assert_eq!(first, arr2(&[[0., 0.]]));
        assert!((mean[[0, 0]] - 0.2).abs() < 1e-12);
    }

    #[test]
    fn ties_go_to_earliest_centre() {
        let modes = vec![
            mode(arr1(&[0., 0.])),
            mode(arr1(&[2., 0.])),
            mode(arr1(&[1., 0.])),
        ];
        let (centers, labels) =
            aggregate(&modes, DistanceMeasure::Euclidean, 1.0, CenterPolicy::FirstSeen);
        assert_eq!(centers.nrows(), 2);
        assert_eq!(labels, vec![0, 1, 0]);
    }

    #[test]
    fn aggregation_is_idempotent() {
        let modes: Vec<Mode<f64>> = (0..40)
            .map(|i| mode(arr1(&[(i % 4) as f64 * 5. + (i as f64) * 1e-3, 1.])))
            .collect();
        let a = aggregate(&modes, DistanceMeasure::Manhattan, 0.5, CenterPolicy::RunningMean);
        let b = aggregate(&modes, DistanceMeasure::Manhattan, 0.5, CenterPolicy::RunningMean);
        assert_eq!(a, b);
        assert_eq!(a.0.nrows(), 4);
    }
}

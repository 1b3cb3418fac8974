use std::fmt::{Display, Formatter};
use std::str::FromStr;

use ndarray::ArrayView1;
use num_traits::Float;

use crate::error::{ClusterError, Result};

/// Named distance measure, resolved once per run.
///
/// Bandwidths and tolerances are always expressed in the units of the chosen
/// measure: clustering with `Euclidean` and bandwidth `b` partitions the same
/// way as `SquaredEuclidean` with bandwidth `b * b`.
///
/// ```
/// use ndarray::arr1;
/// use meanshift::DistanceMeasure;
///
/// let a = arr1(&[1., 1., 1.]);
/// let b = arr1(&[3., 3., 3.]);
/// let d: f64 = DistanceMeasure::SquaredEuclidean.distance(a.view(), b.view()).unwrap();
/// assert!((d - 12.0).abs() < 1e-8);
/// let m: f64 = "manhattan".parse::<DistanceMeasure>().unwrap().distance(a.view(), b.view()).unwrap();
/// assert!((m - 6.0).abs() < 1e-8);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistanceMeasure {
    /// `sqrt(sum((a_i - b_i)**2))`
    #[default]
    Euclidean,
    /// `sum((a_i - b_i)**2)`
    SquaredEuclidean,
    /// `sum(|a_i - b_i|)`
    Manhattan,
    /// Dynamic time warping over the absolute coordinate difference.
    /// Series may differ in length; the shift still averages coordinate-wise.
    Dtw,
}

impl DistanceMeasure {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Euclidean => "euclidean",
            Self::SquaredEuclidean => "squared_euclidean",
            Self::Manhattan => "manhattan",
            Self::Dtw => "dtw",
        }
    }

    /// Distance between `a` and `b`, failing when their lengths differ
    /// (warping only needs both to be non-empty).
    pub fn distance<F>(&self, a: ArrayView1<F>, b: ArrayView1<F>) -> Result<F>
    where
        F: Float,
    {
        if *self == Self::Dtw {
            if a.is_empty() || b.is_empty() {
                return Err(ClusterError::EmptyInput);
            }
            return Ok(warping(a, b));
        }
        if a.len() != b.len() {
            return Err(ClusterError::DimensionMismatch {
                expected: a.len(),
                found: b.len(),
            });
        }
        Ok(self.between(a, b))
    }

    /// Distance for inputs already validated to share a length.
    #[inline]
    pub(crate) fn between<F>(&self, a: ArrayView1<F>, b: ArrayView1<F>) -> F
    where
        F: Float,
    {
        debug_assert_eq!(a.len(), b.len());
        let pairs = a.iter().zip(b.iter());
        match self {
            Self::Euclidean => pairs
                .fold(F::zero(), |acc, (&x, &y)| acc + (x - y).powi(2))
                .sqrt(),
            Self::SquaredEuclidean => pairs.fold(F::zero(), |acc, (&x, &y)| acc + (x - y).powi(2)),
            Self::Manhattan => pairs.fold(F::zero(), |acc, (&x, &y)| acc + (x - y).abs()),
            Self::Dtw => warping(a, b),
        }
    }

    /// Scale a relative tolerance (a fraction of the bandwidth in linear units)
    /// into this measure's units.
    pub fn threshold<F>(&self, bandwidth: F, fraction: F) -> F
    where
        F: Float,
    {
        match self {
            Self::SquaredEuclidean => bandwidth * fraction * fraction,
            _ => bandwidth * fraction,
        }
    }

    /// `(d / h)**2` measured in linear units.
    #[inline]
    fn ratio_squared<F>(&self, distance: F, bandwidth: F) -> F
    where
        F: Float,
    {
        match self {
            Self::SquaredEuclidean => distance / bandwidth,
            _ => (distance / bandwidth).powi(2),
        }
    }
}

/// Cumulative warping cost, keeping only the previous row of the cost matrix.
fn warping<F>(a: ArrayView1<F>, b: ArrayView1<F>) -> F
where
    F: Float,
{
    let mut previous = vec![F::infinity(); b.len() + 1];
    let mut row = vec![F::infinity(); b.len() + 1];
    previous[0] = F::zero();
    for &x in a.iter() {
        row[0] = F::infinity();
        for (j, &y) in b.iter().enumerate() {
            let best = previous[j].min(previous[j + 1]).min(row[j]);
            row[j + 1] = (x - y).abs() + best;
        }
        std::mem::swap(&mut previous, &mut row);
    }
    previous[b.len()]
}

impl FromStr for DistanceMeasure {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "euclidean" | "minkowski" => Ok(Self::Euclidean),
            "squared_euclidean" | "sqeuclidean" => Ok(Self::SquaredEuclidean),
            "manhattan" | "cityblock" => Ok(Self::Manhattan),
            "dtw" => Ok(Self::Dtw),
            _ => Err(ClusterError::UnsupportedMeasure(s.to_string())),
        }
    }
}

impl Display for DistanceMeasure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Weighting applied to points inside the bandwidth window.
/// Points outside the window always weigh 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Kernel {
    /// Weight 1 inside the window.
    #[default]
    Flat,
    /// `exp(-u**2 / 2)` where `u` is the distance in bandwidth units.
    Gaussian,
}

impl Kernel {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Flat => "flat",
            Self::Gaussian => "gaussian",
        }
    }

    #[inline]
    pub(crate) fn weight<F>(&self, distance: F, bandwidth: F, measure: DistanceMeasure) -> F
    where
        F: Float,
    {
        if distance > bandwidth {
            return F::zero();
        }
        match self {
            Self::Flat => F::one(),
            Self::Gaussian => {
                let half = F::one() / (F::one() + F::one());
                (-measure.ratio_squared(distance, bandwidth) * half).exp()
            }
        }
    }
}

impl FromStr for Kernel {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "flat" | "uniform" => Ok(Self::Flat),
            "gaussian" | "rbf" => Ok(Self::Gaussian),
            _ => Err(ClusterError::UnsupportedKernel(s.to_string())),
        }
    }
}

impl Display for Kernel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

use ndarray::{ArcArray2, Array2, ArrayView1, ArrayView2, Axis};
use num_traits::Float;

use crate::error::{ClusterError, Result};

/// Immutable, validated `(n, d)` point matrix shared by every worker of a run.
///
/// Cloning is cheap: rows live in a reference-counted buffer and are never
/// written after ingestion.
#[derive(Debug, Clone)]
pub struct PointSet<F> {
    data: ArcArray2<F>,
}

impl<F> PointSet<F>
where
    F: Float,
{
    /// Take ownership of a dense matrix (rows = samples, cols = coordinates).
    ///
    /// Fails on an empty matrix, on zero-width rows and on any non-finite
    /// coordinate.
    pub fn new(x: Array2<F>) -> Result<Self> {
        let (n, d) = x.dim();
        if n == 0 {
            return Err(ClusterError::EmptyInput);
        }
        if d == 0 {
            return Err(ClusterError::DimensionMismatch {
                expected: 1,
                found: 0,
            });
        }
        if let Some(position) = x.iter().position(|v| !v.is_finite()) {
            return Err(ClusterError::InvalidInput {
                row: position / d,
                column: position % d,
            });
        }
        Ok(Self {
            data: x.into_shared(),
        })
    }

    /// Build from a list of vectors that must already share one length.
    pub fn from_rows(rows: &[Vec<F>]) -> Result<Self> {
        let d = match rows.first() {
            Some(row) => row.len(),
            None => return Err(ClusterError::EmptyInput),
        };
        if let Some(row) = rows.iter().find(|r| r.len() != d) {
            return Err(ClusterError::DimensionMismatch {
                expected: d,
                found: row.len(),
            });
        }
        let mut x = Array2::<F>::zeros((rows.len(), d));
        x.axis_iter_mut(Axis(0))
            .zip(rows.iter())
            .for_each(|(mut dst, src)| {
                dst.iter_mut().zip(src.iter()).for_each(|(v, s)| *v = *s);
            });
        Self::new(x)
    }

    pub fn len(&self) -> usize {
        self.data.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.data.nrows() == 0
    }

    pub fn dim(&self) -> usize {
        self.data.ncols()
    }

    pub fn row(&self, i: usize) -> ArrayView1<F> {
        self.data.row(i)
    }

    pub fn rows(&self) -> ndarray::iter::AxisIter<'_, F, ndarray::Ix1> {
        self.data.axis_iter(Axis(0))
    }

    pub fn view(&self) -> ArrayView2<F> {
        self.data.view()
    }
}

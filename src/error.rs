use thiserror::Error;

/// Errors returned while fitting or applying a mean shift model.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// The point set has no rows.
    #[error("empty input")]
    EmptyInput,

    /// Two points (or a point and a centre) have different lengths.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// A coordinate is NaN or infinite, usually left behind by padding ragged input.
    #[error("invalid input: non-finite value at row {row}, column {column}")]
    InvalidInput { row: usize, column: usize },

    /// Bandwidth is non-positive or non-finite.
    #[error("invalid bandwidth {0}: must be positive and finite")]
    InvalidBandwidth(f64),

    #[error("unsupported distance measure {0:?}")]
    UnsupportedMeasure(String),

    #[error("unsupported kernel {0:?}")]
    UnsupportedKernel(String),

    /// Invalid tuning parameter.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        name: &'static str,
        message: &'static str,
    },

    /// A unit of parallel work panicked or its worker went away.
    #[error("worker failure: {0}")]
    WorkerFailure(String),

    #[error(transparent)]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, ClusterError>;

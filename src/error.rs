use thiserror::Error;

/// Result type for decomposition operations.
pub type Result<T> = std::result::Result<T, EemdError>;

/// Errors reported by the decomposition entry points.
///
/// All of these are raised before any output is written.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EemdError {
    /// Invalid parameter combination passed to a decomposition routine.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Caller-provided output buffer has the wrong length.
    #[error("Output buffer size mismatch: expected {expected}, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// Knots passed to the standalone spline evaluator are unusable.
    #[error("Invalid spline knots: {0}")]
    InvalidKnots(String),

    /// The spline solve failed for the standalone evaluator.
    #[error(transparent)]
    Spline(#[from] SplineError),

    /// The worker pool could not be created.
    #[error("Failed to build worker pool: {0}")]
    ThreadPool(String),
}

/// Failure inside a single spline evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SplineError {
    /// Zero pivot while eliminating the tridiagonal system.
    #[error("Singular tridiagonal system (zero pivot at row {row})")]
    SingularSystem { row: usize },
}

use crate::timeseries::FloatValue;
use thiserror::Error;

/// Error type for invalid operations.
///
/// There are no transient failure modes: every error is a caller
/// configuration mistake and is reported rather than retried or masked.
#[derive(Error, Debug)]
pub enum ComicsError {
    /// A configuration value failed validation before the first step.
    #[error("invalid parameter {0}: {1}")]
    InvalidParameter(&'static str, String),
    /// The equilibrium relation could not produce a volume for a control
    /// parameter value. Aborts the run; a trajectory with silently skipped
    /// steps would be worse than a failed one.
    #[error("equilibrium relation undefined at control={0}: {1}")]
    Evaluation(FloatValue, String),
}

/// Convenience type for `Result<T, ComicsError>`.
pub type ComicsResult<T> = Result<T, ComicsError>;

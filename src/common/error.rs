//! Error types for mpc_path_tracker

use std::fmt;

use thiserror::Error;

/// Why the solver gave up on a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// No point satisfying the dynamics constraints could be found
    Infeasible,
    /// The iteration limit was hit before convergence
    IterationLimit,
    /// The wall-clock ceiling was hit before convergence
    TimeLimit,
    /// A non-finite value or unsolvable linear system was encountered
    NumericalError,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Infeasible => write!(f, "problem infeasible"),
            FailureReason::IterationLimit => write!(f, "iteration limit reached"),
            FailureReason::TimeLimit => write!(f, "time limit reached"),
            FailureReason::NumericalError => write!(f, "numerical error"),
        }
    }
}

/// Main error type for the MPC core
#[derive(Debug, Error)]
pub enum MpcError {
    /// Configuration rejected before the problem was built
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The solver returned without an acceptable point. No partial
    /// actuation is available; recovery policy is up to the caller.
    #[error("solve failed: {0}")]
    SolveFailed(FailureReason),
}

/// Result type alias for MPC operations
pub type MpcResult<T> = Result<T, MpcError>;

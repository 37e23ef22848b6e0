//! Error type shared by every stage of a rank-maximal run.

use crate::lexi::Stage;
use thiserror::Error;

/// Errors raised while building an instance or running the optimizer.
///
/// Every variant is fatal for the run that produced it. Nothing is
/// retried or substituted internally; a [`MatchError::SolverTimeout`]
/// may be retried by the caller with a larger budget.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatchError {
    /// Malformed agents, slots, edges or ranks. No solve was attempted.
    #[error("invalid instance: {0}")]
    InvalidInstance(String),

    /// A pass returned a non-optimal status (infeasible, unbounded, error).
    #[error("optimization failed at {stage} pass: {reason}")]
    OptimizationFailed { stage: Stage, reason: String },

    /// A relaxation value lies strictly between 0 and 1 outside tolerance.
    ///
    /// `edge` is `None` when the offending value is a pass objective
    /// rather than a single edge variable.
    #[error("integrality violation at {stage} pass (edge {edge:?}): value {value}")]
    IntegralityViolation {
        stage: Stage,
        edge: Option<usize>,
        value: f64,
    },

    /// A bounded-time solve did not complete.
    #[error("solver timed out at {stage} pass after {elapsed_ms} ms")]
    SolverTimeout { stage: Stage, elapsed_ms: u64 },

    /// A configuration struct failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MatchError>;

//! Relaxation solver interface.

use super::model::RelaxationProblem;

/// Status of a relaxation solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverStatus {
    /// Proven optimal solution found.
    Optimal,
    /// No point satisfies the constraints.
    Infeasible,
    /// Objective is unbounded.
    Unbounded,
    /// Solver exceeded its time limit.
    Timeout,
    /// Model rejected or backend failure.
    Error,
}

impl std::fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SolverStatus::Optimal => "optimal",
            SolverStatus::Infeasible => "infeasible",
            SolverStatus::Unbounded => "unbounded",
            SolverStatus::Timeout => "timeout",
            SolverStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// Solution from a relaxation solver.
#[derive(Debug, Clone, PartialEq)]
pub struct RelaxationSolution {
    pub status: SolverStatus,
    /// Objective value (only for `Optimal`).
    pub objective_value: Option<f64>,
    /// One value per variable (empty unless `Optimal`).
    pub values: Vec<f64>,
    /// Wall-clock solve time in milliseconds.
    pub solve_time_ms: u64,
    /// Backend diagnostic, if any.
    pub message: Option<String>,
}

impl RelaxationSolution {
    /// Creates an empty solution with the given status.
    pub fn empty(status: SolverStatus) -> Self {
        Self {
            status,
            objective_value: None,
            values: Vec::new(),
            solve_time_ms: 0,
            message: None,
        }
    }

    /// Creates an optimal solution.
    pub fn optimal(objective_value: f64, values: Vec<f64>) -> Self {
        Self {
            status: SolverStatus::Optimal,
            objective_value: Some(objective_value),
            values,
            solve_time_ms: 0,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_solve_time_ms(mut self, ms: u64) -> Self {
        self.solve_time_ms = ms;
        self
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolverStatus::Optimal
    }

    /// Status plus message, for error reporting.
    pub fn describe(&self) -> String {
        match &self.message {
            Some(msg) => format!("{} ({msg})", self.status),
            None => self.status.to_string(),
        }
    }
}

/// Per-call solver configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolverConfig {
    /// Maximum solve time in milliseconds. `None` = unbounded.
    pub time_limit_ms: Option<u64>,
}

impl SolverConfig {
    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }
}

/// Trait for relaxation solver backends.
///
/// Variables are continuous in `[0, 1]`. Implementations must return an
/// optimal *basic* solution (a vertex) so that, over the bipartite
/// capacity rows, values come back integral. A bounded call that runs
/// out of time reports [`SolverStatus::Timeout`] instead of blocking.
pub trait RelaxationSolver: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Solves the problem and returns a solution.
    fn solve(&self, problem: &RelaxationProblem<'_>, config: &SolverConfig) -> RelaxationSolution;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solution_constructors() {
        let s = RelaxationSolution::empty(SolverStatus::Infeasible).with_message("row 3");
        assert!(!s.is_optimal());
        assert_eq!(s.describe(), "infeasible (row 3)");

        let s = RelaxationSolution::optimal(2.0, vec![1.0, 1.0]).with_solve_time_ms(5);
        assert!(s.is_optimal());
        assert_eq!(s.objective_value, Some(2.0));
        assert_eq!(s.solve_time_ms, 5);
        assert_eq!(s.describe(), "optimal");
    }

    #[test]
    fn test_solver_config_default() {
        let config = SolverConfig::default();
        assert_eq!(config.time_limit_ms, None);
        assert_eq!(config.with_time_limit_ms(50).time_limit_ms, Some(50));
    }
}

//! End-to-end rank-maximal solve: optimizer, then extraction.

use crate::error::Result;
use crate::extract::{extract_matching, Matching};
use crate::instance::Instance;
use crate::lexi::{LexiConfig, LexicographicOptimizer, PassRecord, RankSignature};
use crate::relax::{LpRelaxationSolver, RelaxationSolver};
use log::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Output of a rank-maximal solve.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RankMaximalOutcome {
    pub signature: RankSignature,
    /// One matching realizing `signature`. Sentinel pairs included.
    pub matching: Matching,
    /// Final per-edge relaxation values, in edge index order.
    pub values: Vec<f64>,
    pub passes: Vec<PassRecord>,
}

impl RankMaximalOutcome {
    /// Locked maximum number of matched agents (`K_total`).
    pub fn total(&self) -> u32 {
        self.signature.total()
    }
}

/// Rank-maximal solver: a relaxation backend plus optimizer settings.
///
/// # Examples
///
/// ```
/// use u_rankmatch::engine::RankMaximalSolver;
/// use u_rankmatch::instance::InstanceBuilder;
/// use u_rankmatch::lexi::LexiConfig;
///
/// let instance = InstanceBuilder::new()
///     .with_slot("A", 1)
///     .with_slot("B", 1)
///     .with_sentinel("None", 10)
///     .with_agent("r1", ["A", "B"])
///     .with_agent("r2", ["B", "A"])
///     .with_agent("r3", ["A"])
///     .build()
///     .unwrap();
///
/// let solver = RankMaximalSolver::new()
///     .with_config(LexiConfig::default().with_total_time_limit_ms(60_000));
/// let outcome = solver.solve(&instance).unwrap();
///
/// assert_eq!(outcome.total(), 3);
/// assert_eq!(outcome.signature.rows(), vec![(1, 2), (2, 1), (3, 0)]);
/// assert_eq!(outcome.matching.unmatched(&instance), vec!["r3"]);
/// ```
#[derive(Debug, Clone)]
pub struct RankMaximalSolver<S: RelaxationSolver = LpRelaxationSolver> {
    solver: S,
    config: LexiConfig,
}

impl RankMaximalSolver<LpRelaxationSolver> {
    /// Solver using the LP backend and default settings.
    pub fn new() -> Self {
        Self {
            solver: LpRelaxationSolver::new(),
            config: LexiConfig::default(),
        }
    }
}

impl Default for RankMaximalSolver<LpRelaxationSolver> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: RelaxationSolver> RankMaximalSolver<S> {
    /// Replaces the relaxation backend.
    pub fn with_solver<T: RelaxationSolver>(self, solver: T) -> RankMaximalSolver<T> {
        RankMaximalSolver {
            solver,
            config: self.config,
        }
    }

    pub fn with_config(mut self, config: LexiConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &LexiConfig {
        &self.config
    }

    /// Runs the lock sequence and extracts one matching.
    pub fn solve(&self, instance: &Instance) -> Result<RankMaximalOutcome> {
        let optimizer = LexicographicOptimizer::new(instance, &self.solver, self.config.clone())?;
        let result = optimizer.run()?;
        let matching = extract_matching(instance, &result.values, self.config.epsilon)?;
        debug!(
            "extracted {} assignments ({} to real slots)",
            matching.len(),
            matching.assigned().count()
        );

        Ok(RankMaximalOutcome {
            signature: result.signature,
            matching,
            values: result.values,
            passes: result.passes,
        })
    }

    /// Solves independent instances; in parallel with the `parallel` feature.
    pub fn solve_batch(&self, instances: &[Instance]) -> Vec<Result<RankMaximalOutcome>> {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            instances.par_iter().map(|inst| self.solve(inst)).collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            instances.iter().map(|inst| self.solve(inst)).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MatchError;
    use crate::instance::InstanceBuilder;
    use crate::lexi::Stage;
    use crate::relax::{Objective, RelaxationProblem, RelaxationSolution, SolverConfig};

    /// Solves with the LP backend, then splits one selected edge with an
    /// unselected edge of the same rank. Every lock sum is preserved.
    struct SmearingSolver {
        ranks: Vec<u32>,
    }

    impl RelaxationSolver for SmearingSolver {
        fn name(&self) -> &str {
            "smearing"
        }

        fn solve(
            &self,
            problem: &RelaxationProblem<'_>,
            config: &SolverConfig,
        ) -> RelaxationSolution {
            let mut solution = LpRelaxationSolver::new().solve(problem, config);
            if problem.objective == Objective::Feasibility {
                let values = &mut solution.values;
                if let Some(i) = values.iter().position(|&v| v > 0.5) {
                    let rank = self.ranks[i];
                    let partner =
                        (0..values.len()).find(|&j| self.ranks[j] == rank && values[j] < 0.5);
                    if let Some(j) = partner {
                        values[i] = 0.6;
                        values[j] = 0.4;
                    }
                }
            }
            solution
        }
    }

    fn instance(extra: &str) -> Instance {
        InstanceBuilder::new()
            .with_slot("A", 1)
            .with_slot("B", 2)
            .with_sentinel("None", 10)
            .with_agent("r1", ["A", "B"])
            .with_agent("r2", ["A", "B"])
            .with_agent("r3", ["B"])
            .with_agent(extra, ["B", "A"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_solve_respects_capacity() {
        let inst = instance("r4");
        let outcome = RankMaximalSolver::new().solve(&inst).unwrap();

        assert_eq!(outcome.total(), 4);
        // A holds one, B holds two, so one agent falls to the sentinel.
        assert_eq!(outcome.signature.count(1), Some(3));
        assert!(outcome.matching.load("A") <= 1);
        assert!(outcome.matching.load("B") <= 2);
        assert_eq!(outcome.matching.len(), 4);
        assert_eq!(outcome.passes.len(), inst.max_rank() as usize + 2);

        assert_eq!(outcome.values.len(), inst.edge_count());
        let selected = outcome.values.iter().filter(|&&v| v > 0.5).count();
        assert_eq!(selected, outcome.matching.len());
    }

    #[test]
    fn test_pass_time_limit_surfaces_as_timeout() {
        let slots: Vec<String> = (0..60).map(|s| format!("h{s}")).collect();
        let mut builder = InstanceBuilder::new();
        for slot in &slots {
            builder = builder.with_slot(slot.as_str(), 5);
        }
        builder = builder.with_sentinel("None", 800);
        for a in 0..800 {
            let prefs = (0..8).map(|k| slots[(a * 7 + k * 5) % 60].as_str());
            builder = builder.with_agent(format!("r{a}"), prefs);
        }
        let inst = builder.build().unwrap();

        let solver = RankMaximalSolver::new()
            .with_config(LexiConfig::default().with_pass_time_limit_ms(1));
        let err = solver.solve(&inst).unwrap_err();
        assert!(matches!(
            err,
            MatchError::SolverTimeout {
                stage: Stage::Total,
                ..
            }
        ));
    }

    #[test]
    fn test_fractional_vertex_surfaces() {
        let inst = instance("r4");
        let ranks = inst.edges().iter().map(|e| e.rank).collect();
        let solver = RankMaximalSolver::new().with_solver(SmearingSolver { ranks });
        let err = solver.solve(&inst).unwrap_err();
        assert!(matches!(
            err,
            MatchError::IntegralityViolation {
                edge: Some(_),
                ..
            }
        ));
    }

    #[test]
    fn test_batch() {
        let instances = vec![instance("r4"), instance("r5")];
        let results = RankMaximalSolver::new().solve_batch(&instances);
        assert_eq!(results.len(), 2);
        for result in results {
            let outcome = result.unwrap();
            assert_eq!(outcome.signature.count(1), Some(3));
        }
    }
}

//! Lexicographic lock-and-reoptimize loop.
//!
//! # Algorithm
//!
//! 1. Build the structural rows (per agent, per slot) once
//! 2. Maximize the total number of matched edges; lock it
//! 3. For each rank `r = 1..=max_rank`, maximize rank-`r` edges under all
//!    locks so far; lock the optimum
//! 4. Solve once more with a zero objective to obtain one vertex that
//!    satisfies every lock
//!
//! Exactly `max_rank + 2` solver calls are made. Because each rank is
//! locked before the next one is optimized, no gain at rank `r + 1` can
//! ever be traded for a loss at rank `r`.

use super::config::LexiConfig;
use super::types::{Lock, LockSet, LockTarget, PassRecord, RankSignature, RunState, Stage};
use crate::error::{MatchError, Result};
use crate::instance::Instance;
use crate::relax::{
    structural_constraints, Constraint, LinearExpr, Objective, RelaxationProblem,
    RelaxationSolution, RelaxationSolver, SolverConfig, SolverStatus,
};
use log::{debug, info, trace, warn};
use std::time::{Duration, Instant};

/// Result of a completed lexicographic run.
#[derive(Debug, Clone)]
pub struct LexiResult {
    /// Per-rank counts and the locked total.
    pub signature: RankSignature,
    /// Every lock added during the run, in order.
    pub locks: LockSet,
    /// Final per-edge relaxation values (edge index order).
    pub values: Vec<f64>,
    /// One record per solver call.
    pub passes: Vec<PassRecord>,
}

/// Wall-clock budget across the pass sequence.
#[derive(Debug, Clone, Copy)]
struct Budget {
    started: Instant,
    deadline: Instant,
}

impl Budget {
    fn new(limit_ms: u64) -> Self {
        let started = Instant::now();
        Self {
            started,
            deadline: started + Duration::from_millis(limit_ms),
        }
    }

    fn remaining_ms(&self) -> u64 {
        self.deadline
            .saturating_duration_since(Instant::now())
            .as_millis() as u64
    }

    fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

/// Runs the rank-maximal lock sequence for one instance.
///
/// The optimizer owns the structural rows; locks are passed in and
/// returned by value so intermediate states can be driven step by step.
///
/// # Examples
///
/// ```
/// use u_rankmatch::instance::InstanceBuilder;
/// use u_rankmatch::lexi::{LexiConfig, LexicographicOptimizer};
/// use u_rankmatch::relax::LpRelaxationSolver;
///
/// let instance = InstanceBuilder::new()
///     .with_slot("A", 1)
///     .with_sentinel("None", 2)
///     .with_agent("r1", ["A"])
///     .with_agent("r2", ["A"])
///     .build()
///     .unwrap();
///
/// let solver = LpRelaxationSolver::new();
/// let optimizer = LexicographicOptimizer::new(&instance, &solver, LexiConfig::default()).unwrap();
/// let result = optimizer.run().unwrap();
///
/// assert_eq!(result.signature.total(), 2);
/// assert_eq!(result.signature.rows(), vec![(1, 1), (2, 1)]);
/// ```
pub struct LexicographicOptimizer<'a, S: RelaxationSolver + ?Sized> {
    instance: &'a Instance,
    solver: &'a S,
    config: LexiConfig,
    structural: Vec<Constraint>,
}

impl<'a, S: RelaxationSolver + ?Sized> LexicographicOptimizer<'a, S> {
    /// Creates an optimizer and builds the structural rows.
    pub fn new(instance: &'a Instance, solver: &'a S, config: LexiConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            instance,
            solver,
            config,
            structural: structural_constraints(instance),
        })
    }

    /// Structural rows shared by every pass.
    pub fn structural(&self) -> &[Constraint] {
        &self.structural
    }

    pub fn config(&self) -> &LexiConfig {
        &self.config
    }

    /// Runs the full pass sequence.
    ///
    /// # Errors
    ///
    /// Any failed pass aborts the run; no partial signature is returned.
    pub fn run(&self) -> Result<LexiResult> {
        let budget = self.config.total_time_limit_ms.map(Budget::new);
        info!(
            "rank-maximal run: {} agents, {} slots, {} edges, max rank {} ({})",
            self.instance.agent_count(),
            self.instance.slot_count(),
            self.instance.edge_count(),
            self.instance.max_rank(),
            self.solver.name()
        );

        let result = self.run_passes(budget.as_ref());
        match &result {
            Ok(res) => info!(
                "run finished: total {} in {} passes",
                res.signature.total(),
                res.passes.len()
            ),
            Err(err) => warn!("run aborted: {err}"),
        }
        result
    }

    /// Total pass: maximize all edges and lock the optimum.
    pub fn lock_total(&self, locks: LockSet) -> Result<(LockSet, PassRecord)> {
        self.lock_pass(LockTarget::Total, locks, None)
    }

    /// Rank pass: maximize rank-`rank` edges under `locks` and lock the optimum.
    pub fn lock_rank(&self, rank: u32, locks: LockSet) -> Result<(LockSet, PassRecord)> {
        self.lock_pass(LockTarget::Rank(rank), locks, None)
    }

    /// Feasibility pass: one vertex satisfying every lock.
    pub fn feasible_vertex(&self, locks: &LockSet) -> Result<(Vec<f64>, PassRecord)> {
        self.vertex_pass(locks, None)
    }

    fn run_passes(&self, budget: Option<&Budget>) -> Result<LexiResult> {
        let max_rank = self.instance.max_rank();
        let mut state = RunState::Init;
        let mut locks = LockSet::new();
        let mut passes = Vec::with_capacity(max_rank as usize + 2);
        let mut counts = Vec::with_capacity(max_rank as usize);
        let mut total = 0;
        let mut values = Vec::new();

        while !state.is_terminal() {
            trace!("optimizer state {state:?}");
            match state {
                RunState::Init => {}
                RunState::TotalLocked => {
                    let (next, record) = self.lock_pass(LockTarget::Total, locks, budget)?;
                    total = next.get(LockTarget::Total).unwrap_or_default();
                    locks = next;
                    passes.push(record);
                }
                RunState::RankLocking(rank) => {
                    let (next, record) = self.lock_pass(LockTarget::Rank(rank), locks, budget)?;
                    counts.push(next.get(LockTarget::Rank(rank)).unwrap_or_default());
                    locks = next;
                    passes.push(record);
                }
                RunState::Extracting => {
                    let (vertex, record) = self.vertex_pass(&locks, budget)?;
                    values = vertex;
                    passes.push(record);
                }
                RunState::Done | RunState::Aborted => break,
            }
            state = state.next(max_rank);
        }

        Ok(LexiResult {
            signature: RankSignature::new(counts, total),
            locks,
            values,
            passes,
        })
    }

    fn target_expr(&self, target: LockTarget) -> LinearExpr {
        match target {
            LockTarget::Total => LinearExpr::sum_of(0..self.instance.edge_count()),
            LockTarget::Rank(rank) => LinearExpr::sum_of(self.instance.edges_at_rank(rank)),
        }
    }

    fn lock_pass(
        &self,
        target: LockTarget,
        locks: LockSet,
        budget: Option<&Budget>,
    ) -> Result<(LockSet, PassRecord)> {
        let stage = target.stage();
        let expr = self.target_expr(target);
        let solution = self.solve_pass(stage, Objective::Maximize(expr.clone()), &locks, budget)?;

        let raw = solution
            .objective_value
            .unwrap_or_else(|| expr.evaluate(&solution.values));
        let value = self.round_count(stage, raw)?;
        debug!("{stage} pass: objective {raw:.6} -> {target} == {value}");

        let record = PassRecord {
            stage,
            objective_value: raw,
            solve_time_ms: solution.solve_time_ms,
        };
        Ok((locks.with(Lock::new(target, expr, value))?, record))
    }

    fn vertex_pass(
        &self,
        locks: &LockSet,
        budget: Option<&Budget>,
    ) -> Result<(Vec<f64>, PassRecord)> {
        let stage = Stage::Feasibility;
        let solution = self.solve_pass(stage, Objective::Feasibility, locks, budget)?;

        // Backends may stop short on a zero objective; the vertex must still
        // honor every lock.
        let tolerance = self.config.epsilon * self.instance.edge_count().max(1) as f64;
        if let Some(lock) = locks
            .iter()
            .find(|l| !l.constraint().is_satisfied(&solution.values, tolerance))
        {
            return Err(MatchError::OptimizationFailed {
                stage,
                reason: format!("vertex violates {}", lock.target),
            });
        }
        debug!("feasibility pass: vertex satisfies {} locks", locks.len());

        let record = PassRecord {
            stage,
            objective_value: solution.objective_value.unwrap_or(0.0),
            solve_time_ms: solution.solve_time_ms,
        };
        Ok((solution.values, record))
    }

    fn solve_pass(
        &self,
        stage: Stage,
        objective: Objective,
        locks: &LockSet,
        budget: Option<&Budget>,
    ) -> Result<RelaxationSolution> {
        let mut solver_config = SolverConfig {
            time_limit_ms: self.config.pass_time_limit_ms,
        };
        if let Some(budget) = budget {
            let remaining = budget.remaining_ms();
            if remaining == 0 {
                return Err(MatchError::SolverTimeout {
                    stage,
                    elapsed_ms: budget.elapsed_ms(),
                });
            }
            solver_config.time_limit_ms = Some(
                solver_config
                    .time_limit_ms
                    .map_or(remaining, |ms| ms.min(remaining)),
            );
        }

        let num_vars = self.instance.edge_count();
        let problem = RelaxationProblem::new(num_vars, objective)
            .with_constraints(self.structural.iter())
            .with_constraints(locks.constraints());

        let started = Instant::now();
        let solution = self.solver.solve(&problem, &solver_config);
        trace!(
            "{stage} pass: {} after {} ms",
            solution.status,
            started.elapsed().as_millis()
        );

        match solution.status {
            SolverStatus::Optimal => {}
            SolverStatus::Timeout => {
                return Err(MatchError::SolverTimeout {
                    stage,
                    elapsed_ms: started.elapsed().as_millis() as u64,
                })
            }
            _ => {
                return Err(MatchError::OptimizationFailed {
                    stage,
                    reason: solution.describe(),
                })
            }
        }

        if solution.values.len() != num_vars {
            return Err(MatchError::OptimizationFailed {
                stage,
                reason: format!(
                    "backend returned {} values for {num_vars} variables",
                    solution.values.len()
                ),
            });
        }
        Ok(solution)
    }

    fn round_count(&self, stage: Stage, raw: f64) -> Result<u32> {
        let rounded = raw.round();
        if !raw.is_finite() || rounded < 0.0 || (raw - rounded).abs() > self.config.epsilon {
            return Err(MatchError::IntegralityViolation {
                stage,
                edge: None,
                value: raw,
            });
        }
        Ok(rounded as u32)
    }
}

//! Linear-programming backend built on `good_lp` with the `microlp` simplex.

use super::model::{Constraint, LinearExpr, Objective, RelaxationProblem, Sense};
use super::solver::{RelaxationSolution, RelaxationSolver, SolverConfig, SolverStatus};
use good_lp::{
    microlp, variable, variables, Expression, ResolutionError, Solution, SolverModel, Variable,
};
use log::{trace, warn};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Relaxation solver backed by a dense simplex (`microlp`).
///
/// Simplex returns a basic optimal solution, which over the bipartite
/// capacity rows (and any face cut out by lock rows) is integral.
///
/// With a time limit the solve runs on a worker thread; if the limit
/// expires the call returns [`SolverStatus::Timeout`]. `microlp` cannot be
/// interrupted, so the worker keeps its CPU until the simplex finishes.
/// [`LpRelaxationSolver::in_flight`] counts such workers; clones share
/// the count.
#[derive(Debug, Clone, Default)]
pub struct LpRelaxationSolver {
    in_flight: Arc<AtomicUsize>,
}

impl LpRelaxationSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bounded solves whose worker thread has not finished yet.
    ///
    /// Non-zero after a timeout until the abandoned simplex completes.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    fn solve_bounded(&self, problem: &RelaxationProblem<'_>, limit_ms: u64) -> RelaxationSolution {
        let num_vars = problem.num_vars;
        let objective = problem.objective.clone();
        let rows: Vec<Constraint> = problem.constraints.iter().map(|&c| c.clone()).collect();

        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let guard = InFlight(Arc::clone(&self.in_flight));

        let (tx, rx) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name("rankmatch-lp".into())
            .spawn(move || {
                let refs: Vec<&Constraint> = rows.iter().collect();
                let solution = solve_lp(num_vars, &objective, &refs);
                drop(guard);
                // The receiver may already be gone after a timeout.
                let _ = tx.send(solution);
            });
        if let Err(err) = spawned {
            return RelaxationSolution::empty(SolverStatus::Error)
                .with_message(format!("failed to spawn solver thread: {err}"));
        }

        match rx.recv_timeout(Duration::from_millis(limit_ms)) {
            Ok(solution) => solution,
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    "microlp solve exceeded {limit_ms} ms; {} worker(s) still running",
                    self.in_flight()
                );
                RelaxationSolution::empty(SolverStatus::Timeout)
                    .with_message(format!("exceeded {limit_ms} ms"))
            }
            Err(RecvTimeoutError::Disconnected) => RelaxationSolution::empty(SolverStatus::Error)
                .with_message("solver thread terminated without a result"),
        }
    }
}

/// Decrements the in-flight count when the worker is done, panics included.
struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl RelaxationSolver for LpRelaxationSolver {
    fn name(&self) -> &str {
        "microlp"
    }

    fn solve(&self, problem: &RelaxationProblem<'_>, config: &SolverConfig) -> RelaxationSolution {
        if let Err(msg) = problem.validate() {
            return RelaxationSolution::empty(SolverStatus::Error).with_message(msg);
        }

        let start = Instant::now();
        trace!(
            "microlp solve: {} vars, {} rows",
            problem.num_vars,
            problem.constraint_count()
        );

        let solution = match config.time_limit_ms {
            None => solve_lp(problem.num_vars, &problem.objective, &problem.constraints),
            Some(ms) => self.solve_bounded(problem, ms),
        };

        solution.with_solve_time_ms(start.elapsed().as_millis() as u64)
    }
}

fn solve_lp(num_vars: usize, objective: &Objective, rows: &[&Constraint]) -> RelaxationSolution {
    let mut vars = variables!();
    let xs: Vec<Variable> = (0..num_vars)
        .map(|_| vars.add(variable().min(0.0).max(1.0)))
        .collect();

    let target = match objective {
        Objective::Maximize(expr) => to_expression(expr, &xs),
        Objective::Feasibility => Expression::default(),
    };

    let mut model = vars.maximise(target).using(microlp);
    for row in rows {
        let lhs = to_expression(&row.expr, &xs);
        model = model.with(match row.sense {
            Sense::LessEqual => lhs.leq(row.rhs),
            Sense::Equal => lhs.eq(row.rhs),
        });
    }

    match model.solve() {
        Ok(solution) => {
            let values: Vec<f64> = xs.iter().map(|&x| solution.value(x)).collect();
            RelaxationSolution::optimal(objective.evaluate(&values), values)
        }
        Err(ResolutionError::Infeasible) => RelaxationSolution::empty(SolverStatus::Infeasible),
        Err(ResolutionError::Unbounded) => RelaxationSolution::empty(SolverStatus::Unbounded),
        Err(err) => RelaxationSolution::empty(SolverStatus::Error).with_message(err.to_string()),
    }
}

fn to_expression(expr: &LinearExpr, xs: &[Variable]) -> Expression {
    let mut out = Expression::with_capacity(expr.terms().len());
    for &(var, coef) in expr.terms() {
        out.add_mul(coef, xs[var]);
    }
    out
}

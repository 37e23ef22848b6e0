//! Rank-maximal capacitated assignment via lexicographic LP locking.
//!
//! Given agents with ranked preference lists over capacitated slots, finds
//! an assignment that maximizes the number of assigned agents first, then
//! the number assigned to their first choice, then their second choice,
//! and so on.
//!
//! - **Instance**: agents, capacitated slots, ranked preference edges and
//!   a sentinel slot standing for "unassigned". Includes normalization of
//!   raw resident/hospital rows.
//! - **Relaxation**: the bipartite LP relaxation and a pluggable backend
//!   trait, with a `good_lp` implementation.
//! - **Lexicographic optimizer**: solves the lock sequence (total, then
//!   rank 1, rank 2, ...) and returns the rank signature.
//! - **Extraction**: turns the final integral vertex into a matching.
//! - **Evaluation / export**: summary statistics and CSV/JSON output.
//!
//! # Architecture
//!
//! The relaxation matrix is totally unimodular and every lock restricts
//! the feasible region to an optimal face, so each pass returns an
//! integral vertex. Results are rounded with a fixed tolerance and any
//! fractional value is reported as an error, never rounded away.

pub mod engine;
pub mod error;
pub mod evaluate;
pub mod export;
pub mod extract;
pub mod instance;
pub mod lexi;
pub mod relax;

pub use engine::{RankMaximalOutcome, RankMaximalSolver};
pub use error::{MatchError, Result};
pub use instance::{Instance, InstanceBuilder};

/// Solves `instance` with the LP backend and default settings.
pub fn solve(instance: &Instance) -> Result<RankMaximalOutcome> {
    RankMaximalSolver::new().solve(instance)
}

//! Lexicographic optimizer.
//!
//! Computes the rank signature of a rank-maximal assignment by solving a
//! sequence of linear relaxations, locking each optimum before moving to
//! the next (lower priority) objective: total first, then rank 1, rank 2,
//! and so on. A final zero-objective pass returns one concrete vertex.
//!
//! # Tie-breaking
//!
//! Many matchings can share a signature. The vertex returned by the final
//! pass is whatever the backend produces; callers must not rely on a
//! particular choice among equal-signature matchings.
//!
//! # References
//!
//! Irving, Kavitha, Mehlhorn, Michail & Paluch (2006), "Rank-Maximal Matchings"

mod config;
mod runner;
mod types;

pub use config::LexiConfig;
pub use runner::{LexiResult, LexicographicOptimizer};
pub use types::{Lock, LockSet, LockTarget, PassRecord, RankSignature, RunState, Stage};

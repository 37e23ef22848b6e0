//! Stages, locks and the rank signature.

use crate::error::{MatchError, Result};
use crate::relax::{Constraint, LinearExpr};
use std::cmp::Ordering;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A pass of the optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Stage {
    /// Maximize the total number of matched agents.
    Total,
    /// Maximize matches at one rank.
    Rank(u32),
    /// Zero-objective query for one vertex under all locks.
    Feasibility,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Total => f.write_str("total"),
            Stage::Rank(r) => write!(f, "rank {r}"),
            Stage::Feasibility => f.write_str("feasibility"),
        }
    }
}

/// Optimizer state over one run.
///
/// `Init -> TotalLocked -> RankLocking(1..=max_rank) -> Extracting -> Done`,
/// with `Aborted` reachable from any state when a pass fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Init,
    TotalLocked,
    RankLocking(u32),
    Extracting,
    Done,
    Aborted,
}

impl RunState {
    /// The state following a successful pass.
    pub fn next(self, max_rank: u32) -> RunState {
        match self {
            RunState::Init => RunState::TotalLocked,
            RunState::TotalLocked if max_rank >= 1 => RunState::RankLocking(1),
            RunState::TotalLocked => RunState::Extracting,
            RunState::RankLocking(r) if r < max_rank => RunState::RankLocking(r + 1),
            RunState::RankLocking(_) => RunState::Extracting,
            RunState::Extracting | RunState::Done => RunState::Done,
            RunState::Aborted => RunState::Aborted,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Done | RunState::Aborted)
    }
}

/// The expression a lock pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LockTarget {
    /// Sum over all edges.
    Total,
    /// Sum over edges of one rank.
    Rank(u32),
}

impl LockTarget {
    /// The pass that produces this lock.
    pub fn stage(self) -> Stage {
        match self {
            LockTarget::Total => Stage::Total,
            LockTarget::Rank(r) => Stage::Rank(r),
        }
    }
}

impl fmt::Display for LockTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockTarget::Total => f.write_str("LOCK_total_matches"),
            LockTarget::Rank(r) => write!(f, "LOCK_rank_{r}"),
        }
    }
}

/// An equality row `sum(target edges) == value`.
#[derive(Debug, Clone, PartialEq)]
pub struct Lock {
    pub target: LockTarget,
    pub value: u32,
    constraint: Constraint,
}

impl Lock {
    /// Creates a lock over `expr`.
    pub fn new(target: LockTarget, expr: LinearExpr, value: u32) -> Self {
        let constraint = Constraint::eq(target.to_string(), expr, value as f64);
        Self {
            target,
            value,
            constraint,
        }
    }

    /// The row added to every later relaxation.
    pub fn constraint(&self) -> &Constraint {
        &self.constraint
    }
}

/// Append-only list of locks, threaded by value through the passes.
///
/// Each pass consumes the set and returns it extended by one lock,
/// so every intermediate state can be inspected in isolation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LockSet {
    locks: Vec<Lock>,
}

impl LockSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the set extended by `lock`.
    ///
    /// # Errors
    ///
    /// [`MatchError::OptimizationFailed`] if `lock.target` is already
    /// locked. A target is locked at most once per run.
    pub fn with(mut self, lock: Lock) -> Result<Self> {
        if self.get(lock.target).is_some() {
            return Err(MatchError::OptimizationFailed {
                stage: lock.target.stage(),
                reason: format!("{} locked twice", lock.target),
            });
        }
        self.locks.push(lock);
        Ok(self)
    }

    /// Value locked for `target`, if any.
    pub fn get(&self, target: LockTarget) -> Option<u32> {
        self.locks
            .iter()
            .find(|l| l.target == target)
            .map(|l| l.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Lock> {
        self.locks.iter()
    }

    /// Lock rows, in insertion order.
    pub fn constraints(&self) -> impl Iterator<Item = &Constraint> {
        self.locks.iter().map(Lock::constraint)
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Per-rank match counts of a rank-maximal solution plus the total.
///
/// # Examples
///
/// ```
/// use u_rankmatch::lexi::RankSignature;
///
/// let sig = RankSignature::new(vec![2, 1, 0], 3);
/// assert_eq!(sig.count(1), Some(2));
/// assert_eq!(sig.count(4), None);
/// assert_eq!(sig.rows(), vec![(1, 2), (2, 1), (3, 0)]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RankSignature {
    counts: Vec<u32>,
    total: u32,
}

impl RankSignature {
    /// `counts[r - 1]` is the number of agents matched at rank `r`.
    pub fn new(counts: Vec<u32>, total: u32) -> Self {
        Self { counts, total }
    }

    /// Count at `rank` (1-based).
    pub fn count(&self, rank: u32) -> Option<u32> {
        let idx = (rank as usize).checked_sub(1)?;
        self.counts.get(idx).copied()
    }

    /// Locked maximum number of matched agents (`K_total`).
    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn max_rank(&self) -> u32 {
        self.counts.len() as u32
    }

    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// `(rank, count)` pairs for ranks `1..=max_rank`.
    pub fn rows(&self) -> Vec<(u32, u32)> {
        self.iter().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .map(|(i, &c)| (i as u32 + 1, c))
    }

    /// Lexicographic comparison of the count vectors (rank 1 first).
    pub fn lex_cmp(&self, other: &RankSignature) -> Ordering {
        self.counts.cmp(&other.counts)
    }
}

/// Diagnostics for one solver pass.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PassRecord {
    pub stage: Stage,
    /// Raw objective value returned by the backend.
    pub objective_value: f64,
    pub solve_time_ms: u64,
}

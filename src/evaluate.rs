//! Summary statistics of a matching.
//!
//! Sentinel assignments count as unmatched. Ranks refer to positions in
//! each agent's own preference list.

use crate::extract::Matching;
use crate::instance::Instance;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Summary of how well a matching honors preferences.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MatchingReport {
    /// Agents assigned to their rank-1 slot.
    pub first_choice_matches: usize,
    /// Agents on the sentinel or with no assignment.
    pub unmatched: usize,
    /// Sum of `1 / rank` over real assignments.
    pub weighted_score: f64,
    /// Mean rank over real assignments; `None` when nobody is assigned.
    pub average_rank: Option<f64>,
    /// `first_choice_matches / agent count` (0 for an empty instance).
    pub first_choice_rate: f64,
    /// `histogram[0]` = unmatched, `histogram[r]` = real assignments at rank `r`,
    /// up to the highest assigned rank.
    pub histogram: Vec<usize>,
}

impl MatchingReport {
    /// `(label, count)` rows of the histogram.
    pub fn histogram_rows(&self) -> Vec<(String, usize)> {
        let mut rows: Vec<(String, usize)> = self
            .histogram
            .iter()
            .enumerate()
            .skip(1)
            .map(|(r, &c)| (format!("Rank {r}"), c))
            .collect();
        rows.push(("Unmatched".into(), self.histogram[0]));
        rows
    }
}

/// Evaluates `matching` against `instance`.
///
/// # Examples
///
/// ```
/// use u_rankmatch::evaluate::evaluate;
/// use u_rankmatch::extract::{Assignment, Matching};
/// use u_rankmatch::instance::InstanceBuilder;
///
/// let instance = InstanceBuilder::new()
///     .with_slot("A", 1)
///     .with_sentinel("None", 2)
///     .with_agent("r1", ["A"])
///     .with_agent("r2", ["A"])
///     .build()
///     .unwrap();
/// let matching = Matching::new(vec![Assignment {
///     agent: "r1".into(),
///     slot: "A".into(),
///     rank: 1,
///     is_sentinel: false,
/// }]);
///
/// let report = evaluate(&instance, &matching);
/// assert_eq!(report.first_choice_matches, 1);
/// assert_eq!(report.unmatched, 1);
/// assert_eq!(report.histogram, vec![1, 1]);
/// ```
pub fn evaluate(instance: &Instance, matching: &Matching) -> MatchingReport {
    let ranks: Vec<u32> = matching.assigned().map(|a| a.rank).collect();
    let unmatched = instance.agent_count().saturating_sub(ranks.len());

    let highest = ranks.iter().copied().max().unwrap_or(0) as usize;
    let mut histogram = vec![0usize; highest + 1];
    histogram[0] = unmatched;
    for &r in &ranks {
        histogram[r as usize] += 1;
    }

    let first_choice_matches = ranks.iter().filter(|&&r| r == 1).count();
    let weighted_score = ranks.iter().map(|&r| 1.0 / r as f64).sum();
    let average_rank = if ranks.is_empty() {
        None
    } else {
        Some(ranks.iter().map(|&r| r as f64).sum::<f64>() / ranks.len() as f64)
    };
    let first_choice_rate = if instance.agent_count() == 0 {
        0.0
    } else {
        first_choice_matches as f64 / instance.agent_count() as f64
    };

    MatchingReport {
        first_choice_matches,
        unmatched,
        weighted_score,
        average_rank,
        first_choice_rate,
        histogram,
    }
}

//! Conversion of relaxation values into a discrete matching.

use crate::error::{MatchError, Result};
use crate::instance::Instance;
use crate::lexi::Stage;
use std::collections::HashSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One agent's assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Assignment {
    pub agent: String,
    pub slot: String,
    /// Rank of the chosen edge in the agent's list.
    pub rank: u32,
    /// Whether `slot` is the sentinel ("unassigned").
    pub is_sentinel: bool,
}

/// A discrete matching: at most one assignment per agent.
///
/// Sentinel assignments are kept so unmatched agents can be reported;
/// [`Matching::assigned`] yields only real slots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Matching {
    pairs: Vec<Assignment>,
}

impl Matching {
    pub fn new(pairs: Vec<Assignment>) -> Self {
        Self { pairs }
    }

    /// Every assignment, sentinel included, in agent order.
    pub fn pairs(&self) -> &[Assignment] {
        &self.pairs
    }

    /// Assignments to real slots.
    pub fn assigned(&self) -> impl Iterator<Item = &Assignment> {
        self.pairs.iter().filter(|a| !a.is_sentinel)
    }

    /// Agents with no real slot (sentinel or absent), in instance order.
    pub fn unmatched<'a>(&self, instance: &'a Instance) -> Vec<&'a str> {
        let placed: HashSet<&str> = self.assigned().map(|a| a.agent.as_str()).collect();
        instance
            .agents()
            .iter()
            .map(String::as_str)
            .filter(|agent| !placed.contains(agent))
            .collect()
    }

    pub fn assignment_of(&self, agent: &str) -> Option<&Assignment> {
        self.pairs.iter().find(|a| a.agent == agent)
    }

    /// Number of agents assigned to `slot`.
    pub fn load(&self, slot: &str) -> usize {
        self.pairs.iter().filter(|a| a.slot == slot).count()
    }

    /// `(agent, slot)` rows; sentinel rows only when `include_sentinel`.
    pub fn rows(&self, include_sentinel: bool) -> Vec<(&str, &str)> {
        self.pairs
            .iter()
            .filter(|a| include_sentinel || !a.is_sentinel)
            .map(|a| (a.agent.as_str(), a.slot.as_str()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Builds the matching from final per-edge values.
///
/// An edge is selected iff its value is at least `1 - epsilon`. A value
/// strictly inside `(epsilon, 1 - epsilon)`, or outside
/// `[-epsilon, 1 + epsilon]`, means the backend did not return an
/// integral vertex and is reported rather than rounded.
///
/// # Errors
///
/// [`MatchError::IntegralityViolation`] for a fractional value,
/// [`MatchError::OptimizationFailed`] when `values` does not match the
/// edge count or selects two edges for one agent.
pub fn extract_matching(instance: &Instance, values: &[f64], epsilon: f64) -> Result<Matching> {
    if values.len() != instance.edge_count() {
        return Err(MatchError::OptimizationFailed {
            stage: Stage::Feasibility,
            reason: format!(
                "{} values for {} edges",
                values.len(),
                instance.edge_count()
            ),
        });
    }

    let mut pairs = Vec::with_capacity(instance.agent_count());
    for agent in 0..instance.agent_count() {
        let mut chosen = None;
        for &e in instance.edges_of_agent(agent) {
            let value = values[e];
            if value >= 1.0 - epsilon && value <= 1.0 + epsilon {
                if chosen.replace(e).is_some() {
                    return Err(MatchError::OptimizationFailed {
                        stage: Stage::Feasibility,
                        reason: format!(
                            "agent {:?} selected more than once",
                            instance.agents()[agent]
                        ),
                    });
                }
            } else if value.abs() > epsilon {
                return Err(MatchError::IntegralityViolation {
                    stage: Stage::Feasibility,
                    edge: Some(e),
                    value,
                });
            }
        }

        if let Some(e) = chosen {
            let edge = instance.edges()[e];
            pairs.push(Assignment {
                agent: instance.agents()[agent].clone(),
                slot: instance.slots()[edge.slot].name.clone(),
                rank: edge.rank,
                is_sentinel: instance.is_sentinel(edge.slot),
            });
        }
    }

    Ok(Matching { pairs })
}

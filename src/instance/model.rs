//! Validated matching instance and its builder.

use super::types::{PreferenceEdge, Slot};
use crate::error::{MatchError, Result};
use std::collections::HashMap;

/// A validated, read-only rank-maximal matching instance.
///
/// Holds the agents, the slots (one of which is the sentinel), and the
/// preference edges. Per-agent and per-slot edge indices are computed
/// once at construction so the relaxation can build its structural rows
/// without rescanning the edge list.
///
/// # Examples
///
/// ```
/// use u_rankmatch::instance::InstanceBuilder;
///
/// let instance = InstanceBuilder::new()
///     .with_slot("A", 1)
///     .with_slot("B", 1)
///     .with_sentinel("None", 10)
///     .with_agent("r1", ["A", "B"])
///     .with_agent("r2", ["B"])
///     .build()
///     .unwrap();
///
/// assert_eq!(instance.agent_count(), 2);
/// assert_eq!(instance.max_rank(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct Instance {
    agents: Vec<String>,
    slots: Vec<Slot>,
    sentinel: usize,
    edges: Vec<PreferenceEdge>,
    max_rank: u32,
    agent_edges: Vec<Vec<usize>>,
    slot_edges: Vec<Vec<usize>>,
}

impl Instance {
    /// Builds an instance from explicit `(agent, slot, rank)` triples.
    ///
    /// Edges may arrive in any order; they are stored grouped by agent
    /// in agent order and by increasing rank within an agent.
    ///
    /// # Errors
    ///
    /// [`MatchError::InvalidInstance`] when names repeat, the sentinel is
    /// missing or too small, an edge names an unknown agent or slot, an
    /// agent has no edges, ranks are not `1..=n` for some agent, a slot
    /// appears twice for one agent, or an agent's edge list does not end
    /// with exactly one sentinel edge.
    pub fn from_edges<A, S>(
        agents: Vec<String>,
        slots: Vec<Slot>,
        sentinel: &str,
        edges: impl IntoIterator<Item = (A, S, u32)>,
    ) -> Result<Self>
    where
        A: AsRef<str>,
        S: AsRef<str>,
    {
        let agent_index = index_names(agents.iter().map(String::as_str), "agent")?;
        let slot_index = index_names(slots.iter().map(|s| s.name.as_str()), "slot")?;

        let sentinel_idx = *slot_index
            .get(sentinel)
            .ok_or_else(|| invalid(format!("sentinel slot {sentinel:?} is not defined")))?;
        let sentinel_cap = slots[sentinel_idx].capacity as usize;
        if sentinel_cap < agents.len() {
            return Err(invalid(format!(
                "sentinel capacity {sentinel_cap} is below agent count {}",
                agents.len()
            )));
        }

        let mut per_agent: Vec<Vec<PreferenceEdge>> = vec![Vec::new(); agents.len()];
        for (agent, slot, rank) in edges {
            let (agent, slot) = (agent.as_ref(), slot.as_ref());
            let &a = agent_index
                .get(agent)
                .ok_or_else(|| invalid(format!("edge references unknown agent {agent:?}")))?;
            let &s = slot_index
                .get(slot)
                .ok_or_else(|| invalid(format!("edge references unknown slot {slot:?}")))?;
            if rank == 0 {
                return Err(invalid(format!("agent {agent:?} has an edge with rank 0")));
            }
            per_agent[a].push(PreferenceEdge {
                agent: a,
                slot: s,
                rank,
            });
        }

        let mut edges = Vec::new();
        let mut agent_edges = vec![Vec::new(); agents.len()];
        let mut slot_edges = vec![Vec::new(); slots.len()];
        let mut max_rank = 0;

        for (a, mut list) in per_agent.into_iter().enumerate() {
            let name = &agents[a];
            if list.is_empty() {
                return Err(invalid(format!("agent {name:?} has no edges")));
            }
            list.sort_by_key(|e| e.rank);

            let mut seen_slots = vec![false; slots.len()];
            for (pos, edge) in list.iter().enumerate() {
                let expected = pos as u32 + 1;
                if edge.rank != expected {
                    return Err(invalid(format!(
                        "agent {name:?} ranks are not contiguous: expected rank {expected}, found {}",
                        edge.rank
                    )));
                }
                if seen_slots[edge.slot] {
                    return Err(invalid(format!(
                        "agent {name:?} lists slot {:?} more than once",
                        slots[edge.slot].name
                    )));
                }
                seen_slots[edge.slot] = true;
            }
            let last = list.len() - 1;
            if list[last].slot != sentinel_idx {
                return Err(invalid(format!(
                    "agent {name:?} preference list does not end with the sentinel"
                )));
            }

            for edge in list {
                let idx = edges.len();
                agent_edges[a].push(idx);
                slot_edges[edge.slot].push(idx);
                max_rank = max_rank.max(edge.rank);
                edges.push(edge);
            }
        }

        if edges.is_empty() {
            return Err(invalid("instance has no edges".into()));
        }

        Ok(Self {
            agents,
            slots,
            sentinel: sentinel_idx,
            edges,
            max_rank,
            agent_edges,
            slot_edges,
        })
    }

    /// Agent identifiers, in input order.
    pub fn agents(&self) -> &[String] {
        &self.agents
    }

    /// Slots, sentinel included.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// All preference edges. Edge `i` is relaxation variable `i`.
    pub fn edges(&self) -> &[PreferenceEdge] {
        &self.edges
    }

    /// Index of the sentinel slot.
    pub fn sentinel(&self) -> usize {
        self.sentinel
    }

    /// Whether `slot` is the sentinel.
    pub fn is_sentinel(&self, slot: usize) -> bool {
        slot == self.sentinel
    }

    /// Highest rank over all edges.
    pub fn max_rank(&self) -> u32 {
        self.max_rank
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Edge indices of one agent, ordered by rank.
    pub fn edges_of_agent(&self, agent: usize) -> &[usize] {
        &self.agent_edges[agent]
    }

    /// Edge indices pointing into one slot.
    pub fn edges_into_slot(&self, slot: usize) -> &[usize] {
        &self.slot_edges[slot]
    }

    /// Edge indices with the given rank.
    pub fn edges_at_rank(&self, rank: u32) -> impl Iterator<Item = usize> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter(move |(_, e)| e.rank == rank)
            .map(|(i, _)| i)
    }

    /// Looks up an agent index by name.
    pub fn agent_index(&self, name: &str) -> Option<usize> {
        self.agents.iter().position(|a| a == name)
    }

    /// Looks up a slot index by name.
    pub fn slot_index(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|s| s.name == name)
    }
}

/// Builder for an [`Instance`] from per-agent preference lists.
///
/// Ranks are assigned by position (first preference = rank 1) and the
/// sentinel is appended to every list automatically, so callers pass
/// only the real preferences.
#[derive(Debug, Clone, Default)]
pub struct InstanceBuilder {
    slots: Vec<Slot>,
    sentinel: Option<String>,
    agents: Vec<(String, Vec<String>)>,
}

impl InstanceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a regular slot.
    pub fn with_slot(mut self, name: impl Into<String>, capacity: u32) -> Self {
        self.slots.push(Slot::new(name, capacity));
        self
    }

    /// Adds the sentinel ("unassigned") slot.
    pub fn with_sentinel(mut self, name: impl Into<String>, capacity: u32) -> Self {
        let name = name.into();
        self.slots.push(Slot::new(name.clone(), capacity));
        self.sentinel = Some(name);
        self
    }

    /// Adds an agent with its ordered real preferences.
    pub fn with_agent<I, S>(mut self, name: impl Into<String>, preferences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.agents
            .push((name.into(), preferences.into_iter().map(Into::into).collect()));
        self
    }

    /// Validates and builds the instance.
    pub fn build(self) -> Result<Instance> {
        let sentinel = self
            .sentinel
            .ok_or_else(|| invalid("no sentinel slot was declared".into()))?;

        let mut edges = Vec::new();
        for (agent, prefs) in &self.agents {
            for (pos, slot) in prefs.iter().chain(std::iter::once(&sentinel)).enumerate() {
                edges.push((agent.as_str(), slot.as_str(), pos as u32 + 1));
            }
        }

        let agents = self.agents.iter().map(|(name, _)| name.clone()).collect();
        Instance::from_edges(agents, self.slots, &sentinel, edges)
    }
}

fn index_names<'a>(
    names: impl Iterator<Item = &'a str>,
    kind: &str,
) -> Result<HashMap<&'a str, usize>> {
    let mut index = HashMap::new();
    for (i, name) in names.enumerate() {
        if index.insert(name, i).is_some() {
            return Err(invalid(format!("duplicate {kind} name {name:?}")));
        }
    }
    Ok(index)
}

fn invalid(reason: String) -> MatchError {
    MatchError::InvalidInstance(reason)
}

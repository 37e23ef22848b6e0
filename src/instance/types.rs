//! Instance value types.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A slot (hospital) with an integer capacity.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Slot {
    /// Slot identifier.
    pub name: String,
    /// Maximum number of agents the slot accepts.
    pub capacity: u32,
}

impl Slot {
    /// Creates a slot.
    pub fn new(name: impl Into<String>, capacity: u32) -> Self {
        Self {
            name: name.into(),
            capacity,
        }
    }
}

/// One (agent, slot, rank) preference.
///
/// `agent` and `slot` index into [`Instance::agents`](super::Instance::agents)
/// and [`Instance::slots`](super::Instance::slots). The edge's position in
/// [`Instance::edges`](super::Instance::edges) is also the index of its
/// relaxation variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PreferenceEdge {
    /// Agent index.
    pub agent: usize,
    /// Slot index.
    pub slot: usize,
    /// 1-based rank; 1 is the most preferred.
    pub rank: u32,
}

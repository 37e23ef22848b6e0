//! Instance model: agents, capacitated slots and ranked preference edges.
//!
//! # Key Components
//!
//! - [`Instance`]: validated, read-only instance with edge indices
//! - [`InstanceBuilder`]: builds an instance from per-agent preference lists
//! - [`normalize`]: turns raw resident/hospital rows into an instance
//!
//! Every agent's list ends with an edge to the *sentinel* slot, whose
//! capacity is at least the number of agents. The sentinel models the
//! "unassigned" outcome and keeps every relaxation feasible.

mod model;
mod normalize;
mod types;

pub use model::{Instance, InstanceBuilder};
pub use normalize::{normalize, NormalizeConfig, RawHospital, RawInstance, RawResident};
pub use types::{PreferenceEdge, Slot};

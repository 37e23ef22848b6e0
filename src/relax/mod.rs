//! Linear relaxation of the capacitated bipartite assignment.
//!
//! One continuous variable in `[0, 1]` per preference edge, with two
//! structural row families:
//!
//! - per agent: sum of the agent's edge variables `<= 1`
//! - per slot: sum of variables into the slot `<= capacity`
//!
//! This matrix is the incidence matrix of a bipartite graph and is
//! totally unimodular, so every basic optimal solution is integral for
//! any linear objective over the edges. Each lock row used by the
//! lexicographic optimizer fixes an objective at its optimum, which
//! restricts the region to an optimal face; vertices of a face are
//! vertices of the original polytope, so integrality survives locking.
//!
//! # Key Components
//!
//! - [`LinearExpr`], [`Constraint`], [`Objective`], [`RelaxationProblem`]: model
//! - [`RelaxationSolver`]: backend interface
//! - [`LpRelaxationSolver`]: `good_lp` + `microlp` backend
//! - [`structural_constraints`]: builds the two row families for an instance

mod lp;
mod model;
mod solver;

pub use lp::LpRelaxationSolver;
pub use model::{Constraint, LinearExpr, Objective, RelaxationProblem, Sense};
pub use solver::{RelaxationSolution, RelaxationSolver, SolverConfig, SolverStatus};

use crate::instance::Instance;

/// Builds the per-agent and per-slot rows for `instance`.
///
/// Agents come first (in agent order), then slots (in slot order).
pub fn structural_constraints(instance: &Instance) -> Vec<Constraint> {
    let mut rows = Vec::with_capacity(instance.agent_count() + instance.slot_count());

    for (a, name) in instance.agents().iter().enumerate() {
        rows.push(Constraint::leq(
            format!("agent_{name}_at_most_one"),
            LinearExpr::sum_of(instance.edges_of_agent(a).iter().copied()),
            1.0,
        ));
    }

    for (s, slot) in instance.slots().iter().enumerate() {
        rows.push(Constraint::leq(
            format!("slot_{}_capacity", slot.name),
            LinearExpr::sum_of(instance.edges_into_slot(s).iter().copied()),
            slot.capacity as f64,
        ));
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::InstanceBuilder;

    #[test]
    fn test_structural_rows() {
        let inst = InstanceBuilder::new()
            .with_slot("A", 2)
            .with_sentinel("S", 5)
            .with_agent("x", ["A"])
            .with_agent("y", Vec::<String>::new())
            .build()
            .unwrap();

        let rows = structural_constraints(&inst);
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|r| r.sense == Sense::LessEqual));

        assert_eq!(rows[0].expr.terms().len(), 2);
        assert_eq!(rows[1].expr.terms().len(), 1);
        assert_eq!(rows[2].rhs, 2.0);
        assert_eq!(rows[3].rhs, 5.0);
        assert_eq!(rows[3].expr.terms().len(), 2);
        assert_eq!(rows[2].name, "slot_A_capacity");
    }
}

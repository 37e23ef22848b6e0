//! Property tests on small random instances.

use proptest::prelude::*;
use u_rankmatch::instance::{Instance, InstanceBuilder};
use u_rankmatch::lexi::{LexiConfig, LexicographicOptimizer, RankSignature};
use u_rankmatch::relax::LpRelaxationSolver;
use u_rankmatch::RankMaximalSolver;

const SLOT_NAMES: [&str; 3] = ["A", "B", "C"];

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn build(capacities: &[u32], lists: &[Vec<usize>]) -> Instance {
    let mut builder = InstanceBuilder::new();
    for (slot, &cap) in capacities.iter().enumerate() {
        builder = builder.with_slot(SLOT_NAMES[slot], cap);
    }
    builder = builder.with_sentinel("None", lists.len() as u32);
    for (agent, list) in lists.iter().enumerate() {
        let mut prefs: Vec<&str> = Vec::new();
        for &slot in list {
            let name = SLOT_NAMES[slot];
            if slot < capacities.len() && !prefs.contains(&name) {
                prefs.push(name);
            }
        }
        builder = builder.with_agent(format!("r{agent}"), prefs);
    }
    builder.build().unwrap()
}

fn instance_strategy() -> impl Strategy<Value = Instance> {
    (
        prop::collection::vec(0u32..=2, 1..=3),
        prop::collection::vec(prop::collection::vec(0usize..3, 0..=3), 1..=5),
    )
        .prop_map(|(capacities, lists)| build(&capacities, &lists))
}

/// Best signature over every full assignment (one edge per agent) that
/// respects capacities.
fn brute_force(instance: &Instance) -> RankSignature {
    let n = instance.agent_count();
    let max_rank = instance.max_rank() as usize;
    let mut choice = vec![0usize; n];
    let mut best: Option<Vec<u32>> = None;

    loop {
        let mut load = vec![0u32; instance.slot_count()];
        let mut counts = vec![0u32; max_rank];
        let mut feasible = true;
        for (agent, &pick) in choice.iter().enumerate() {
            let edge = instance.edges()[instance.edges_of_agent(agent)[pick]];
            load[edge.slot] += 1;
            if load[edge.slot] > instance.slots()[edge.slot].capacity {
                feasible = false;
                break;
            }
            counts[edge.rank as usize - 1] += 1;
        }
        if feasible && best.as_ref().map_or(true, |b| counts > *b) {
            best = Some(counts);
        }

        // Odometer over per-agent edge choices.
        let mut agent = 0;
        loop {
            if agent == n {
                let counts = best.unwrap();
                return RankSignature::new(counts, n as u32);
            }
            choice[agent] += 1;
            if choice[agent] < instance.edges_of_agent(agent).len() {
                break;
            }
            choice[agent] = 0;
            agent += 1;
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn matching_respects_capacity_and_uniqueness(instance in instance_strategy()) {
        init_logger();
        let outcome = RankMaximalSolver::new().solve(&instance).unwrap();

        for slot in instance.slots() {
            prop_assert!(outcome.matching.load(&slot.name) as u32 <= slot.capacity);
        }
        for agent in instance.agents() {
            let count = outcome.matching.pairs().iter().filter(|a| &a.agent == agent).count();
            prop_assert!(count <= 1);
        }
    }

    #[test]
    fn sentinel_saturates_total(instance in instance_strategy()) {
        let outcome = RankMaximalSolver::new().solve(&instance).unwrap();
        prop_assert_eq!(outcome.total() as usize, instance.agent_count());
        prop_assert_eq!(outcome.matching.len(), instance.agent_count());
        prop_assert_eq!(
            outcome.signature.counts().iter().sum::<u32>(),
            outcome.total()
        );
    }

    #[test]
    fn matching_realizes_signature(instance in instance_strategy()) {
        let outcome = RankMaximalSolver::new().solve(&instance).unwrap();
        let mut counts = vec![0u32; instance.max_rank() as usize];
        for assignment in outcome.matching.pairs() {
            counts[assignment.rank as usize - 1] += 1;
        }
        prop_assert_eq!(counts.as_slice(), outcome.signature.counts());
    }

    #[test]
    fn final_values_are_integral(instance in instance_strategy()) {
        let solver = LpRelaxationSolver::new();
        let config = LexiConfig::default();
        let eps = config.epsilon;
        let optimizer = LexicographicOptimizer::new(&instance, &solver, config).unwrap();
        let result = optimizer.run().unwrap();

        prop_assert_eq!(result.values.len(), instance.edge_count());
        for &v in &result.values {
            prop_assert!(v.abs() <= eps || (v - 1.0).abs() <= eps, "fractional value {}", v);
        }
        // One lock for the total plus one per rank.
        prop_assert_eq!(result.locks.len(), instance.max_rank() as usize + 1);
    }

    #[test]
    fn signature_is_lexicographically_maximal(instance in instance_strategy()) {
        let outcome = RankMaximalSolver::new().solve(&instance).unwrap();
        let expected = brute_force(&instance);
        prop_assert_eq!(outcome.signature, expected);
    }

    #[test]
    fn repeated_solves_agree(instance in instance_strategy()) {
        let solver = RankMaximalSolver::new();
        let first = solver.solve(&instance).unwrap();
        let second = solver.solve(&instance).unwrap();
        prop_assert_eq!(first.total(), second.total());
        prop_assert_eq!(first.signature, second.signature);
    }
}

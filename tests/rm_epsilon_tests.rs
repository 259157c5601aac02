//! Epsilon removal: scenarios, idempotence, and equivalence on random
//! inputs.

mod common;

use common::{assert_relation_approx_eq, relation_weights};
use libwfst::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[test]
fn scenario_simple_chain() {
    // 0 -eps/0.4-> 1 -a/0.6-> 2, final(2) = 1 over the tropical semiring.
    let mut fst = VectorFst::<TropicalWeight>::new();
    for _ in 0..3 {
        fst.add_state();
    }
    fst.set_start(0);
    fst.add_arc(0, Arc::new(0, 0, TropicalWeight::new(0.4), 1));
    fst.add_arc(1, Arc::new(1, 1, TropicalWeight::new(0.6), 2));
    fst.set_final(2, TropicalWeight::one());

    rm_epsilon(&mut fst, &RmEpsilonConfig::default());

    assert_eq!(fst.num_states(), 2);
    let arc = fst.arcs(fst.start().unwrap()).next().unwrap();
    assert_eq!((arc.ilabel, arc.olabel), (1, 1));
    assert!(arc.weight.approx_eq(&TropicalWeight::new(1.0), 1e-5));
}

#[test]
fn scenario_parallel_merge() {
    // Two epsilon branches reconverging on the same labelled arc merge by
    // plus: 0.3*1 + 0.5*1 = 0.8 in the probability semiring.
    let mut fst = VectorFst::<ProbabilityWeight>::new();
    for _ in 0..4 {
        fst.add_state();
    }
    fst.set_start(0);
    fst.add_arc(0, Arc::new(0, 0, ProbabilityWeight::new(0.3), 1));
    fst.add_arc(0, Arc::new(0, 0, ProbabilityWeight::new(0.5), 2));
    fst.add_arc(1, Arc::new(1, 1, ProbabilityWeight::one(), 3));
    fst.add_arc(2, Arc::new(1, 1, ProbabilityWeight::one(), 3));
    fst.set_final(3, ProbabilityWeight::one());

    rm_epsilon(&mut fst, &RmEpsilonConfig::default());

    let start = fst.start().unwrap();
    assert_eq!(fst.num_arcs(start), 1);
    let arc = fst.arcs(start).next().unwrap();
    assert!(arc.weight.approx_eq(&ProbabilityWeight::new(0.8), 1e-6));
}

#[test]
fn idempotent_up_to_isomorphism() {
    let mut once = sample_with_epsilons();
    rm_epsilon(&mut once, &RmEpsilonConfig::default());
    let mut twice = once.clone();
    rm_epsilon(&mut twice, &RmEpsilonConfig::default());
    assert_eq!(isomorphic(&once, &twice, 1e-4), Ok(true));
}

#[test]
fn preserves_the_relation() {
    let mut fst = sample_with_epsilons();
    let before = relation_weights(&fst, 10);
    rm_epsilon(&mut fst, &RmEpsilonConfig::default());
    let after = relation_weights(&fst, 10);
    assert_relation_approx_eq(&before, &after, 1e-4);
    assert!(fst.properties().contains(FstProperties::NO_EPSILONS));
}

#[test]
fn preserves_the_relation_on_random_acyclic_inputs() {
    let mut rng = StdRng::seed_from_u64(20240611);
    for _ in 0..40 {
        let mut fst = random_acyclic_fst(&mut rng);
        let before = relation_weights(&fst, 12);
        rm_epsilon(&mut fst, &RmEpsilonConfig::default());
        let after = relation_weights(&fst, 12);
        assert_relation_approx_eq(&before, &after, 1e-3);
        for s in fst.states() {
            for arc in fst.arcs(s) {
                assert!(!arc.is_epsilon(), "epsilon arc survived: {arc:?}");
            }
        }
    }
}

#[test]
fn lazy_view_preserves_the_relation() {
    let fst = sample_with_epsilons();
    let before = relation_weights(&fst, 10);
    let lazy = rm_epsilon_lazy(fst, CacheOptions::default());
    let after = relation_weights(&lazy, 10);
    assert_relation_approx_eq(&before, &after, 1e-4);
}

#[test]
fn epsilon_cycle_over_tropical_converges() {
    // eps cycle 0 -> 1 -> 0 with weights 0.5/0.5; tropical plus is min, so
    // the closure converges despite the cycle.
    let mut fst = VectorFst::<TropicalWeight>::new();
    for _ in 0..3 {
        fst.add_state();
    }
    fst.set_start(0);
    fst.add_arc(0, Arc::new(0, 0, TropicalWeight::new(0.5), 1));
    fst.add_arc(1, Arc::new(0, 0, TropicalWeight::new(0.5), 0));
    fst.add_arc(1, Arc::new(1, 1, TropicalWeight::new(1.0), 2));
    fst.set_final(2, TropicalWeight::one());

    let before = relation_weights(&fst, 8);
    rm_epsilon(&mut fst, &RmEpsilonConfig::default());
    let after = relation_weights(&fst, 8);
    assert_relation_approx_eq(&before, &after, 1e-3);
}

/// Mixed epsilon and labelled arcs with a branch and a final epsilon tail.
fn sample_with_epsilons() -> VectorFst<TropicalWeight> {
    let mut fst = VectorFst::new();
    for _ in 0..5 {
        fst.add_state();
    }
    fst.set_start(0);
    fst.add_arc(0, Arc::new(0, 0, TropicalWeight::new(0.25), 1));
    fst.add_arc(0, Arc::new(1, 1, TropicalWeight::new(1.0), 2));
    fst.add_arc(1, Arc::new(2, 2, TropicalWeight::new(0.5), 3));
    fst.add_arc(2, Arc::new(0, 0, TropicalWeight::new(0.75), 3));
    fst.add_arc(3, Arc::new(0, 0, TropicalWeight::new(0.125), 4));
    fst.set_final(4, TropicalWeight::one());
    fst
}

/// Random acyclic transducer: arcs only lead to higher-numbered states, a
/// third of them epsilon.
fn random_acyclic_fst(rng: &mut StdRng) -> VectorFst<TropicalWeight> {
    let n = rng.gen_range(3..7);
    let mut fst = VectorFst::new();
    for _ in 0..n {
        fst.add_state();
    }
    fst.set_start(0);
    for s in 0..n - 1 {
        let arcs = rng.gen_range(1..4);
        for _ in 0..arcs {
            let target = rng.gen_range(s + 1..n);
            let epsilon = rng.gen_bool(1.0 / 3.0);
            let (ilabel, olabel) = if epsilon {
                (0, 0)
            } else {
                (rng.gen_range(1..4), rng.gen_range(1..4))
            };
            let weight = TropicalWeight::new(rng.gen_range(0.0f32..2.0));
            fst.add_arc(s, Arc::new(ilabel, olabel, weight, target));
        }
    }
    fst.set_final(n - 1, TropicalWeight::one());
    if rng.gen_bool(0.5) {
        let mid = rng.gen_range(1..n);
        fst.set_final(mid, TropicalWeight::new(rng.gen_range(0.0f32..1.0)));
    }
    fst
}

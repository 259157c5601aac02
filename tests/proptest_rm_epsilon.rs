//! Property-based equivalence of epsilon removal on generated transducers.

mod common;

use common::{assert_relation_approx_eq, relation_weights};
use libwfst::prelude::*;
use proptest::prelude::*;

#[derive(Debug, Clone)]
struct ArcSpec {
    source: usize,
    forward: usize,
    epsilon: bool,
    ilabel: Label,
    olabel: Label,
    weight: f32,
}

fn arc_spec(states: usize) -> impl Strategy<Value = ArcSpec> {
    (
        0..states - 1,
        1usize..states,
        prop::bool::ANY,
        1i64..4,
        1i64..4,
        0.0f32..2.0,
    )
        .prop_map(|(source, forward, epsilon, ilabel, olabel, weight)| ArcSpec {
            source,
            forward,
            epsilon,
            ilabel,
            olabel,
            weight,
        })
}

/// Acyclic transducer: each arc targets a strictly higher state id.
fn acyclic_fst() -> impl Strategy<Value = VectorFst<TropicalWeight>> {
    (3usize..6)
        .prop_flat_map(|states| {
            (
                Just(states),
                prop::collection::vec(arc_spec(states), 1..10),
            )
        })
        .prop_map(|(states, specs)| {
            let mut fst = VectorFst::new();
            for _ in 0..states {
                fst.add_state();
            }
            fst.set_start(0);
            for spec in specs {
                let target = (spec.source + 1 + spec.forward % (states - spec.source - 1).max(1))
                    .min(states - 1);
                let (ilabel, olabel) = if spec.epsilon {
                    (0, 0)
                } else {
                    (spec.ilabel, spec.olabel)
                };
                fst.add_arc(
                    spec.source,
                    Arc::new(ilabel, olabel, TropicalWeight::new(spec.weight), target),
                );
            }
            fst.set_final(states - 1, TropicalWeight::one());
            fst
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn rm_epsilon_preserves_the_relation(mut fst in acyclic_fst()) {
        let before = relation_weights(&fst, 12);
        rm_epsilon(&mut fst, &RmEpsilonConfig::default());
        let after = relation_weights(&fst, 12);
        assert_relation_approx_eq(&before, &after, 1e-3);
    }

    #[test]
    fn rm_epsilon_leaves_no_epsilon_arcs(mut fst in acyclic_fst()) {
        rm_epsilon(&mut fst, &RmEpsilonConfig::default());
        for s in fst.states() {
            for arc in fst.arcs(s) {
                prop_assert!(!arc.is_epsilon());
            }
        }
    }

    #[test]
    fn rm_epsilon_is_idempotent(mut fst in acyclic_fst()) {
        rm_epsilon(&mut fst, &RmEpsilonConfig::default());
        let mut again = fst.clone();
        rm_epsilon(&mut again, &RmEpsilonConfig::default());
        match isomorphic(&fst, &again, 1e-3) {
            Ok(result) => prop_assert!(result),
            // Generated inputs may violate the check's determinism
            // precondition; nothing to conclude then.
            Err(IsomorphicError::NondeterministicInput) => {}
            Err(error) => prop_assert!(false, "isomorphism check failed: {error}"),
        }
    }

    #[test]
    fn lazy_and_eager_agree(fst in acyclic_fst()) {
        let lazy = rm_epsilon_lazy(fst.clone(), CacheOptions::default());
        let lazy_relation = relation_weights(&lazy, 12);
        let mut eager = fst;
        rm_epsilon(&mut eager, &RmEpsilonConfig::default());
        let eager_relation = relation_weights(&eager, 12);
        assert_relation_approx_eq(&lazy_relation, &eager_relation, 1e-3);
    }
}

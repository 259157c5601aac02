//! Delayed views: cache sharing, safe copies, eviction under a budget.

mod common;

use common::{assert_relation_approx_eq, relation_weights};
use libwfst::prelude::*;

fn with_epsilons() -> VectorFst<TropicalWeight> {
    let mut fst = VectorFst::new();
    for _ in 0..4 {
        fst.add_state();
    }
    fst.set_start(0);
    fst.add_arc(0, Arc::new(0, 0, TropicalWeight::new(0.5), 1));
    fst.add_arc(1, Arc::new(1, 1, TropicalWeight::new(0.25), 2));
    fst.add_arc(2, Arc::new(2, 2, TropicalWeight::new(1.0), 3));
    fst.set_final(3, TropicalWeight::one());
    fst
}

#[test]
fn start_is_computed_once_and_stable() {
    let lazy = rm_epsilon_lazy(with_epsilons(), CacheOptions::default());
    let first = lazy.start();
    let second = lazy.start();
    assert_eq!(first, second);
    assert!(first.is_some());
}

#[test]
fn clones_share_expansion_work() {
    let lazy = rm_epsilon_lazy(with_epsilons(), CacheOptions::default());
    let clone = lazy.clone();
    // Access through one handle, read through the other; both views see
    // the same cached sequence.
    let start = lazy.start().unwrap();
    let from_original: Vec<_> = lazy.arcs(start).collect();
    let from_clone: Vec<_> = clone.arcs(start).collect();
    assert_eq!(from_original, from_clone);
}

#[test]
fn safe_copy_evolves_independently() {
    let lazy = rm_epsilon_lazy(with_epsilons(), CacheOptions::default());
    let start = lazy.start().unwrap();
    let before: Vec<_> = lazy.arcs(start).collect();

    let copy = lazy.safe_copy();
    // Drive both to the end; results agree even though the copies cache
    // independently after the snapshot.
    assert_relation_approx_eq(
        &relation_weights(&lazy, 10),
        &relation_weights(&copy, 10),
        1e-5,
    );
    let after: Vec<_> = copy.arcs(start).collect();
    assert_eq!(before, after);
}

#[test]
fn tight_gc_budget_does_not_change_results() {
    // With a zero-byte budget every state is evicted as soon as possible;
    // re-access recomputes and the observable behavior is unchanged.
    let unbounded = rm_epsilon_lazy(with_epsilons(), CacheOptions::default());
    let bounded = rm_epsilon_lazy(with_epsilons(), CacheOptions::with_gc_limit(0));
    assert_relation_approx_eq(
        &relation_weights(&unbounded, 10),
        &relation_weights(&bounded, 10),
        1e-5,
    );
}

#[test]
fn synchronize_under_eviction_is_stable() {
    let mut fst = VectorFst::<TropicalWeight>::new();
    for _ in 0..3 {
        fst.add_state();
    }
    fst.set_start(0);
    fst.add_arc(0, Arc::new(1, 10, TropicalWeight::new(0.5), 1));
    fst.add_arc(1, Arc::new(2, 20, TropicalWeight::new(0.25), 2));
    fst.set_final(2, TropicalWeight::one());

    let bounded = synchronize_lazy(fst.clone(), CacheOptions::with_gc_limit(0));
    let reference = synchronize_lazy(fst, CacheOptions::default());
    assert_relation_approx_eq(
        &relation_weights(&reference, 8),
        &relation_weights(&bounded, 8),
        1e-5,
    );
}

#[test]
fn expand_all_matches_lazy_reads() {
    let lazy = rm_epsilon_lazy(with_epsilons(), CacheOptions::default());
    let dense = lazy.expand_all();
    assert_relation_approx_eq(
        &relation_weights(&lazy, 10),
        &relation_weights(&dense, 10),
        1e-5,
    );
}

//! Property-bit honesty: known-true bits after an operation must hold
//! under a structural audit.

use libwfst::prelude::*;

/// Every tri-state claim the operation left as known-true must also be
/// found true by the structural audit.
fn assert_honest(fst: &VectorFst<TropicalWeight>) {
    let claimed = fst.properties();
    let actual = compute_properties(fst);
    let trinary_claims = claimed & FstProperties::TRINARY;
    assert!(
        actual.contains(trinary_claims),
        "claimed {claimed:?} but audit found {actual:?}"
    );
}

fn with_epsilons() -> VectorFst<TropicalWeight> {
    let mut fst = VectorFst::new();
    for _ in 0..4 {
        fst.add_state();
    }
    fst.set_start(0);
    fst.add_arc(0, Arc::new(0, 0, TropicalWeight::new(0.5), 1));
    fst.add_arc(1, Arc::new(1, 1, TropicalWeight::new(0.25), 2));
    fst.add_arc(0, Arc::new(2, 2, TropicalWeight::one(), 3));
    fst.set_final(2, TropicalWeight::one());
    fst.set_final(3, TropicalWeight::one());
    fst
}

#[test]
fn rm_epsilon_claims_hold() {
    let mut fst = with_epsilons();
    rm_epsilon(&mut fst, &RmEpsilonConfig::default());
    assert!(fst.properties().contains(FstProperties::NO_EPSILONS));
    assert_honest(&fst);
}

#[test]
fn concat_claims_hold() {
    let mut left = with_epsilons();
    let right = with_epsilons();
    concat(&mut left, &right);
    assert_honest(&left);
}

#[test]
fn synchronize_claims_hold() {
    // Balanced-delay source so the eager wrapper terminates.
    let mut fst = VectorFst::<TropicalWeight>::new();
    for _ in 0..2 {
        fst.add_state();
    }
    fst.set_start(0);
    fst.add_arc(0, Arc::new(1, 2, TropicalWeight::new(0.5), 1));
    fst.set_final(1, TropicalWeight::one());
    let sync = synchronize(&fst);
    assert_honest(&sync);
}

#[test]
fn top_sort_claims_hold() {
    let mut fst = with_epsilons();
    assert!(top_sort(&mut fst));
    assert!(fst.properties().contains(FstProperties::TOP_SORTED));
    assert_honest(&fst);
}

#[test]
fn connect_claims_hold() {
    let mut fst = with_epsilons();
    // Add an unreachable state; connect removes it and claims both
    // reachability bits.
    fst.add_state();
    connect(&mut fst);
    assert!(fst.properties().contains(FstProperties::ACCESSIBLE));
    assert!(fst.properties().contains(FstProperties::COACCESSIBLE));
    assert_honest(&fst);
}

//! Isomorphism laws over state permutations and perturbations.

use libwfst::algorithms::top_sort::state_sort;
use libwfst::prelude::*;

fn sample() -> VectorFst<TropicalWeight> {
    let mut fst = VectorFst::new();
    for _ in 0..4 {
        fst.add_state();
    }
    fst.set_start(0);
    fst.add_arc(0, Arc::new(1, 1, TropicalWeight::new(0.5), 1));
    fst.add_arc(0, Arc::new(2, 2, TropicalWeight::new(1.5), 2));
    fst.add_arc(1, Arc::new(3, 3, TropicalWeight::new(0.25), 3));
    fst.add_arc(2, Arc::new(3, 3, TropicalWeight::new(0.75), 3));
    fst.set_final(3, TropicalWeight::new(2.0));
    fst
}

#[test]
fn identity_law() {
    let fst = sample();
    assert_eq!(isomorphic(&fst, &fst, 1e-4), Ok(true));
}

#[test]
fn invariant_under_every_rotation() {
    // state_sort applies an arbitrary permutation; isomorphism must hold
    // for each rotation of the state ids.
    let reference = sample();
    let n = reference.num_states();
    for shift in 1..n {
        let order: Vec<usize> = (0..n).map(|s| (s + shift) % n).collect();
        let mut permuted = sample();
        state_sort(&mut permuted, &order);
        assert_eq!(
            isomorphic(&reference, &permuted, 1e-4),
            Ok(true),
            "failed for rotation {shift}"
        );
    }
}

#[test]
fn weight_perturbation_beyond_delta_is_detected() {
    let reference = sample();
    let mut nudged = sample();
    nudged.for_each_arc_mut(1, &mut |arc| {
        arc.weight = TropicalWeight::new(0.25 + 0.01);
    });
    assert_eq!(isomorphic(&reference, &nudged, 1e-4), Ok(false));
    // Within delta the nudge is invisible.
    assert_eq!(isomorphic(&reference, &nudged, 0.05), Ok(true));
}

#[test]
fn spurious_arc_is_detected() {
    let reference = sample();
    let mut padded = sample();
    padded.add_arc(1, Arc::new(9, 9, TropicalWeight::one(), 3));
    assert_eq!(isomorphic(&reference, &padded, 1e-4), Ok(false));
}

#[test]
fn different_final_weights_are_detected() {
    let reference = sample();
    let mut altered = sample();
    altered.set_final(3, TropicalWeight::new(3.0));
    assert_eq!(isomorphic(&reference, &altered, 1e-4), Ok(false));
}

#[test]
fn log_semiring_uses_quantized_hash_order() {
    // Non-idempotent weights order by quantized hash; equal machines with
    // permuted arcs still compare isomorphic.
    let mut a = VectorFst::<LogWeight>::new();
    for _ in 0..2 {
        a.add_state();
    }
    a.set_start(0);
    a.add_arc(0, Arc::new(1, 1, LogWeight::new(0.5), 1));
    a.add_arc(0, Arc::new(2, 2, LogWeight::new(0.75), 1));
    a.set_final(1, LogWeight::one());

    let mut b = VectorFst::<LogWeight>::new();
    for _ in 0..2 {
        b.add_state();
    }
    b.set_start(0);
    b.add_arc(0, Arc::new(2, 2, LogWeight::new(0.75), 1));
    b.add_arc(0, Arc::new(1, 1, LogWeight::new(0.5), 1));
    b.set_final(1, LogWeight::one());

    assert_eq!(isomorphic(&a, &b, 1e-4), Ok(true));
}

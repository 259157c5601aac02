//! Shared helpers: small builders and a brute-force relation oracle.

#![allow(dead_code)]

use libwfst::prelude::*;
use std::collections::HashMap;

/// Weighted relation of a transducer, brute-forced by enumerating every
/// path of at most `max_arcs` arcs. Epsilon labels are dropped from the
/// recorded strings; weights of coinciding pairs are combined with `plus`.
pub fn relation_weights<W, F>(
    fst: &F,
    max_arcs: usize,
) -> HashMap<(Vec<Label>, Vec<Label>), W>
where
    W: Semiring,
    F: Fst<W>,
{
    let mut relation = HashMap::new();
    let start = match fst.start() {
        Some(s) => s,
        None => return relation,
    };
    let mut input = Vec::new();
    let mut output = Vec::new();
    walk(
        fst,
        start,
        W::one(),
        &mut input,
        &mut output,
        max_arcs,
        &mut relation,
    );
    relation
}

fn walk<W, F>(
    fst: &F,
    state: StateId,
    weight: W,
    input: &mut Vec<Label>,
    output: &mut Vec<Label>,
    remaining: usize,
    relation: &mut HashMap<(Vec<Label>, Vec<Label>), W>,
) where
    W: Semiring,
    F: Fst<W>,
{
    let final_weight = fst.final_weight(state);
    if !final_weight.is_zero() {
        let key = (input.clone(), output.clone());
        let contribution = weight.times(&final_weight);
        relation
            .entry(key)
            .and_modify(|w| *w = w.plus(&contribution))
            .or_insert(contribution);
    }
    if remaining == 0 {
        return;
    }
    for arc in fst.arcs(state) {
        if arc.ilabel != EPSILON {
            input.push(arc.ilabel);
        }
        if arc.olabel != EPSILON {
            output.push(arc.olabel);
        }
        walk(
            fst,
            arc.nextstate,
            weight.times(&arc.weight),
            input,
            output,
            remaining - 1,
            relation,
        );
        if arc.olabel != EPSILON {
            output.pop();
        }
        if arc.ilabel != EPSILON {
            input.pop();
        }
    }
}

/// Asserts two relations agree within `delta`; a pair missing on one side
/// must carry (approximately) zero weight on the other.
pub fn assert_relation_approx_eq<W: Semiring>(
    left: &HashMap<(Vec<Label>, Vec<Label>), W>,
    right: &HashMap<(Vec<Label>, Vec<Label>), W>,
    delta: f32,
) {
    for (key, weight) in left {
        let other = right.get(key).cloned().unwrap_or_else(W::zero);
        assert!(
            weight.approx_eq(&other, delta),
            "pair {key:?}: {weight:?} vs {other:?}"
        );
    }
    for (key, weight) in right {
        if !left.contains_key(key) {
            assert!(
                weight.approx_eq(&W::zero(), delta),
                "pair {key:?} only on the right with weight {weight:?}"
            );
        }
    }
}

/// The one-state transducer accepting the empty string with weight one.
pub fn empty_string_fst<W: Semiring>() -> VectorFst<W> {
    let mut fst = VectorFst::new();
    let state = fst.add_state();
    fst.set_start(state);
    fst.set_final(state, W::one());
    fst
}

/// A linear transducer over (ilabel, olabel, weight) triples, final weight
/// one.
pub fn linear_fst<W: Semiring>(arcs: &[(Label, Label, W)]) -> VectorFst<W> {
    let mut fst = VectorFst::new();
    let mut state = fst.add_state();
    fst.set_start(state);
    for (ilabel, olabel, weight) in arcs {
        let next = fst.add_state();
        fst.add_arc(state, Arc::new(*ilabel, *olabel, weight.clone(), next));
        state = next;
    }
    fst.set_final(state, W::one());
    fst
}

//! Isomorphism testing.
//!
//! Two transducers are isomorphic when they are equal up to a reordering of
//! states and arcs. The check assumes both inputs are deterministic when
//! viewed as unweighted automata; a detected violation is an error, not a
//! negative answer.

use crate::fst::{Arc, Fst, StateId};
use crate::semiring::Semiring;
use std::cmp::Ordering;
use std::collections::VecDeque;
use thiserror::Error;

/// Failures that leave the isomorphism question undecided.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IsomorphicError {
    /// Two distinct quantized weights hashed equally; the weight order is
    /// unreliable for this pair of inputs.
    #[error("weight hash collision between distinct quantized weights")]
    WeightHashCollision,

    /// An input has two arcs from one state agreeing on labels and weight;
    /// the determinism precondition is violated.
    #[error("input is nondeterministic as an unweighted automaton")]
    NondeterministicInput,
}

/// Tests if two transducers are equal up to state and arc reordering.
///
/// `delta` bounds the weight comparison. Returns an error (rather than
/// `false`) when the result cannot be trusted; see [`IsomorphicError`].
pub fn isomorphic<W, F1, F2>(fst1: &F1, fst2: &F2, delta: f32) -> Result<bool, IsomorphicError>
where
    W: Semiring,
    F1: Fst<W>,
    F2: Fst<W>,
{
    Isomorphism::new(fst1, fst2, delta).run()
}

struct Isomorphism<'a, W, F1, F2>
where
    W: Semiring,
    F1: Fst<W>,
    F2: Fst<W>,
{
    fst1: &'a F1,
    fst2: &'a F2,
    delta: f32,
    // Partial bijection, indexed by fst1 state.
    state_pairs: Vec<Option<StateId>>,
    queue: VecDeque<(StateId, StateId)>,
    _weight: std::marker::PhantomData<W>,
}

impl<'a, W, F1, F2> Isomorphism<'a, W, F1, F2>
where
    W: Semiring,
    F1: Fst<W>,
    F2: Fst<W>,
{
    fn new(fst1: &'a F1, fst2: &'a F2, delta: f32) -> Self {
        Isomorphism {
            fst1,
            fst2,
            delta,
            state_pairs: Vec::new(),
            queue: VecDeque::new(),
            _weight: std::marker::PhantomData,
        }
    }

    fn run(mut self) -> Result<bool, IsomorphicError> {
        let (start1, start2) = match (self.fst1.start(), self.fst2.start()) {
            (None, None) => return Ok(true),
            (Some(s1), Some(s2)) => (s1, s2),
            _ => return Ok(false),
        };
        if !self.pair_state(start1, start2) {
            return Ok(false);
        }
        while let Some((s1, s2)) = self.queue.pop_front() {
            match self.isomorphic_state(s1, s2) {
                Ok(true) => {}
                other => return other,
            }
        }
        Ok(true)
    }

    /// Extends the bijection with (s1, s2); false on conflict.
    fn pair_state(&mut self, s1: StateId, s2: StateId) -> bool {
        if self.state_pairs.len() <= s1 {
            self.state_pairs.resize(s1 + 1, None);
        }
        match self.state_pairs[s1] {
            Some(paired) => paired == s2,
            None => {
                self.state_pairs[s1] = Some(s2);
                self.queue.push_back((s1, s2));
                true
            }
        }
    }

    fn isomorphic_state(&mut self, s1: StateId, s2: StateId) -> Result<bool, IsomorphicError> {
        if !self
            .fst1
            .final_weight(s1)
            .approx_eq(&self.fst2.final_weight(s2), self.delta)
        {
            return Ok(false);
        }
        if self.fst1.num_arcs(s1) != self.fst2.num_arcs(s2) {
            return Ok(false);
        }

        let mut arcs1: Vec<Arc<W>> = self.fst1.arcs(s1).collect();
        let mut arcs2: Vec<Arc<W>> = self.fst2.arcs(s2).collect();
        let delta = self.delta;
        let mut collision = false;
        arcs1.sort_by(|a, b| arc_order(a, b, delta, &mut collision));
        arcs2.sort_by(|a, b| arc_order(a, b, delta, &mut collision));
        if collision {
            return Err(IsomorphicError::WeightHashCollision);
        }

        for i in 0..arcs1.len() {
            let arc1 = &arcs1[i];
            let arc2 = &arcs2[i];
            if arc1.ilabel != arc2.ilabel || arc1.olabel != arc2.olabel {
                return Ok(false);
            }
            if !arc1.weight.approx_eq(&arc2.weight, self.delta) {
                return Ok(false);
            }
            if !self.pair_state(arc1.nextstate, arc2.nextstate) {
                return Ok(false);
            }
            if i > 0 {
                // Two sorted arcs agreeing on labels and weight violate the
                // determinism precondition.
                let prev = &arcs1[i - 1];
                if arc1.ilabel == prev.ilabel
                    && arc1.olabel == prev.olabel
                    && arc1.weight.approx_eq(&prev.weight, self.delta)
                {
                    return Err(IsomorphicError::NondeterministicInput);
                }
            }
        }
        Ok(true)
    }
}

/// Total order on arcs: labels first, then the weight order.
fn arc_order<W: Semiring>(a: &Arc<W>, b: &Arc<W>, delta: f32, collision: &mut bool) -> Ordering {
    match a.ilabel.cmp(&b.ilabel) {
        Ordering::Equal => {}
        other => return other,
    }
    match a.olabel.cmp(&b.olabel) {
        Ordering::Equal => {}
        other => return other,
    }
    weight_order(&a.weight, &b.weight, delta, collision)
}

/// Orders weights by natural order when available, by quantized hash
/// otherwise. A hash collision between distinct quantized weights is
/// flagged; the caller must treat the run as indeterminate.
fn weight_order<W: Semiring>(w1: &W, w2: &W, delta: f32, collision: &mut bool) -> Ordering {
    if W::IDEMPOTENT {
        if w1.natural_less(w2) {
            Ordering::Less
        } else if w2.natural_less(w1) {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    } else {
        let q1 = w1.quantize(delta);
        let q2 = w2.quantize(delta);
        let h1 = q1.hash_weight();
        let h2 = q2.hash_weight();
        if h1 == h2 && q1 != q2 {
            *collision = true;
        }
        h1.cmp(&h2)
    }
}

//! Weight- and state-threshold pruning.

use super::shortest_distance::shortest_distance;
use crate::fst::{ExpandedFst, FstProperties, MutableFst, StateId};
use crate::semiring::Semiring;
use std::collections::VecDeque;

/// Deletes states on no path within `times(total_weight, weight_threshold)`
/// of the best, keeping at most `state_threshold` states when given.
///
/// Requires a semiring with a natural order (idempotent); anything else
/// sets the sticky error bit and leaves the transducer unchanged.
pub fn prune<W, M>(
    fst: &mut M,
    weight_threshold: &W,
    state_threshold: Option<usize>,
    delta: f32,
) where
    W: Semiring,
    M: MutableFst<W>,
{
    if weight_threshold.is_zero() && state_threshold.is_none() {
        return;
    }
    if !W::IDEMPOTENT {
        fst.set_properties(FstProperties::ERROR, FstProperties::ERROR);
        return;
    }
    let start = match fst.start() {
        Some(s) => s,
        None => return,
    };
    let n = fst.num_states();
    let forward = shortest_distance(fst, start);
    let backward = backward_distances(fst, delta);
    let total = backward[start].clone();
    let limit = total.times(weight_threshold);

    // Score each state by the best path through it.
    let scores: Vec<W> = (0..n)
        .map(|s| forward[s].times(&backward[s]))
        .collect();

    let mut keep: Vec<bool> = scores
        .iter()
        .map(|score| !limit.natural_less(score))
        .collect();

    if let Some(max_states) = state_threshold {
        let mut ranked: Vec<StateId> = (0..n).filter(|&s| keep[s]).collect();
        ranked.sort_by(|&a, &b| {
            if scores[a].natural_less(&scores[b]) {
                std::cmp::Ordering::Less
            } else if scores[b].natural_less(&scores[a]) {
                std::cmp::Ordering::Greater
            } else {
                a.cmp(&b)
            }
        });
        for &s in ranked.iter().skip(max_states) {
            keep[s] = false;
        }
    }

    let dstates: Vec<StateId> = (0..n).filter(|&s| !keep[s]).collect();
    fst.delete_states(&dstates);
}

/// For each state, the semiring sum over paths to final states of the path
/// weight times the final weight.
fn backward_distances<W, F>(fst: &F, delta: f32) -> Vec<W>
where
    W: Semiring,
    F: ExpandedFst<W>,
{
    let n = fst.num_states();
    let mut reverse: Vec<Vec<(StateId, W)>> = vec![Vec::new(); n];
    for s in fst.states() {
        for arc in fst.arcs(s) {
            reverse[arc.nextstate].push((s, arc.weight));
        }
    }

    let mut distance = vec![W::zero(); n];
    let mut adder = vec![W::zero(); n];
    let mut radder = vec![W::zero(); n];
    let mut enqueued = vec![false; n];
    let mut queue = VecDeque::new();
    for s in fst.states() {
        let final_weight = fst.final_weight(s);
        if !final_weight.is_zero() {
            distance[s] = final_weight.clone();
            adder[s] = final_weight.clone();
            radder[s] = final_weight;
            queue.push_back(s);
            enqueued[s] = true;
        }
    }

    while let Some(state) = queue.pop_front() {
        enqueued[state] = false;
        let pending = std::mem::replace(&mut radder[state], W::zero());
        for (source, weight) in &reverse[state] {
            let mass = weight.times(&pending);
            let candidate = distance[*source].plus(&mass);
            if !distance[*source].approx_eq(&candidate, delta) {
                adder[*source] = adder[*source].plus(&mass);
                radder[*source] = radder[*source].plus(&mass);
                distance[*source] = adder[*source].clone();
                if !enqueued[*source] {
                    queue.push_back(*source);
                    enqueued[*source] = true;
                }
            }
        }
    }
    distance
}

//! Per-state reachable-final intervals.
//!
//! Numbers the final states of an acyclic transducer in depth-first
//! discovery order and computes, for every state, the set of reachable
//! final indices as an interval set. Discovery-order numbering makes those
//! sets contiguous for tree-shaped graphs and keeps them compact for DAGs.

use super::arc_filter::AnyArcFilter;
use super::interval_set::IntervalSet;
use super::visit::{dfs_visit, Visitor};
use crate::fst::{Arc, ExpandedFst, Label, StateId, NO_LABEL};
use crate::semiring::Semiring;

/// Reachability of final states, as intervals over their indices.
#[derive(Debug)]
pub struct StateReachable {
    /// Interval set of reachable final indices per state.
    pub isets: Vec<IntervalSet>,
    /// Index assigned to each final state; `NO_LABEL` for non-final states.
    pub state2index: Vec<Label>,
    /// True if the input was cyclic (reachability is then meaningless).
    pub error: bool,
}

impl StateReachable {
    /// Computes reachability over `fst`, which must be acyclic.
    pub fn new<W, F>(fst: &F) -> Self
    where
        W: Semiring,
        F: ExpandedFst<W>,
    {
        let mut visitor = IntervalReachVisitor::new(fst);
        dfs_visit(fst, &mut visitor, &AnyArcFilter);
        StateReachable {
            isets: visitor.isets,
            state2index: visitor.state2index,
            error: visitor.error,
        }
    }
}

struct IntervalReachVisitor {
    isets: Vec<IntervalSet>,
    state2index: Vec<Label>,
    is_final: Vec<bool>,
    next_index: Label,
    error: bool,
}

impl IntervalReachVisitor {
    fn new<W, F>(fst: &F) -> Self
    where
        W: Semiring,
        F: ExpandedFst<W>,
    {
        let is_final = fst
            .states()
            .map(|s| !fst.final_weight(s).is_zero())
            .collect();
        IntervalReachVisitor {
            isets: Vec::new(),
            state2index: Vec::new(),
            is_final,
            // Index 0 is never used; compact relabeling is 1-based so the
            // epsilon label keeps its meaning.
            next_index: 1,
            error: false,
        }
    }
}

impl<W: Semiring> Visitor<W> for IntervalReachVisitor {
    fn init_visit(&mut self, num_states: usize, _start: Option<StateId>) {
        self.isets = vec![IntervalSet::new(); num_states];
        self.state2index = vec![NO_LABEL; num_states];
    }

    fn init_state(&mut self, state: StateId, _root: StateId) -> bool {
        if self.is_final[state] {
            let index = self.next_index;
            self.next_index += 1;
            self.state2index[state] = index;
            self.isets[state].insert(index, index + 1);
        }
        true
    }

    fn back_arc(&mut self, _state: StateId, _arc: &Arc<W>) {
        self.error = true;
    }

    fn forward_or_cross_arc(&mut self, state: StateId, arc: &Arc<W>) {
        // The target is finished, its set is complete.
        let (left, right) = split_isets(&mut self.isets, state, arc.nextstate);
        left.extend(right);
    }

    fn finish_state(&mut self, state: StateId, parent: Option<StateId>) {
        self.isets[state].normalize();
        if let Some(parent) = parent {
            let (dst, src) = split_isets(&mut self.isets, parent, state);
            dst.extend(src);
        }
    }
}

/// Disjoint mutable/shared access to two entries of the interval table.
fn split_isets(
    isets: &mut [IntervalSet],
    dst: StateId,
    src: StateId,
) -> (&mut IntervalSet, &IntervalSet) {
    debug_assert_ne!(dst, src);
    if dst < src {
        let (a, b) = isets.split_at_mut(src);
        (&mut a[dst], &b[0])
    } else {
        let (a, b) = isets.split_at_mut(dst);
        (&mut b[0], &a[src])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fst::{MutableFst, VectorFst};
    use crate::semiring::{Semiring, TropicalWeight};

    #[test]
    fn contiguous_indices_for_fanout() {
        // Root with three final children: interval [1, 4).
        let mut fst = VectorFst::<TropicalWeight>::new();
        for _ in 0..4 {
            fst.add_state();
        }
        fst.set_start(0);
        for child in 1..4 {
            fst.add_arc(0, Arc::new(child as i64, child as i64, TropicalWeight::one(), child));
            fst.set_final(child, TropicalWeight::one());
        }

        let reachable = StateReachable::new(&fst);
        assert!(!reachable.error);
        assert_eq!(reachable.isets[0].len(), 1);
        let interval = *reachable.isets[0].iter().next().unwrap();
        assert_eq!((interval.begin, interval.end), (1, 4));
        for child in 1..4usize {
            assert_ne!(reachable.state2index[child], NO_LABEL);
        }
    }

    #[test]
    fn shared_descendant_via_cross_arc() {
        // 0 -> 1 -> 3(final), 0 -> 2 -> 3: state 2 reaches 3's index too.
        let mut fst = VectorFst::<TropicalWeight>::new();
        for _ in 0..4 {
            fst.add_state();
        }
        fst.set_start(0);
        fst.add_arc(0, Arc::new(1, 1, TropicalWeight::one(), 1));
        fst.add_arc(0, Arc::new(2, 2, TropicalWeight::one(), 2));
        fst.add_arc(1, Arc::new(3, 3, TropicalWeight::one(), 3));
        fst.add_arc(2, Arc::new(3, 3, TropicalWeight::one(), 3));
        fst.set_final(3, TropicalWeight::one());

        let reachable = StateReachable::new(&fst);
        assert!(!reachable.error);
        let index = reachable.state2index[3];
        assert!(reachable.isets[1].member(index));
        assert!(reachable.isets[2].member(index));
        assert!(reachable.isets[0].member(index));
    }

    #[test]
    fn cycle_is_an_error() {
        let mut fst = VectorFst::<TropicalWeight>::new();
        fst.add_state();
        fst.set_start(0);
        fst.add_arc(0, Arc::new(1, 1, TropicalWeight::one(), 0));
        let reachable = StateReachable::new(&fst);
        assert!(reachable.error);
    }
}

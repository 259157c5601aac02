//! Label reachability index.
//!
//! Answers "can label `l` appear as the first non-epsilon label on some
//! path from state `s`?" in logarithmic time per query. Construction
//! relabels the transducer so reachable label sets compress into contiguous
//! intervals: every labelled arc is redirected to a per-label sink, final
//! weights become arcs to a reserved sink, and a super-initial state ties
//! the zero-in-degree states together; per-state interval sets then come
//! from [`StateReachable`] over the transformed graph.
//!
//! Used to prune composition lookups: given an arc range sorted by the
//! relabelled side, [`LabelReachable::reach_range`] reports whether any arc
//! in the range carries a reachable label, optionally accumulating the
//! matching arc weights.

use super::interval_set::IntervalSet;
use super::state_reachable::StateReachable;
use crate::fst::{Arc, ExpandedFst, Fst, Label, MutableFst, StateId, VectorFst, NO_LABEL};
use crate::semiring::Semiring;
use log::debug;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;

/// Shareable data behind a reachability index; copies share it.
#[derive(Debug)]
pub struct LabelReachableData {
    reach_input: bool,
    label2index: FxHashMap<Label, Label>,
    final_label: Label,
    isets: Vec<IntervalSet>,
}

impl LabelReachableData {
    /// The interval set for `state`.
    pub fn interval_set(&self, state: StateId) -> &IntervalSet {
        &self.isets[state]
    }

    /// The reserved index standing for "reaches a final state".
    pub fn final_label(&self) -> Label {
        self.final_label
    }

    /// True if the index tracks input labels, false for output labels.
    pub fn reach_input(&self) -> bool {
        self.reach_input
    }
}

/// Accumulates the weights of reachable arcs in a range query.
pub trait ReachAccumulator<W: Semiring> {
    /// Combines an accumulated value with one arc weight.
    fn sum(&mut self, accumulated: &W, weight: &W) -> W;
}

/// The default accumulator: semiring `plus`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlusAccumulator;

impl<W: Semiring> ReachAccumulator<W> for PlusAccumulator {
    fn sum(&mut self, accumulated: &W, weight: &W) -> W {
        accumulated.plus(weight)
    }
}

/// Label reachability index over one side of a transducer.
pub struct LabelReachable<W: Semiring, A: ReachAccumulator<W> = PlusAccumulator> {
    data: Rc<RefCell<LabelReachableData>>,
    accumulator: A,
    state: Option<StateId>,
    reach_begin: Option<usize>,
    reach_end: usize,
    reach_weight: W,
    ncalls: u64,
    nintervals: u64,
    error: bool,
}

impl<W: Semiring> LabelReachable<W, PlusAccumulator> {
    /// Builds the index for `fst` on the input (`reach_input`) or output
    /// side.
    pub fn new<F: ExpandedFst<W>>(fst: &F, reach_input: bool) -> Self {
        Self::with_accumulator(fst, reach_input, PlusAccumulator)
    }
}

impl<W: Semiring, A: ReachAccumulator<W>> LabelReachable<W, A> {
    /// Builds the index with a custom weight accumulator.
    pub fn with_accumulator<F: ExpandedFst<W>>(fst: &F, reach_input: bool, accumulator: A) -> Self {
        let mut working = VectorFst::from_fst(fst);
        let original_states = working.num_states();
        let mut label2state: FxHashMap<Label, StateId> = FxHashMap::default();
        transform_fst(&mut working, reach_input, &mut label2state);

        let mut data = LabelReachableData {
            reach_input,
            label2index: FxHashMap::default(),
            final_label: NO_LABEL,
            isets: Vec::new(),
        };
        let mut error = false;
        let reachable = StateReachable::new(&working);
        if reachable.error {
            error = true;
        } else {
            let mut isets = reachable.isets;
            isets.truncate(original_states);
            data.isets = isets;
            for (&label, &sink) in &label2state {
                let index = reachable.state2index[sink];
                data.label2index.insert(label, index);
                if label == NO_LABEL {
                    data.final_label = index;
                }
            }
            let nintervals: usize = data.isets.iter().map(IntervalSet::len).sum();
            debug!(
                "label reachability: {} states, {} labels, {} intervals",
                original_states,
                label2state.len(),
                nintervals
            );
        }

        LabelReachable {
            data: Rc::new(RefCell::new(data)),
            accumulator,
            state: None,
            reach_begin: None,
            reach_end: 0,
            reach_weight: W::zero(),
            ncalls: 0,
            nintervals: 0,
            error,
        }
    }

    /// A copy sharing the underlying interval data.
    pub fn share(&self) -> Self
    where
        A: Clone,
    {
        LabelReachable {
            data: Rc::clone(&self.data),
            accumulator: self.accumulator.clone(),
            state: None,
            reach_begin: None,
            reach_end: 0,
            reach_weight: W::zero(),
            ncalls: 0,
            nintervals: 0,
            error: self.error,
        }
    }

    /// Maps a label to its compact index, assigning a fresh index to a
    /// label not seen during construction. Epsilon maps to itself.
    pub fn relabel(&mut self, label: Label) -> Label {
        if label == 0 || self.error {
            return label;
        }
        let mut data = self.data.borrow_mut();
        let next = data.label2index.len() as Label + 1;
        *data.label2index.entry(label).or_insert(next)
    }

    /// Relabels the chosen side of an entire transducer and sorts its arcs
    /// by that side, making it directly queryable against this index.
    pub fn relabel_fst(&mut self, fst: &mut VectorFst<W>, relabel_input: bool) {
        for s in fst.states() {
            let mut unseen: Vec<Label> = Vec::new();
            {
                let data = self.data.borrow();
                for arc in fst.arcs(s) {
                    let old = if relabel_input { arc.ilabel } else { arc.olabel };
                    if old != 0 && !data.label2index.contains_key(&old) {
                        unseen.push(old);
                    }
                }
            }
            for old in unseen {
                self.relabel(old);
            }
            let data = self.data.borrow();
            fst.for_each_arc_mut(s, &mut |arc| {
                let label = if relabel_input { arc.ilabel } else { arc.olabel };
                if label != 0 {
                    let new = data.label2index[&label];
                    if relabel_input {
                        arc.ilabel = new;
                    } else {
                        arc.olabel = new;
                    }
                }
            });
        }
        if relabel_input {
            fst.arc_sort_by(|arc| arc.ilabel);
            fst.set_input_symbols(None);
        } else {
            fst.arc_sort_by(|arc| arc.olabel);
            fst.set_output_symbols(None);
        }
    }

    /// Returns the (old, new) relabelling pairs. With `avoid_collisions`,
    /// compact indices that were not assigned to any seen label are mapped
    /// out of the compact range so unseen labels cannot collide.
    pub fn relabel_pairs(&self, avoid_collisions: bool) -> Vec<(Label, Label)> {
        let data = self.data.borrow();
        let mut pairs: Vec<(Label, Label)> = data
            .label2index
            .iter()
            .filter(|(_, &index)| index != data.final_label)
            .map(|(&label, &index)| (label, index))
            .collect();
        if avoid_collisions {
            let used = data.label2index.len() as Label;
            for index in 1..=used {
                let taken = data
                    .label2index
                    .get(&index)
                    .is_some_and(|&i| i != data.final_label);
                if !taken {
                    pairs.push((index, used + 1));
                }
            }
        }
        pairs
    }

    /// Positions the index at `state` for subsequent queries.
    pub fn set_state(&mut self, state: StateId) {
        self.state = Some(state);
    }

    /// Can the (relabelled) label be read as the first non-epsilon symbol
    /// on some path from the current state?
    pub fn reach(&self, label: Label) -> bool {
        if label == 0 || self.error {
            return false;
        }
        let state = self.state.expect("set_state before reach");
        self.data.borrow().interval_set(state).member(label)
    }

    /// Can a final state be reached (via epsilon paths) from the current
    /// state?
    pub fn reach_final(&self) -> bool {
        if self.error {
            return false;
        }
        let state = self.state.expect("set_state before reach_final");
        let data = self.data.borrow();
        data.interval_set(state).member(data.final_label)
    }

    /// Scans `arcs[begin..end]` (sorted by the relabelled side) for arcs
    /// with reachable labels. Walks the range linearly when it is small
    /// against the interval count, binary-searching each interval
    /// otherwise. With `compute_weight`, the matching arc weights are
    /// summed through the accumulator and available via
    /// [`reach_weight`](Self::reach_weight).
    pub fn reach_range(
        &mut self,
        arcs: &[Arc<W>],
        begin: usize,
        end: usize,
        compute_weight: bool,
    ) -> bool {
        if self.error {
            return false;
        }
        let state = self.state.expect("set_state before reach_range");
        let data = Rc::clone(&self.data);
        let data = data.borrow();
        let iset = data.interval_set(state);
        self.ncalls += 1;
        self.nintervals += iset.len() as u64;

        self.reach_begin = None;
        self.reach_end = 0;
        self.reach_weight = W::zero();

        let reach_input = data.reach_input();
        let side = |arc: &Arc<W>| if reach_input { arc.ilabel } else { arc.olabel };

        if 2 * (end - begin) < iset.len() {
            // Few arcs: check each against the interval set.
            let mut last_label = NO_LABEL;
            for (pos, arc) in arcs[begin..end].iter().enumerate() {
                let pos = begin + pos;
                let label = side(arc);
                if label == last_label || (label != 0 && iset.member(label)) {
                    last_label = label;
                    if self.reach_begin.is_none() {
                        self.reach_begin = Some(pos);
                    }
                    self.reach_end = pos + 1;
                    if compute_weight {
                        self.reach_weight = self.accumulator.sum(&self.reach_weight, &arc.weight);
                    }
                }
            }
        } else {
            // Few intervals: binary-search each against the sorted range.
            let mut end_low = begin;
            for interval in iset {
                let begin_low = lower_bound(arcs, end_low, end, interval.begin, reach_input);
                end_low = lower_bound(arcs, begin_low, end, interval.end, reach_input);
                if end_low > begin_low {
                    if self.reach_begin.is_none() {
                        self.reach_begin = Some(begin_low);
                    }
                    self.reach_end = end_low;
                    if compute_weight {
                        for arc in &arcs[begin_low..end_low] {
                            self.reach_weight =
                                self.accumulator.sum(&self.reach_weight, &arc.weight);
                        }
                    }
                }
            }
        }
        self.reach_begin.is_some()
    }

    /// Position of the first matching arc of the last range query.
    pub fn reach_begin(&self) -> Option<usize> {
        self.reach_begin
    }

    /// One past the last matching arc of the last range query.
    pub fn reach_end(&self) -> usize {
        self.reach_end
    }

    /// Accumulated weight of the last range query (when requested).
    pub fn reach_weight(&self) -> &W {
        &self.reach_weight
    }

    /// The shared interval data.
    pub fn data(&self) -> Rc<RefCell<LabelReachableData>> {
        Rc::clone(&self.data)
    }

    /// True if construction or a query failed.
    pub fn error(&self) -> bool {
        self.error
    }
}

impl<W: Semiring, A: ReachAccumulator<W>> Drop for LabelReachable<W, A> {
    fn drop(&mut self) {
        if self.ncalls > 0 {
            debug!(
                "label reachability: {} range queries, {} intervals/query",
                self.ncalls,
                self.nintervals / self.ncalls
            );
        }
    }
}

/// First position in `arcs[begin..end]` whose chosen-side label is at least
/// `label`; the range must be sorted by that side.
fn lower_bound<W: Semiring>(
    arcs: &[Arc<W>],
    begin: usize,
    end: usize,
    label: Label,
    reach_input: bool,
) -> usize {
    begin
        + arcs[begin..end].partition_point(|arc| {
            let l = if reach_input { arc.ilabel } else { arc.olabel };
            l < label
        })
}

/// Redirects labelled arcs to per-label sinks, final weights to a reserved
/// sink, and adds a super-initial state feeding all zero-in-degree states.
fn transform_fst<W: Semiring>(
    fst: &mut VectorFst<W>,
    reach_input: bool,
    label2state: &mut FxHashMap<Label, StateId>,
) {
    let ins = fst.num_states();

    // Assign sink ids in encounter order: per state, arcs first, then the
    // final weight.
    let mut next_sink = ins;
    for s in 0..ins {
        for arc in fst.arcs(s) {
            let label = if reach_input { arc.ilabel } else { arc.olabel };
            if label != 0 {
                label2state.entry(label).or_insert_with(|| {
                    let id = next_sink;
                    next_sink += 1;
                    id
                });
            }
        }
        if !fst.final_weight(s).is_zero() {
            label2state.entry(NO_LABEL).or_insert_with(|| {
                let id = next_sink;
                next_sink += 1;
                id
            });
        }
    }
    while fst.num_states() < next_sink {
        let sink = fst.add_state();
        fst.set_final(sink, W::one());
    }

    // Re-point labelled arcs and final weights.
    for s in 0..ins {
        fst.for_each_arc_mut(s, &mut |arc| {
            let label = if reach_input { arc.ilabel } else { arc.olabel };
            if label != 0 {
                arc.nextstate = label2state[&label];
            }
        });
        let final_weight = fst.final_weight(s);
        if !final_weight.is_zero() {
            let sink = label2state[&NO_LABEL];
            fst.add_arc(s, Arc::new(NO_LABEL, NO_LABEL, final_weight, sink));
            fst.set_final(s, W::zero());
        }
    }

    // Super-initial state over all zero-in-degree states.
    let mut indegree = vec![0usize; fst.num_states()];
    for s in 0..fst.num_states() {
        for arc in fst.arcs(s) {
            indegree[arc.nextstate] += 1;
        }
    }
    let start = fst.add_state();
    fst.set_start(start);
    for s in 0..start {
        if indegree[s] == 0 {
            fst.add_arc(start, Arc::new(0, 0, W::one(), s));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fst::MutableFst;
    use crate::semiring::{Semiring, TropicalWeight};

    /// State 0 fans out on labels {3, 5, 7, 8, 9} to final states.
    fn fanout() -> VectorFst<TropicalWeight> {
        let mut fst = VectorFst::new();
        let root = fst.add_state();
        fst.set_start(root);
        for label in [3i64, 5, 7, 8, 9] {
            let target = fst.add_state();
            fst.add_arc(root, Arc::new(label, label, TropicalWeight::one(), target));
            fst.set_final(target, TropicalWeight::one());
        }
        fst
    }

    #[test]
    fn compacts_labels_into_one_interval() {
        let fst = fanout();
        let mut reachable = LabelReachable::new(&fst, true);
        assert!(!reachable.error());

        reachable.set_state(0);
        for label in [3i64, 5, 7, 8, 9] {
            let index = reachable.relabel(label);
            assert!((1..=5).contains(&index), "index {index} out of range");
            assert!(reachable.reach(index));
        }
        // The compact set is a single interval.
        assert_eq!(reachable.data.borrow().interval_set(0).len(), 1);
    }

    #[test]
    fn unreachable_label_is_rejected() {
        let fst = fanout();
        let mut reachable = LabelReachable::new(&fst, true);
        reachable.set_state(0);
        let unseen = reachable.relabel(42);
        assert!(!reachable.reach(unseen));
        assert!(!reachable.reach(0));
    }

    #[test]
    fn range_query_finds_sorted_matches() {
        let fst = fanout();
        let mut reachable = LabelReachable::new(&fst, true);
        reachable.set_state(0);

        // Arcs labelled with compact indices 1..=5 plus an unseen 100.
        let mut arcs: Vec<Arc<TropicalWeight>> = (1..=5)
            .map(|i| Arc::new(i, i, TropicalWeight::new(i as f32), 0))
            .collect();
        arcs.push(Arc::new(100, 100, TropicalWeight::one(), 0));

        assert!(reachable.reach_range(&arcs, 0, arcs.len(), true));
        assert_eq!(reachable.reach_begin(), Some(0));
        assert_eq!(reachable.reach_end(), 5);
        // Tropical plus picks the minimum weight.
        assert_eq!(*reachable.reach_weight(), TropicalWeight::new(1.0));
    }

    #[test]
    fn reach_final_sees_epsilon_paths() {
        // 0 -eps-> 1 (final): the final sink is reachable from 0.
        let mut fst = VectorFst::<TropicalWeight>::new();
        for _ in 0..2 {
            fst.add_state();
        }
        fst.set_start(0);
        fst.add_arc(0, Arc::new(0, 0, TropicalWeight::one(), 1));
        fst.set_final(1, TropicalWeight::one());

        let mut reachable = LabelReachable::new(&fst, true);
        reachable.set_state(0);
        assert!(reachable.reach_final());
    }

    #[test]
    fn relabel_fst_sorts_chosen_side() {
        let fst = fanout();
        let mut reachable = LabelReachable::new(&fst, true);
        let mut other = fanout();
        reachable.relabel_fst(&mut other, true);
        let labels: Vec<Label> = other.arcs(0).map(|a| a.ilabel).collect();
        let mut sorted = labels.clone();
        sorted.sort_unstable();
        assert_eq!(labels, sorted);
        assert!(labels.iter().all(|&l| (1..=5).contains(&l)));
    }
}

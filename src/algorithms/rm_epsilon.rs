//! Epsilon removal.
//!
//! Removes every arc whose input and output labels are both epsilon while
//! preserving the transducer relation. Each state's epsilon closure is
//! computed by generic shortest distance restricted to epsilon arcs; the
//! non-epsilon arcs leaving the closure are re-rooted at the state with the
//! closure distance folded into their weights, merging parallel arcs that
//! agree on (input, output, destination) by `plus`.
//!
//! The eager form rewrites a mutable transducer in place; the lazy form
//! ([`RmEpsilonFst`]) performs the identical per-state computation on demand
//! through the delayed framework, without connection or pruning.

use super::arc_filter::EpsilonArcFilter;
use super::connect::connect;
use super::prune::prune;
use super::queue::{AutoQueue, FifoQueue, StateQueue};
use super::shortest_distance::{ShortestDistanceConfig, ShortestDistanceState};
use super::visit::{dfs_visit, SccVisitor, TopOrderVisitor};
use crate::cache::{CacheOptions, ComputedState, LazyFst, LazyFstOp};
use crate::fst::properties::rm_epsilon_properties;
use crate::fst::{Arc, Fst, FstProperties, Label, MutableFst, StateId};
use crate::semiring::{Semiring, DEFAULT_DELTA};
use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;
use std::rc::Rc;

/// Options for epsilon removal.
#[derive(Debug, Clone)]
pub struct RmEpsilonConfig<W: Semiring> {
    /// Convergence delta for the epsilon-closure distances.
    pub delta: f32,
    /// Remove states neither accessible nor coaccessible afterwards.
    pub connect: bool,
    /// Prune paths weaker than `times(threshold, total_weight)`; `zero`
    /// disables.
    pub weight_threshold: W,
    /// Keep at most this many states when pruning.
    pub state_threshold: Option<usize>,
}

impl<W: Semiring> Default for RmEpsilonConfig<W> {
    fn default() -> Self {
        RmEpsilonConfig {
            delta: DEFAULT_DELTA,
            connect: true,
            weight_threshold: W::zero(),
            state_threshold: None,
        }
    }
}

/// Arc-merge key: arcs agreeing on all three are combined by `plus`.
#[derive(Clone, PartialEq, Eq, Hash)]
struct Element {
    ilabel: Label,
    olabel: Label,
    nextstate: StateId,
}

/// Per-state expansion engine shared by the eager and lazy forms.
///
/// The element map is reused across expansions: entries are stamped with an
/// expansion counter, so entries from earlier expansions are overwritten
/// lazily instead of rehashing the map every time. Visited marks are undone
/// through a list of touched states rather than a full clear.
#[derive(Clone)]
struct RmEpsilonState<W: Semiring, Q: StateQueue<W>> {
    sd: ShortestDistanceState<W, Q, EpsilonArcFilter>,
    element_map: FxHashMap<Element, (usize, usize)>,
    eps_queue: Vec<StateId>,
    visited: Vec<bool>,
    visited_states: Vec<StateId>,
    arcs: Vec<Arc<W>>,
    final_weight: W,
    expand_id: usize,
}

impl<W: Semiring, Q: StateQueue<W>> RmEpsilonState<W, Q> {
    fn new(queue: Q, delta: f32) -> Self {
        RmEpsilonState {
            sd: ShortestDistanceState::new(
                queue,
                EpsilonArcFilter,
                &ShortestDistanceConfig { delta },
                true,
            ),
            element_map: FxHashMap::default(),
            eps_queue: Vec::new(),
            visited: Vec::new(),
            visited_states: Vec::new(),
            arcs: Vec::new(),
            final_weight: W::zero(),
            expand_id: 0,
        }
    }

    fn error(&self) -> bool {
        self.sd.error()
    }

    /// Computes the replacement arcs and final weight for `source`.
    fn expand<F: Fst<W>>(&mut self, fst: &F, source: StateId) {
        self.final_weight = W::zero();
        self.arcs.clear();
        self.sd.shortest_distance(fst, source);
        if self.sd.error() {
            return;
        }
        self.eps_queue.push(source);

        while let Some(state) = self.eps_queue.pop() {
            if self.visited.len() <= state {
                self.visited.resize(state + 1, false);
            }
            if self.visited[state] {
                continue;
            }
            self.visited[state] = true;
            self.visited_states.push(state);

            let distance = self.sd.distance(state);
            for arc in fst.arcs(state) {
                if arc.is_epsilon() {
                    if self.visited.len() <= arc.nextstate {
                        self.visited.resize(arc.nextstate + 1, false);
                    }
                    if !self.visited[arc.nextstate] {
                        self.eps_queue.push(arc.nextstate);
                    }
                } else {
                    let weight = distance.times(&arc.weight);
                    let element = Element {
                        ilabel: arc.ilabel,
                        olabel: arc.olabel,
                        nextstate: arc.nextstate,
                    };
                    match self.element_map.entry(element) {
                        Entry::Vacant(entry) => {
                            entry.insert((self.expand_id, self.arcs.len()));
                            self.arcs
                                .push(Arc::new(arc.ilabel, arc.olabel, weight, arc.nextstate));
                        }
                        Entry::Occupied(mut entry) => {
                            let (stamp, pos) = *entry.get();
                            if stamp == self.expand_id {
                                let merged = self.arcs[pos].weight.plus(&weight);
                                self.arcs[pos].weight = merged;
                            } else {
                                // Stale entry from an earlier expansion.
                                entry.insert((self.expand_id, self.arcs.len()));
                                self.arcs.push(Arc::new(
                                    arc.ilabel,
                                    arc.olabel,
                                    weight,
                                    arc.nextstate,
                                ));
                            }
                        }
                    }
                }
            }
            self.final_weight = self
                .final_weight
                .plus(&distance.times(&fst.final_weight(state)));
        }

        for state in self.visited_states.drain(..) {
            self.visited[state] = false;
        }
        self.expand_id += 1;
    }
}

/// Removes epsilon arcs in place.
///
/// States are processed in reverse topological order of the epsilon
/// sub-graph (grouped by strongly connected component when that graph is
/// cyclic), so already-rewritten states are epsilon-free when their
/// predecessors expand. With `connect` or a pruning threshold set, states
/// with no incoming non-epsilon arc are skipped and stripped; otherwise all
/// states are retained.
///
/// Time is O(V² + VE) unweighted or acyclic, O(V² log V + VE) over the
/// tropical semiring, exponential in general.
pub fn rm_epsilon<W, M>(fst: &mut M, config: &RmEpsilonConfig<W>)
where
    W: Semiring,
    M: MutableFst<W>,
{
    // A transducer already carrying the error bit is meaningless; leave it
    // untouched with the bit sticky.
    if fst.properties().contains(FstProperties::ERROR) {
        return;
    }
    let start = match fst.start() {
        Some(s) => s,
        None => return,
    };
    let n = fst.num_states();
    let input_props = fst.properties();

    // States with an incoming non-epsilon arc (or the start).
    let mut noneps_in = vec![false; n];
    noneps_in[start] = true;
    for s in fst.states() {
        for arc in fst.arcs(s) {
            if !arc.is_epsilon() {
                noneps_in[arc.nextstate] = true;
            }
        }
    }

    // Processing order, pushed topologically and popped from the back.
    let mut states: Vec<StateId> = Vec::with_capacity(n);
    if input_props.contains(FstProperties::TOP_SORTED) {
        states.extend(0..n);
    } else {
        let mut top = TopOrderVisitor::new();
        dfs_visit(fst, &mut top, &EpsilonArcFilter);
        if top.acyclic {
            states.resize(n, 0);
            for s in 0..n {
                states[top.order[s]] = s;
            }
        } else if input_props.contains(FstProperties::ACYCLIC) {
            // The declared bit contradicts the structure.
            fst.set_properties(FstProperties::ERROR, FstProperties::ERROR);
            return;
        } else {
            let mut scc = SccVisitor::new(fst);
            dfs_visit(fst, &mut scc, &EpsilonArcFilter);
            // Group states by component, components in topological order.
            let mut first: Vec<Option<StateId>> = vec![None; scc.nscc];
            let mut next: Vec<Option<StateId>> = vec![None; n];
            for s in 0..n {
                next[s] = first[scc.scc[s]];
                first[scc.scc[s]] = Some(s);
            }
            for head in first {
                let mut cursor = head;
                while let Some(s) = cursor {
                    states.push(s);
                    cursor = next[s];
                }
            }
        }
    }

    let use_thresholds = !config.weight_threshold.is_zero() || config.state_threshold.is_some();
    let queue = AutoQueue::new(fst, &EpsilonArcFilter);
    let mut rmeps = RmEpsilonState::new(queue, config.delta);

    while let Some(state) = states.pop() {
        if !noneps_in[state] && (config.connect || use_thresholds) {
            continue;
        }
        rmeps.expand(fst, state);
        fst.set_final(state, rmeps.final_weight.clone());
        fst.delete_arcs(state);
        fst.reserve_arcs(state, rmeps.arcs.len());
        for arc in rmeps.arcs.drain(..) {
            fst.add_arc(state, arc);
        }
    }

    // Strip states the result will not keep. Runs only under connect or a
    // threshold; with both off all states retain their rewritten arcs.
    if config.connect || use_thresholds {
        for s in 0..n {
            if !noneps_in[s] {
                fst.delete_arcs(s);
            }
        }
    }

    if rmeps.error() {
        fst.set_properties(FstProperties::ERROR, FstProperties::ERROR);
    }

    let mut output_props = rm_epsilon_properties(input_props);
    if use_thresholds {
        prune(
            fst,
            &config.weight_threshold,
            config.state_threshold,
            config.delta,
        );
    }
    if config.connect && !use_thresholds {
        connect(fst);
        output_props |= FstProperties::ACCESSIBLE | FstProperties::COACCESSIBLE;
    }
    fst.set_properties(output_props, FstProperties::TRINARY);
}

/// The computation behind the delayed epsilon-removal view.
#[derive(Clone)]
pub struct RmEpsilonOp<W: Semiring, F: Fst<W>> {
    fst: Rc<F>,
    rmeps: RmEpsilonState<W, FifoQueue>,
    props: FstProperties,
}

impl<W: Semiring, F: Fst<W>> RmEpsilonOp<W, F> {
    /// Wraps a shared source transducer.
    pub fn new(fst: Rc<F>, delta: f32) -> Self {
        let props = rm_epsilon_properties(fst.properties());
        RmEpsilonOp {
            fst,
            rmeps: RmEpsilonState::new(FifoQueue::new(), delta),
            props,
        }
    }
}

impl<W: Semiring, F: Fst<W>> LazyFstOp<W> for RmEpsilonOp<W, F> {
    fn compute_start(&mut self) -> Option<StateId> {
        self.fst.start()
    }

    fn compute_state(&mut self, state: StateId) -> ComputedState<W> {
        self.rmeps.expand(&*self.fst, state);
        ComputedState {
            final_weight: self.rmeps.final_weight.clone(),
            arcs: std::mem::take(&mut self.rmeps.arcs),
        }
    }

    fn properties(&self) -> FstProperties {
        self.props
    }

    fn error(&self) -> bool {
        self.rmeps.error()
    }
}

/// Delayed epsilon removal: states are rewritten on first access.
///
/// Unlike the eager form, no connection or pruning is performed; states
/// unreachable without epsilon arcs simply never materialise.
pub type RmEpsilonFst<W, F> = LazyFst<W, RmEpsilonOp<W, F>>;

/// Builds the delayed epsilon-removal view of `fst`.
pub fn rm_epsilon_lazy<W, F>(fst: F, cache: CacheOptions) -> RmEpsilonFst<W, F>
where
    W: Semiring,
    F: Fst<W>,
{
    let isymbols = fst.input_symbols().cloned();
    let osymbols = fst.output_symbols().cloned();
    LazyFst::with_symbols(
        RmEpsilonOp::new(Rc::new(fst), DEFAULT_DELTA),
        cache,
        isymbols,
        osymbols,
    )
}

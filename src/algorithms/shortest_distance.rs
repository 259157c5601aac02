//! Generic single-source shortest distance.
//!
//! Computes, for a source state `s` and an arc filter, the semiring sum of
//! the weights of all filtered paths from `s` to every reachable state. With
//! a k-closed semiring or an acyclic filtered graph the computation is
//! exact; otherwise it converges when the pending mass at every state stays
//! within the configured delta. Non-idempotent semirings over cyclic graphs
//! may diverge and must not be used.

use super::arc_filter::ArcFilter;
use super::queue::{AutoQueue, StateQueue};
use crate::fst::{ExpandedFst, Fst, StateId};
use crate::semiring::{Semiring, DEFAULT_DELTA};

/// Convergence configuration.
#[derive(Debug, Clone, Copy)]
pub struct ShortestDistanceConfig {
    /// Convergence delta for approximate weight comparison.
    pub delta: f32,
}

impl Default for ShortestDistanceConfig {
    fn default() -> Self {
        ShortestDistanceConfig {
            delta: DEFAULT_DELTA,
        }
    }
}

/// Reusable computation state for repeated single-source runs.
///
/// Epsilon removal calls this once per state it expands. The transducer is
/// passed per call rather than held, so callers may mutate it between runs.
/// With `retain`, the distance table survives across calls and entries from
/// earlier sources are recognised by a per-call stamp instead of a full
/// reset.
#[derive(Clone)]
pub struct ShortestDistanceState<W, Q, AF>
where
    W: Semiring,
    Q: StateQueue<W>,
    AF: ArcFilter<W>,
{
    queue: Q,
    filter: AF,
    delta: f32,
    retain: bool,

    distance: Vec<W>,
    adder: Vec<W>,
    radder: Vec<W>,
    enqueued: Vec<bool>,
    sources: Vec<usize>,
    source_stamp: usize,
    error: bool,
}

impl<W, Q, AF> ShortestDistanceState<W, Q, AF>
where
    W: Semiring,
    Q: StateQueue<W>,
    AF: ArcFilter<W>,
{
    /// Creates computation state with the given discipline and filter. With
    /// `retain`, state from earlier calls is reused.
    pub fn new(queue: Q, filter: AF, config: &ShortestDistanceConfig, retain: bool) -> Self {
        ShortestDistanceState {
            queue,
            filter,
            delta: config.delta,
            retain,
            distance: Vec::new(),
            adder: Vec::new(),
            radder: Vec::new(),
            enqueued: Vec::new(),
            sources: Vec::new(),
            source_stamp: 0,
            error: false,
        }
    }

    /// Distance to `state` from the last source, `zero` if unreached.
    pub fn distance(&self, state: StateId) -> W {
        if state < self.distance.len()
            && (!self.retain || self.sources[state] == self.source_stamp)
        {
            self.distance[state].clone()
        } else {
            W::zero()
        }
    }

    /// True if a run failed (queue discipline violation).
    pub fn error(&self) -> bool {
        self.error
    }

    fn ensure(&mut self, state: StateId) {
        if self.distance.len() <= state {
            let n = state + 1;
            self.distance.resize(n, W::zero());
            self.adder.resize(n, W::zero());
            self.radder.resize(n, W::zero());
            self.enqueued.resize(n, false);
            self.sources.resize(n, usize::MAX);
        }
    }

    /// Clears a state's entries if they belong to an earlier source.
    fn freshen(&mut self, state: StateId) {
        if self.retain && self.sources[state] != self.source_stamp {
            self.distance[state] = W::zero();
            self.adder[state] = W::zero();
            self.radder[state] = W::zero();
            self.sources[state] = self.source_stamp;
        }
    }

    /// Runs the computation from `source`, filling the distance table.
    pub fn shortest_distance<F: Fst<W>>(&mut self, fst: &F, source: StateId) {
        if self.retain {
            self.source_stamp += 1;
        } else {
            self.distance.clear();
            self.adder.clear();
            self.radder.clear();
            self.enqueued.clear();
            self.sources.clear();
        }
        self.queue.clear();
        self.ensure(source);
        self.freshen(source);
        self.distance[source] = W::one();
        self.adder[source] = W::one();
        self.radder[source] = W::one();
        self.queue.enqueue(source, &W::one());
        self.enqueued[source] = true;

        while let Some(state) = self.queue.dequeue() {
            self.enqueued[state] = false;
            let pending = std::mem::replace(&mut self.radder[state], W::zero());
            for arc in fst.arcs(state) {
                if !self.filter.keep(&arc) {
                    continue;
                }
                let next = arc.nextstate;
                self.ensure(next);
                self.freshen(next);
                let mass = pending.times(&arc.weight);
                let candidate = self.distance[next].plus(&mass);
                if !self.distance[next].approx_eq(&candidate, self.delta) {
                    self.adder[next] = self.adder[next].plus(&mass);
                    self.radder[next] = self.radder[next].plus(&mass);
                    self.distance[next] = self.adder[next].clone();
                    if self.enqueued[next] {
                        self.queue.update(next, &self.distance[next]);
                    } else {
                        self.queue.enqueue(next, &self.distance[next]);
                        self.enqueued[next] = true;
                    }
                }
            }
        }
        if self.queue.error() {
            self.error = true;
        }
    }
}

/// Single-source shortest distance over all arcs with an auto-selected
/// queue discipline.
///
/// Returns `distance[t]` for every state; unreached states hold `zero`.
pub fn shortest_distance<W, F>(fst: &F, source: StateId) -> Vec<W>
where
    W: Semiring,
    F: ExpandedFst<W>,
{
    shortest_distance_filtered(
        fst,
        source,
        super::arc_filter::AnyArcFilter,
        &ShortestDistanceConfig::default(),
    )
}

/// Single-source shortest distance restricted to filtered arcs.
pub fn shortest_distance_filtered<W, F, AF>(
    fst: &F,
    source: StateId,
    filter: AF,
    config: &ShortestDistanceConfig,
) -> Vec<W>
where
    W: Semiring,
    F: ExpandedFst<W>,
    AF: ArcFilter<W>,
{
    let queue = AutoQueue::new(fst, &filter);
    let mut state = ShortestDistanceState::new(queue, filter, config, false);
    state.shortest_distance(fst, source);
    let mut distance = state.distance;
    distance.resize(fst.num_states().max(distance.len()), W::zero());
    distance
}

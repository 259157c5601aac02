//! Per-state cache and the delayed transducer framework.
//!
//! A delayed transducer exposes the read-only [`Fst`](crate::fst::Fst)
//! interface but materialises each state on first access. The expansion of a
//! state is computed once by a [`LazyFstOp`] and stored in a [`StateCache`];
//! later accesses are cache hits. With a byte budget configured
//! ([`CacheOptions::gc_limit`]) least-recently-used ready states are evicted,
//! except the state currently expanding and any state whose arcs are pinned
//! by an outstanding iterator.

mod lazy;

pub use lazy::{ComputedState, LazyFst, LazyFstOp};

use crate::fst::{Arc, SharedArcs, StateId, EPSILON};
use crate::semiring::Semiring;
use rustc_hash::FxHashMap;

/// Cache configuration for delayed transducers.
#[derive(Debug, Clone, Copy)]
pub struct CacheOptions {
    /// Enable garbage collection of cached states.
    pub gc: bool,
    /// Maximum cached bytes before eviction runs (only with `gc`).
    pub gc_limit: usize,
}

impl Default for CacheOptions {
    fn default() -> Self {
        // No eviction: every expanded state stays available.
        CacheOptions {
            gc: false,
            gc_limit: usize::MAX,
        }
    }
}

impl CacheOptions {
    /// Caching with an LRU byte budget.
    pub fn with_gc_limit(gc_limit: usize) -> Self {
        CacheOptions { gc: true, gc_limit }
    }
}

#[derive(Debug, Clone)]
struct CacheSlot<W: Semiring> {
    final_weight: W,
    arcs: SharedArcs<W>,
    niepsilons: usize,
    noepsilons: usize,
    last_access: u64,
}

impl<W: Semiring> CacheSlot<W> {
    fn bytes(&self) -> usize {
        std::mem::size_of::<Self>() + self.arcs.len() * std::mem::size_of::<Arc<W>>()
    }
}

/// Mapping from state id to its cached expansion.
#[derive(Debug, Clone)]
pub struct StateCache<W: Semiring> {
    slots: FxHashMap<StateId, CacheSlot<W>>,
    start: Option<Option<StateId>>,
    options: CacheOptions,
    clock: u64,
    bytes: usize,
}

impl<W: Semiring> StateCache<W> {
    /// Creates an empty cache.
    pub fn new(options: CacheOptions) -> Self {
        StateCache {
            slots: FxHashMap::default(),
            start: None,
            options,
            clock: 0,
            bytes: 0,
        }
    }

    /// True once the start state has been computed.
    pub fn has_start(&self) -> bool {
        self.start.is_some()
    }

    /// The memoised start state; call only after [`set_start`](Self::set_start).
    pub fn start(&self) -> Option<StateId> {
        self.start.expect("start not computed")
    }

    /// Memoises the start state.
    pub fn set_start(&mut self, start: Option<StateId>) {
        self.start = Some(start);
    }

    /// True if `state` has a cached expansion.
    pub fn has_state(&self, state: StateId) -> bool {
        self.slots.contains_key(&state)
    }

    /// Stores the expansion of `state`. The arc list is final from here on
    /// and never rewritten (only evicted wholesale).
    pub fn insert(&mut self, state: StateId, final_weight: W, arcs: Vec<Arc<W>>) {
        let niepsilons = arcs.iter().filter(|a| a.ilabel == EPSILON).count();
        let noepsilons = arcs.iter().filter(|a| a.olabel == EPSILON).count();
        self.clock += 1;
        let slot = CacheSlot {
            final_weight,
            arcs: SharedArcs::new(arcs),
            niepsilons,
            noepsilons,
            last_access: self.clock,
        };
        self.bytes += slot.bytes();
        if let Some(old) = self.slots.insert(state, slot) {
            self.bytes -= old.bytes();
        }
        if self.options.gc && self.bytes > self.options.gc_limit {
            self.evict(state);
        }
    }

    /// Final weight of a cached state.
    pub fn final_weight(&mut self, state: StateId) -> W {
        self.touch(state);
        self.slots[&state].final_weight.clone()
    }

    /// Shared arc snapshot of a cached state. Cloning the returned pointer
    /// pins the state against eviction until dropped.
    pub fn arcs(&mut self, state: StateId) -> SharedArcs<W> {
        self.touch(state);
        SharedArcs::clone(&self.slots[&state].arcs)
    }

    /// Arc count of a cached state.
    pub fn num_arcs(&mut self, state: StateId) -> usize {
        self.touch(state);
        self.slots[&state].arcs.len()
    }

    /// Input-epsilon count of a cached state.
    pub fn num_input_epsilons(&mut self, state: StateId) -> usize {
        self.touch(state);
        self.slots[&state].niepsilons
    }

    /// Output-epsilon count of a cached state.
    pub fn num_output_epsilons(&mut self, state: StateId) -> usize {
        self.touch(state);
        self.slots[&state].noepsilons
    }

    /// Cached byte estimate.
    pub fn cache_bytes(&self) -> usize {
        self.bytes
    }

    fn touch(&mut self, state: StateId) {
        self.clock += 1;
        let clock = self.clock;
        if let Some(slot) = self.slots.get_mut(&state) {
            slot.last_access = clock;
        }
    }

    /// Evicts least-recently-used unpinned states until within budget.
    /// `keep` (the state just inserted / being expanded) is never evicted.
    fn evict(&mut self, keep: StateId) {
        let mut victims: Vec<(u64, StateId)> = self
            .slots
            .iter()
            .filter(|(&s, slot)| s != keep && SharedArcs::strong_count(&slot.arcs) == 1)
            .map(|(&s, slot)| (slot.last_access, s))
            .collect();
        victims.sort_unstable();
        for (_, s) in victims {
            if self.bytes <= self.options.gc_limit {
                break;
            }
            if let Some(slot) = self.slots.remove(&s) {
                self.bytes -= slot.bytes();
            }
        }
    }
}

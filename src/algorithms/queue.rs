//! State queue disciplines for shortest distance.
//!
//! The discipline decides the relaxation order. The caller tracks which
//! states are currently queued: `enqueue` is called only for states not in
//! the queue, `update` for states already in it. Disciplines receive the
//! candidate distance so priority orders need no access to the caller's
//! distance table.

use super::arc_filter::ArcFilter;
use super::visit::{dfs_visit, TopOrderVisitor};
use crate::fst::{ExpandedFst, StateId};
use crate::semiring::Semiring;
use std::collections::{BTreeSet, BinaryHeap, VecDeque};

/// A queue of states awaiting relaxation.
pub trait StateQueue<W: Semiring> {
    /// Inserts a state not currently queued, with its candidate distance.
    fn enqueue(&mut self, state: StateId, distance: &W);

    /// Signals a better distance for an already-queued state.
    fn update(&mut self, state: StateId, distance: &W);

    /// Removes and returns the next state, or `None` when empty.
    fn dequeue(&mut self) -> Option<StateId>;

    /// True when no state is queued.
    fn is_empty(&self) -> bool;

    /// Drops all queued states.
    fn clear(&mut self);

    /// True if the discipline's assumptions were violated.
    fn error(&self) -> bool {
        false
    }
}

/// First-in, first-out.
#[derive(Debug, Default, Clone)]
pub struct FifoQueue {
    queue: VecDeque<StateId>,
}

impl FifoQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        FifoQueue::default()
    }
}

impl<W: Semiring> StateQueue<W> for FifoQueue {
    fn enqueue(&mut self, state: StateId, _distance: &W) {
        self.queue.push_back(state);
    }

    fn update(&mut self, _state: StateId, _distance: &W) {}

    fn dequeue(&mut self) -> Option<StateId> {
        self.queue.pop_front()
    }

    fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    fn clear(&mut self) {
        self.queue.clear();
    }
}

/// Last-in, first-out.
#[derive(Debug, Default)]
pub struct LifoQueue {
    stack: Vec<StateId>,
}

impl LifoQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        LifoQueue::default()
    }
}

impl<W: Semiring> StateQueue<W> for LifoQueue {
    fn enqueue(&mut self, state: StateId, _distance: &W) {
        self.stack.push(state);
    }

    fn update(&mut self, _state: StateId, _distance: &W) {}

    fn dequeue(&mut self) -> Option<StateId> {
        self.stack.pop()
    }

    fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    fn clear(&mut self) {
        self.stack.clear();
    }
}

/// Dequeues in ascending state-id order.
#[derive(Debug, Default)]
pub struct StateOrderQueue {
    pending: BTreeSet<StateId>,
}

impl StateOrderQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        StateOrderQueue::default()
    }
}

impl<W: Semiring> StateQueue<W> for StateOrderQueue {
    fn enqueue(&mut self, state: StateId, _distance: &W) {
        self.pending.insert(state);
    }

    fn update(&mut self, _state: StateId, _distance: &W) {}

    fn dequeue(&mut self) -> Option<StateId> {
        self.pending.pop_first()
    }

    fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    fn clear(&mut self) {
        self.pending.clear();
    }
}

/// Dequeues in a fixed topological order.
#[derive(Debug)]
pub struct TopOrderQueue {
    /// Topological position per state.
    order: Vec<usize>,
    /// State at each topological position.
    by_pos: Vec<StateId>,
    pending: BTreeSet<usize>,
}

impl TopOrderQueue {
    /// Builds from a precomputed topological numbering (`order[s]` is the
    /// position of state `s`).
    pub fn new(order: Vec<usize>) -> Self {
        let mut by_pos = vec![0; order.len()];
        for (state, &pos) in order.iter().enumerate() {
            by_pos[pos] = state;
        }
        TopOrderQueue {
            order,
            by_pos,
            pending: BTreeSet::new(),
        }
    }
}

impl<W: Semiring> StateQueue<W> for TopOrderQueue {
    fn enqueue(&mut self, state: StateId, _distance: &W) {
        self.pending.insert(self.order[state]);
    }

    fn update(&mut self, _state: StateId, _distance: &W) {}

    fn dequeue(&mut self) -> Option<StateId> {
        let pos = self.pending.pop_first()?;
        Some(self.by_pos[pos])
    }

    fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    fn clear(&mut self) {
        self.pending.clear();
    }
}

struct HeapEntry<W: Semiring> {
    key: W,
    state: StateId,
}

impl<W: Semiring> PartialEq for HeapEntry<W> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl<W: Semiring> Eq for HeapEntry<W> {}

impl<W: Semiring> PartialOrd for HeapEntry<W> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<W: Semiring> Ord for HeapEntry<W> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // BinaryHeap is a max-heap; smaller keys must compare greater so
        // they pop first. Ties break on state id for determinism.
        if self.key.natural_less(&other.key) {
            std::cmp::Ordering::Greater
        } else if other.key.natural_less(&self.key) {
            std::cmp::Ordering::Less
        } else {
            other.state.cmp(&self.state)
        }
    }
}

/// Dequeues the state with the smallest distance under the natural order.
///
/// Requires an idempotent semiring with the path property; construction
/// under any other semiring sets the error flag (the discipline's
/// assumptions cannot hold).
///
/// Updates push fresh heap entries; stale entries are skipped on dequeue.
#[derive(Default)]
pub struct ShortestFirstQueue<W: Semiring> {
    heap: BinaryHeap<HeapEntry<W>>,
    queued: Vec<bool>,
    error: bool,
}

impl<W: Semiring> ShortestFirstQueue<W> {
    /// Creates an empty queue, checking the semiring's suitability.
    pub fn new() -> Self {
        ShortestFirstQueue {
            heap: BinaryHeap::new(),
            queued: Vec::new(),
            error: !(W::IDEMPOTENT && W::PATH),
        }
    }

    fn mark(&mut self, state: StateId, queued: bool) {
        if self.queued.len() <= state {
            self.queued.resize(state + 1, false);
        }
        self.queued[state] = queued;
    }
}

impl<W: Semiring> StateQueue<W> for ShortestFirstQueue<W> {
    fn enqueue(&mut self, state: StateId, distance: &W) {
        self.mark(state, true);
        self.heap.push(HeapEntry {
            key: distance.clone(),
            state,
        });
    }

    fn update(&mut self, state: StateId, distance: &W) {
        // Lazy deletion: the superseded entry stays in the heap and is
        // filtered out on dequeue.
        self.mark(state, true);
        self.heap.push(HeapEntry {
            key: distance.clone(),
            state,
        });
    }

    fn dequeue(&mut self) -> Option<StateId> {
        while let Some(entry) = self.heap.pop() {
            if self.queued.get(entry.state).copied().unwrap_or(false) {
                self.queued[entry.state] = false;
                return Some(entry.state);
            }
        }
        None
    }

    fn is_empty(&self) -> bool {
        !self.queued.iter().any(|&q| q)
    }

    fn clear(&mut self) {
        self.heap.clear();
        self.queued.clear();
    }

    fn error(&self) -> bool {
        self.error
    }
}

/// Discipline chosen from the semiring and the filtered graph's shape.
///
/// Topological order when the filtered graph is acyclic; shortest-first for
/// idempotent path semirings; FIFO otherwise.
pub enum AutoQueue<W: Semiring> {
    /// Topological order over an acyclic filtered graph.
    TopOrder(TopOrderQueue),
    /// Natural-order priority queue.
    ShortestFirst(ShortestFirstQueue<W>),
    /// Fallback.
    Fifo(FifoQueue),
}

impl<W: Semiring> AutoQueue<W> {
    /// Inspects the filtered graph and picks a discipline.
    pub fn new<F, AF>(fst: &F, filter: &AF) -> Self
    where
        F: ExpandedFst<W>,
        AF: ArcFilter<W>,
    {
        let mut visitor = TopOrderVisitor::new();
        dfs_visit(fst, &mut visitor, filter);
        if visitor.acyclic {
            AutoQueue::TopOrder(TopOrderQueue::new(visitor.order))
        } else if W::IDEMPOTENT && W::PATH {
            AutoQueue::ShortestFirst(ShortestFirstQueue::new())
        } else {
            AutoQueue::Fifo(FifoQueue::new())
        }
    }
}

impl<W: Semiring> StateQueue<W> for AutoQueue<W> {
    fn enqueue(&mut self, state: StateId, distance: &W) {
        match self {
            AutoQueue::TopOrder(q) => q.enqueue(state, distance),
            AutoQueue::ShortestFirst(q) => q.enqueue(state, distance),
            AutoQueue::Fifo(q) => StateQueue::<W>::enqueue(q, state, distance),
        }
    }

    fn update(&mut self, state: StateId, distance: &W) {
        match self {
            AutoQueue::TopOrder(q) => q.update(state, distance),
            AutoQueue::ShortestFirst(q) => q.update(state, distance),
            AutoQueue::Fifo(q) => StateQueue::<W>::update(q, state, distance),
        }
    }

    fn dequeue(&mut self) -> Option<StateId> {
        match self {
            AutoQueue::TopOrder(q) => StateQueue::<W>::dequeue(q),
            AutoQueue::ShortestFirst(q) => q.dequeue(),
            AutoQueue::Fifo(q) => StateQueue::<W>::dequeue(q),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            AutoQueue::TopOrder(q) => StateQueue::<W>::is_empty(q),
            AutoQueue::ShortestFirst(q) => StateQueue::<W>::is_empty(q),
            AutoQueue::Fifo(q) => StateQueue::<W>::is_empty(q),
        }
    }

    fn clear(&mut self) {
        match self {
            AutoQueue::TopOrder(q) => StateQueue::<W>::clear(q),
            AutoQueue::ShortestFirst(q) => StateQueue::<W>::clear(q),
            AutoQueue::Fifo(q) => StateQueue::<W>::clear(q),
        }
    }

    fn error(&self) -> bool {
        match self {
            AutoQueue::TopOrder(q) => StateQueue::<W>::error(q),
            AutoQueue::ShortestFirst(q) => StateQueue::<W>::error(q),
            AutoQueue::Fifo(q) => StateQueue::<W>::error(q),
        }
    }
}

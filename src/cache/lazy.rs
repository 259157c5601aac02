//! Cache-backed delayed transducer views.

use super::{CacheOptions, StateCache};
use crate::fst::{Arc, ArcsIter, Fst, FstProperties, MutableFst, StateId, SymbolTable, VectorFst};
use crate::semiring::Semiring;
use rustc_hash::FxHashMap;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

/// The result of expanding one state: its final weight and arc list.
#[derive(Debug, Clone)]
pub struct ComputedState<W: Semiring> {
    /// Final weight of the state (`zero` when not final).
    pub final_weight: W,
    /// Outgoing arcs, in emission order.
    pub arcs: Vec<Arc<W>>,
}

impl<W: Semiring> ComputedState<W> {
    /// A non-final state with no arcs.
    pub fn empty() -> Self {
        ComputedState {
            final_weight: W::zero(),
            arcs: Vec::new(),
        }
    }
}

/// The computation driving a delayed transducer.
///
/// Implementations compute the start state once and each state's expansion
/// on demand. An expansion must refer to other states by id only — it must
/// not re-enter the expansion of the state it is computing.
pub trait LazyFstOp<W: Semiring> {
    /// Computes the start state.
    fn compute_start(&mut self) -> Option<StateId>;

    /// Computes the final weight and arcs of `state`.
    fn compute_state(&mut self, state: StateId) -> ComputedState<W>;

    /// Property bits known for the whole delayed result.
    fn properties(&self) -> FstProperties {
        FstProperties::empty()
    }

    /// True if the computation has failed; the view reports the sticky
    /// error bit.
    fn error(&self) -> bool {
        false
    }
}

struct LazyInner<W: Semiring, Op: LazyFstOp<W>> {
    op: RefCell<Op>,
    cache: RefCell<StateCache<W>>,
    expanding: Cell<Option<StateId>>,
    error: Cell<bool>,
    isymbols: Option<SymbolTable>,
    osymbols: Option<SymbolTable>,
}

/// A delayed transducer: states materialise on first access.
///
/// Cloning is cheap and shares both the operation and the cache (the
/// "unsafe" copy of the underlying design — fine while a single thread
/// drives all clones). [`safe_copy`](LazyFst::safe_copy) snapshots the cache
/// so the copy evolves independently.
pub struct LazyFst<W: Semiring, Op: LazyFstOp<W>> {
    inner: Rc<LazyInner<W, Op>>,
}

impl<W: Semiring, Op: LazyFstOp<W>> Clone for LazyFst<W, Op> {
    fn clone(&self) -> Self {
        LazyFst {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<W: Semiring, Op: LazyFstOp<W>> LazyFst<W, Op> {
    /// Wraps an operation with a fresh cache.
    pub fn new(op: Op, options: CacheOptions) -> Self {
        LazyFst {
            inner: Rc::new(LazyInner {
                op: RefCell::new(op),
                cache: RefCell::new(StateCache::new(options)),
                expanding: Cell::new(None),
                error: Cell::new(false),
                isymbols: None,
                osymbols: None,
            }),
        }
    }

    /// Wraps an operation, attaching symbol tables to the view.
    pub fn with_symbols(
        op: Op,
        options: CacheOptions,
        isymbols: Option<SymbolTable>,
        osymbols: Option<SymbolTable>,
    ) -> Self {
        LazyFst {
            inner: Rc::new(LazyInner {
                op: RefCell::new(op),
                cache: RefCell::new(StateCache::new(options)),
                expanding: Cell::new(None),
                error: Cell::new(false),
                isymbols,
                osymbols,
            }),
        }
    }

    /// A copy whose cache is a snapshot of this view's cache; safe to hand
    /// to an independent reader while this view keeps expanding.
    pub fn safe_copy(&self) -> Self
    where
        Op: Clone,
    {
        LazyFst {
            inner: Rc::new(LazyInner {
                op: RefCell::new(self.inner.op.borrow().clone()),
                cache: RefCell::new(self.inner.cache.borrow().clone()),
                expanding: Cell::new(None),
                error: Cell::new(self.inner.error.get()),
                isymbols: self.inner.isymbols.clone(),
                osymbols: self.inner.osymbols.clone(),
            }),
        }
    }

    /// Ensures `state` is cached.
    fn expand(&self, state: StateId) {
        if self.inner.cache.borrow().has_state(state) {
            return;
        }
        if self.inner.expanding.get() == Some(state) {
            // An expansion recursed into its own state; record the error and
            // break the cycle with an empty state.
            self.inner.error.set(true);
            let empty = ComputedState::empty();
            self.inner
                .cache
                .borrow_mut()
                .insert(state, empty.final_weight, empty.arcs);
            return;
        }
        let previous = self.inner.expanding.replace(Some(state));
        let computed = self.inner.op.borrow_mut().compute_state(state);
        self.inner.expanding.set(previous);
        self.inner
            .cache
            .borrow_mut()
            .insert(state, computed.final_weight, computed.arcs);
    }

    /// Materialises the part of the view reachable from the start into a
    /// dense store, numbering states in discovery order.
    pub fn expand_all(&self) -> VectorFst<W> {
        let mut out = VectorFst::new();
        let start = match self.start() {
            Some(s) => s,
            None => {
                out.set_properties(self.properties(), FstProperties::TRINARY | FstProperties::ERROR);
                return out;
            }
        };
        let mut ids: FxHashMap<StateId, StateId> = FxHashMap::default();
        let mut queue = VecDeque::new();
        let out_start = out.add_state();
        ids.insert(start, out_start);
        out.set_start(out_start);
        queue.push_back(start);
        while let Some(s) = queue.pop_front() {
            let out_s = ids[&s];
            out.set_final(out_s, self.final_weight(s));
            for arc in self.arcs(s) {
                let target = *ids.entry(arc.nextstate).or_insert_with(|| {
                    queue.push_back(arc.nextstate);
                    out.add_state()
                });
                out.add_arc(out_s, Arc::new(arc.ilabel, arc.olabel, arc.weight, target));
            }
        }
        out.set_properties(
            self.properties(),
            FstProperties::TRINARY | FstProperties::ERROR,
        );
        out.set_input_symbols(self.inner.isymbols.clone());
        out.set_output_symbols(self.inner.osymbols.clone());
        out
    }
}

impl<W: Semiring, Op: LazyFstOp<W>> Fst<W> for LazyFst<W, Op> {
    fn start(&self) -> Option<StateId> {
        if !self.inner.cache.borrow().has_start() {
            let start = self.inner.op.borrow_mut().compute_start();
            self.inner.cache.borrow_mut().set_start(start);
        }
        self.inner.cache.borrow().start()
    }

    fn final_weight(&self, state: StateId) -> W {
        self.expand(state);
        self.inner.cache.borrow_mut().final_weight(state)
    }

    fn num_arcs(&self, state: StateId) -> usize {
        self.expand(state);
        self.inner.cache.borrow_mut().num_arcs(state)
    }

    fn arcs(&self, state: StateId) -> ArcsIter<W> {
        self.expand(state);
        ArcsIter::new(self.inner.cache.borrow_mut().arcs(state))
    }

    fn num_input_epsilons(&self, state: StateId) -> usize {
        self.expand(state);
        self.inner.cache.borrow_mut().num_input_epsilons(state)
    }

    fn num_output_epsilons(&self, state: StateId) -> usize {
        self.expand(state);
        self.inner.cache.borrow_mut().num_output_epsilons(state)
    }

    fn properties(&self) -> FstProperties {
        let mut props = self.inner.op.borrow().properties();
        if self.inner.error.get() || self.inner.op.borrow().error() {
            props.insert(FstProperties::ERROR);
        }
        props
    }

    fn input_symbols(&self) -> Option<&SymbolTable> {
        self.inner.isymbols.as_ref()
    }

    fn output_symbols(&self) -> Option<&SymbolTable> {
        self.inner.osymbols.as_ref()
    }
}

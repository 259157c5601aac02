//! Delay synchronization.
//!
//! The delay of a path is the number of non-epsilon output labels minus the
//! number of non-epsilon input labels. Synchronization produces an
//! equivalent transducer in which, along any traversal from the start, the
//! delay is zero or strictly increasing: labels are consumed and emitted in
//! lock-step, with the lagging side's labels queued as residual strings.
//!
//! Result states are triples `(source state, input residual, output
//! residual)`; residual strings are interned so triple equality is a token
//! comparison. The construction is exclusively lazy — the powerset of
//! residuals is exponential in the worst case — and terminates iff the
//! source has bounded delay (every cycle has delay zero). The eager wrapper
//! simply copies the lazy view into a dense store.

use crate::cache::{CacheOptions, ComputedState, LazyFst, LazyFstOp};
use crate::fst::properties::synchronize_properties;
use crate::fst::{Arc, Fst, FstProperties, Label, StateId, VectorFst};
use crate::semiring::Semiring;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::rc::Rc;

/// A residual label string; short in the bounded-delay cases that matter.
type Residual = SmallVec<[Label; 4]>;

/// Token for an interned residual string.
type StringId = usize;

/// Interner mapping residual strings to stable integer tokens.
#[derive(Debug, Default, Clone)]
struct StringInterner {
    ids: FxHashMap<Residual, StringId>,
    strings: Vec<Residual>,
}

impl StringInterner {
    fn intern(&mut self, string: Residual) -> StringId {
        if let Some(&id) = self.ids.get(&string) {
            return id;
        }
        let id = self.strings.len();
        self.ids.insert(string.clone(), id);
        self.strings.push(string);
        id
    }

    fn get(&self, id: StringId) -> &Residual {
        &self.strings[id]
    }
}

/// A result state: source state (or none, once the source is exhausted and
/// only residuals drain) plus the residual strings on either side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Element {
    state: Option<StateId>,
    istring: StringId,
    ostring: StringId,
}

/// The computation behind the delayed synchronization view.
pub struct SynchronizeOp<W: Semiring, F: Fst<W>> {
    fst: Rc<F>,
    interner: StringInterner,
    elements: Vec<Element>,
    element_map: FxHashMap<Element, StateId>,
    empty: StringId,
    props: FstProperties,
    _weight: std::marker::PhantomData<W>,
}

impl<W: Semiring, F: Fst<W>> SynchronizeOp<W, F> {
    /// Wraps a shared source transducer.
    pub fn new(fst: Rc<F>) -> Self {
        let props = synchronize_properties(fst.properties());
        let mut interner = StringInterner::default();
        let empty = interner.intern(Residual::new());
        SynchronizeOp {
            fst,
            interner,
            elements: Vec::new(),
            element_map: FxHashMap::default(),
            empty,
            props,
            _weight: std::marker::PhantomData,
        }
    }

    /// First label of `s · l`, or 0 when both are empty.
    fn car(&self, s: StringId, l: Label) -> Label {
        let string = self.interner.get(s);
        if let Some(&head) = string.first() {
            head
        } else {
            l
        }
    }

    /// `s · l` without its first label.
    fn cdr(&mut self, s: StringId, l: Label) -> StringId {
        let string = self.interner.get(s);
        let mut rest: Residual = string.iter().skip(1).copied().collect();
        if l != 0 && !string.is_empty() {
            rest.push(l);
        }
        self.interner.intern(rest)
    }

    /// `s · l`.
    fn concat(&mut self, s: StringId, l: Label) -> StringId {
        let mut string: Residual = self.interner.get(s).clone();
        if l != 0 {
            string.push(l);
        }
        self.interner.intern(string)
    }

    /// True if `s · l` is the empty string.
    fn is_empty(&self, s: StringId, l: Label) -> bool {
        self.interner.get(s).is_empty() && l == 0
    }

    /// Interns a result-state triple, creating a fresh state id on first
    /// sight.
    fn find_state(&mut self, element: Element) -> StateId {
        if let Some(&id) = self.element_map.get(&element) {
            return id;
        }
        let id = self.elements.len();
        self.elements.push(element);
        self.element_map.insert(element, id);
        id
    }
}

impl<W: Semiring, F: Fst<W>> LazyFstOp<W> for SynchronizeOp<W, F> {
    fn compute_start(&mut self) -> Option<StateId> {
        let source_start = self.fst.start()?;
        let empty = self.empty;
        Some(self.find_state(Element {
            state: Some(source_start),
            istring: empty,
            ostring: empty,
        }))
    }

    fn compute_state(&mut self, state: StateId) -> ComputedState<W> {
        let element = self.elements[state];
        let mut arcs = Vec::new();

        if let Some(source) = element.state {
            // The iterator owns its arc snapshot, so interning below may
            // mutate `self` freely.
            let source_arcs = self.fst.arcs(source);
            for arc in source_arcs {
                if !self.is_empty(element.istring, arc.ilabel)
                    && !self.is_empty(element.ostring, arc.olabel)
                {
                    // Both sides have a label available: emit them in step
                    // and queue the remainder.
                    let ilabel = self.car(element.istring, arc.ilabel);
                    let olabel = self.car(element.ostring, arc.olabel);
                    let istring = self.cdr(element.istring, arc.ilabel);
                    let ostring = self.cdr(element.ostring, arc.olabel);
                    let next = self.find_state(Element {
                        state: Some(arc.nextstate),
                        istring,
                        ostring,
                    });
                    arcs.push(Arc::new(ilabel, olabel, arc.weight, next));
                } else {
                    // One side is starved; accumulate the other as residual.
                    let istring = self.concat(element.istring, arc.ilabel);
                    let ostring = self.concat(element.ostring, arc.olabel);
                    let next = self.find_state(Element {
                        state: Some(arc.nextstate),
                        istring,
                        ostring,
                    });
                    arcs.push(Arc::new(0, 0, arc.weight, next));
                }
            }
        }

        let source_final = match element.state {
            Some(source) => self.fst.final_weight(source),
            None => W::one(),
        };
        let residual_len =
            self.interner.get(element.istring).len() + self.interner.get(element.ostring).len();
        if !source_final.is_zero() && residual_len > 0 {
            // Drain the residuals through a final-weight arc.
            let ilabel = self.car(element.istring, 0);
            let olabel = self.car(element.ostring, 0);
            let istring = self.cdr(element.istring, 0);
            let ostring = self.cdr(element.ostring, 0);
            let next = self.find_state(Element {
                state: None,
                istring,
                ostring,
            });
            arcs.push(Arc::new(ilabel, olabel, source_final.clone(), next));
        }

        let final_weight = if residual_len == 0 {
            source_final
        } else {
            W::zero()
        };
        ComputedState { final_weight, arcs }
    }

    fn properties(&self) -> FstProperties {
        self.props
    }
}

/// Delayed synchronization view.
pub type SynchronizeFst<W, F> = LazyFst<W, SynchronizeOp<W, F>>;

/// Builds the delayed synchronization view of `fst`.
///
/// Terminates on access only if `fst` has bounded delay; unbounded sources
/// make the construction diverge, which is not detected here.
pub fn synchronize_lazy<W, F>(fst: F, cache: CacheOptions) -> SynchronizeFst<W, F>
where
    W: Semiring,
    F: Fst<W>,
{
    let isymbols = fst.input_symbols().cloned();
    let osymbols = fst.output_symbols().cloned();
    LazyFst::with_symbols(SynchronizeOp::new(Rc::new(fst)), cache, isymbols, osymbols)
}

/// Synchronizes `fst` into a dense store.
///
/// Copies the lazy view state by state; the cache keeps only what the copy
/// needs in flight.
pub fn synchronize<W, F>(fst: &F) -> VectorFst<W>
where
    W: Semiring,
    F: Fst<W> + Clone,
{
    synchronize_lazy(fst.clone(), CacheOptions::default()).expand_all()
}

//! Concatenation.
//!
//! If A transduces `x` to `y` with weight `a` and B transduces `w` to `v`
//! with weight `b`, their concatenation transduces `xw` to `yv` with weight
//! `times(a, b)`. Final states of A are joined to B's start with an
//! epsilon arc carrying the final weight.

use crate::cache::{CacheOptions, ComputedState, LazyFst, LazyFstOp};
use crate::fst::properties::concat_properties;
use crate::fst::{compat_symbols, Arc, ExpandedFst, FstProperties, MutableFst, StateId};
use crate::semiring::Semiring;
use std::rc::Rc;

/// Concatenates `fst2` after `fst1`, modifying `fst1` in place.
///
/// Incompatible symbol tables set the sticky error bit on `fst1`.
pub fn concat<W, M, F>(fst1: &mut M, fst2: &F)
where
    W: Semiring,
    M: MutableFst<W>,
    F: ExpandedFst<W>,
{
    if !compat_symbols(fst1.input_symbols(), fst2.input_symbols())
        || !compat_symbols(fst1.output_symbols(), fst2.output_symbols())
    {
        fst1.set_properties(FstProperties::ERROR, FstProperties::ERROR);
        return;
    }
    let props1 = fst1.properties();
    let props2 = fst2.properties();

    if fst1.start().is_none() {
        if props2.contains(FstProperties::ERROR) {
            fst1.set_properties(FstProperties::ERROR, FstProperties::ERROR);
        }
        return;
    }

    let numstates1 = fst1.num_states();
    fst1.reserve_states(fst2.num_states());
    for s2 in fst2.states() {
        let s1 = fst1.add_state();
        fst1.set_final(s1, fst2.final_weight(s2));
        fst1.reserve_arcs(s1, fst2.num_arcs(s2));
        for mut arc in fst2.arcs(s2) {
            arc.nextstate += numstates1;
            fst1.add_arc(s1, arc);
        }
    }

    let start2 = fst2.start();
    for s1 in 0..numstates1 {
        let final_weight = fst1.final_weight(s1);
        if !final_weight.is_zero() {
            fst1.set_final(s1, W::zero());
            if let Some(start2) = start2 {
                fst1.add_arc(s1, Arc::new(0, 0, final_weight, start2 + numstates1));
            }
        }
    }
    if start2.is_some() {
        fst1.set_properties(concat_properties(props1, props2), FstProperties::TRINARY);
    }
}

/// Concatenates `fst1` before `fst2`, modifying `fst2` in place.
pub fn concat_after<W, F, M>(fst1: &F, fst2: &mut M)
where
    W: Semiring,
    F: ExpandedFst<W>,
    M: MutableFst<W>,
{
    if !compat_symbols(fst1.input_symbols(), fst2.input_symbols())
        || !compat_symbols(fst1.output_symbols(), fst2.output_symbols())
    {
        fst2.set_properties(FstProperties::ERROR, FstProperties::ERROR);
        return;
    }
    let props1 = fst1.properties();
    let props2 = fst2.properties();

    let start2 = match fst2.start() {
        Some(s) => s,
        None => {
            if props1.contains(FstProperties::ERROR) {
                fst2.set_properties(FstProperties::ERROR, FstProperties::ERROR);
            }
            return;
        }
    };

    let numstates2 = fst2.num_states();
    fst2.reserve_states(fst1.num_states());
    for s1 in fst1.states() {
        let s2 = fst2.add_state();
        let final_weight = fst1.final_weight(s1);
        let extra = usize::from(!final_weight.is_zero());
        fst2.reserve_arcs(s2, fst1.num_arcs(s1) + extra);
        if !final_weight.is_zero() {
            fst2.add_arc(s2, Arc::new(0, 0, final_weight, start2));
        }
        for mut arc in fst1.arcs(s1) {
            arc.nextstate += numstates2;
            fst2.add_arc(s2, arc);
        }
    }
    match fst1.start() {
        Some(start1) => {
            fst2.set_start(start1 + numstates2);
            fst2.set_properties(concat_properties(props1, props2), FstProperties::TRINARY);
        }
        None => {
            let isolated = fst2.add_state();
            fst2.set_start(isolated);
        }
    }
}

/// The computation behind the delayed concatenation view.
///
/// States of the first operand keep their ids; states of the second are
/// offset by the first's state count.
pub struct ConcatOp<W, F1, F2>
where
    W: Semiring,
    F1: ExpandedFst<W>,
    F2: ExpandedFst<W>,
{
    fst1: Rc<F1>,
    fst2: Rc<F2>,
    numstates1: usize,
    props: FstProperties,
    error: bool,
    _weight: std::marker::PhantomData<W>,
}

impl<W, F1, F2> ConcatOp<W, F1, F2>
where
    W: Semiring,
    F1: ExpandedFst<W>,
    F2: ExpandedFst<W>,
{
    /// Wraps the two operands, checking symbol compatibility.
    pub fn new(fst1: Rc<F1>, fst2: Rc<F2>) -> Self {
        let error = !compat_symbols(fst1.input_symbols(), fst2.input_symbols())
            || !compat_symbols(fst1.output_symbols(), fst2.output_symbols());
        let mut props = concat_properties(fst1.properties(), fst2.properties());
        if error {
            props.insert(FstProperties::ERROR);
        }
        let numstates1 = fst1.num_states();
        ConcatOp {
            fst1,
            fst2,
            numstates1,
            props,
            error,
            _weight: std::marker::PhantomData,
        }
    }
}

impl<W, F1, F2> LazyFstOp<W> for ConcatOp<W, F1, F2>
where
    W: Semiring,
    F1: ExpandedFst<W>,
    F2: ExpandedFst<W>,
{
    fn compute_start(&mut self) -> Option<StateId> {
        if self.error {
            return None;
        }
        self.fst1.start()
    }

    fn compute_state(&mut self, state: StateId) -> ComputedState<W> {
        if state < self.numstates1 {
            let mut arcs: Vec<Arc<W>> = self.fst1.arcs(state).collect();
            let final1 = self.fst1.final_weight(state);
            if !final1.is_zero() {
                if let Some(start2) = self.fst2.start() {
                    arcs.push(Arc::new(0, 0, final1, self.numstates1 + start2));
                }
            }
            // First-operand states defer finality to the second operand.
            ComputedState {
                final_weight: W::zero(),
                arcs,
            }
        } else {
            let s2 = state - self.numstates1;
            let arcs = self
                .fst2
                .arcs(s2)
                .map(|mut arc| {
                    arc.nextstate += self.numstates1;
                    arc
                })
                .collect();
            ComputedState {
                final_weight: self.fst2.final_weight(s2),
                arcs,
            }
        }
    }

    fn properties(&self) -> FstProperties {
        self.props
    }

    fn error(&self) -> bool {
        self.error
    }
}

/// Delayed concatenation view.
pub type ConcatFst<W, F1, F2> = LazyFst<W, ConcatOp<W, F1, F2>>;

/// Builds the delayed concatenation of `fst1` and `fst2`.
pub fn concat_lazy<W, F1, F2>(fst1: F1, fst2: F2, cache: CacheOptions) -> ConcatFst<W, F1, F2>
where
    W: Semiring,
    F1: ExpandedFst<W>,
    F2: ExpandedFst<W>,
{
    let isymbols = fst1.input_symbols().cloned();
    let osymbols = fst1.output_symbols().cloned();
    LazyFst::with_symbols(
        ConcatOp::new(Rc::new(fst1), Rc::new(fst2)),
        cache,
        isymbols,
        osymbols,
    )
}

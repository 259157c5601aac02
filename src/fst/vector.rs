//! Dense state-indexed mutable transducer.

use super::{
    Arc, ArcsIter, ExpandedFst, Fst, FstProperties, MutableFst, SharedArcs, StateId, SymbolTable,
    EPSILON,
};
use crate::semiring::Semiring;

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
struct VectorState<W: Semiring> {
    final_weight: W,
    #[cfg_attr(feature = "serialization", serde(with = "shared_arcs_serde"))]
    arcs: SharedArcs<W>,
    niepsilons: usize,
    noepsilons: usize,
}

impl<W: Semiring> VectorState<W> {
    fn new() -> Self {
        VectorState {
            final_weight: W::zero(),
            arcs: SharedArcs::new(Vec::new()),
            niepsilons: 0,
            noepsilons: 0,
        }
    }

    fn recount_epsilons(&mut self) {
        self.niepsilons = self.arcs.iter().filter(|a| a.ilabel == EPSILON).count();
        self.noepsilons = self.arcs.iter().filter(|a| a.olabel == EPSILON).count();
    }
}

/// The dense mutable transducer store.
///
/// States are indexed contiguously from 0. Per-state arc vectors are shared
/// copy-on-write: mutation never rewrites a snapshot an iterator already
/// holds.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct VectorFst<W: Semiring> {
    states: Vec<VectorState<W>>,
    start: Option<StateId>,
    properties: FstProperties,
    isymbols: Option<SymbolTable>,
    osymbols: Option<SymbolTable>,
}

impl<W: Semiring> Default for VectorFst<W> {
    fn default() -> Self {
        VectorFst::new()
    }
}

impl<W: Semiring> VectorFst<W> {
    /// Creates an empty transducer (no states, no start).
    pub fn new() -> Self {
        VectorFst {
            states: Vec::new(),
            start: None,
            properties: FstProperties::EXPANDED | FstProperties::MUTABLE,
            isymbols: None,
            osymbols: None,
        }
    }

    /// Copies any [`Fst`] with a dense state table into a `VectorFst`.
    pub fn from_fst<F: ExpandedFst<W>>(fst: &F) -> Self {
        let mut out = VectorFst::new();
        out.reserve_states(fst.num_states());
        for _ in 0..fst.num_states() {
            out.add_state();
        }
        if let Some(s) = fst.start() {
            out.set_start(s);
        }
        for s in fst.states() {
            out.set_final(s, fst.final_weight(s));
            out.reserve_arcs(s, fst.num_arcs(s));
            for arc in fst.arcs(s) {
                out.add_arc(s, arc);
            }
        }
        out.set_properties(
            fst.properties(),
            FstProperties::TRINARY | FstProperties::ERROR,
        );
        out.isymbols = fst.input_symbols().cloned();
        out.osymbols = fst.output_symbols().cloned();
        out
    }

    /// Sorts the arcs of every state by the given key.
    pub fn arc_sort_by<K: Ord>(&mut self, key: impl Fn(&Arc<W>) -> K) {
        for state in &mut self.states {
            let arcs = SharedArcs::make_mut(&mut state.arcs);
            arcs.sort_by_key(&key);
        }
        self.properties.invalidate();
    }

    fn state(&self, s: StateId) -> &VectorState<W> {
        &self.states[s]
    }
}

impl<W: Semiring> Fst<W> for VectorFst<W> {
    fn start(&self) -> Option<StateId> {
        self.start
    }

    fn final_weight(&self, state: StateId) -> W {
        self.state(state).final_weight.clone()
    }

    fn num_arcs(&self, state: StateId) -> usize {
        self.state(state).arcs.len()
    }

    fn arcs(&self, state: StateId) -> ArcsIter<W> {
        ArcsIter::new(SharedArcs::clone(&self.state(state).arcs))
    }

    fn num_input_epsilons(&self, state: StateId) -> usize {
        self.state(state).niepsilons
    }

    fn num_output_epsilons(&self, state: StateId) -> usize {
        self.state(state).noepsilons
    }

    fn properties(&self) -> FstProperties {
        self.properties
    }

    fn input_symbols(&self) -> Option<&SymbolTable> {
        self.isymbols.as_ref()
    }

    fn output_symbols(&self) -> Option<&SymbolTable> {
        self.osymbols.as_ref()
    }
}

impl<W: Semiring> ExpandedFst<W> for VectorFst<W> {
    fn num_states(&self) -> usize {
        self.states.len()
    }
}

impl<W: Semiring> MutableFst<W> for VectorFst<W> {
    fn set_start(&mut self, state: StateId) {
        debug_assert!(state < self.states.len());
        self.start = Some(state);
        self.properties.invalidate();
    }

    fn set_final(&mut self, state: StateId, weight: W) {
        self.states[state].final_weight = weight;
        self.properties.invalidate();
    }

    fn add_state(&mut self) -> StateId {
        self.states.push(VectorState::new());
        self.properties.invalidate();
        self.states.len() - 1
    }

    fn add_arc(&mut self, state: StateId, arc: Arc<W>) {
        debug_assert!(arc.nextstate < self.states.len());
        let st = &mut self.states[state];
        if arc.ilabel == EPSILON {
            st.niepsilons += 1;
        }
        if arc.olabel == EPSILON {
            st.noepsilons += 1;
        }
        SharedArcs::make_mut(&mut st.arcs).push(arc);
        self.properties.invalidate();
    }

    fn delete_arcs(&mut self, state: StateId) {
        let st = &mut self.states[state];
        st.arcs = SharedArcs::new(Vec::new());
        st.niepsilons = 0;
        st.noepsilons = 0;
        self.properties.invalidate();
    }

    fn delete_states(&mut self, states: &[StateId]) {
        if states.is_empty() {
            return;
        }
        let n = self.states.len();
        let mut keep = vec![true; n];
        for &s in states {
            keep[s] = false;
        }
        // New id for each kept state.
        let mut newid = vec![usize::MAX; n];
        let mut next = 0;
        for s in 0..n {
            if keep[s] {
                newid[s] = next;
                next += 1;
            }
        }
        let old = std::mem::take(&mut self.states);
        self.states.reserve(next);
        for (s, mut state) in old.into_iter().enumerate() {
            if !keep[s] {
                continue;
            }
            let arcs = SharedArcs::make_mut(&mut state.arcs);
            arcs.retain(|a| keep[a.nextstate]);
            for arc in arcs.iter_mut() {
                arc.nextstate = newid[arc.nextstate];
            }
            state.recount_epsilons();
            self.states.push(state);
        }
        self.start = self.start.and_then(|s| if keep[s] { Some(newid[s]) } else { None });
        self.properties.invalidate();
    }

    fn delete_all_states(&mut self) {
        self.states.clear();
        self.start = None;
        self.properties.invalidate();
    }

    fn reserve_states(&mut self, additional: usize) {
        self.states.reserve(additional);
    }

    fn reserve_arcs(&mut self, state: StateId, additional: usize) {
        SharedArcs::make_mut(&mut self.states[state].arcs).reserve(additional);
    }

    fn for_each_arc_mut(&mut self, state: StateId, f: &mut dyn FnMut(&mut Arc<W>)) {
        let st = &mut self.states[state];
        let arcs = SharedArcs::make_mut(&mut st.arcs);
        for arc in arcs.iter_mut() {
            f(arc);
        }
        st.recount_epsilons();
        self.properties.invalidate();
    }

    fn set_properties(&mut self, props: FstProperties, mask: FstProperties) {
        self.properties.assign(props, mask);
    }

    fn set_input_symbols(&mut self, symbols: Option<SymbolTable>) {
        self.isymbols = symbols;
    }

    fn set_output_symbols(&mut self, symbols: Option<SymbolTable>) {
        self.osymbols = symbols;
    }
}

#[cfg(feature = "serialization")]
mod shared_arcs_serde {
    //! Serializes the shared arc vector by content, rebuilding a fresh
    //! shared pointer on read.

    use super::{Arc, SharedArcs};
    use crate::semiring::Semiring;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<W, S>(arcs: &SharedArcs<W>, serializer: S) -> Result<S::Ok, S::Error>
    where
        W: Semiring + Serialize,
        S: Serializer,
    {
        arcs.as_slice().serialize(serializer)
    }

    pub fn deserialize<'de, W, D>(deserializer: D) -> Result<SharedArcs<W>, D::Error>
    where
        W: Semiring + Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Ok(SharedArcs::new(Vec::<Arc<W>>::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semiring::TropicalWeight;

    fn weight(v: f32) -> TropicalWeight {
        TropicalWeight::new(v)
    }

    #[test]
    fn build_and_read_back() {
        let mut fst = VectorFst::<TropicalWeight>::new();
        let a = fst.add_state();
        let b = fst.add_state();
        fst.set_start(a);
        fst.add_arc(a, Arc::new(1, 2, weight(0.5), b));
        fst.set_final(b, TropicalWeight::one());

        assert_eq!(fst.start(), Some(a));
        assert_eq!(fst.num_states(), 2);
        assert_eq!(fst.num_arcs(a), 1);
        let arc = fst.arcs(a).next().unwrap();
        assert_eq!((arc.ilabel, arc.olabel, arc.nextstate), (1, 2, b));
        assert!(fst.final_weight(b).is_one());
        assert!(fst.final_weight(a).is_zero());
    }

    #[test]
    fn iterator_snapshot_survives_mutation() {
        let mut fst = VectorFst::<TropicalWeight>::new();
        let a = fst.add_state();
        let b = fst.add_state();
        fst.set_start(a);
        fst.add_arc(a, Arc::new(1, 1, weight(1.0), b));

        let iter = fst.arcs(a);
        fst.add_arc(a, Arc::new(2, 2, weight(2.0), b));
        // The earlier snapshot still sees one arc; a fresh one sees two.
        assert_eq!(iter.len(), 1);
        assert_eq!(fst.arcs(a).len(), 2);
    }

    #[test]
    fn delete_states_renumbers_and_drops_arcs() {
        let mut fst = VectorFst::<TropicalWeight>::new();
        let s0 = fst.add_state();
        let s1 = fst.add_state();
        let s2 = fst.add_state();
        fst.set_start(s0);
        fst.add_arc(s0, Arc::new(1, 1, weight(1.0), s1));
        fst.add_arc(s0, Arc::new(2, 2, weight(2.0), s2));
        fst.add_arc(s1, Arc::new(3, 3, weight(3.0), s2));
        fst.set_final(s2, TropicalWeight::one());

        fst.delete_states(&[s1]);
        assert_eq!(fst.num_states(), 2);
        assert_eq!(fst.start(), Some(0));
        // The arc into the deleted state is gone; s2 is renumbered to 1.
        assert_eq!(fst.num_arcs(0), 1);
        let arc = fst.arcs(0).next().unwrap();
        assert_eq!((arc.ilabel, arc.nextstate), (2, 1));
        assert!(fst.final_weight(1).is_one());
    }

    #[test]
    fn epsilon_counts_track_arcs() {
        let mut fst = VectorFst::<TropicalWeight>::new();
        let a = fst.add_state();
        let b = fst.add_state();
        fst.set_start(a);
        fst.add_arc(a, Arc::new(0, 5, weight(1.0), b));
        fst.add_arc(a, Arc::new(0, 0, weight(1.0), b));
        assert_eq!(fst.num_input_epsilons(a), 2);
        assert_eq!(fst.num_output_epsilons(a), 1);
        fst.delete_arcs(a);
        assert_eq!(fst.num_input_epsilons(a), 0);
    }
}

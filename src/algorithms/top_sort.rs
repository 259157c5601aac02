//! Topological reordering of states.

use super::arc_filter::AnyArcFilter;
use super::visit::{dfs_visit, TopOrderVisitor};
use crate::fst::{Arc, FstProperties, MutableFst, StateId};
use crate::semiring::Semiring;

/// Renumbers states so arcs always lead to higher ids.
///
/// Returns false (leaving the transducer unchanged except for property
/// bits) when the input is cyclic.
pub fn top_sort<W, M>(fst: &mut M) -> bool
where
    W: Semiring,
    M: MutableFst<W>,
{
    let mut visitor = TopOrderVisitor::new();
    dfs_visit(fst, &mut visitor, &AnyArcFilter);
    if !visitor.acyclic {
        fst.set_properties(
            FstProperties::CYCLIC | FstProperties::NOT_TOP_SORTED,
            FstProperties::CYCLIC
                | FstProperties::ACYCLIC
                | FstProperties::TOP_SORTED
                | FstProperties::NOT_TOP_SORTED,
        );
        return false;
    }
    state_sort(fst, &visitor.order);
    fst.set_properties(
        FstProperties::ACYCLIC
            | FstProperties::INITIAL_ACYCLIC
            | FstProperties::TOP_SORTED,
        FstProperties::CYCLIC
            | FstProperties::ACYCLIC
            | FstProperties::INITIAL_CYCLIC
            | FstProperties::INITIAL_ACYCLIC
            | FstProperties::TOP_SORTED
            | FstProperties::NOT_TOP_SORTED,
    );
    true
}

/// Permutes states so state `s` becomes state `order[s]`.
pub fn state_sort<W, M>(fst: &mut M, order: &[usize])
where
    W: Semiring,
    M: MutableFst<W>,
{
    let n = fst.num_states();
    debug_assert_eq!(order.len(), n);
    let start = fst.start();

    let mut finals: Vec<W> = vec![W::zero(); n];
    let mut arcs: Vec<Vec<Arc<W>>> = vec![Vec::new(); n];
    for s in 0..n {
        finals[order[s]] = fst.final_weight(s);
        arcs[order[s]] = fst
            .arcs(s)
            .map(|mut arc| {
                arc.nextstate = order[arc.nextstate];
                arc
            })
            .collect();
    }

    fst.delete_all_states();
    fst.reserve_states(n);
    for _ in 0..n {
        fst.add_state();
    }
    if let Some(start) = start {
        fst.set_start(order[start]);
    }
    for (s, (final_weight, state_arcs)) in finals.into_iter().zip(arcs).enumerate() {
        fst.set_final(s as StateId, final_weight);
        fst.reserve_arcs(s as StateId, state_arcs.len());
        for arc in state_arcs {
            fst.add_arc(s as StateId, arc);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fst::{ExpandedFst, Fst, VectorFst};
    use crate::semiring::{Semiring, TropicalWeight};

    #[test]
    fn orders_arcs_forward() {
        // 2 -> 0 -> 1, start 2, final 1.
        let mut fst = VectorFst::<TropicalWeight>::new();
        for _ in 0..3 {
            fst.add_state();
        }
        fst.set_start(2);
        fst.add_arc(2, Arc::new(1, 1, TropicalWeight::one(), 0));
        fst.add_arc(0, Arc::new(2, 2, TropicalWeight::one(), 1));
        fst.set_final(1, TropicalWeight::one());

        assert!(top_sort(&mut fst));
        assert_eq!(fst.start(), Some(0));
        for s in fst.states() {
            for arc in fst.arcs(s) {
                assert!(arc.nextstate > s);
            }
        }
        assert!(fst.properties().contains(FstProperties::TOP_SORTED));
    }

    #[test]
    fn cyclic_input_is_reported() {
        let mut fst = VectorFst::<TropicalWeight>::new();
        fst.add_state();
        fst.set_start(0);
        fst.add_arc(0, Arc::new(1, 1, TropicalWeight::one(), 0));
        assert!(!top_sort(&mut fst));
        assert!(fst.properties().contains(FstProperties::CYCLIC));
    }
}

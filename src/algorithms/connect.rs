//! Trimming to the accessible, coaccessible part.

use super::arc_filter::AnyArcFilter;
use super::visit::{dfs_visit, SccVisitor};
use crate::fst::{FstProperties, MutableFst, StateId};
use crate::semiring::Semiring;

/// Deletes states that are unreachable from the start or reach no final
/// state. The result is known accessible and coaccessible.
pub fn connect<W, M>(fst: &mut M)
where
    W: Semiring,
    M: MutableFst<W>,
{
    if fst.start().is_none() {
        fst.delete_all_states();
        return;
    }
    let mut visitor = SccVisitor::new(fst);
    dfs_visit(fst, &mut visitor, &AnyArcFilter);
    let dstates: Vec<StateId> = fst
        .states()
        .filter(|&s| !visitor.access[s] || !visitor.coaccess[s])
        .collect();
    fst.delete_states(&dstates);
    fst.set_properties(
        FstProperties::ACCESSIBLE | FstProperties::COACCESSIBLE,
        FstProperties::ACCESSIBLE
            | FstProperties::NOT_ACCESSIBLE
            | FstProperties::COACCESSIBLE
            | FstProperties::NOT_COACCESSIBLE,
    );
}

//! Operations on transducers.
//!
//! Eager operations work on a [`MutableFst`](crate::fst::MutableFst) in
//! place; delayed ones return cache-backed views (see [`crate::cache`]).

pub mod arc_filter;
pub mod concat;
pub mod connect;
pub mod interval_set;
pub mod isomorphic;
pub mod label_reachable;
pub mod prune;
pub mod queue;
pub mod rm_epsilon;
pub mod shortest_distance;
pub mod state_reachable;
pub mod synchronize;
pub mod top_sort;
pub mod visit;

use crate::fst::{ExpandedFst, FstProperties};
use crate::semiring::Semiring;
use self::arc_filter::AnyArcFilter;
use self::visit::{dfs_visit, SccVisitor};

/// Structurally audits a transducer and returns its actual property bits,
/// every tri-state claim decided.
///
/// Used to verify that operations only claim properties that hold; eager
/// code paths prefer the cheap closure rules in
/// [`crate::fst::properties`].
pub fn compute_properties<W, F>(fst: &F) -> FstProperties
where
    W: Semiring,
    F: ExpandedFst<W>,
{
    let mut props = FstProperties::empty();
    let n = fst.num_states();

    let mut acceptor = true;
    let mut ideterministic = true;
    let mut odeterministic = true;
    let mut epsilons = false;
    let mut iepsilons = false;
    let mut oepsilons = false;
    let mut isorted = true;
    let mut osorted = true;
    let mut weighted = false;
    let mut top_sorted = true;

    let mut ilabels = std::collections::HashSet::new();
    let mut olabels = std::collections::HashSet::new();
    for s in fst.states() {
        ilabels.clear();
        olabels.clear();
        let mut prev_ilabel = i64::MIN;
        let mut prev_olabel = i64::MIN;
        for arc in fst.arcs(s) {
            if arc.ilabel != arc.olabel {
                acceptor = false;
            }
            if arc.is_epsilon() {
                epsilons = true;
            }
            if arc.ilabel == 0 {
                iepsilons = true;
            }
            if arc.olabel == 0 {
                oepsilons = true;
            }
            if !ilabels.insert(arc.ilabel) {
                ideterministic = false;
            }
            if !olabels.insert(arc.olabel) {
                odeterministic = false;
            }
            if arc.ilabel < prev_ilabel {
                isorted = false;
            }
            if arc.olabel < prev_olabel {
                osorted = false;
            }
            prev_ilabel = arc.ilabel;
            prev_olabel = arc.olabel;
            if !arc.weight.is_one() && !arc.weight.is_zero() {
                weighted = true;
            }
            if arc.nextstate <= s {
                top_sorted = false;
            }
        }
        let final_weight = fst.final_weight(s);
        if !final_weight.is_one() && !final_weight.is_zero() {
            weighted = true;
        }
    }

    let mut scc = SccVisitor::new(fst);
    dfs_visit(fst, &mut scc, &AnyArcFilter);
    let accessible = scc.access.iter().all(|&a| a);
    let coaccessible = scc.coaccess.iter().all(|&c| c);

    props.insert(pick(acceptor, FstProperties::ACCEPTOR, FstProperties::NOT_ACCEPTOR));
    props.insert(pick(
        ideterministic,
        FstProperties::I_DETERMINISTIC,
        FstProperties::NOT_I_DETERMINISTIC,
    ));
    props.insert(pick(
        odeterministic,
        FstProperties::O_DETERMINISTIC,
        FstProperties::NOT_O_DETERMINISTIC,
    ));
    props.insert(pick(epsilons, FstProperties::EPSILONS, FstProperties::NO_EPSILONS));
    props.insert(pick(iepsilons, FstProperties::I_EPSILONS, FstProperties::NO_I_EPSILONS));
    props.insert(pick(oepsilons, FstProperties::O_EPSILONS, FstProperties::NO_O_EPSILONS));
    props.insert(pick(
        isorted,
        FstProperties::I_LABEL_SORTED,
        FstProperties::NOT_I_LABEL_SORTED,
    ));
    props.insert(pick(
        osorted,
        FstProperties::O_LABEL_SORTED,
        FstProperties::NOT_O_LABEL_SORTED,
    ));
    props.insert(pick(weighted, FstProperties::WEIGHTED, FstProperties::UNWEIGHTED));
    props.insert(pick(scc.cyclic, FstProperties::CYCLIC, FstProperties::ACYCLIC));
    props.insert(pick(
        scc.start_cyclic,
        FstProperties::INITIAL_CYCLIC,
        FstProperties::INITIAL_ACYCLIC,
    ));
    props.insert(pick(
        top_sorted && !scc.cyclic,
        FstProperties::TOP_SORTED,
        FstProperties::NOT_TOP_SORTED,
    ));
    props.insert(pick(
        n == 0 || accessible,
        FstProperties::ACCESSIBLE,
        FstProperties::NOT_ACCESSIBLE,
    ));
    props.insert(pick(
        n == 0 || coaccessible,
        FstProperties::COACCESSIBLE,
        FstProperties::NOT_COACCESSIBLE,
    ));
    props
}

fn pick(condition: bool, yes: FstProperties, no: FstProperties) -> FstProperties {
    if condition {
        yes
    } else {
        no
    }
}

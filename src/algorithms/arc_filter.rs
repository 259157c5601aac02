//! Arc filters restricting traversals to a subset of arcs.

use crate::fst::Arc;
use crate::semiring::Semiring;

/// Selects a subset of arcs for a traversal or shortest-distance run.
pub trait ArcFilter<W: Semiring> {
    /// True if the arc participates.
    fn keep(&self, arc: &Arc<W>) -> bool;
}

/// Keeps every arc.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyArcFilter;

impl<W: Semiring> ArcFilter<W> for AnyArcFilter {
    #[inline]
    fn keep(&self, _arc: &Arc<W>) -> bool {
        true
    }
}

/// Keeps arcs whose input and output labels are both epsilon.
#[derive(Debug, Clone, Copy, Default)]
pub struct EpsilonArcFilter;

impl<W: Semiring> ArcFilter<W> for EpsilonArcFilter {
    #[inline]
    fn keep(&self, arc: &Arc<W>) -> bool {
        arc.is_epsilon()
    }
}

/// Keeps arcs whose input label is epsilon.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputEpsilonArcFilter;

impl<W: Semiring> ArcFilter<W> for InputEpsilonArcFilter {
    #[inline]
    fn keep(&self, arc: &Arc<W>) -> bool {
        arc.ilabel == 0
    }
}

/// Keeps arcs whose output label is epsilon.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputEpsilonArcFilter;

impl<W: Semiring> ArcFilter<W> for OutputEpsilonArcFilter {
    #[inline]
    fn keep(&self, arc: &Arc<W>) -> bool {
        arc.olabel == 0
    }
}

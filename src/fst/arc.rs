//! The arc record.

use super::{Label, StateId};
use crate::semiring::Semiring;

/// A directed, labelled, weighted transition.
///
/// An arc with both labels equal to [`EPSILON`](super::EPSILON) is an
/// epsilon arc: it consumes and emits nothing.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct Arc<W: Semiring> {
    /// Input label; `0` is epsilon.
    pub ilabel: Label,
    /// Output label; `0` is epsilon.
    pub olabel: Label,
    /// Arc weight.
    pub weight: W,
    /// Destination state.
    pub nextstate: StateId,
}

impl<W: Semiring> Arc<W> {
    /// Creates a new arc.
    pub fn new(ilabel: Label, olabel: Label, weight: W, nextstate: StateId) -> Self {
        Arc {
            ilabel,
            olabel,
            weight,
            nextstate,
        }
    }

    /// True if both labels are epsilon.
    #[inline]
    pub fn is_epsilon(&self) -> bool {
        self.ilabel == 0 && self.olabel == 0
    }
}

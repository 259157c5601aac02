//! # libwfst
//!
//! Weighted finite-state transducer (WFST) algorithms over generic semirings.
//!
//! A transducer maps input label sequences to output label sequences with
//! weights drawn from a [`Semiring`](semiring::Semiring). This crate provides
//! the data model (arcs, property bits, dense and delayed transducers) and
//! the classic constructions on top of it: epsilon removal, delay
//! synchronization, concatenation, connection, pruning, isomorphism testing,
//! and a label-reachability index for composition filtering.
//!
//! ## Example
//!
//! ```rust,ignore
//! use libwfst::prelude::*;
//!
//! let mut fst = VectorFst::<TropicalWeight>::new();
//! let a = fst.add_state();
//! let b = fst.add_state();
//! fst.set_start(a);
//! fst.add_arc(a, Arc::new(1, 1, TropicalWeight::new(0.5), b));
//! fst.set_final(b, TropicalWeight::one());
//!
//! rm_epsilon(&mut fst, &RmEpsilonConfig::default());
//! ```
//!
//! Delayed (lazily materialised) views share the same read interface but
//! expand states on first access through a per-state cache; see the
//! [`cache`] module.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algorithms;
pub mod cache;
pub mod fst;
pub mod semiring;

#[cfg(feature = "serialization")]
pub mod archive;
#[cfg(feature = "serialization")]
pub mod serialization;

/// Common imports for convenient usage
pub mod prelude {
    pub use crate::algorithms::compute_properties;
    pub use crate::algorithms::concat::{concat, concat_after, concat_lazy, ConcatFst};
    pub use crate::algorithms::connect::connect;
    pub use crate::algorithms::isomorphic::{isomorphic, IsomorphicError};
    pub use crate::algorithms::label_reachable::LabelReachable;
    pub use crate::algorithms::prune::prune;
    pub use crate::algorithms::rm_epsilon::{
        rm_epsilon, rm_epsilon_lazy, RmEpsilonConfig, RmEpsilonFst,
    };
    pub use crate::algorithms::shortest_distance::shortest_distance;
    pub use crate::algorithms::synchronize::{synchronize, synchronize_lazy, SynchronizeFst};
    pub use crate::algorithms::top_sort::top_sort;
    pub use crate::cache::{CacheOptions, LazyFst};
    pub use crate::fst::{
        Arc, ExpandedFst, Fst, FstProperties, Label, MutableFst, StateId, SymbolTable, VectorFst,
        EPSILON, NO_LABEL,
    };
    pub use crate::semiring::{
        BooleanWeight, LogWeight, ProbabilityWeight, Semiring, TropicalWeight,
    };

    #[cfg(feature = "serialization")]
    pub use crate::archive::{ArchiveReader, ArchiveType, ArchiveWriter};
    #[cfg(feature = "serialization")]
    pub use crate::serialization::{BincodeSerializer, FstSerializer, JsonSerializer};
}

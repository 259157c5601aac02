//! Transducer property bits.
//!
//! Properties are a 64-bit set with tri-state semantics: for each structural
//! claim there is a known-true bit and a known-false bit; neither set means
//! the property is unknown. [`ERROR`](FstProperties::ERROR) is a sticky
//! always-truthful bit — once set it survives every operation.
//!
//! Operations declare closure rules (e.g. [`concat_properties`]) that derive
//! the known bits of their output from the known bits of their inputs.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign, Not};

/// A 64-bit transducer property set.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct FstProperties(pub u64);

impl FstProperties {
    /// The state table is fully materialised.
    pub const EXPANDED: FstProperties = FstProperties(1 << 0);
    /// The transducer supports mutation.
    pub const MUTABLE: FstProperties = FstProperties(1 << 1);
    /// Sticky error bit; a transducer carrying it is meaningless.
    pub const ERROR: FstProperties = FstProperties(1 << 2);

    /// Every arc has equal input and output labels.
    pub const ACCEPTOR: FstProperties = FstProperties(1 << 3);
    /// Some arc has differing input and output labels.
    pub const NOT_ACCEPTOR: FstProperties = FstProperties(1 << 4);
    /// No state has two outgoing arcs with the same input label.
    pub const I_DETERMINISTIC: FstProperties = FstProperties(1 << 5);
    /// Some state has two outgoing arcs with the same input label.
    pub const NOT_I_DETERMINISTIC: FstProperties = FstProperties(1 << 6);
    /// No state has two outgoing arcs with the same output label.
    pub const O_DETERMINISTIC: FstProperties = FstProperties(1 << 7);
    /// Some state has two outgoing arcs with the same output label.
    pub const NOT_O_DETERMINISTIC: FstProperties = FstProperties(1 << 8);
    /// Some arc is an epsilon arc (both labels 0).
    pub const EPSILONS: FstProperties = FstProperties(1 << 9);
    /// No arc is an epsilon arc.
    pub const NO_EPSILONS: FstProperties = FstProperties(1 << 10);
    /// Some arc has input label 0.
    pub const I_EPSILONS: FstProperties = FstProperties(1 << 11);
    /// No arc has input label 0.
    pub const NO_I_EPSILONS: FstProperties = FstProperties(1 << 12);
    /// Some arc has output label 0.
    pub const O_EPSILONS: FstProperties = FstProperties(1 << 13);
    /// No arc has output label 0.
    pub const NO_O_EPSILONS: FstProperties = FstProperties(1 << 14);
    /// Arcs at every state are sorted by input label.
    pub const I_LABEL_SORTED: FstProperties = FstProperties(1 << 15);
    /// Arcs at some state are not sorted by input label.
    pub const NOT_I_LABEL_SORTED: FstProperties = FstProperties(1 << 16);
    /// Arcs at every state are sorted by output label.
    pub const O_LABEL_SORTED: FstProperties = FstProperties(1 << 17);
    /// Arcs at some state are not sorted by output label.
    pub const NOT_O_LABEL_SORTED: FstProperties = FstProperties(1 << 18);
    /// Some arc or final weight differs from One (or Zero).
    pub const WEIGHTED: FstProperties = FstProperties(1 << 19);
    /// All arc and final weights are One (or Zero).
    pub const UNWEIGHTED: FstProperties = FstProperties(1 << 20);
    /// The transducer contains a cycle.
    pub const CYCLIC: FstProperties = FstProperties(1 << 21);
    /// The transducer contains no cycle.
    pub const ACYCLIC: FstProperties = FstProperties(1 << 22);
    /// Some cycle passes through the start state.
    pub const INITIAL_CYCLIC: FstProperties = FstProperties(1 << 23);
    /// No cycle passes through the start state.
    pub const INITIAL_ACYCLIC: FstProperties = FstProperties(1 << 24);
    /// State ids are in topological order.
    pub const TOP_SORTED: FstProperties = FstProperties(1 << 25);
    /// State ids are not in topological order.
    pub const NOT_TOP_SORTED: FstProperties = FstProperties(1 << 26);
    /// Every state is reachable from the start.
    pub const ACCESSIBLE: FstProperties = FstProperties(1 << 27);
    /// Some state is unreachable from the start.
    pub const NOT_ACCESSIBLE: FstProperties = FstProperties(1 << 28);
    /// Every state reaches a final state.
    pub const COACCESSIBLE: FstProperties = FstProperties(1 << 29);
    /// Some state reaches no final state.
    pub const NOT_COACCESSIBLE: FstProperties = FstProperties(1 << 30);

    /// All tri-state bits (everything except EXPANDED/MUTABLE/ERROR).
    pub const TRINARY: FstProperties = FstProperties((1u64 << 31) - 8);
    /// All property bits.
    pub const ALL: FstProperties = FstProperties((1u64 << 31) - 1);

    /// The empty set: everything unknown.
    pub const fn empty() -> Self {
        FstProperties(0)
    }

    /// True if every bit of `bits` is present.
    #[inline]
    pub fn contains(self, bits: FstProperties) -> bool {
        self.0 & bits.0 == bits.0
    }

    /// True if any bit of `bits` is present.
    #[inline]
    pub fn intersects(self, bits: FstProperties) -> bool {
        self.0 & bits.0 != 0
    }

    /// Adds bits to the set.
    #[inline]
    pub fn insert(&mut self, bits: FstProperties) {
        self.0 |= bits.0;
    }

    /// Removes bits from the set.
    #[inline]
    pub fn remove(&mut self, bits: FstProperties) {
        self.0 &= !bits.0;
    }

    /// Replaces the bits selected by `mask` with those of `props`,
    /// preserving the sticky error bit.
    pub fn assign(&mut self, props: FstProperties, mask: FstProperties) {
        let error = self.0 & Self::ERROR.0;
        self.0 = (self.0 & !mask.0) | (props.0 & mask.0) | error;
    }

    /// Drops every tri-state claim, keeping EXPANDED/MUTABLE/ERROR.
    ///
    /// Mutations call this: a changed transducer no longer knows its
    /// structure.
    pub fn invalidate(&mut self) {
        self.0 &= !Self::TRINARY.0;
    }
}

impl BitOr for FstProperties {
    type Output = FstProperties;
    fn bitor(self, rhs: Self) -> Self {
        FstProperties(self.0 | rhs.0)
    }
}

impl BitOrAssign for FstProperties {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for FstProperties {
    type Output = FstProperties;
    fn bitand(self, rhs: Self) -> Self {
        FstProperties(self.0 & rhs.0)
    }
}

impl Not for FstProperties {
    type Output = FstProperties;
    fn not(self) -> Self {
        FstProperties(!self.0)
    }
}

impl fmt::Debug for FstProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FstProperties({:#x})", self.0)
    }
}

/// Property closure for concatenation.
///
/// The error bit of either operand survives. Acceptor-ness, acyclicity and
/// unweightedness hold for the result when known for both operands. The
/// joining epsilon arcs make the epsilon claims of the result unknown unless
/// the caller re-establishes them.
pub fn concat_properties(p1: FstProperties, p2: FstProperties) -> FstProperties {
    let mut out = (p1 | p2) & FstProperties::ERROR;
    out |= p1
        & p2
        & (FstProperties::ACCEPTOR | FstProperties::ACYCLIC | FstProperties::UNWEIGHTED);
    out |= (p1 | p2) & (FstProperties::CYCLIC | FstProperties::NOT_ACCEPTOR);
    out
}

/// Property closure for epsilon removal.
///
/// The result carries no epsilon (both-sides) arcs. For acceptors every
/// one-sided epsilon is an epsilon arc, so the one-sided claims clear too.
/// Determinism survives only when the input already had no input (output)
/// epsilons, since the closure rewrite cannot then merge label sets.
pub fn rm_epsilon_properties(p: FstProperties) -> FstProperties {
    let mut out = p & FstProperties::ERROR;
    out |= FstProperties::NO_EPSILONS;
    out |= p
        & (FstProperties::ACCEPTOR
            | FstProperties::NOT_ACCEPTOR
            | FstProperties::ACYCLIC
            | FstProperties::INITIAL_ACYCLIC);
    if p.contains(FstProperties::ACCEPTOR) {
        out |= FstProperties::NO_I_EPSILONS | FstProperties::NO_O_EPSILONS;
    }
    if p.contains(FstProperties::I_DETERMINISTIC | FstProperties::NO_I_EPSILONS) {
        out |= FstProperties::I_DETERMINISTIC;
    }
    if p.contains(FstProperties::O_DETERMINISTIC | FstProperties::NO_O_EPSILONS) {
        out |= FstProperties::O_DETERMINISTIC;
    }
    out
}

/// Property closure for synchronization.
pub fn synchronize_properties(p: FstProperties) -> FstProperties {
    let mut out = p & FstProperties::ERROR;
    out |= p
        & (FstProperties::ACCEPTOR
            | FstProperties::ACYCLIC
            | FstProperties::UNWEIGHTED
            | FstProperties::WEIGHTED);
    out
}

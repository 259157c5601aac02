//! Weight algebras for transducer arcs.
//!
//! A [`Semiring`] supplies the two operations used everywhere in this crate:
//! `plus` combines the weights of alternative paths and `times` combines the
//! weights along a path. `zero` is the additive identity (and annihilates
//! under `times`); `one` is the multiplicative identity. Floating-point
//! semirings additionally support approximate comparison, quantization, and
//! a hash consistent with quantized equality, which the isomorphism check
//! relies on.

mod boolean;
mod log;
mod probability;
mod tropical;

pub use boolean::BooleanWeight;
pub use log::LogWeight;
pub use probability::ProbabilityWeight;
pub use tropical::TropicalWeight;

use std::fmt::Debug;

/// Default comparison/quantization delta for floating-point weights.
pub const DEFAULT_DELTA: f32 = 1.0 / 1024.0;

/// A semiring of arc weights.
///
/// Implementations must satisfy the usual laws: `plus` is associative and
/// commutative with identity `zero`; `times` is associative with identity
/// `one`, distributes over `plus`, and is annihilated by `zero`. `times` may
/// be non-commutative ([`COMMUTATIVE`](Semiring::COMMUTATIVE) is false then).
pub trait Semiring: Clone + Debug + PartialEq + 'static {
    /// True if `plus(w, w) == w` for all weights.
    const IDEMPOTENT: bool;

    /// True if `plus(w1, w2)` always equals `w1` or `w2` (the semiring has
    /// the path property). Required by the shortest-first queue discipline.
    const PATH: bool;

    /// True if `times` is commutative.
    const COMMUTATIVE: bool;

    /// Name of the arc type carrying this weight, as recorded in headers and
    /// archives. Readable iff it matches on deserialisation.
    const TYPE_NAME: &'static str;

    /// The additive identity.
    fn zero() -> Self;

    /// The multiplicative identity.
    fn one() -> Self;

    /// Path alternation: combines weights of parallel paths.
    fn plus(&self, rhs: &Self) -> Self;

    /// Path extension: combines weights along a path.
    fn times(&self, rhs: &Self) -> Self;

    /// Right division: `divide(times(a, b), b) == a` where defined.
    ///
    /// Returns `None` when the semiring does not support division or the
    /// divisor is `zero`.
    fn divide(&self, rhs: &Self) -> Option<Self>;

    /// Approximate equality within `delta`, for floating-point semirings.
    fn approx_eq(&self, rhs: &Self, delta: f32) -> bool;

    /// Rounds the weight onto a `delta`-spaced grid.
    ///
    /// Two weights that quantize equal must hash equal under
    /// [`hash_weight`](Semiring::hash_weight).
    fn quantize(&self, delta: f32) -> Self;

    /// Hash consistent with equality of quantized weights.
    fn hash_weight(&self) -> u64;

    /// Natural order induced by `plus`: `a < b` iff `plus(a, b) == a` and
    /// `a != b`. Only meaningful for idempotent semirings.
    fn natural_less(&self, rhs: &Self) -> bool {
        self.plus(rhs) == *self && self != rhs
    }

    /// True if this weight is the additive identity.
    fn is_zero(&self) -> bool {
        *self == Self::zero()
    }

    /// True if this weight is the multiplicative identity.
    fn is_one(&self) -> bool {
        *self == Self::one()
    }
}

/// Quantizes a raw float onto a `delta`-spaced grid.
///
/// Infinities are fixed points so that `zero` weights survive quantization
/// in semirings that encode them as infinity.
pub(crate) fn quantize_f32(value: f32, delta: f32) -> f32 {
    if value.is_infinite() {
        value
    } else {
        (value / delta + 0.5).floor() * delta
    }
}

/// Hash of a float through its bit pattern, with `-0.0` folded onto `0.0`.
pub(crate) fn hash_f32(value: f32) -> u64 {
    let canonical = if value == 0.0 { 0.0f32 } else { value };
    u64::from(canonical.to_bits())
}

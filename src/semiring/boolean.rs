//! Boolean semiring: `(∨, ∧)`.

use super::Semiring;

/// Boolean weight: `plus` is logical or, `times` is logical and.
///
/// The semiring of unweighted acceptance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct BooleanWeight(bool);

impl BooleanWeight {
    /// Creates a weight from a bool.
    pub fn new(value: bool) -> Self {
        BooleanWeight(value)
    }

    /// The raw value.
    pub fn value(self) -> bool {
        self.0
    }
}

impl Semiring for BooleanWeight {
    const IDEMPOTENT: bool = true;
    const PATH: bool = true;
    const COMMUTATIVE: bool = true;
    const TYPE_NAME: &'static str = "boolean";

    fn zero() -> Self {
        BooleanWeight(false)
    }

    fn one() -> Self {
        BooleanWeight(true)
    }

    fn plus(&self, rhs: &Self) -> Self {
        BooleanWeight(self.0 || rhs.0)
    }

    fn times(&self, rhs: &Self) -> Self {
        BooleanWeight(self.0 && rhs.0)
    }

    fn divide(&self, rhs: &Self) -> Option<Self> {
        if rhs.0 {
            Some(*self)
        } else {
            None
        }
    }

    fn approx_eq(&self, rhs: &Self, _delta: f32) -> bool {
        self == rhs
    }

    fn quantize(&self, _delta: f32) -> Self {
        *self
    }

    fn hash_weight(&self) -> u64 {
        u64::from(self.0)
    }
}

//! Probability (real) semiring: `(+, ×)` over non-negative reals.

use super::{hash_f32, quantize_f32, Semiring};

/// Probability weight: `plus` adds, `times` multiplies.
///
/// `zero` is `0.0`, `one` is `1.0`. Not idempotent; used where path weights
/// are genuine probabilities or counts.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct ProbabilityWeight(f32);

impl ProbabilityWeight {
    /// Creates a weight from its raw value.
    pub fn new(value: f32) -> Self {
        ProbabilityWeight(value)
    }

    /// The raw value.
    pub fn value(self) -> f32 {
        self.0
    }
}

impl Semiring for ProbabilityWeight {
    const IDEMPOTENT: bool = false;
    const PATH: bool = false;
    const COMMUTATIVE: bool = true;
    const TYPE_NAME: &'static str = "probability";

    fn zero() -> Self {
        ProbabilityWeight(0.0)
    }

    fn one() -> Self {
        ProbabilityWeight(1.0)
    }

    fn plus(&self, rhs: &Self) -> Self {
        ProbabilityWeight(self.0 + rhs.0)
    }

    fn times(&self, rhs: &Self) -> Self {
        ProbabilityWeight(self.0 * rhs.0)
    }

    fn divide(&self, rhs: &Self) -> Option<Self> {
        if rhs.0 == 0.0 {
            None
        } else {
            Some(ProbabilityWeight(self.0 / rhs.0))
        }
    }

    fn approx_eq(&self, rhs: &Self, delta: f32) -> bool {
        (self.0 - rhs.0).abs() <= delta
    }

    fn quantize(&self, delta: f32) -> Self {
        ProbabilityWeight(quantize_f32(self.0, delta))
    }

    fn hash_weight(&self) -> u64 {
        hash_f32(self.0)
    }
}

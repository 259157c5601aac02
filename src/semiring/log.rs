//! Log semiring: `(-log(e^-x + e^-y), +)` over reals with infinity.

use super::{hash_f32, quantize_f32, Semiring};

/// Log weight: negated log probabilities.
///
/// `plus` is `-log(e^-x + e^-y)`, `times` adds. `zero` is positive infinity,
/// `one` is `0.0`. Unlike the tropical semiring this is not idempotent:
/// summing alternative paths accumulates probability mass.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct LogWeight(f32);

impl LogWeight {
    /// Creates a weight from its raw value.
    pub fn new(value: f32) -> Self {
        LogWeight(value)
    }

    /// The raw value.
    pub fn value(self) -> f32 {
        self.0
    }
}

/// `-log(e^-x + 1)` for `x >= 0`, computed in f64 to limit rounding error.
fn log_plus(x: f32) -> f32 {
    -(f64::from(-x).exp().ln_1p()) as f32
}

impl Semiring for LogWeight {
    const IDEMPOTENT: bool = false;
    const PATH: bool = false;
    const COMMUTATIVE: bool = true;
    const TYPE_NAME: &'static str = "log";

    fn zero() -> Self {
        LogWeight(f32::INFINITY)
    }

    fn one() -> Self {
        LogWeight(0.0)
    }

    fn plus(&self, rhs: &Self) -> Self {
        if self.0.is_infinite() {
            *rhs
        } else if rhs.0.is_infinite() {
            *self
        } else if self.0 <= rhs.0 {
            LogWeight(self.0 + log_plus(rhs.0 - self.0))
        } else {
            LogWeight(rhs.0 + log_plus(self.0 - rhs.0))
        }
    }

    fn times(&self, rhs: &Self) -> Self {
        if self.0.is_infinite() || rhs.0.is_infinite() {
            Self::zero()
        } else {
            LogWeight(self.0 + rhs.0)
        }
    }

    fn divide(&self, rhs: &Self) -> Option<Self> {
        if rhs.0.is_infinite() {
            None
        } else if self.0.is_infinite() {
            Some(Self::zero())
        } else {
            Some(LogWeight(self.0 - rhs.0))
        }
    }

    fn approx_eq(&self, rhs: &Self, delta: f32) -> bool {
        if self.0.is_infinite() || rhs.0.is_infinite() {
            self.0 == rhs.0
        } else {
            (self.0 - rhs.0).abs() <= delta
        }
    }

    fn quantize(&self, delta: f32) -> Self {
        LogWeight(quantize_f32(self.0, delta))
    }

    fn hash_weight(&self) -> u64 {
        hash_f32(self.0)
    }
}

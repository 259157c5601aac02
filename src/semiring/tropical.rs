//! Tropical semiring: `(min, +)` over non-negative reals with infinity.

use super::{hash_f32, quantize_f32, Semiring};

/// Tropical weight: `plus` takes the minimum, `times` adds.
///
/// `zero` is positive infinity, `one` is `0.0`. This is the semiring of
/// shortest paths and the usual choice for speech and text lattices.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct TropicalWeight(f32);

impl TropicalWeight {
    /// Creates a weight from its raw value.
    pub fn new(value: f32) -> Self {
        TropicalWeight(value)
    }

    /// The raw value.
    pub fn value(self) -> f32 {
        self.0
    }
}

impl Semiring for TropicalWeight {
    const IDEMPOTENT: bool = true;
    const PATH: bool = true;
    const COMMUTATIVE: bool = true;
    const TYPE_NAME: &'static str = "tropical";

    fn zero() -> Self {
        TropicalWeight(f32::INFINITY)
    }

    fn one() -> Self {
        TropicalWeight(0.0)
    }

    fn plus(&self, rhs: &Self) -> Self {
        if self.0 <= rhs.0 {
            *self
        } else {
            *rhs
        }
    }

    fn times(&self, rhs: &Self) -> Self {
        if self.0.is_infinite() || rhs.0.is_infinite() {
            Self::zero()
        } else {
            TropicalWeight(self.0 + rhs.0)
        }
    }

    fn divide(&self, rhs: &Self) -> Option<Self> {
        if rhs.0.is_infinite() {
            None
        } else if self.0.is_infinite() {
            Some(Self::zero())
        } else {
            Some(TropicalWeight(self.0 - rhs.0))
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
        TropicalWeight(quantize_f32(self.0, delta))
    }

    fn hash_weight(&self) -> u64 {
        hash_f32(self.0)
    }

    fn natural_less(&self, rhs: &Self) -> bool {
        self.0 < rhs.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_annihilates_times() {
        let w = TropicalWeight::new(3.0);
        assert_eq!(w.times(&TropicalWeight::zero()), TropicalWeight::zero());
        assert_eq!(TropicalWeight::zero().times(&w), TropicalWeight::zero());
    }

    #[test]
    fn plus_is_min() {
        let a = TropicalWeight::new(1.5);
        let b = TropicalWeight::new(0.5);
        assert_eq!(a.plus(&b), b);
    }

    #[test]
    fn divide_inverts_times() {
        let a = TropicalWeight::new(1.25);
        let b = TropicalWeight::new(0.75);
        let product = a.times(&b);
        assert_eq!(product.divide(&b), Some(a));
    }
}

//! Voting weight amounts.
//!
//! Weights are fixed-point integers (u128 raw units) to avoid floating-point
//! errors when summing the stake delegated to representatives.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Representative voting weight, in raw units.
///
/// [`Amount::MIN`] doubles as the "no weight" sentinel: a vote carrying it
/// comes from a key that is not a representative.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Amount(u128);

impl Amount {
    pub const MIN: Self = Self(0);
    pub const MAX: Self = Self(u128::MAX);

    pub const fn new(raw: u128) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Scale by a fraction expressed in basis points (1/10_000).
    pub fn mul_bps(self, bps: u128) -> Self {
        Self(self.0 / 10_000 * bps + self.0 % 10_000 * bps / 10_000)
    }
}

// Weight sums saturate: a tally pinned at MAX still compares correctly
// against any confirmation threshold.
impl Add for Amount {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        self.saturating_add(rhs)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        *self = self.saturating_add(rhs);
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::MIN, |acc, a| acc + a)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} raw", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sum_saturates_instead_of_overflowing() {
        let total: Amount = [Amount::MAX, Amount::new(1)].iter().sum();
        assert_eq!(total, Amount::MAX);
    }

    #[test]
    fn mul_bps_takes_fraction() {
        assert_eq!(Amount::new(1000).mul_bps(6700), Amount::new(670));
        assert_eq!(Amount::new(3).mul_bps(5000), Amount::new(1));
        assert_eq!(Amount::MAX.mul_bps(10_000), Amount::MAX);
    }

    #[test]
    fn min_is_zero() {
        assert!(Amount::MIN.is_zero());
        assert_eq!(Amount::default(), Amount::MIN);
    }
}

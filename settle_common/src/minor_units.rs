use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

//--------------------------------------     MinorUnits      ---------------------------------------------------------
/// An amount of money in the smallest unit of the settlement currency (e.g. kobo, cents).
///
/// Balances, order totals and gateway amounts are always carried in minor units. Floating point only ever appears
/// in commission *rates*, and is collapsed back to an integer by [`MinorUnits::apply_rate`].
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct MinorUnits(i64);

op!(binary MinorUnits, Add, add);
op!(binary MinorUnits, Sub, sub);
op!(inplace MinorUnits, AddAssign, add_assign);
op!(inplace MinorUnits, SubAssign, sub_assign);
op!(unary MinorUnits, Neg, neg);

impl Mul<i64> for MinorUnits {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for MinorUnits {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl<'a> Sum<&'a MinorUnits> for MinorUnits {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in minor units: {0}")]
pub struct MinorUnitsConversionError(String);

impl From<i64> for MinorUnits {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for MinorUnits {
    type Error = MinorUnitsConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        i64::try_from(value)
            .map(Self)
            .map_err(|_| MinorUnitsConversionError(format!("{value} is too large to convert to MinorUnits")))
    }
}

impl Display for MinorUnits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl MinorUnits {
    pub const ZERO: MinorUnits = MinorUnits(0);

    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Applies a fractional rate (e.g. a 10% commission is `0.1`) and rounds half away from zero to the nearest minor
    /// unit. This is the only place a rate touches an amount, so rounding happens exactly once per credit.
    pub fn apply_rate(&self, rate: f64) -> Result<MinorUnits, MinorUnitsConversionError> {
        if !rate.is_finite() || rate < 0.0 {
            return Err(MinorUnitsConversionError(format!("{rate} is not a valid rate")));
        }
        let scaled = (self.0 as f64 * rate).round();
        if scaled.abs() >= i64::MAX as f64 {
            return Err(MinorUnitsConversionError(format!("{self} x {rate} overflows")));
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(Self(scaled as i64))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn commission_rounding() {
        let total = MinorUnits::from(5000);
        assert_eq!(total.apply_rate(0.1).unwrap(), MinorUnits::from(500));
        assert_eq!(total.apply_rate(0.05).unwrap(), MinorUnits::from(250));
        assert_eq!(MinorUnits::from(1999).apply_rate(0.05).unwrap(), MinorUnits::from(100));
        assert_eq!(MinorUnits::from(1_001).apply_rate(0.1).unwrap(), MinorUnits::from(100));
        assert_eq!(MinorUnits::from(3).apply_rate(0.1).unwrap(), MinorUnits::ZERO);
        assert!(total.apply_rate(-0.1).is_err());
        assert!(total.apply_rate(f64::NAN).is_err());
    }

    #[test]
    fn arithmetic_and_display() {
        let mut a = MinorUnits::from(1000);
        a -= MinorUnits::from(400);
        assert_eq!(a, MinorUnits::from(600));
        a += MinorUnits::from(5);
        assert_eq!(a.to_string(), "6.05");
        assert_eq!((-a).to_string(), "-6.05");
        let total: MinorUnits = [MinorUnits::from(1), MinorUnits::from(2)].iter().sum();
        assert_eq!(total, MinorUnits::from(3));
        assert!(MinorUnits::try_from(u64::MAX).is_err());
    }

    #[test]
    fn serializes_as_plain_integer() {
        let json = serde_json::to_string(&MinorUnits::from(250)).unwrap();
        assert_eq!(json, "250");
        let v: MinorUnits = serde_json::from_str("4200").unwrap();
        assert_eq!(v.value(), 4200);
    }
}

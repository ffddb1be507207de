use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

/// Number of stored units in one whole point. Amounts carry two decimal places.
pub const HUNDREDTHS_PER_POINT: i64 = 100;

//--------------------------------------       Points        ---------------------------------------------------------
/// A loyalty points amount, stored as an integer count of hundredths of a point so that sums are exact.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Points(i64);

op!(binary Points, Add, add);
op!(binary Points, Sub, sub);
op!(inplace Points, AddAssign, add_assign);
op!(inplace Points, SubAssign, sub_assign);
op!(unary Points, Neg, neg);

impl Sum for Points {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in points: {0}")]
pub struct PointsConversionError(String);

impl PartialEq for Points {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Points {}

impl TryFrom<f64> for Points {
    type Error = PointsConversionError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::from_f64(value)
    }
}

impl Display for Points {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = abs / HUNDREDTHS_PER_POINT as u64;
        let frac = abs % HUNDREDTHS_PER_POINT as u64;
        write!(f, "{sign}{whole}.{frac:02}")
    }
}

impl Points {
    pub fn from_hundredths(value: i64) -> Self {
        Self(value)
    }

    pub fn from_points(points: i64) -> Self {
        Self(points * HUNDREDTHS_PER_POINT)
    }

    /// Converts a floating point amount (as sent by the accrual service) into points, rounding half away from zero to
    /// the nearest hundredth.
    pub fn from_f64(value: f64) -> Result<Self, PointsConversionError> {
        if !value.is_finite() {
            return Err(PointsConversionError(format!("{value} is not a finite number")));
        }
        let scaled = (value * HUNDREDTHS_PER_POINT as f64).round();
        if scaled > i64::MAX as f64 || scaled < i64::MIN as f64 {
            return Err(PointsConversionError(format!("{value} is out of range")));
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(Self(scaled as i64))
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / HUNDREDTHS_PER_POINT as f64
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(Points::from_hundredths(3750).to_string(), "37.50");
        assert_eq!(Points::from_hundredths(5).to_string(), "0.05");
        assert_eq!(Points::from_hundredths(-1205).to_string(), "-12.05");
        assert_eq!(Points::default().to_string(), "0.00");
    }

    #[test]
    fn from_float_rounds_to_hundredths() {
        assert_eq!(Points::from_f64(37.5).unwrap(), Points::from_hundredths(3750));
        assert_eq!(Points::from_f64(729.98).unwrap(), Points::from_hundredths(72998));
        assert_eq!(Points::from_f64(0.125).unwrap(), Points::from_hundredths(13));
        assert_eq!(Points::from_f64(-0.125).unwrap(), Points::from_hundredths(-13));
        assert!(Points::from_f64(f64::NAN).is_err());
        assert!(Points::from_f64(f64::INFINITY).is_err());
        assert!(Points::from_f64(1e300).is_err());
    }

    #[test]
    fn arithmetic_is_exact() {
        let total: Points = [0.1, 0.2, 0.3].iter().map(|v| Points::from_f64(*v).unwrap()).sum();
        assert_eq!(total, Points::from_hundredths(60));
        let mut balance = Points::from_points(100);
        balance -= Points::from_f64(99.99).unwrap();
        assert_eq!(balance, Points::from_hundredths(1));
        assert_eq!(-balance, Points::from_hundredths(-1));
        assert!((Points::from_hundredths(3750).as_f64() - 37.5).abs() < f64::EPSILON);
    }
}

//! Fixed-point decimal with 18 fractional digits.
//!
//! Shares, vote weights and voting power are all `Dec`. The value is held as
//! an unbounded integer scaled by 10^18; every multiplication and division
//! truncates toward zero at the 18th digit so results are bit-exact across
//! nodes.

use num_bigint::BigUint;
use num_traits::Zero;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

use crate::{Int, TypesError};

/// Number of fractional digits carried by [`Dec`].
pub const PRECISION: usize = 18;

const SCALE: u64 = 1_000_000_000_000_000_000;

fn scale() -> BigUint {
    BigUint::from(SCALE)
}

/// A non-negative decimal of arbitrary size with 18 digits of precision.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Dec(BigUint);

impl Dec {
    pub fn zero() -> Self {
        Self(BigUint::zero())
    }

    pub fn one() -> Self {
        Self(scale())
    }

    pub fn from_int(v: &Int) -> Self {
        Self(v.as_biguint() * scale())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// True when the value has no fractional part.
    pub fn is_integer(&self) -> bool {
        (&self.0 % scale()).is_zero()
    }

    pub fn checked_sub(&self, other: &Dec) -> Option<Dec> {
        if other.0 > self.0 {
            None
        } else {
            Some(Self(&self.0 - &other.0))
        }
    }

    /// `max(0, self - other)`.
    pub fn saturating_sub(&self, other: &Dec) -> Dec {
        self.checked_sub(other).unwrap_or_default()
    }

    /// `self * other`, truncated at the 18th fractional digit.
    pub fn mul_truncate(&self, other: &Dec) -> Dec {
        Self((&self.0 * &other.0) / scale())
    }

    pub fn mul_int(&self, other: &Int) -> Dec {
        Self(&self.0 * other.as_biguint())
    }

    /// `self / other`, truncated at the 18th fractional digit. `None` on a
    /// zero divisor.
    pub fn quo_truncate(&self, other: &Dec) -> Option<Dec> {
        if other.is_zero() {
            return None;
        }
        Some(Self((&self.0 * scale()) / &other.0))
    }

    /// `floor(self * numerator / denominator)` computed exactly, with no
    /// intermediate rounding. `None` on a zero denominator.
    ///
    /// This is the share → token projection: `shares * bonded / total_shares`.
    pub fn mul_int_quo_floor(&self, numerator: &Int, denominator: &Dec) -> Option<Int> {
        if denominator.is_zero() {
            return None;
        }
        // Both `self` and `denominator` carry the same scale, so it cancels.
        Some(Int::from_biguint(
            (&self.0 * numerator.as_biguint()) / &denominator.0,
        ))
    }

    /// Drop the fractional part.
    pub fn truncate_int(&self) -> Int {
        Int::from_biguint(&self.0 / scale())
    }
}

impl From<u64> for Dec {
    fn from(v: u64) -> Self {
        Self(BigUint::from(v) * scale())
    }
}

impl From<u128> for Dec {
    fn from(v: u128) -> Self {
        Self(BigUint::from(v) * scale())
    }
}

impl Add for Dec {
    type Output = Dec;
    fn add(self, rhs: Dec) -> Dec {
        Dec(self.0 + rhs.0)
    }
}

impl<'a> Add<&'a Dec> for &'a Dec {
    type Output = Dec;
    fn add(self, rhs: &'a Dec) -> Dec {
        Dec(&self.0 + &rhs.0)
    }
}

impl AddAssign<&Dec> for Dec {
    fn add_assign(&mut self, rhs: &Dec) {
        self.0 += &rhs.0;
    }
}

impl FromStr for Dec {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TypesError::InvalidDecimal(s.to_string());
        let trimmed = s.trim();
        let (int_part, frac_part) = match trimmed.split_once('.') {
            Some((i, f)) => (i, f),
            None => (trimmed, ""),
        };
        if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if trimmed.contains('.') && frac_part.is_empty() {
            return Err(invalid());
        }
        if !frac_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if frac_part.len() > PRECISION {
            return Err(TypesError::DecimalPrecision(s.to_string()));
        }

        let int = BigUint::parse_bytes(int_part.as_bytes(), 10).ok_or_else(invalid)?;
        let padded = format!("{:0<width$}", frac_part, width = PRECISION);
        let frac = BigUint::parse_bytes(padded.as_bytes(), 10).ok_or_else(invalid)?;
        Ok(Self(int * scale() + frac))
    }
}

impl fmt::Display for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let int = &self.0 / scale();
        let frac = &self.0 % scale();
        if frac.is_zero() {
            return write!(f, "{int}");
        }
        let digits = format!("{:0>width$}", frac.to_string(), width = PRECISION);
        write!(f, "{int}.{}", digits.trim_end_matches('0'))
    }
}

impl Serialize for Dec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Dec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

//! # Decimal
//!
//! Fixed-point amounts with 18 fractional digits, stored as a signed count
//! of "attos" (10^-18 units). This is the ledger's amount type; floats are
//! not welcome anywhere near it.
//!
//! Parsing accepts more than 18 fractional digits and rounds half-up (away
//! from zero on ties), so `"0.0000000000000000005"` becomes one atto.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::DECIMAL_SCALE;

const ONE_IN_ATTOS: i128 = 10i128.pow(DECIMAL_SCALE);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecimalError {
    #[error("invalid decimal '{0}'")]
    Invalid(String),

    #[error("decimal overflow")]
    Overflow,
}

/// An 18-decimal fixed-point number.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Decimal(i128);

impl Decimal {
    pub const ZERO: Decimal = Decimal(0);
    pub const ONE: Decimal = Decimal(ONE_IN_ATTOS);

    /// Build from a raw atto count.
    pub const fn from_attos(attos: i128) -> Self {
        Decimal(attos)
    }

    pub const fn attos(self) -> i128 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, other: Decimal) -> Option<Decimal> {
        self.0.checked_add(other.0).map(Decimal)
    }

    pub fn checked_sub(self, other: Decimal) -> Option<Decimal> {
        self.0.checked_sub(other.0).map(Decimal)
    }

    /// Sum an iterator of amounts, failing on overflow.
    pub fn checked_sum<I: IntoIterator<Item = Decimal>>(iter: I) -> Result<Decimal, DecimalError> {
        iter.into_iter()
            .try_fold(Decimal::ZERO, |acc, d| acc.checked_add(d))
            .ok_or(DecimalError::Overflow)
    }
}

impl From<u64> for Decimal {
    fn from(units: u64) -> Self {
        // u64::MAX * 10^18 fits comfortably in i128.
        Decimal(i128::from(units) * ONE_IN_ATTOS)
    }
}

impl FromStr for Decimal {
    type Err = DecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DecimalError::Invalid(s.to_string());
        let trimmed = s.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let scale = DECIMAL_SCALE as usize;
        let mut attos: i128 = 0;
        for b in int_part.bytes() {
            attos = attos
                .checked_mul(10)
                .and_then(|v| v.checked_add(i128::from(b - b'0')))
                .ok_or(DecimalError::Overflow)?;
        }
        attos = attos
            .checked_mul(ONE_IN_ATTOS)
            .ok_or(DecimalError::Overflow)?;

        let kept = &frac_part[..frac_part.len().min(scale)];
        let mut frac: i128 = 0;
        for b in kept.bytes() {
            frac = frac * 10 + i128::from(b - b'0');
        }
        frac *= 10i128.pow((scale - kept.len()) as u32);

        // Half-up on the first dropped digit.
        if let Some(next) = frac_part.as_bytes().get(scale) {
            if *next >= b'5' {
                frac += 1;
            }
        }

        attos = attos.checked_add(frac).ok_or(DecimalError::Overflow)?;
        Ok(Decimal(if negative { -attos } else { attos }))
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let one = ONE_IN_ATTOS as u128;
        let int_part = abs / one;
        let frac_part = abs % one;
        if frac_part == 0 {
            return write!(f, "{sign}{int_part}");
        }
        let frac = format!("{:0width$}", frac_part, width = DECIMAL_SCALE as usize);
        write!(f, "{sign}{int_part}.{}", frac.trim_end_matches('0'))
    }
}

impl fmt::Debug for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Decimal({self})")
    }
}

impl Serialize for Decimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.collect_str(self)
        } else {
            serializer.serialize_i128(self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Decimal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(D::Error::custom)
        } else {
            i128::deserialize(deserializer).map(Decimal)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn parse_and_display() {
        assert_eq!(dec("10").to_string(), "10");
        assert_eq!(dec("2.5").to_string(), "2.5");
        assert_eq!(dec("-0.75").to_string(), "-0.75");
        assert_eq!(dec(".5").to_string(), "0.5");
        assert_eq!(dec("3.").to_string(), "3");
        assert_eq!(dec("0.000000000000000001").attos(), 1);
    }

    #[test]
    fn from_u64_matches_parse() {
        assert_eq!(Decimal::from(10u64), dec("10"));
        assert_eq!(Decimal::from(1u64), Decimal::ONE);
    }

    #[test]
    fn rounds_half_up_past_scale() {
        assert_eq!(dec("0.0000000000000000005").attos(), 1);
        assert_eq!(dec("0.0000000000000000004").attos(), 0);
        assert_eq!(dec("1.9999999999999999999").to_string(), "2");
        assert_eq!(dec("-0.0000000000000000005").attos(), -1);
    }

    #[test]
    fn rejects_garbage() {
        for bad in ["", "-", ".", "1.2.3", "abc", "1e5", "+1", "1 000"] {
            assert!(bad.parse::<Decimal>().is_err(), "{bad:?} parsed");
        }
    }

    #[test]
    fn overflow_detected() {
        let huge = "9".repeat(40);
        assert_eq!(huge.parse::<Decimal>(), Err(DecimalError::Overflow));
        let max = Decimal::from_attos(i128::MAX);
        assert!(max.checked_add(Decimal::ONE).is_none());
        assert_eq!(
            Decimal::checked_sum([max, Decimal::ONE]),
            Err(DecimalError::Overflow)
        );
    }

    #[test]
    fn checked_sum_adds() {
        let total = Decimal::checked_sum([dec("1.5"), dec("2.25"), dec("0.25")]).unwrap();
        assert_eq!(total, dec("4"));
    }

    #[test]
    fn serde_json_uses_strings() {
        let json = serde_json::to_string(&dec("12.345")).unwrap();
        assert_eq!(json, "\"12.345\"");
        assert_eq!(serde_json::from_str::<Decimal>(&json).unwrap(), dec("12.345"));
    }

    #[test]
    fn bincode_uses_raw_attos() {
        let bytes = bincode::serialize(&dec("1")).unwrap();
        assert_eq!(bytes.len(), 16);
        assert_eq!(bincode::deserialize::<Decimal>(&bytes).unwrap(), dec("1"));
    }
}

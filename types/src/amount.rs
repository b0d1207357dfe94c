//! Amount types for contributed funds and governance tokens.
//!
//! Amounts are represented as fixed-point integers (u128) to avoid floating-point errors.
//! The smallest unit is 1 raw; one whole unit is [`UNIT`] raw (18 decimals).

use crate::error::DaoError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of decimal places in one whole unit.
pub const DECIMALS: u32 = 18;

/// Raw units in one whole unit (10^18).
pub const UNIT: u128 = 1_000_000_000_000_000_000;

/// Funds contributed to the treasury (the payable currency).
///
/// Internally stored as raw units (u128) for precision.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct FundAmount(u128);

impl FundAmount {
    pub const ZERO: Self = Self(0);

    pub fn new(raw: u128) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Parse a decimal string of whole units, e.g. `"0.5"` → 5·10^17 raw.
    pub fn parse(s: &str) -> Result<Self, DaoError> {
        parse_units(s, DECIMALS).map(Self)
    }
}

impl fmt::Display for FundAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_units(self.0, DECIMALS))
    }
}

/// Governance token balance, minted from contributions.
///
/// Internally stored as raw units (u128) for precision.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TokenAmount(u128);

impl TokenAmount {
    pub const ZERO: Self = Self(0);

    pub fn new(raw: u128) -> Self {
        Self(raw)
    }

    /// `whole` tokens, or `None` if that overflows the raw representation.
    pub fn from_whole(whole: u128) -> Option<Self> {
        whole.checked_mul(UNIT).map(Self)
    }

    pub fn raw(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Whole tokens held, rounded down.
    pub fn whole_units(&self) -> u128 {
        self.0 / UNIT
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Parse a decimal string of whole tokens.
    pub fn parse(s: &str) -> Result<Self, DaoError> {
        parse_units(s, DECIMALS).map(Self)
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_units(self.0, DECIMALS))
    }
}

/// Parse a non-negative decimal string into raw units with `decimals` places.
///
/// Accepts `"2"`, `"2.3"`, `".5"`; rejects signs, exponents, empty input,
/// more fractional digits than `decimals`, and values that overflow `u128`.
pub fn parse_units(s: &str, decimals: u32) -> Result<u128, DaoError> {
    let s = s.trim();
    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(DaoError::InvalidAmount(format!("{s:?} has no digits")));
    }
    if !whole.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(DaoError::InvalidAmount(format!("{s:?} is not a decimal number")));
    }
    if frac.len() > decimals as usize {
        return Err(DaoError::InvalidAmount(format!(
            "{s:?} has more than {decimals} fractional digits"
        )));
    }
    let scale = 10u128.checked_pow(decimals).ok_or(DaoError::Overflow)?;
    let whole_raw = if whole.is_empty() {
        0
    } else {
        whole.parse::<u128>().map_err(|_| DaoError::Overflow)?
    };
    let frac_raw = if frac.is_empty() {
        0
    } else {
        let padded = format!("{frac:0<width$}", width = decimals as usize);
        padded.parse::<u128>().map_err(|_| DaoError::Overflow)?
    };
    whole_raw
        .checked_mul(scale)
        .and_then(|w| w.checked_add(frac_raw))
        .ok_or(DaoError::Overflow)
}

/// Format raw units as a decimal string, always keeping one fractional digit
/// (`1.0`, `0.5`, `2.25`).
pub fn format_units(raw: u128, decimals: u32) -> String {
    let scale = 10u128.pow(decimals);
    let whole = raw / scale;
    let frac = raw % scale;
    if frac == 0 {
        return format!("{whole}.0");
    }
    let digits = format!("{frac:0>width$}", width = decimals as usize);
    format!("{whole}.{}", digits.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_half_unit() {
        assert_eq!(FundAmount::parse("0.5").unwrap().raw(), UNIT / 2);
        assert_eq!(FundAmount::parse(".5").unwrap().raw(), UNIT / 2);
    }

    #[test]
    fn parse_whole_and_fraction() {
        assert_eq!(parse_units("2.3", 18).unwrap(), 2_300_000_000_000_000_000);
        assert_eq!(parse_units("7", 18).unwrap(), 7 * UNIT);
    }

    #[test]
    fn parse_rejects_garbage() {
        for bad in ["", ".", "-1", "1e18", "abc", "1.2.3"] {
            assert!(parse_units(bad, 18).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn parse_rejects_excess_precision() {
        let s = format!("0.{}", "1".repeat(19));
        assert!(matches!(parse_units(&s, 18), Err(DaoError::InvalidAmount(_))));
    }

    #[test]
    fn parse_detects_overflow() {
        let s = "1".repeat(40);
        assert_eq!(parse_units(&s, 18), Err(DaoError::Overflow));
    }

    #[test]
    fn format_keeps_one_fractional_digit() {
        assert_eq!(format_units(UNIT, 18), "1.0");
        assert_eq!(format_units(UNIT / 2, 18), "0.5");
        assert_eq!(format_units(2 * UNIT + UNIT / 4, 18), "2.25");
        assert_eq!(format_units(0, 18), "0.0");
    }

    #[test]
    fn whole_units_rounds_down() {
        let t = TokenAmount::new(UNIT * 3 - 1);
        assert_eq!(t.whole_units(), 2);
        assert_eq!(TokenAmount::from_whole(3).unwrap().whole_units(), 3);
    }

    #[test]
    fn checked_add_reports_overflow() {
        let max = TokenAmount::new(u128::MAX);
        assert_eq!(max.checked_add(TokenAmount::new(1)), None);
        assert_eq!(
            FundAmount::new(u128::MAX).checked_add(FundAmount::new(1)),
            None
        );
        assert_eq!(
            TokenAmount::new(UNIT).checked_add(TokenAmount::new(UNIT)),
            TokenAmount::from_whole(2)
        );
    }

    #[test]
    fn from_whole_overflow_is_none() {
        assert!(TokenAmount::from_whole(u128::MAX).is_none());
    }
}

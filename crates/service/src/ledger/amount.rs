use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::LedgerError;
use crate::errors::ServiceError;

/// Minor units per displayed unit.
pub const MINOR_UNITS: i64 = 100;

/// A non-negative quantity of money in minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);
    pub const MAX: Amount = Amount(i64::MAX);

    pub fn from_minor(minor: i64) -> Option<Self> {
        (minor >= 0).then_some(Self(minor))
    }

    pub fn from_units(units: i64) -> Option<Self> {
        units.checked_mul(MINOR_UNITS).and_then(Self::from_minor)
    }

    pub fn minor(self) -> i64 { self.0 }

    /// Truncated toward zero; what callers see as `balance=`.
    pub fn whole_units(self) -> i64 { self.0 / MINOR_UNITS }

    pub fn is_zero(self) -> bool { self.0 == 0 }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    /// `None` when the result would be negative.
    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).and_then(Amount::from_minor)
    }

    /// Parse user input such as `"100"`, `"12.5"`, `" 0.01 "` or `"1e3"`.
    ///
    /// # Examples
    /// ```
    /// use service::ledger::Amount;
    /// assert_eq!(Amount::parse("12.5").unwrap().minor(), 1250);
    /// assert_eq!(Amount::parse("1e3").unwrap().whole_units(), 1000);
    /// assert!(Amount::parse("0.001").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, ServiceError> {
        let s = raw.trim();
        if s.is_empty() {
            return Err(ServiceError::validation("must specify amount"));
        }
        let value = match Decimal::from_str(s).or_else(|_| Decimal::from_scientific(s)) {
            Ok(v) => v,
            Err(_) => return Err(classify_unrepresentable(s)),
        };
        if value.is_sign_negative() && !value.is_zero() {
            return Err(LedgerError::InvalidAmount.into());
        }
        if fraction_digits(s) > 2 {
            return Err(LedgerError::InvalidAmount.into());
        }
        let minor = value
            .checked_mul(Decimal::from(MINOR_UNITS))
            .and_then(|m| m.trunc().to_i64())
            .ok_or(LedgerError::AmountTooLarge)?;
        // "-0" parses as a negative zero
        Ok(Self(minor.max(0)))
    }
}

/// Significant fractional digits written in `s`, after applying any exponent.
/// Counted on the text: a decimal silently rounds past 28 places.
fn fraction_digits(s: &str) -> i64 {
    let (mantissa, exponent) = match s.find(|c: char| c == 'e' || c == 'E') {
        Some(i) => (&s[..i], s[i + 1..].parse::<i64>().unwrap_or(0)),
        None => (s, 0),
    };
    let fraction = mantissa.split_once('.').map_or("", |(_, f)| f);
    let written = fraction.trim_end_matches('0').len() as i64;
    written.saturating_sub(exponent).max(0)
}

/// Input a decimal cannot hold: decide between "not a number", "not a valid
/// amount" and "too big" using a float reading of it.
fn classify_unrepresentable(s: &str) -> ServiceError {
    match s.parse::<f64>() {
        Ok(f) if !f.is_finite() || f < 0.0 => LedgerError::InvalidAmount.into(),
        Ok(f) if f.abs() >= 1.0 => LedgerError::AmountTooLarge.into(),
        Ok(_) => LedgerError::InvalidAmount.into(),
        Err(_) => ServiceError::validation("amount must be numeric"),
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cents = self.0 % MINOR_UNITS;
        if cents == 0 {
            write!(f, "{}", self.whole_units())
        } else {
            write!(f, "{}.{:02}", self.whole_units(), cents)
        }
    }
}

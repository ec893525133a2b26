use std::{
    fmt,
    ops::{Add, Neg, Sub},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Signed money amount stored as **integer cents**.
///
/// Amounts and balances are persisted as a fixed-precision decimal with two
/// fraction digits and at most sixteen digits overall, so the magnitude is
/// bounded by [`Money::MAX_CENTS`].
///
/// The sign carries meaning for operations:
/// - positive = credit
/// - negative = debit
///
/// # Examples
///
/// ```rust
/// use engine::Money;
///
/// let amount: Money = "-12,5".parse().unwrap();
/// assert_eq!(amount.cents(), -1250);
/// assert_eq!(amount.to_string(), "-12.50");
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);
    /// 99 999 999 999 999.99
    pub const MAX_CENTS: i64 = 9_999_999_999_999_999;

    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    /// Builds an amount, rejecting values outside the storable precision.
    pub fn checked(cents: i64) -> Result<Self, EngineError> {
        if cents.unsigned_abs() > Self::MAX_CENTS as u64 {
            return Err(EngineError::InvalidAmount(format!(
                "{} exceeds 16 digits",
                Money(cents)
            )));
        }
        Ok(Self(cents))
    }

    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Addition that fails instead of leaving the storable range.
    pub fn checked_add(self, rhs: Money) -> Result<Money, EngineError> {
        let sum = self
            .0
            .checked_add(rhs.0)
            .ok_or_else(|| EngineError::InvalidAmount("amount too large".to_string()))?;
        Money::checked(sum)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Money> for i64 {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Self::Output {
        Money(-self.0)
    }
}

impl FromStr for Money {
    type Err = EngineError;

    /// Parses user input such as `12`, `-3.5` or `+1,25`.
    ///
    /// `.` and `,` are both accepted as decimal separator; more than two
    /// fractional digits or more than sixteen digits overall are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidAmount(format!("invalid amount: {s:?}"));

        let trimmed = s.trim();
        let (negative, digits) = match trimmed.as_bytes().first() {
            Some(b'-') => (true, &trimmed[1..]),
            Some(b'+') => (false, &trimmed[1..]),
            Some(_) => (false, trimmed),
            None => return Err(EngineError::InvalidAmount("empty amount".to_string())),
        };

        let (units, fraction) = match digits.split_once(['.', ',']) {
            Some((units, fraction)) => (units, fraction),
            None => (digits, ""),
        };
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if units.is_empty() || !all_digits(units) || !all_digits(fraction) {
            return Err(invalid());
        }
        if fraction.len() > 2 {
            return Err(EngineError::InvalidAmount("too many decimals".to_string()));
        }
        if units.trim_start_matches('0').len() > 14 {
            return Err(EngineError::InvalidAmount(format!("{s} exceeds 16 digits")));
        }

        let units: i64 = units.parse().map_err(|_| invalid())?;
        let fraction: i64 = format!("{fraction:0<2}").parse().map_err(|_| invalid())?;
        let cents = units * 100 + fraction;
        Money::checked(if negative { -cents } else { cents })
    }
}

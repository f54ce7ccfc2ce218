//! Monetary amounts with exact decimal arithmetic.
//!
//! Amounts are kept as [Decimal] values with two fractional digits so that
//! summing many transactions never drifts by a cent. They are stored in the
//! database as integer cents and serialized as strings, e.g. `"12.50"`.
//!
//! JSON input is read from the raw text of the value, so a JSON number such as
//! `1234567890123456.78` is parsed straight into a decimal and never passes
//! through `f64`.

use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Sub},
    str::FromStr,
};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef},
};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::value::RawValue;

use crate::Error;

/// The number of fractional digits kept for every amount.
const SCALE: u32 = 2;

/// An exact monetary value with two fractional digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    /// An amount of zero.
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    /// Create an amount from a decimal value.
    ///
    /// # Errors
    ///
    /// Returns [Error::Validation] if `value` has more than two fractional
    /// digits or is too large to be stored as a whole number of cents.
    pub fn new(value: Decimal) -> Result<Self, Error> {
        if value.normalize().scale() > SCALE {
            return Err(Error::Validation(format!(
                "amount {value} has more than {SCALE} decimal places"
            )));
        }

        let mut rescaled = value;
        rescaled.rescale(SCALE);
        let amount = Self(rescaled);

        match amount.cents() {
            Some(_) => Ok(amount),
            None => Err(Error::Validation(format!("amount {value} is too large"))),
        }
    }

    /// Create an amount from a whole number of cents.
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, SCALE))
    }

    /// The amount as a whole number of cents, or `None` if it does not fit in
    /// an `i64`.
    pub fn cents(&self) -> Option<i64> {
        self.0.checked_mul(Decimal::ONE_HUNDRED)?.trunc().to_i64()
    }

    /// The underlying decimal value.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Parse an amount from a raw JSON value, either a number or a string.
    ///
    /// # Errors
    ///
    /// Returns [Error::Validation] if `raw` is neither a number nor a string,
    /// or if its text is not a valid amount.
    pub fn from_json(raw: &RawValue) -> Result<Self, Error> {
        let text = raw.get().trim();

        if text.starts_with('"') {
            let text: String = serde_json::from_str(text)
                .map_err(|error| Error::Validation(format!("invalid amount {text}: {error}")))?;
            return Self::from_str(&text);
        }

        if text.starts_with(|c: char| c == '-' || c.is_ascii_digit()) {
            return Self::from_str(text);
        }

        Err(Error::Validation(format!("amount must be a number, got {text}")))
    }

    /// Whether the amount is strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Amount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str_exact(s.trim())
            .map_err(|error| Error::Validation(format!("invalid amount \"{s}\": {error}")))?;

        Self::new(value)
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = <Box<RawValue>>::deserialize(deserializer)?;
        Amount::from_json(&raw).map_err(serde::de::Error::custom)
    }
}

impl ToSql for Amount {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let cents = self.cents().ok_or_else(|| {
            rusqlite::Error::ToSqlConversionFailure(
                format!("amount {self} does not fit in a 64 bit integer").into(),
            )
        })?;

        Ok(ToSqlOutput::from(cents))
    }
}

impl FromSql for Amount {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_i64().map(Amount::from_cents)
    }
}

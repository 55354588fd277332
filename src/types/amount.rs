use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Non-negative FBC quantity held as exact decimal, at most [`Amount::MAX`].
///
/// The ceiling keeps any realistic ledger sum far inside `Decimal`'s range, so
/// balance arithmetic never overflows.
///
/// Serialized as decimal text (`"75"`, `"10.00"`); JSON numbers are accepted on
/// input for blobs written by hand.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    /// One quadrillion FBC.
    pub const MAX: Amount = Amount(dec!(1000000000000000));

    pub fn new(value: Decimal) -> Result<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(Error::Validation(format!("amount must not be negative: {value}")));
        }
        if value > Self::MAX.0 {
            return Err(Error::Validation(format!(
                "amount {value} exceeds the maximum of {}",
                Self::MAX
            )));
        }
        Ok(Amount(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// `self * rate`, rounded half away from zero to `dp` places and padded to
    /// exactly `dp` places.
    pub fn scaled(&self, rate: Decimal, dp: u32) -> Amount {
        Amount(round_fixed(self.0 * rate, dp))
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = Error;

    fn try_from(value: Decimal) -> Result<Self> {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(value: Amount) -> Self {
        value.0
    }
}

impl FromStr for Amount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let value = Decimal::from_str_exact(trimmed)
            .map_err(|e| Error::Validation(format!("invalid amount {trimmed:?}: {e}")))?;
        Amount::new(value)
    }
}

impl Add for Amount {
    type Output = Amount;
    fn add(self, other: Amount) -> Amount {
        Amount(self.0 + other.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        iter.fold(Amount::ZERO, Add::add)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rounds half away from zero and forces exactly `dp` fractional digits.
pub fn round_fixed(value: Decimal, dp: u32) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(dp);
    rounded
}

/// Display form with a fixed number of fractional digits, e.g. `"110"` or `"10.00"`.
pub fn format_fixed(value: Decimal, dp: u32) -> String {
    round_fixed(value, dp).to_string()
}

use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const CURRENCY_CODE: &str = "NGN";
pub const KOBO_PER_NAIRA: i64 = 100;

//--------------------------------------       Kobo        ---------------------------------------------------------
/// An amount of money in kobo, the minor unit of the store currency. Catalog prices, fees, balances and ledger
/// entries are all carried in this type. Ledger amounts may be negative; everything else is non-negative.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Kobo(i64);

op!(binary Kobo, Add, add);
op!(binary Kobo, Sub, sub);
op!(inplace Kobo, AddAssign, add_assign);
op!(inplace Kobo, SubAssign, sub_assign);
op!(unary Kobo, Neg, neg);

impl Sum for Kobo {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in kobo: {0}")]
pub struct KoboConversionError(String);

impl From<i64> for Kobo {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for Kobo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let kobo_per_naira = KOBO_PER_NAIRA.unsigned_abs();
        write!(f, "{sign}₦{}.{:02}", abs / kobo_per_naira, abs % kobo_per_naira)
    }
}

impl Kobo {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub const fn from_naira(naira: i64) -> Self {
        Self(naira * KOBO_PER_NAIRA)
    }

    /// `self × quantity`, or `None` if the product does not fit in an `i64`.
    pub fn checked_mul(self, quantity: i64) -> Option<Self> {
        self.0.checked_mul(quantity).map(Self)
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Rounds a fractional kobo amount (e.g. the output of a rate calculation) to the nearest whole kobo, i.e. to 2
    /// decimal places of the major unit. Halves round away from zero.
    pub fn from_fractional(kobo: f64) -> Result<Self, KoboConversionError> {
        let rounded = kobo.round();
        if !rounded.is_finite() || rounded.abs() > i64::MAX as f64 {
            return Err(KoboConversionError(format!("{kobo} is not a finite amount")));
        }
        #[allow(clippy::cast_possible_truncation)]
        let value = rounded as i64;
        Ok(Self(value))
    }

    /// Takes `percent`% of this amount and rounds the result to whole naira (half away from zero).
    pub fn percentage_in_whole_naira(&self, percent: f64) -> Result<Self, KoboConversionError> {
        let naira = self.0 as f64 * percent / 100.0 / KOBO_PER_NAIRA as f64;
        let whole = Self::from_fractional(naira)?;
        Ok(Self(whole.0 * KOBO_PER_NAIRA))
    }
}

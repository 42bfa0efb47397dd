use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::str::FromStr;

use crate::calendar::to_persian_digits;

/// Money type in whole toman units
///
/// the fund keeps no sub-unit precision; every construction and arithmetic
/// op rounds to zero decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// create from decimal, rounding to whole units
    pub fn from_decimal(d: Decimal) -> Self {
        Money(d.round_dp(0))
    }

    /// create from an integer toman amount
    pub fn from_major(amount: i64) -> Self {
        Money(Decimal::from(amount))
    }

    /// get underlying decimal
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// check if zero
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// check if strictly positive
    pub fn is_positive(&self) -> bool {
        !self.0.is_zero() && self.0.is_sign_positive()
    }

    /// check if negative
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// minimum of two values
    pub fn min(self, other: Self) -> Self {
        Money(self.0.min(other.0))
    }

    /// maximum of two values
    pub fn max(self, other: Self) -> Self {
        Money(self.0.max(other.0))
    }

    /// subtract, clamping the result at zero
    pub fn saturating_sub(self, other: Self) -> Self {
        (self - other).max(Money::ZERO)
    }

    /// fixed monthly cell: floor(self / parts); a term below one is raised to one
    pub fn div_floor(self, parts: u32) -> Self {
        let parts = Decimal::from(parts.max(1));
        Money((self.0 / parts).floor())
    }

    /// digits with persian thousands grouping, e.g. ۱٬۲۰۰٬۰۰۰
    pub fn format_plain(&self) -> String {
        let raw = self.0.abs().to_string();
        let mut grouped = String::new();
        for (i, c) in raw.chars().rev().enumerate() {
            if i > 0 && i % 3 == 0 {
                grouped.push('٬');
            }
            grouped.push(c);
        }
        let ltr: String = grouped.chars().rev().collect();
        let signed = if self.is_negative() {
            format!("-{ltr}")
        } else {
            ltr
        };
        to_persian_digits(&signed)
    }

    /// display form with the currency suffix, e.g. ۱٬۲۰۰٬۰۰۰ تومان
    pub fn format_toman(&self) -> String {
        format!("{} تومان", self.format_plain())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Money(Decimal::from_str(s)?.round_dp(0)))
    }
}

impl From<Decimal> for Money {
    fn from(d: Decimal) -> Self {
        Money::from_decimal(d)
    }
}

impl From<i64> for Money {
    fn from(i: i64) -> Self {
        Money::from_major(i)
    }
}

impl From<u32> for Money {
    fn from(i: u32) -> Self {
        Money::from_major(i as i64)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, other: Money) -> Money {
        Money((self.0 + other.0).round_dp(0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Money) {
        self.0 = (self.0 + other.0).round_dp(0);
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, other: Money) -> Money {
        Money((self.0 - other.0).round_dp(0))
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, other: Money) {
        self.0 = (self.0 - other.0).round_dp(0);
    }
}

//! Fixed-point money arithmetic.
//!
//! Every value is held as a [`Decimal`] rounded to two fractional digits with
//! midpoint-away-from-zero rounding. Arithmetic re-rounds its result so long
//! chains of additions and subtractions never drift.

use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use rust_decimal::{prelude::FromPrimitive, Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::{BudgetError, Result};

const SCALE: u32 = 2;

/// Largest whole amount accepted from user input: one trillion.
pub const MAX_UNITS: i64 = 1_000_000_000_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Wraps a raw decimal, rounding it to two places.
    pub fn new(value: Decimal) -> Self {
        Self(normalize(value))
    }

    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, SCALE))
    }

    pub fn from_units(units: i64) -> Self {
        Self::new(Decimal::from(units))
    }

    /// Lossy conversion for values that arrive as binary floats (legacy snapshots).
    pub fn from_f64(value: f64) -> Option<Self> {
        Decimal::from_f64(value).map(Self::new)
    }

    /// Parses user-entered text such as `"1250.5"`.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(BudgetError::InvalidAmount("an amount is required".into()));
        }
        let parsed = if trimmed.contains(['e', 'E']) {
            Decimal::from_scientific(trimmed)
        } else {
            Decimal::from_str(trimmed)
        };
        parsed
            .map(Self::new)
            .map_err(|_| BudgetError::InvalidAmount(format!("`{trimmed}` is not a number")))?
            .within_limit()
    }

    /// Rejects amounts whose magnitude exceeds [`MAX_UNITS`].
    pub fn within_limit(self) -> Result<Self> {
        if self.0.abs() > Decimal::from(MAX_UNITS) {
            return Err(BudgetError::InvalidAmount(format!(
                "{} exceeds the largest supported amount ({MAX_UNITS})",
                self
            )));
        }
        Ok(self)
    }

    pub fn amount(self) -> Decimal {
        self.0
    }

    pub fn is_positive(self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn abs(self) -> Self {
        Self(self.0.abs())
    }

    /// One half of the amount, rounded on its own.
    pub fn half(self) -> Self {
        Self::new(self.0 / Decimal::TWO)
    }

    /// Divides into `parts` and floors each share to a multiple of `step`.
    ///
    /// The division is kept exact until the floor so that, for example,
    /// 7000 split three ways with a step of 10 yields 2330.
    pub fn divide_floor(self, parts: u32, step: u32) -> Self {
        if parts == 0 || step == 0 {
            return Self::ZERO;
        }
        let step = Decimal::from(step);
        let share = self.0 / Decimal::from(parts);
        Self::new((share / step).floor() * step)
    }

    /// Saturates at the decimal range instead of overflowing.
    pub fn times(self, factor: u32) -> Self {
        Self::new(self.0.saturating_mul(Decimal::from(factor)))
    }

    /// Percentage of `total` this amount represents, one decimal place.
    /// Returns zero when `total` is not positive.
    pub fn percent_of(self, total: Money) -> Decimal {
        if !total.is_positive() {
            return Decimal::ZERO;
        }
        self.0
            .checked_div(total.0)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .unwrap_or(Decimal::MAX)
            .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Renders the amount for people, e.g. `Rs 1,234.56` or `-Rs 170.00`.
    pub fn format_amount(self, symbol: &str) -> String {
        let body = format!("{:.2}", self.0.abs());
        let (int_part, frac_part) = body.split_once('.').unwrap_or((body.as_str(), "00"));
        let grouped = group_digits(int_part, ',');
        let sign = if self.is_negative() { "-" } else { "" };
        if symbol.is_empty() {
            format!("{sign}{grouped}.{frac_part}")
        } else {
            format!("{sign}{symbol} {grouped}.{frac_part}")
        }
    }
}

fn normalize(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(SCALE);
    rounded
}

fn group_digits(digits: &str, separator: char) -> String {
    let mut grouped = String::new();
    for (count, ch) in digits.chars().rev().enumerate() {
        if count != 0 && count % 3 == 0 {
            grouped.insert(0, separator);
        }
        grouped.insert(0, ch);
    }
    grouped
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Money {
    type Err = BudgetError;

    fn from_str(s: &str) -> Result<Self> {
        Money::parse(s)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money::new(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money::new(self.0.saturating_sub(rhs.0))
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        *self = *self + rhs;
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        *self = *self - rhs;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        <Decimal as Deserialize>::deserialize(deserializer).map(Money::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn money(raw: &str) -> Money {
        Money::parse(raw).expect("valid amount")
    }

    #[test]
    fn repeated_tenths_do_not_drift() {
        let total: Money = (0..10).map(|_| money("0.1")).sum();
        assert_eq!(total, Money::from_units(1));
        assert_eq!((money("0.1") + money("0.2")).to_string(), "0.30");
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(money("2.345").to_string(), "2.35");
        assert_eq!(money("-2.345").to_string(), "-2.35");
        assert_eq!(money("0.01").half(), money("0.01"));
    }

    #[test]
    fn divide_floor_matches_weekly_allocation_rule() {
        assert_eq!(money("7000").divide_floor(3, 10), money("2330"));
        assert_eq!(money("6000").divide_floor(3, 10), money("2000"));
        assert_eq!(money("29.99").divide_floor(3, 10), Money::ZERO);
    }

    #[test]
    fn parse_rejects_non_numeric_text() {
        let err = Money::parse("twelve").expect_err("text is not an amount");
        assert!(matches!(err, BudgetError::InvalidAmount(_)));
        assert!(matches!(
            Money::parse("   "),
            Err(BudgetError::InvalidAmount(_))
        ));
        assert_eq!(money("1e3"), Money::from_units(1000));
    }

    #[test]
    fn parse_caps_amounts_at_one_trillion() {
        assert_eq!(money("1000000000000"), Money::from_units(MAX_UNITS));
        assert!(matches!(
            Money::parse("1000000000000.01"),
            Err(BudgetError::InvalidAmount(_))
        ));
        assert!(matches!(
            Money::parse("79228162514264337593543950335"),
            Err(BudgetError::InvalidAmount(_))
        ));
    }

    #[test]
    fn arithmetic_saturates_instead_of_panicking() {
        let huge = Money::new(Decimal::MAX);
        assert_eq!(huge + huge, huge);
        assert!((-huge - huge).is_negative());
        assert!(huge.times(3).is_positive());
        assert_eq!(
            Money::from_units(5).percent_of(Money::from_cents(1)),
            Decimal::from(50_000)
        );
    }

    #[test]
    fn formats_with_grouping_and_sign() {
        assert_eq!(money("1234567.5").format_amount("Rs"), "Rs 1,234,567.50");
        assert_eq!(money("-170").format_amount("Rs"), "-Rs 170.00");
        assert_eq!(money("999").format_amount(""), "999.00");
    }

    #[test]
    fn percent_of_handles_empty_totals() {
        assert_eq!(money("50").percent_of(Money::ZERO), Decimal::ZERO);
        assert_eq!(money("1").percent_of(money("3")).to_string(), "33.3");
    }

    #[test]
    fn serde_normalizes_legacy_numbers() {
        let from_float: Money = serde_json::from_str("2333.3333333333335").unwrap();
        assert_eq!(from_float, money("2333.33"));
        let from_int: Money = serde_json::from_str("500").unwrap();
        assert_eq!(serde_json::to_string(&from_int).unwrap(), "\"500.00\"");
    }
}

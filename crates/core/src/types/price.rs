//! Type-safe price representation using decimal arithmetic.
//!
//! Amounts are `rust_decimal::Decimal` in the currency's standard unit
//! (dollars, not cents). Sums and products are exact; rounding only happens
//! when a price is formatted for display.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    #[serde(default)]
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// A zero amount in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self::new(Decimal::ZERO, currency_code)
    }

    /// Create a USD price from an integer number of cents.
    ///
    /// ```
    /// use stockyard_core::Price;
    ///
    /// assert_eq!(Price::usd_cents(1999).to_string(), "$19.99");
    /// ```
    #[must_use]
    pub fn usd_cents(cents: i64) -> Self {
        Self::new(Decimal::new(cents, 2), CurrencyCode::USD)
    }

    /// Whether the amount is exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Whether the amount is below zero.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }

    /// The price of `quantity` units at this unit price.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self::new(self.amount * Decimal::from(quantity), self.currency_code)
    }

    /// Like [`Price::times`], but `None` when the amount overflows.
    #[must_use]
    pub fn checked_times(&self, quantity: u32) -> Option<Self> {
        self.amount
            .checked_mul(Decimal::from(quantity))
            .map(|amount| Self::new(amount, self.currency_code))
    }

    /// Sum of two amounts, or `None` when it overflows.
    #[must_use]
    pub fn checked_add(&self, rhs: Self) -> Option<Self> {
        self.amount
            .checked_add(rhs.amount)
            .map(|amount| Self::new(amount, self.currency_code))
    }

    /// Amount rounded to two decimal places for display.
    #[must_use]
    pub fn rounded(&self) -> Decimal {
        self.amount
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }
}

impl Add for Price {
    type Output = Self;

    /// Adds two amounts. Carts never mix currencies, so the left-hand
    /// currency is kept.
    fn add(self, rhs: Self) -> Self {
        debug_assert_eq!(self.currency_code, rhs.currency_code);
        Self::new(self.amount + rhs.amount, self.currency_code)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(CurrencyCode::default()), |acc, p| {
            Self::new(acc.amount + p.amount, p.currency_code)
        })
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:.2}", self.currency_code.symbol(), self.rounded())
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::USD | Self::CAD | Self::AUD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }
}

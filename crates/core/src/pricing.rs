//! Shipping methods and the order totals calculator.
//!
//! Totals are derived on demand from the cart lines and the selected
//! shipping method. They are never stored on the cart.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::CartLine;
use crate::types::{CurrencyCode, ParseStatusError, Price};

/// Shipping fee tier selected at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShippingMethod {
    Free,
    #[default]
    Standard,
    Express,
}

impl ShippingMethod {
    pub const ALL: [Self; 3] = [Self::Free, Self::Standard, Self::Express];

    /// Fixed fee for this tier, in the currency's standard unit.
    #[must_use]
    pub const fn fee(&self) -> Decimal {
        match self {
            Self::Free => Decimal::ZERO,
            Self::Standard => Decimal::from_parts(1000, 0, 0, false, 2),
            Self::Express => Decimal::from_parts(2500, 0, 0, false, 2),
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "FREE",
            Self::Standard => "STANDARD",
            Self::Express => "EXPRESS",
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Free => "Free shipping",
            Self::Standard => "Standard",
            Self::Express => "Express",
        }
    }
}

impl fmt::Display for ShippingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShippingMethod {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseStatusError::new("shipping method", s))
    }
}

/// Subtotal, shipping fee and total for a set of cart lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Price,
    pub shipping_fee: Price,
    pub total: Price,
}

impl OrderTotals {
    /// All-zero totals in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self {
            subtotal: Price::zero(currency_code),
            shipping_fee: Price::zero(currency_code),
            total: Price::zero(currency_code),
        }
    }
}

/// Compute totals for `lines` shipped with `method`.
///
/// - subtotal is the sum of `unit_price * quantity`
/// - the shipping fee is the method's fixed fee, or zero when the subtotal is zero
/// - total is subtotal plus shipping fee
///
/// ```
/// use stockyard_core::{CartLine, ProductId, Price, ShippingMethod, calculate_totals};
///
/// let lines = [CartLine::new(ProductId::new(1), "Crate", Price::usd_cents(10_000), 2)];
/// let totals = calculate_totals(&lines, ShippingMethod::Standard);
/// assert_eq!(totals.total, Price::usd_cents(21_000));
/// ```
#[must_use]
pub fn calculate_totals(lines: &[CartLine], method: ShippingMethod) -> OrderTotals {
    let currency_code = lines
        .first()
        .map_or_else(CurrencyCode::default, |line| line.unit_price.currency_code);

    let subtotal = lines.iter().fold(Price::zero(currency_code), |acc, line| {
        acc + line.line_total()
    });

    let shipping_fee = if subtotal.is_zero() {
        Price::zero(currency_code)
    } else {
        Price::new(method.fee(), currency_code)
    };

    OrderTotals {
        subtotal,
        shipping_fee,
        total: subtotal + shipping_fee,
    }
}

/// Like [`calculate_totals`], but `None` when any amount overflows.
#[must_use]
pub fn checked_totals(lines: &[CartLine], method: ShippingMethod) -> Option<OrderTotals> {
    let currency_code = lines
        .first()
        .map_or_else(CurrencyCode::default, |line| line.unit_price.currency_code);

    let subtotal = lines.iter().try_fold(Price::zero(currency_code), |acc, line| {
        acc.checked_add(line.unit_price.checked_times(line.quantity)?)
    })?;

    let shipping_fee = if subtotal.is_zero() {
        Price::zero(currency_code)
    } else {
        Price::new(method.fee(), currency_code)
    };

    Some(OrderTotals {
        subtotal,
        shipping_fee,
        total: subtotal.checked_add(shipping_fee)?,
    })
}

//! Shopper cart held pending checkout.
//!
//! A cart belongs to one company (tenant) and holds one line per product.
//! Prices are captured when the product is added and travel with the line
//! into the order at checkout.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pricing::{OrderTotals, ShippingMethod, calculate_totals, checked_totals};
use crate::types::{CompanyId, CurrencyCode, Price, ProductId};

/// Errors from cart mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// Quantities must be at least 1.
    #[error("quantity must be at least 1 (got {0})")]
    InvalidQuantity(u32),

    /// The product is not in the cart.
    #[error("product {0} is not in the cart")]
    LineNotFound(ProductId),

    /// The product belongs to a different company than the cart.
    #[error("cart belongs to company {expected}, product belongs to {actual}")]
    CompanyMismatch {
        expected: CompanyId,
        actual: CompanyId,
    },

    /// The line is priced in a different currency than the cart.
    #[error("cart is priced in {expected:?}, line is priced in {actual:?}")]
    CurrencyMismatch {
        expected: CurrencyCode,
        actual: CurrencyCode,
    },

    /// Unit prices cannot be negative.
    #[error("unit price cannot be negative")]
    NegativePrice,

    /// The cart total would exceed the representable amount.
    #[error("cart total is too large")]
    AmountTooLarge,
}

/// One product plus quantity held pending checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Price,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
}

impl CartLine {
    #[must_use]
    pub fn new(
        product_id: ProductId,
        name: impl Into<String>,
        unit_price: Price,
        quantity: u32,
    ) -> Self {
        Self {
            product_id,
            name: name.into(),
            unit_price,
            quantity,
            image_ref: None,
        }
    }

    #[must_use]
    pub fn with_image(mut self, image_ref: impl Into<String>) -> Self {
        self.image_ref = Some(image_ref.into());
        self
    }

    /// `unit_price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// A company-scoped shopping cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub company_id: CompanyId,
    #[serde(default)]
    lines: Vec<CartLine>,
}

impl Cart {
    /// An empty cart for `company_id`.
    #[must_use]
    pub const fn new(company_id: CompanyId) -> Self {
        Self {
            company_id,
            lines: Vec::new(),
        }
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |acc, line| acc.saturating_add(line.quantity))
    }

    /// Currency of the cart, taken from its first line.
    #[must_use]
    pub fn currency_code(&self) -> Option<CurrencyCode> {
        self.lines.first().map(|line| line.unit_price.currency_code)
    }

    #[must_use]
    pub fn line(&self, product_id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.product_id == product_id)
    }

    /// Add a product from `company_id` to the cart.
    ///
    /// Adding a product that is already present increases its quantity and
    /// keeps the originally captured price.
    ///
    /// # Errors
    ///
    /// Rejects zero quantities, negative prices, products from another
    /// company and lines priced in another currency. Returns
    /// `AmountTooLarge` when the new totals would overflow.
    pub fn add(&mut self, company_id: CompanyId, line: CartLine) -> Result<(), CartError> {
        if company_id != self.company_id {
            return Err(CartError::CompanyMismatch {
                expected: self.company_id,
                actual: company_id,
            });
        }
        if line.quantity == 0 {
            return Err(CartError::InvalidQuantity(0));
        }
        if line.unit_price.is_negative() {
            return Err(CartError::NegativePrice);
        }
        if let Some(expected) = self.currency_code()
            && expected != line.unit_price.currency_code
        {
            return Err(CartError::CurrencyMismatch {
                expected,
                actual: line.unit_price.currency_code,
            });
        }

        let mut lines = self.lines.clone();
        if let Some(existing) = lines
            .iter_mut()
            .find(|existing| existing.product_id == line.product_id)
        {
            existing.quantity = existing.quantity.saturating_add(line.quantity);
        } else {
            lines.push(line);
        }
        self.replace_lines(lines)
    }

    /// Set the quantity of an existing line.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuantity` for 0 (use [`Cart::remove`] instead),
    /// `LineNotFound` for products not in the cart and `AmountTooLarge`
    /// when the new totals would overflow.
    pub fn update_quantity(&mut self, product_id: ProductId, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }
        let mut lines = self.lines.clone();
        let line = lines
            .iter_mut()
            .find(|line| line.product_id == product_id)
            .ok_or(CartError::LineNotFound(product_id))?;
        line.quantity = quantity;
        self.replace_lines(lines)
    }

    /// Swap in `lines` if their totals fit for every shipping method.
    fn replace_lines(&mut self, lines: Vec<CartLine>) -> Result<(), CartError> {
        if ShippingMethod::ALL
            .into_iter()
            .any(|method| checked_totals(&lines, method).is_none())
        {
            return Err(CartError::AmountTooLarge);
        }
        self.lines = lines;
        Ok(())
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns `LineNotFound` for products not in the cart.
    pub fn remove(&mut self, product_id: ProductId) -> Result<CartLine, CartError> {
        let index = self
            .lines
            .iter()
            .position(|line| line.product_id == product_id)
            .ok_or(CartError::LineNotFound(product_id))?;
        Ok(self.lines.remove(index))
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Totals for the current lines with `method` shipping.
    #[must_use]
    pub fn totals(&self, method: ShippingMethod) -> OrderTotals {
        calculate_totals(&self.lines, method)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const COMPANY: CompanyId = CompanyId::new(1);

    fn line(id: i32, cents: i64, quantity: u32) -> CartLine {
        CartLine::new(
            ProductId::new(id),
            format!("Product {id}"),
            Price::usd_cents(cents),
            quantity,
        )
    }

    #[test]
    fn test_add_merges_same_product() {
        let mut cart = Cart::new(COMPANY);
        cart.add(COMPANY, line(1, 500, 1)).unwrap();
        cart.add(COMPANY, line(1, 999, 2)).unwrap();

        assert_eq!(cart.lines().len(), 1);
        let merged = cart.line(ProductId::new(1)).unwrap();
        assert_eq!(merged.quantity, 3);
        // first captured price wins
        assert_eq!(merged.unit_price, Price::usd_cents(500));
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_add_rejects_zero_quantity() {
        let mut cart = Cart::new(COMPANY);
        assert_eq!(
            cart.add(COMPANY, line(1, 500, 0)),
            Err(CartError::InvalidQuantity(0))
        );
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_rejects_other_company() {
        let mut cart = Cart::new(COMPANY);
        let other = CompanyId::new(2);
        assert_eq!(
            cart.add(other, line(1, 500, 1)),
            Err(CartError::CompanyMismatch {
                expected: COMPANY,
                actual: other
            })
        );
    }

    #[test]
    fn test_add_rejects_mixed_currency() {
        let mut cart = Cart::new(COMPANY);
        cart.add(COMPANY, line(1, 500, 1)).unwrap();
        let mut euro = line(2, 500, 1);
        euro.unit_price.currency_code = CurrencyCode::EUR;
        assert!(matches!(
            cart.add(COMPANY, euro),
            Err(CartError::CurrencyMismatch { .. })
        ));
    }

    #[test]
    fn test_add_rejects_negative_price() {
        let mut cart = Cart::new(COMPANY);
        assert_eq!(
            cart.add(COMPANY, line(1, -100, 1)),
            Err(CartError::NegativePrice)
        );
    }

    #[test]
    fn test_update_to_zero_is_rejected_and_subtotal_unchanged() {
        let mut cart = Cart::new(COMPANY);
        cart.add(COMPANY, line(1, 10_000, 2)).unwrap();
        cart.add(COMPANY, line(2, 2_500, 1)).unwrap();
        let before = cart.totals(ShippingMethod::Free).subtotal;

        assert_eq!(
            cart.update_quantity(ProductId::new(1), 0),
            Err(CartError::InvalidQuantity(0))
        );

        let after = cart.totals(ShippingMethod::Free).subtotal;
        assert_eq!(before, after);
        assert_eq!(after, Price::usd_cents(22_500));
    }

    #[test]
    fn test_oversized_amounts_are_rejected_without_changing_cart() {
        use rust_decimal::Decimal;

        let huge = CartLine::new(
            ProductId::new(7),
            "Huge",
            Price::new(Decimal::MAX, CurrencyCode::USD),
            2,
        );
        let mut cart = Cart::new(COMPANY);
        assert_eq!(cart.add(COMPANY, huge), Err(CartError::AmountTooLarge));
        assert!(cart.is_empty());

        cart.add(COMPANY, line(1, 500, 1)).unwrap();
        cart.update_quantity(ProductId::new(1), u32::MAX).unwrap();
        let big = CartLine::new(
            ProductId::new(2),
            "Big",
            Price::new(Decimal::MAX / Decimal::TWO, CurrencyCode::USD),
            1,
        );
        cart.add(COMPANY, big).unwrap();
        assert_eq!(
            cart.update_quantity(ProductId::new(2), 3),
            Err(CartError::AmountTooLarge)
        );
        assert_eq!(cart.line(ProductId::new(2)).unwrap().quantity, 1);
    }

    #[test]
    fn test_update_quantity() {
        let mut cart = Cart::new(COMPANY);
        cart.add(COMPANY, line(1, 1_000, 1)).unwrap();
        cart.update_quantity(ProductId::new(1), 5).unwrap();
        assert_eq!(cart.totals(ShippingMethod::Free).subtotal, Price::usd_cents(5_000));
        assert_eq!(
            cart.update_quantity(ProductId::new(9), 1),
            Err(CartError::LineNotFound(ProductId::new(9)))
        );
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cart = Cart::new(COMPANY);
        cart.add(COMPANY, line(1, 1_000, 1)).unwrap();
        cart.add(COMPANY, line(2, 1_000, 1)).unwrap();

        let removed = cart.remove(ProductId::new(1)).unwrap();
        assert_eq!(removed.product_id, ProductId::new(1));
        assert!(cart.remove(ProductId::new(1)).is_err());

        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(
            cart.totals(ShippingMethod::Express),
            OrderTotals::zero(CurrencyCode::USD)
        );
    }

    #[test]
    fn test_cart_json_shape() {
        let mut cart = Cart::new(COMPANY);
        cart.add(COMPANY, line(3, 1_250, 2).with_image("products/3.jpg"))
            .unwrap();
        let json = serde_json::to_value(&cart).unwrap();
        assert_eq!(json["company_id"], 1);
        assert_eq!(json["lines"][0]["product_id"], 3);
        assert_eq!(json["lines"][0]["image_ref"], "products/3.jpg");

        let back: Cart = serde_json::from_value(json).unwrap();
        assert_eq!(back, cart);
    }
}

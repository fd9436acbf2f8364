//! Price a cart file without a running storefront.
//!
//! The file holds a JSON array of cart lines:
//!
//! ```json
//! [{ "product_id": 1, "name": "Oak crate", "unit_price": { "amount": "100.00" }, "quantity": 2 }]
//! ```

use std::path::Path;

use thiserror::Error;

use stockyard_core::{Cart, CartError, CartLine, CompanyId, OrderTotals, ProductId, ShippingMethod};

/// Quotes are not tied to a shop; every line is added under this ID.
const QUOTE_COMPANY: CompanyId = CompanyId::new(0);

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("Failed to read cart file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid cart file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid cart line: {0}")]
    Cart(#[from] CartError),

    #[error("Product {0} appears on more than one line")]
    DuplicateProduct(ProductId),
}

/// Totals for a JSON array of cart lines.
///
/// Lines go through the same validation as the storefront cart, so zero
/// quantities, negative prices and mixed currencies are rejected. A cart
/// holds one line per product, so repeated product IDs are an error rather
/// than a merge that would drop the second price.
pub fn quote_json(json: &str, method: ShippingMethod) -> Result<OrderTotals, QuoteError> {
    let lines: Vec<CartLine> = serde_json::from_str(json)?;
    let mut cart = Cart::new(QUOTE_COMPANY);
    for line in lines {
        if cart.line(line.product_id).is_some() {
            return Err(QuoteError::DuplicateProduct(line.product_id));
        }
        cart.add(QUOTE_COMPANY, line)?;
    }
    Ok(cart.totals(method))
}

/// Totals for the cart lines stored at `path`.
pub fn quote_file(path: &Path, method: ShippingMethod) -> Result<OrderTotals, QuoteError> {
    let contents = std::fs::read_to_string(path)?;
    quote_json(&contents, method)
}

/// Print the quote for `path`.
#[allow(clippy::print_stdout)]
pub fn run(path: &Path, method: ShippingMethod, json: bool) -> Result<(), QuoteError> {
    let totals = quote_file(path, method)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&totals)?);
    } else {
        println!("Subtotal: {}", totals.subtotal);
        println!("Shipping: {} ({})", totals.shipping_fee, method.label());
        println!("Total:    {}", totals.total);
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use stockyard_core::Price;

    use super::*;

    #[test]
    fn test_quote_standard_shipping() {
        let totals = quote_json(
            r#"[{"product_id":1,"name":"Oak crate","unit_price":{"amount":"100"},"quantity":2}]"#,
            ShippingMethod::Standard,
        )
        .unwrap();
        assert_eq!(totals.subtotal, Price::usd_cents(20_000));
        assert_eq!(totals.shipping_fee, Price::usd_cents(1_000));
        assert_eq!(totals.total, Price::usd_cents(21_000));
    }

    #[test]
    fn test_quote_empty_cart_has_no_shipping() {
        let totals = quote_json("[]", ShippingMethod::Express).unwrap();
        assert!(totals.total.is_zero());
        assert!(totals.shipping_fee.is_zero());
    }

    #[test]
    fn test_quote_rejects_zero_quantity() {
        let err = quote_json(
            r#"[{"product_id":1,"name":"Oak crate","unit_price":{"amount":"5"},"quantity":0}]"#,
            ShippingMethod::Free,
        )
        .unwrap_err();
        assert!(matches!(err, QuoteError::Cart(CartError::InvalidQuantity(0))));
    }

    #[test]
    fn test_quote_rejects_repeated_product() {
        let err = quote_json(
            r#"[
                {"product_id":1,"name":"Oak crate","unit_price":{"amount":"10.00"},"quantity":1},
                {"product_id":1,"name":"Oak crate","unit_price":{"amount":"20.00"},"quantity":1}
            ]"#,
            ShippingMethod::Free,
        )
        .unwrap_err();
        assert!(matches!(err, QuoteError::DuplicateProduct(id) if id == ProductId::new(1)));
    }

    #[test]
    fn test_quote_overflowing_amount_is_an_error() {
        let err = quote_json(
            r#"[{"product_id":1,"name":"Oak crate","unit_price":{"amount":"79228162514264337593543950335"},"quantity":2}]"#,
            ShippingMethod::Standard,
        )
        .unwrap_err();
        assert!(matches!(err, QuoteError::Cart(CartError::AmountTooLarge)));
    }

    #[test]
    fn test_quote_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"product_id":2,"name":"Pine crate","unit_price":{{"amount":"12.50"}},"quantity":4}}]"#
        )
        .unwrap();

        let totals = quote_file(file.path(), ShippingMethod::Free).unwrap();
        assert_eq!(totals.total, Price::usd_cents(5_000));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = quote_file(Path::new("/nonexistent/cart.json"), ShippingMethod::Free).unwrap_err();
        assert!(matches!(err, QuoteError::Io(_)));
    }
}

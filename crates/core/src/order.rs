//! Orders: the draft assembled at checkout and the record the backend keeps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cart::{Cart, CartLine};
use crate::pricing::{OrderTotals, ShippingMethod};
use crate::types::{
    CompanyId, Email, OrderId, OrderStatus, PaymentMethod, PaymentStatus, Price, ProductId,
};

/// Errors assembling an order draft.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("cannot place an order with an empty cart")]
    EmptyCart,

    #[error("{0} is required")]
    MissingField(&'static str),
}

/// Where the order ships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub postal_code: String,
    pub country: String,
}

/// Customer identity and address captured at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub name: String,
    pub email: Email,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub address: ShippingAddress,
}

impl CustomerDetails {
    /// Check that the required text fields are filled in.
    ///
    /// # Errors
    ///
    /// Returns `MissingField` naming the first blank required field.
    pub fn validate(&self) -> Result<(), DraftError> {
        let required = [
            ("name", &self.name),
            ("address line 1", &self.address.line1),
            ("city", &self.address.city),
            ("postal code", &self.address.postal_code),
            ("country", &self.address.country),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(DraftError::MissingField(field));
            }
        }
        Ok(())
    }
}

/// Payment method plus its current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInfo {
    pub method: PaymentMethod,
    pub status: PaymentStatus,
}

/// A purchased line, with the price captured at submission time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Price,
    pub quantity: u32,
}

impl OrderItem {
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

impl From<&CartLine> for OrderItem {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id,
            name: line.name.clone(),
            unit_price: line.unit_price,
            quantity: line.quantity,
        }
    }
}

/// Everything the backend needs to record an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDraft {
    pub company_id: CompanyId,
    pub customer: CustomerDetails,
    pub payment: PaymentInfo,
    pub status: OrderStatus,
    pub shipping_method: ShippingMethod,
    pub subtotal: Price,
    pub shipping: Price,
    pub total: Price,
    pub items: Vec<OrderItem>,
}

impl OrderDraft {
    /// Snapshot a cart into an order draft.
    ///
    /// Prices are taken from the cart lines as-is. The order starts out
    /// `Pending` with a `Pending` payment.
    ///
    /// # Errors
    ///
    /// Returns `EmptyCart` for an empty cart and `MissingField` when the
    /// customer details are incomplete.
    pub fn assemble(
        cart: &Cart,
        customer: CustomerDetails,
        payment_method: PaymentMethod,
        shipping_method: ShippingMethod,
    ) -> Result<Self, DraftError> {
        if cart.is_empty() {
            return Err(DraftError::EmptyCart);
        }
        customer.validate()?;

        let OrderTotals {
            subtotal,
            shipping_fee,
            total,
        } = cart.totals(shipping_method);

        Ok(Self {
            company_id: cart.company_id,
            customer,
            payment: PaymentInfo {
                method: payment_method,
                status: PaymentStatus::Pending,
            },
            status: OrderStatus::Pending,
            shipping_method,
            subtotal,
            shipping: shipping_fee,
            total,
            items: cart.lines().iter().map(OrderItem::from).collect(),
        })
    }
}

/// A persisted order as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub company_id: CompanyId,
    pub customer: CustomerDetails,
    pub payment: PaymentInfo,
    pub status: OrderStatus,
    pub shipping_method: ShippingMethod,
    pub subtotal: Price,
    pub shipping: Price,
    pub total: Price,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Build the record for `draft` once the backend has assigned an ID and timestamp.
    #[must_use]
    pub fn from_draft(id: OrderId, created_at: DateTime<Utc>, draft: OrderDraft) -> Self {
        Self {
            id,
            company_id: draft.company_id,
            customer: draft.customer,
            payment: draft.payment,
            status: draft.status,
            shipping_method: draft.shipping_method,
            subtotal: draft.subtotal,
            shipping: draft.shipping,
            total: draft.total,
            items: draft.items,
            created_at,
        }
    }

    /// Total number of units ordered.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |acc, item| acc.saturating_add(item.quantity))
    }

    /// Apply an admin status patch in place.
    pub fn apply(&mut self, update: &OrderStatusUpdate) {
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(payment_status) = update.payment_status {
            self.payment.status = payment_status;
        }
    }
}

/// Admin patch of an order's status labels. Either field may be omitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrderStatusUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentStatus>,
}

impl OrderStatusUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.status.is_none() && self.payment_status.is_none()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const COMPANY: CompanyId = CompanyId::new(7);

    fn customer() -> CustomerDetails {
        CustomerDetails {
            name: "Ada Lovelace".to_string(),
            email: Email::parse("ada@example.com").unwrap(),
            phone: None,
            address: ShippingAddress {
                line1: "12 Analytical Row".to_string(),
                line2: None,
                city: "London".to_string(),
                region: None,
                postal_code: "N1 9GU".to_string(),
                country: "GB".to_string(),
            },
        }
    }

    fn cart() -> Cart {
        let mut cart = Cart::new(COMPANY);
        cart.add(
            COMPANY,
            CartLine::new(ProductId::new(1), "Crate", Price::usd_cents(10_000), 2),
        )
        .unwrap();
        cart
    }

    #[test]
    fn test_assemble_snapshots_cart() {
        let draft = OrderDraft::assemble(
            &cart(),
            customer(),
            PaymentMethod::Card,
            ShippingMethod::Standard,
        )
        .unwrap();

        assert_eq!(draft.company_id, COMPANY);
        assert_eq!(draft.status, OrderStatus::Pending);
        assert_eq!(draft.payment.status, PaymentStatus::Pending);
        assert_eq!(draft.payment.method, PaymentMethod::Card);
        assert_eq!(draft.subtotal, Price::usd_cents(20_000));
        assert_eq!(draft.shipping, Price::usd_cents(1_000));
        assert_eq!(draft.total, Price::usd_cents(21_000));
        assert_eq!(draft.items.len(), 1);
        assert_eq!(draft.items[0].quantity, 2);
        assert_eq!(draft.items[0].line_total(), Price::usd_cents(20_000));
    }

    #[test]
    fn test_assemble_empty_cart() {
        let result = OrderDraft::assemble(
            &Cart::new(COMPANY),
            customer(),
            PaymentMethod::Card,
            ShippingMethod::Free,
        );
        assert_eq!(result, Err(DraftError::EmptyCart));
    }

    #[test]
    fn test_assemble_requires_address() {
        let mut details = customer();
        details.address.city = "  ".to_string();
        let result = OrderDraft::assemble(
            &cart(),
            details,
            PaymentMethod::CashOnDelivery,
            ShippingMethod::Free,
        );
        assert_eq!(result, Err(DraftError::MissingField("city")));
    }

    #[test]
    fn test_apply_status_update_allows_any_value() {
        let draft =
            OrderDraft::assemble(&cart(), customer(), PaymentMethod::Card, ShippingMethod::Free)
                .unwrap();
        let mut order = Order::from_draft(OrderId::new(1), Utc::now(), draft);

        order.apply(&OrderStatusUpdate {
            status: Some(OrderStatus::Cancelled),
            payment_status: None,
        });
        assert_eq!(order.status, OrderStatus::Cancelled);

        order.apply(&OrderStatusUpdate {
            status: Some(OrderStatus::Pending),
            payment_status: Some(PaymentStatus::Completed),
        });
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment.status, PaymentStatus::Completed);
    }

    #[test]
    fn test_status_update_serializes_only_set_fields() {
        let update = OrderStatusUpdate {
            status: Some(OrderStatus::Shipped),
            payment_status: None,
        };
        let json = serde_json::to_value(update).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "shipped" }));
        assert!(OrderStatusUpdate::default().is_empty());
    }
}

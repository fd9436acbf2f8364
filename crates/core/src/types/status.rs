//! Status enums for orders and payments.
//!
//! Order status and payment status are independent labels. Admins may set
//! either one to any value; nothing here refuses a change. [`StatusChange`]
//! only reports changes worth a second look so callers can log them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a status string does not name a known value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {value}")]
pub struct ParseStatusError {
    kind: &'static str,
    value: String,
}

impl ParseStatusError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Every order status, in lifecycle order (for admin select boxes).
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Stable string form used in forms, URLs and the backend API.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Human readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Statuses that normally end an order's lifecycle.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseStatusError::new("order status", s))
    }
}

/// Payment lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub const ALL: [Self; 4] = [Self::Pending, Self::Completed, Self::Failed, Self::Refunded];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
            Self::Refunded => "Refunded",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseStatusError::new("payment status", s))
    }
}

/// Payment method chosen by the customer at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    CashOnDelivery,
    Card,
    BankTransfer,
}

impl PaymentMethod {
    pub const ALL: [Self; 3] = [Self::CashOnDelivery, Self::Card, Self::BankTransfer];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CashOnDelivery => "cash_on_delivery",
            Self::Card => "card",
            Self::BankTransfer => "bank_transfer",
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::CashOnDelivery => "Cash on delivery",
            Self::Card => "Card",
            Self::BankTransfer => "Bank transfer",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseStatusError::new("payment method", s))
    }
}

/// A requested change of an order's status labels.
///
/// Built from the current order and an admin patch. Never rejects anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub payment_from: PaymentStatus,
    pub payment_to: PaymentStatus,
}

impl StatusChange {
    /// Combine the current labels with optional new values.
    #[must_use]
    pub fn new(
        current: (OrderStatus, PaymentStatus),
        status: Option<OrderStatus>,
        payment_status: Option<PaymentStatus>,
    ) -> Self {
        Self {
            from: current.0,
            to: status.unwrap_or(current.0),
            payment_from: current.1,
            payment_to: payment_status.unwrap_or(current.1),
        }
    }

    /// Whether nothing would change.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.from == self.to && self.payment_from == self.payment_to
    }

    /// Moves an order out of a terminal status (e.g. Cancelled back to Pending).
    #[must_use]
    pub fn reopens_terminal(&self) -> bool {
        self.from.is_terminal() && self.from != self.to
    }

    /// Payment completed on a cancelled order.
    #[must_use]
    pub fn is_inconsistent(&self) -> bool {
        self.to == OrderStatus::Cancelled && self.payment_to == PaymentStatus::Completed
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_parse_and_display() {
        for status in OrderStatus::ALL {
            assert_eq!(status.to_string().parse::<OrderStatus>().unwrap(), status);
        }
        assert_eq!("SHIPPED".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
        let err = "lost".parse::<OrderStatus>().unwrap_err();
        assert_eq!(err.to_string(), "invalid order status: lost");
    }

    #[test]
    fn test_payment_status_parse() {
        assert_eq!(
            " completed ".parse::<PaymentStatus>().unwrap(),
            PaymentStatus::Completed
        );
        assert!("paid".parse::<PaymentStatus>().is_err());
    }

    #[test]
    fn test_payment_method_serde() {
        let json = serde_json::to_string(&PaymentMethod::CashOnDelivery).unwrap();
        assert_eq!(json, "\"cash_on_delivery\"");
        let method: PaymentMethod = serde_json::from_str("\"bank_transfer\"").unwrap();
        assert_eq!(method, PaymentMethod::BankTransfer);
    }

    #[test]
    fn test_defaults_are_pending() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
        assert_eq!(PaymentStatus::default(), PaymentStatus::Pending);
    }

    #[test]
    fn test_any_transition_is_representable() {
        // Cancelled -> Pending is allowed, only flagged
        let change = StatusChange::new(
            (OrderStatus::Cancelled, PaymentStatus::Pending),
            Some(OrderStatus::Pending),
            None,
        );
        assert_eq!(change.to, OrderStatus::Pending);
        assert!(change.reopens_terminal());
        assert!(!change.is_inconsistent());
    }

    #[test]
    fn test_completed_payment_on_cancelled_order_is_flagged() {
        let change = StatusChange::new(
            (OrderStatus::Processing, PaymentStatus::Completed),
            Some(OrderStatus::Cancelled),
            None,
        );
        assert!(change.is_inconsistent());
        assert!(!change.reopens_terminal());
    }

    #[test]
    fn test_noop_change() {
        let change = StatusChange::new((OrderStatus::Shipped, PaymentStatus::Completed), None, None);
        assert!(change.is_noop());
        assert!(!change.reopens_terminal());
    }
}

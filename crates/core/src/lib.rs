//! Stockyard Core - Shared domain library.
//!
//! This crate provides the domain model used across all Stockyard components:
//! - `storefront` - Public storefront where customers browse and check out
//! - `admin` - Company dashboard for order management
//! - `cli` - Command-line tools for migrations, quotes and status updates
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP clients. Records are persisted by the external
//! backend API; this crate only describes them.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, emails and statuses
//! - [`catalog`] - Companies and products served by the backend
//! - [`cart`] - Shopper cart and cart lines
//! - [`pricing`] - Shipping methods and the order totals calculator
//! - [`order`] - Order drafts, persisted orders and status patches
//! - [`api`] - Error body parsing shared by the records API clients

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod catalog;
pub mod order;
pub mod pricing;
pub mod types;

pub use cart::{Cart, CartError, CartLine};
pub use catalog::{Company, Product};
pub use order::{
    CustomerDetails, DraftError, Order, OrderDraft, OrderItem, OrderStatusUpdate, PaymentInfo,
    ShippingAddress,
};
pub use pricing::{OrderTotals, ShippingMethod, calculate_totals, checked_totals};
pub use types::*;

//! Companies and their products, as served by the backend.

use serde::{Deserialize, Serialize};

use crate::cart::CartLine;
use crate::types::{CompanyId, CurrencyCode, Price, ProductId};

/// A tenant running its own storefront.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    /// URL-safe handle used in storefront paths (`/shop/{slug}`).
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub currency_code: CurrencyCode,
}

/// A product listed by a company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub company_id: CompanyId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
    /// Units on hand.
    #[serde(default)]
    pub stock: i32,
    #[serde(default = "default_active")]
    pub active: bool,
}

const fn default_active() -> bool {
    true
}

impl Product {
    /// Listed and in stock.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.active && self.stock > 0
    }

    /// A cart line for `quantity` units, capturing the current price.
    #[must_use]
    pub fn to_cart_line(&self, quantity: u32) -> CartLine {
        CartLine {
            product_id: self.id,
            name: self.name.clone(),
            unit_price: self.price,
            quantity,
            image_ref: self.image_ref.clone(),
        }
    }
}

//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness check
//! GET  /health/ready                    - Readiness check (session database)
//!
//! # Shop
//! GET  /shop/{company}                  - Product listing
//!
//! # Cart (HTMX fragments, redirects for plain form posts)
//! GET  /shop/{company}/cart             - Cart page
//! POST /shop/{company}/cart/add         - Add product (returns count badge, triggers cart-updated)
//! POST /shop/{company}/cart/update      - Update quantity (returns cart_items fragment)
//! POST /shop/{company}/cart/remove      - Remove line (returns cart_items fragment)
//! GET  /shop/{company}/cart/totals      - Totals fragment for ?shipping=
//!
//! # Checkout
//! GET  /shop/{company}/checkout         - Checkout form
//! POST /shop/{company}/checkout         - Submit order (rate limited)
//! ```

pub mod cart;
pub mod checkout;
pub mod shop;

use axum::{
    Router,
    routing::{get, post},
};
use serde::Deserialize;

use stockyard_core::Company;

use crate::backend::BackendError;
use crate::error::{AppError, Result};
use crate::middleware::checkout_rate_limiter;
use crate::state::AppState;

/// Path parameters shared by every shop route.
#[derive(Debug, Deserialize)]
pub struct ShopPath {
    pub company: String,
}

/// Resolve a shop slug, mapping unknown slugs to a 404.
pub(crate) async fn load_company(state: &AppState, slug: &str) -> Result<Company> {
    state
        .backend()
        .get_company(slug)
        .await
        .map_err(|e| match e {
            BackendError::NotFound(_) => AppError::NotFound(format!("shop {slug}")),
            e => AppError::Backend(e),
        })
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/totals", get(cart::totals))
}

/// Create the routes of one company's shop.
pub fn shop_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(shop::index))
        .nest("/cart", cart_routes())
        .route(
            "/checkout",
            get(checkout::show)
                .merge(post(checkout::submit).layer(checkout_rate_limiter())),
        )
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new().nest("/shop/{company}", shop_routes())
}

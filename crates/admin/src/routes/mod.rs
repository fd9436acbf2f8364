//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                                   - Health check
//! GET  /companies/{company}/orders               - Order list (?status=&payment_status=)
//! GET  /companies/{company}/orders/{id}          - Order detail
//! POST /companies/{company}/orders/{id}/status   - Set order and/or payment status
//! ```

pub mod orders;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
        .route("/{id}/status", post(orders::update_status))
}

/// Create all routes for the admin panel.
pub fn routes() -> Router<AppState> {
    Router::new().nest("/companies/{company}/orders", order_routes())
}

//! Stockyard admin library.
//!
//! Order lists, order detail and status changes for company staff, backed
//! by the records API.
//!
//! # Security
//!
//! This crate holds a records API token with order write access. It has no
//! login of its own; deploy it behind an authenticating proxy or keep it on
//! localhost.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod client;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod status;

pub use client::{AdminClient, AdminClientError, OrderFilter};

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the admin router with every layer except Sentry.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(routes::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

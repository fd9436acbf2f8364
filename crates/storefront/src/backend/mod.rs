//! Records API client.
//!
//! # Architecture
//!
//! - Companies, products and orders live in the external records API; this
//!   crate never stores them locally
//! - Plain JSON over HTTPS with a bearer token (`reqwest`)
//! - Companies and products are cached in memory via `moka` (5 minute TTL)
//! - Orders are never cached
//!
//! # Example
//!
//! ```rust,ignore
//! use stockyard_storefront::backend::BackendClient;
//!
//! let client = BackendClient::new(&config.backend)?;
//! let company = client.get_company("acme").await?;
//! let products = client.list_products(company.id).await?;
//! ```

mod cache;
mod client;

pub use client::BackendClient;

use thiserror::Error;

/// Errors that can occur when talking to the records API.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed (connection, TLS, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("Backend returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body.
        message: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the API.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),
}

impl BackendError {
    /// Message suitable for showing to a shopper.
    ///
    /// Validation messages from the API (4xx) are passed through; transport
    /// and server failures get a generic sentence.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { status, message } if (400..500).contains(status) && !message.is_empty() => {
                message.clone()
            }
            Self::NotFound(_) => "The requested item no longer exists.".to_string(),
            Self::RateLimited(_) => "Too many requests, please try again shortly.".to_string(),
            Self::Http(e) if e.is_timeout() => {
                "The order service timed out, please try again.".to_string()
            }
            _ => "The order service is unavailable, please try again.".to_string(),
        }
    }
}

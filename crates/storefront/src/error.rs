//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Server-side failures are
//! captured to Sentry before a response is built, and their details never
//! reach the client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::backend::BackendError;
use crate::cart_store::CartStoreError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Records API call failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Cart could not be loaded, changed or saved.
    #[error("Cart error: {0}")]
    Cart(#[from] CartStoreError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Backend(BackendError::NotFound(_)) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Backend(BackendError::Status { status, .. }) if *status < 500 => {
                StatusCode::BAD_REQUEST
            }
            Self::Backend(BackendError::RateLimited(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Backend(_) => StatusCode::BAD_GATEWAY,
            Self::Cart(CartStoreError::Cart(_)) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Cart(CartStoreError::Session(_)) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Backend(BackendError::NotFound(what)) => format!("Not found: {what}"),
            Self::Backend(e) => e.user_message(),
            Self::Cart(CartStoreError::Cart(e)) => e.to_string(),
            Self::Cart(CartStoreError::Session(_)) | Self::Internal(_) => {
                "Internal server error".to_string()
            }
            Self::NotFound(_) | Self::BadRequest(_) => self.to_string(),
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for shopper actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, String)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb
            .data
            .insert((*key).to_string(), serde_json::Value::String(value.clone()));
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use stockyard_core::{CartError, ProductId};

    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("company acme".to_string());
        assert_eq!(err.to_string(), "Not found: company acme");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Backend(BackendError::NotFound(
                "product 4".to_string()
            ))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Cart(CartStoreError::Cart(
                CartError::LineNotFound(ProductId::new(4))
            ))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Backend(BackendError::Status {
                status: 503,
                message: "down".to_string(),
            })),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(AppError::Backend(BackendError::RateLimited(3))),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

//! Unified error handling with Sentry integration.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::client::AdminClientError;

/// Application-level error type for the admin panel.
#[derive(Debug, Error)]
pub enum AppError {
    /// Records API call failed.
    #[error("Backend error: {0}")]
    Backend(#[from] AdminClientError),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Backend(AdminClientError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Backend(AdminClientError::Status { status, .. }) if *status < 500 => {
                StatusCode::BAD_REQUEST
            }
            Self::Backend(_) => StatusCode::BAD_GATEWAY,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Admins see validation messages from the API, never transport details
        let message = match &self {
            Self::Backend(AdminClientError::NotFound(what)) => format!("Not found: {what}"),
            Self::Backend(AdminClientError::Status { message, .. }) if status.is_client_error() => {
                message.clone()
            }
            Self::Backend(_) => "Records API unavailable".to_string(),
            Self::BadRequest(_) => self.to_string(),
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            AppError::Backend(AdminClientError::NotFound("order 9".to_string()))
                .into_response()
                .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Backend(AdminClientError::Status {
                status: 409,
                message: "order is locked".to_string(),
            })
            .into_response()
            .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Backend(AdminClientError::Status {
                status: 500,
                message: "boom".to_string(),
            })
            .into_response()
            .status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::BadRequest("invalid order status: lost".to_string())
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
    }
}

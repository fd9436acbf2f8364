//! Records API client with order write access.
//!
//! Orders are never cached here: an admin must always see the stored state
//! before changing it.

use std::time::Duration;

use reqwest::{RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::instrument;
use url::Url;

use stockyard_core::api::extract_error_message;
use stockyard_core::{CompanyId, Order, OrderId, OrderStatus, OrderStatusUpdate, PaymentStatus};

use crate::config::BackendConfig;

/// Errors that can occur when talking to the records API.
#[derive(Debug, Error)]
pub enum AdminClientError {
    /// HTTP request failed (connection, TLS, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("Backend returned {status}: {message}")]
    Status { status: u16, message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Optional filters for the order list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
}

impl OrderFilter {
    /// Query pairs understood by the records API.
    fn query_pairs(&self) -> Vec<(&'static str, &'static str)> {
        let mut pairs = Vec::new();
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str()));
        }
        if let Some(payment_status) = self.payment_status {
            pairs.push(("payment_status", payment_status.as_str()));
        }
        pairs
    }
}

/// Client for the records API's order endpoints.
#[derive(Clone)]
pub struct AdminClient {
    client: reqwest::Client,
    base: String,
    admin_token: SecretString,
}

impl AdminClient {
    /// Create a new admin API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, AdminClientError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(5))
            .user_agent(concat!("stockyard-admin/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base: config.base().to_string(),
            admin_token: config.admin_token.clone(),
        })
    }

    fn orders_url(&self, company_id: CompanyId) -> String {
        format!("{}/companies/{company_id}/orders", self.base)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        resource: &str,
    ) -> Result<T, AdminClientError> {
        let response = request
            .bearer_auth(self.admin_token.expose_secret())
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AdminClientError::NotFound(resource.to_string()));
        }

        let body = response.text().await?;
        if !status.is_success() {
            tracing::warn!(status = %status, "Records API returned non-success status");
            return Err(AdminClientError::Status {
                status: status.as_u16(),
                message: extract_error_message(&body),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// List a company's orders, newest first as returned by the API.
    ///
    /// # Errors
    ///
    /// Returns any transport, status or decoding error.
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        company_id: CompanyId,
        filter: &OrderFilter,
    ) -> Result<Vec<Order>, AdminClientError> {
        let url = Url::parse_with_params(&self.orders_url(company_id), filter.query_pairs())?;
        self.send(self.client.get(url), &format!("orders of company {company_id}"))
            .await
    }

    /// Fetch one order.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the company has no such order.
    #[instrument(skip(self))]
    pub async fn get_order(
        &self,
        company_id: CompanyId,
        order_id: OrderId,
    ) -> Result<Order, AdminClientError> {
        self.send(
            self.client
                .get(format!("{}/{order_id}", self.orders_url(company_id))),
            &format!("order {order_id}"),
        )
        .await
    }

    /// Patch an order's status labels and return the stored order.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown orders, or the API's message as `Status`.
    #[instrument(skip(self))]
    pub async fn update_order_status(
        &self,
        company_id: CompanyId,
        order_id: OrderId,
        update: &OrderStatusUpdate,
    ) -> Result<Order, AdminClientError> {
        self.send(
            self.client
                .patch(format!("{}/{order_id}", self.orders_url(company_id)))
                .json(update),
            &format!("order {order_id}"),
        )
        .await
    }
}

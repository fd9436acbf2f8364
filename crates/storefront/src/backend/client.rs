//! Records API client implementation.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::{RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use stockyard_core::api::extract_error_message;
use stockyard_core::{Company, CompanyId, Order, OrderDraft, Product, ProductId};

use super::cache::{CacheKey, CacheValue};
use super::BackendError;
use crate::checkout::OrderRecorder;
use crate::config::BackendConfig;

/// Catalog entries are cached for five minutes.
const CACHE_TTL: Duration = Duration::from_secs(300);

/// Client for the records API.
///
/// Cheap to clone; all clones share the HTTP connection pool and cache.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base: String,
    api_token: SecretString,
    cache: Cache<CacheKey, CacheValue>,
}

impl BackendClient {
    /// Create a new records API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("stockyard-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(CACHE_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                base: config.base().to_string(),
                api_token: config.api_token.clone(),
                cache,
            }),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base)
    }

    /// Send a request and decode the JSON response.
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        resource: &str,
    ) -> Result<T, BackendError> {
        let response = request
            .bearer_auth(self.inner.api_token.expose_secret())
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(BackendError::RateLimited(retry_after));
        }

        if status == StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound(resource.to_string()));
        }

        // Read the body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Records API returned non-success status"
            );
            return Err(BackendError::Status {
                status: status.as_u16(),
                message: extract_error_message(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse records API response"
            );
            BackendError::Parse(e)
        })
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Look up a company by its storefront slug.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown or malformed slugs, or any transport
    /// error. Malformed slugs never reach the records API.
    #[instrument(skip(self))]
    pub async fn get_company(&self, slug: &str) -> Result<Company, BackendError> {
        if !is_valid_slug(slug) {
            return Err(BackendError::NotFound(format!("company {slug}")));
        }

        let key = CacheKey::Company(slug.to_string());
        if let Some(CacheValue::Company(company)) = self.inner.cache.get(&key).await {
            debug!("cache hit");
            return Ok(*company);
        }

        let company: Company = self
            .send(
                self.inner.client.get(self.url(&format!("/companies/{slug}"))),
                &format!("company {slug}"),
            )
            .await?;

        self.inner
            .cache
            .insert(key, CacheValue::Company(Box::new(company.clone())))
            .await;
        Ok(company)
    }

    /// List a company's products.
    ///
    /// # Errors
    ///
    /// Returns any transport or decoding error.
    #[instrument(skip(self))]
    pub async fn list_products(&self, company_id: CompanyId) -> Result<Vec<Product>, BackendError> {
        let key = CacheKey::Products(company_id);
        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&key).await {
            debug!("cache hit");
            return Ok(products);
        }

        let products: Vec<Product> = self
            .send(
                self.inner
                    .client
                    .get(self.url(&format!("/companies/{company_id}/products"))),
                &format!("products of company {company_id}"),
            )
            .await?;

        self.inner
            .cache
            .insert(key, CacheValue::Products(products.clone()))
            .await;
        Ok(products)
    }

    /// Fetch a single product, from the cached listing when possible.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the company has no such product.
    #[instrument(skip(self))]
    pub async fn get_product(
        &self,
        company_id: CompanyId,
        product_id: ProductId,
    ) -> Result<Product, BackendError> {
        let key = CacheKey::Products(company_id);
        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&key).await
            && let Some(product) = products.into_iter().find(|p| p.id == product_id)
        {
            return Ok(product);
        }

        let product: Product = self
            .send(
                self.inner.client.get(
                    self.url(&format!("/companies/{company_id}/products/{product_id}")),
                ),
                &format!("product {product_id}"),
            )
            .await?;

        // Tenancy is enforced by the API, but a mismatched record must never
        // reach a cart.
        if product.company_id != company_id {
            return Err(BackendError::NotFound(format!("product {product_id}")));
        }
        Ok(product)
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Record a new order. The API assigns the ID and timestamp.
    ///
    /// # Errors
    ///
    /// Returns the API's validation message as `Status`, or any transport error.
    #[instrument(skip(self, draft), fields(company_id = %draft.company_id, total = %draft.total))]
    pub async fn create_order(&self, draft: &OrderDraft) -> Result<Order, BackendError> {
        let order: Order = self
            .send(
                self.inner
                    .client
                    .post(self.url(&format!("/companies/{}/orders", draft.company_id)))
                    .json(draft),
                "orders",
            )
            .await?;

        tracing::info!(order_id = %order.id, "Order recorded");
        Ok(order)
    }
}

impl OrderRecorder for BackendClient {
    async fn record(&self, draft: &OrderDraft) -> Result<Order, BackendError> {
        self.create_order(draft).await
    }
}

/// Slugs are non-empty runs of lowercase ASCII letters, digits and `-`.
fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use url::Url;

    fn client(base: &str) -> BackendClient {
        BackendClient::new(&BackendConfig {
            url: Url::parse(base).unwrap(),
            api_token: SecretString::from("tok_9fQ2xLm7Vb3Kp8Zr"),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let client = client("http://localhost:8080/v1/");
        assert_eq!(
            client.url("/companies/acme"),
            "http://localhost:8080/v1/companies/acme"
        );
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_http_error() {
        // Port 9 (discard) is closed on CI machines
        let client = client("http://127.0.0.1:9");
        let err = client.get_company("acme").await.unwrap_err();
        assert!(matches!(err, BackendError::Http(_)));
    }

    #[test]
    fn test_slug_validation() {
        assert!(is_valid_slug("acme"));
        assert!(is_valid_slug("oak-and-pine-2"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("acme/products/1"));
        assert!(!is_valid_slug("acme?limit=1"));
        assert!(!is_valid_slug("../admin"));
        assert!(!is_valid_slug("Acme"));
    }

    #[tokio::test]
    async fn test_path_like_slug_is_not_found_without_request() {
        // an Http error here would mean the slug was sent upstream
        let client = client("http://127.0.0.1:9");
        for slug in ["acme/products/1", "acme?x=1", "..", ""] {
            let err = client.get_company(slug).await.unwrap_err();
            assert!(matches!(err, BackendError::NotFound(_)), "{slug}: {err:?}");
        }
        assert_eq!(client.inner.cache.entry_count(), 0);
    }
}

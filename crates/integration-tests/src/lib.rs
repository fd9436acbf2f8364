//! Integration tests for Stockyard.
//!
//! Every test runs real servers on ephemeral ports: an in-process records
//! API ([`MockBackend`]) plus the storefront and admin routers pointed at
//! it. Sessions are kept in memory, so no database is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p stockyard-integration-tests
//! ```

#![allow(clippy::missing_panics_doc)]

pub mod mock_backend;

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use axum::Router;
use secrecy::SecretString;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_sessions::MemoryStore;
use url::Url;

pub use mock_backend::MockBackend;

/// Token the storefront sends to the records API.
pub const API_TOKEN: &str = "tok_9fQ2xLm7Vb3Kp8Zr";

/// Token the admin sends to the records API.
pub const ADMIN_TOKEN: &str = "adm_Q7rT2wLx9Kc4Vn8Hb";

/// Serve `router` on an ephemeral port and return its base URL.
///
/// The server lives until the test's runtime shuts down.
pub async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no address");

    tokio::spawn(async move {
        let _ = axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await;
    });

    format!("http://{addr}")
}

/// Start a storefront that talks to the records API at `backend_url`.
pub async fn spawn_storefront(backend_url: &str) -> String {
    use stockyard_storefront::config::{BackendConfig, StorefrontConfig};

    let config = StorefrontConfig {
        database_url: SecretString::from("postgres://stockyard@localhost/unused"),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        base_url: "http://127.0.0.1".to_string(),
        backend: BackendConfig {
            url: Url::parse(backend_url).expect("Invalid backend URL"),
            api_token: SecretString::from(API_TOKEN),
            timeout: Duration::from_secs(5),
        },
        sentry_dsn: None,
        sentry_environment: None,
    };

    // Only /health/ready touches the pool; it never connects in these tests
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://stockyard@localhost/unused")
        .expect("Failed to create lazy pool");

    let state = stockyard_storefront::state::AppState::new(config, pool)
        .expect("Failed to build storefront state");

    serve(stockyard_storefront::app(state, MemoryStore::default())).await
}

/// Start an admin server that talks to the records API at `backend_url`.
pub async fn spawn_admin(backend_url: &str) -> String {
    use stockyard_admin::config::{AdminConfig, BackendConfig};

    let config = AdminConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        backend: BackendConfig {
            url: Url::parse(backend_url).expect("Invalid backend URL"),
            admin_token: SecretString::from(ADMIN_TOKEN),
            timeout: Duration::from_secs(5),
        },
        sentry_dsn: None,
        sentry_environment: None,
    };

    let state =
        stockyard_admin::state::AppState::new(config).expect("Failed to build admin state");

    serve(stockyard_admin::app(state)).await
}

/// A browser-like client: keeps cookies and follows redirects.
#[must_use]
pub fn browser() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

//! In-process records API.
//!
//! Serves the endpoints the storefront and admin call, backed by vectors
//! behind a mutex. Tests seed it, flip it into failure modes and inspect
//! what was recorded.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Utc;
use serde_json::{Value, json};

use stockyard_core::{
    Company, CompanyId, CurrencyCode, Order, OrderDraft, OrderId, OrderStatusUpdate, Price,
    Product, ProductId,
};

/// Slug of the seeded company.
pub const SHOP: &str = "acme";

/// ID of the seeded company.
pub const COMPANY: CompanyId = CompanyId::new(1);

/// In stock, $100.00.
pub const OAK_CRATE: ProductId = ProductId::new(1);

/// Out of stock, $12.50.
pub const PINE_CRATE: ProductId = ProductId::new(2);

/// Delisted.
pub const OLD_CRATE: ProductId = ProductId::new(3);

type ApiError = (StatusCode, Json<Value>);
type ApiResult<T> = Result<Json<T>, ApiError>;

fn api_error(status: StatusCode, message: &str) -> ApiError {
    (status, Json(json!({ "message": message })))
}

fn not_found(what: &str) -> ApiError {
    api_error(StatusCode::NOT_FOUND, &format!("{what} not found"))
}

#[derive(Default)]
struct Inner {
    companies: Mutex<Vec<Company>>,
    products: Mutex<Vec<Product>>,
    orders: Mutex<Vec<Order>>,
    reject_orders: Mutex<Option<(StatusCode, String)>>,
    order_delay: Mutex<Option<Duration>>,
}

/// Handle to the mock API's data. Clones share state.
#[derive(Clone, Default)]
pub struct MockBackend {
    inner: Arc<Inner>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().expect("Mock backend state poisoned")
}

fn product(id: ProductId, name: &str, cents: i64, stock: i32, active: bool) -> Product {
    Product {
        id,
        company_id: COMPANY,
        name: name.to_string(),
        description: None,
        price: Price::usd_cents(cents),
        image_ref: None,
        stock,
        active,
    }
}

impl MockBackend {
    /// One company ("acme") with three products.
    #[must_use]
    pub fn seeded() -> Self {
        let backend = Self::default();
        lock(&backend.inner.companies).push(Company {
            id: COMPANY,
            slug: SHOP.to_string(),
            name: "Acme Crates".to_string(),
            currency_code: CurrencyCode::USD,
        });
        lock(&backend.inner.products).extend([
            product(OAK_CRATE, "Oak crate", 10_000, 5, true),
            product(PINE_CRATE, "Pine crate", 1_250, 0, true),
            product(OLD_CRATE, "Old crate", 500, 9, false),
        ]);
        backend
    }

    /// Answer every order creation with `status` and `message`.
    pub fn reject_orders(&self, status: StatusCode, message: &str) {
        *lock(&self.inner.reject_orders) = Some((status, message.to_string()));
    }

    /// Hold every order creation for `delay` before answering.
    pub fn delay_orders(&self, delay: Duration) {
        *lock(&self.inner.order_delay) = Some(delay);
    }

    /// Orders recorded so far.
    #[must_use]
    pub fn orders(&self) -> Vec<Order> {
        lock(&self.inner.orders).clone()
    }

    /// Record `draft` as if a shopper had checked out.
    pub fn insert_order(&self, draft: OrderDraft) -> Order {
        let mut orders = lock(&self.inner.orders);
        let id = OrderId::new(1000 + i32::try_from(orders.len()).unwrap_or(i32::MAX - 1000));
        let order = Order::from_draft(id, Utc::now(), draft);
        orders.push(order.clone());
        order
    }

    /// Serve the API on an ephemeral port and return its base URL.
    pub async fn spawn(&self) -> String {
        crate::serve(self.router()).await
    }

    fn router(&self) -> Router {
        Router::new()
            .route("/companies/{company}", get(get_company))
            .route("/companies/{company}/products", get(list_products))
            .route("/companies/{company}/products/{id}", get(get_product))
            .route(
                "/companies/{company}/orders",
                get(list_orders).post(create_order),
            )
            .route(
                "/companies/{company}/orders/{id}",
                get(get_order).patch(update_order),
            )
            .layer(middleware::from_fn(require_bearer))
            .with_state(self.clone())
    }
}

async fn require_bearer(request: Request, next: Next) -> Response {
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Bearer ") && v.len() > "Bearer ".len());

    if !authorized {
        return api_error(StatusCode::UNAUTHORIZED, "missing bearer token").into_response();
    }
    next.run(request).await
}

async fn get_company(
    State(backend): State<MockBackend>,
    Path(slug): Path<String>,
) -> ApiResult<Company> {
    lock(&backend.inner.companies)
        .iter()
        .find(|c| c.slug == slug)
        .cloned()
        .map(Json)
        .ok_or_else(|| not_found("company"))
}

async fn list_products(
    State(backend): State<MockBackend>,
    Path(company): Path<CompanyId>,
) -> ApiResult<Vec<Product>> {
    Ok(Json(
        lock(&backend.inner.products)
            .iter()
            .filter(|p| p.company_id == company)
            .cloned()
            .collect(),
    ))
}

async fn get_product(
    State(backend): State<MockBackend>,
    Path((company, id)): Path<(CompanyId, ProductId)>,
) -> ApiResult<Product> {
    lock(&backend.inner.products)
        .iter()
        .find(|p| p.company_id == company && p.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| not_found("product"))
}

async fn create_order(
    State(backend): State<MockBackend>,
    Path(company): Path<CompanyId>,
    Json(draft): Json<OrderDraft>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let delay = *lock(&backend.inner.order_delay);
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    if let Some((status, message)) = lock(&backend.inner.reject_orders).clone() {
        return Err(api_error(status, &message));
    }
    if draft.company_id != company {
        return Err(api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "company does not match path",
        ));
    }
    Ok((StatusCode::CREATED, Json(backend.insert_order(draft))))
}

async fn list_orders(
    State(backend): State<MockBackend>,
    Path(company): Path<CompanyId>,
    Query(filter): Query<HashMap<String, String>>,
) -> ApiResult<Vec<Order>> {
    let status = filter.get("status");
    let payment_status = filter.get("payment_status");

    Ok(Json(
        lock(&backend.inner.orders)
            .iter()
            .rev()
            .filter(|o| o.company_id == company)
            .filter(|o| status.is_none_or(|s| o.status.as_str() == s))
            .filter(|o| payment_status.is_none_or(|s| o.payment.status.as_str() == s))
            .cloned()
            .collect(),
    ))
}

async fn get_order(
    State(backend): State<MockBackend>,
    Path((company, id)): Path<(CompanyId, OrderId)>,
) -> ApiResult<Order> {
    lock(&backend.inner.orders)
        .iter()
        .find(|o| o.company_id == company && o.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| not_found("order"))
}

async fn update_order(
    State(backend): State<MockBackend>,
    Path((company, id)): Path<(CompanyId, OrderId)>,
    Json(update): Json<OrderStatusUpdate>,
) -> ApiResult<Order> {
    let mut orders = lock(&backend.inner.orders);
    let order = orders
        .iter_mut()
        .find(|o| o.company_id == company && o.id == id)
        .ok_or_else(|| not_found("order"))?;
    order.apply(&update);
    Ok(Json(order.clone()))
}

//! Order management route handlers.

use std::str::FromStr;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tracing::instrument;

use stockyard_core::{
    CompanyId, Order, OrderId, OrderStatus, OrderStatusUpdate, ParseStatusError, PaymentStatus,
};

use crate::client::OrderFilter;
use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::status::set_status;

/// Path of the order list.
#[derive(Debug, Deserialize)]
pub struct CompanyPath {
    pub company: CompanyId,
}

/// Path of a single order.
#[derive(Debug, Deserialize)]
pub struct OrderPath {
    pub company: CompanyId,
    pub id: OrderId,
}

/// Order list filters. Blank values mean "any".
#[derive(Debug, Default, Deserialize)]
pub struct OrdersQuery {
    pub status: Option<String>,
    pub payment_status: Option<String>,
}

/// Order detail query.
#[derive(Debug, Default, Deserialize)]
pub struct ShowQuery {
    #[serde(default)]
    pub updated: bool,
}

/// Status update form. A blank field leaves that status unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StatusForm {
    pub status: String,
    pub payment_status: String,
}

/// Parse an optional enum value, treating blank as absent.
fn parse_optional<T>(value: Option<&str>) -> Result<Option<T>>
where
    T: FromStr<Err = ParseStatusError>,
{
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|e: ParseStatusError| AppError::BadRequest(e.to_string())),
    }
}

impl StatusForm {
    fn to_update(&self) -> Result<OrderStatusUpdate> {
        Ok(OrderStatusUpdate {
            status: parse_optional(Some(&self.status))?,
            payment_status: parse_optional(Some(&self.payment_status))?,
        })
    }
}

// =============================================================================
// View Models
// =============================================================================

/// One entry of a select box.
#[derive(Debug, Clone)]
pub struct SelectOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

fn status_options(selected: Option<OrderStatus>) -> Vec<SelectOption> {
    OrderStatus::ALL
        .into_iter()
        .map(|status| SelectOption {
            value: status.as_str(),
            label: status.label(),
            selected: Some(status) == selected,
        })
        .collect()
}

fn payment_status_options(selected: Option<PaymentStatus>) -> Vec<SelectOption> {
    PaymentStatus::ALL
        .into_iter()
        .map(|status| SelectOption {
            value: status.as_str(),
            label: status.label(),
            selected: Some(status) == selected,
        })
        .collect()
}

/// Order row for the list page.
#[derive(Debug, Clone)]
pub struct OrderRowView {
    pub id: String,
    pub customer_name: String,
    pub total: String,
    pub status: &'static str,
    pub status_value: &'static str,
    pub payment_status: &'static str,
    pub item_count: u32,
    pub created_at: String,
}

impl From<&Order> for OrderRowView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            customer_name: order.customer.name.clone(),
            total: order.total.to_string(),
            status: order.status.label(),
            status_value: order.status.as_str(),
            payment_status: order.payment.status.label(),
            item_count: order.item_count(),
            created_at: order.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Order line for the detail page.
#[derive(Debug, Clone)]
pub struct LineItemView {
    pub name: String,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
}

/// Order detail view.
#[derive(Debug, Clone)]
pub struct OrderDetailView {
    pub row: OrderRowView,
    pub email: String,
    pub phone: Option<String>,
    pub address_lines: Vec<String>,
    pub items: Vec<LineItemView>,
    pub subtotal: String,
    pub shipping: String,
    pub shipping_method: &'static str,
    pub payment_method: &'static str,
}

impl From<&Order> for OrderDetailView {
    fn from(order: &Order) -> Self {
        let address = &order.customer.address;
        let locality = [
            Some(address.city.as_str()),
            address.region.as_deref(),
            Some(address.postal_code.as_str()),
        ]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ");

        let address_lines = [
            Some(address.line1.clone()),
            address.line2.clone(),
            Some(locality),
            Some(address.country.clone()),
        ]
        .into_iter()
        .flatten()
        .filter(|line| !line.is_empty())
        .collect();

        Self {
            row: OrderRowView::from(order),
            email: order.customer.email.to_string(),
            phone: order.customer.phone.clone(),
            address_lines,
            items: order
                .items
                .iter()
                .map(|item| LineItemView {
                    name: item.name.clone(),
                    quantity: item.quantity,
                    unit_price: item.unit_price.to_string(),
                    line_total: item.line_total().to_string(),
                })
                .collect(),
            subtotal: order.subtotal.to_string(),
            shipping: order.shipping.to_string(),
            shipping_method: order.shipping_method.label(),
            payment_method: order.payment.method.label(),
        }
    }
}

/// Orders list page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub company_id: i32,
    pub orders: Vec<OrderRowView>,
    pub status_options: Vec<SelectOption>,
    pub payment_status_options: Vec<SelectOption>,
}

/// Order detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub company_id: i32,
    pub order: OrderDetailView,
    pub status_options: Vec<SelectOption>,
    pub payment_status_options: Vec<SelectOption>,
    pub updated: bool,
}

// =============================================================================
// Handlers
// =============================================================================

/// Orders list page handler.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Path(CompanyPath { company }): Path<CompanyPath>,
    Query(query): Query<OrdersQuery>,
) -> Result<impl IntoResponse> {
    let filter = OrderFilter {
        status: parse_optional(query.status.as_deref())?,
        payment_status: parse_optional(query.payment_status.as_deref())?,
    };

    let orders = state.client().list_orders(company, &filter).await?;

    Ok(OrdersIndexTemplate {
        company_id: company.as_i32(),
        orders: orders.iter().map(OrderRowView::from).collect(),
        status_options: status_options(filter.status),
        payment_status_options: payment_status_options(filter.payment_status),
    })
}

/// Order detail page handler.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(OrderPath { company, id }): Path<OrderPath>,
    Query(query): Query<ShowQuery>,
) -> Result<impl IntoResponse> {
    let order = state.client().get_order(company, id).await?;

    Ok(OrderShowTemplate {
        company_id: company.as_i32(),
        status_options: status_options(Some(order.status)),
        payment_status_options: payment_status_options(Some(order.payment.status)),
        order: OrderDetailView::from(&order),
        updated: query.updated,
    })
}

/// Set an order's status and/or payment status.
///
/// Any enumerated value is accepted; questionable changes are only logged.
#[instrument(skip(state))]
pub async fn update_status(
    State(state): State<AppState>,
    Path(OrderPath { company, id }): Path<OrderPath>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect> {
    let update = form.to_update()?;
    set_status(state.client(), company, id, &update).await?;

    Ok(Redirect::to(&format!(
        "/companies/{company}/orders/{id}?updated=true"
    )))
}

//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! Plain form posts (no `HX-Request` header) are answered with a redirect
//! back to the cart page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use stockyard_core::{
    Cart, CartLine, Company, CurrencyCode, OrderTotals, Price, ProductId, ShippingMethod,
};

use crate::cart_store::{CartService, SessionCartStore};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::routes::{ShopPath, load_company};
use crate::state::AppState;

// =============================================================================
// View Models
// =============================================================================

/// Company display data for templates.
#[derive(Clone)]
pub struct CompanyView {
    pub slug: String,
    pub name: String,
}

impl From<&Company> for CompanyView {
    fn from(company: &Company) -> Self {
        Self {
            slug: company.slug.clone(),
            name: company.name.clone(),
        }
    }
}

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub product_id: i32,
    pub name: String,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
    pub image_ref: Option<String>,
}

impl From<&CartLine> for CartItemView {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id.as_i32(),
            name: line.name.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price.to_string(),
            line_total: line.line_total().to_string(),
            image_ref: line.image_ref.clone(),
        }
    }
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub item_count: u32,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.lines().iter().map(CartItemView::from).collect(),
            item_count: cart.item_count(),
        }
    }
}

impl CartView {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Totals display data for templates.
#[derive(Clone)]
pub struct TotalsView {
    pub subtotal: String,
    pub shipping_fee: String,
    pub total: String,
    pub shipping: &'static str,
}

impl TotalsView {
    #[must_use]
    pub fn new(totals: &OrderTotals, method: ShippingMethod) -> Self {
        Self {
            subtotal: totals.subtotal.to_string(),
            shipping_fee: totals.shipping_fee.to_string(),
            total: totals.total.to_string(),
            shipping: method.as_str(),
        }
    }
}

/// One entry of the shipping method selector.
#[derive(Clone)]
pub struct ShippingOption {
    pub value: &'static str,
    pub label: String,
    pub selected: bool,
}

/// Shipping selector entries with fees shown in `currency`.
#[must_use]
pub fn shipping_options(selected: ShippingMethod, currency: CurrencyCode) -> Vec<ShippingOption> {
    ShippingMethod::ALL
        .into_iter()
        .map(|method| ShippingOption {
            value: method.as_str(),
            label: format!(
                "{} ({})",
                method.label(),
                Price::new(method.fee(), currency)
            ),
            selected: method == selected,
        })
        .collect()
}

/// Parse the `shipping` query or form value. Blank means the default tier.
///
/// # Errors
///
/// Returns `BadRequest` for unknown shipping methods.
pub fn parse_shipping(value: Option<&str>) -> Result<ShippingMethod> {
    match value.map(str::trim) {
        None | Some("") => Ok(ShippingMethod::default()),
        Some(value) => value
            .parse()
            .map_err(|e: stockyard_core::ParseStatusError| AppError::BadRequest(e.to_string())),
    }
}

// =============================================================================
// Forms and Templates
// =============================================================================

/// Query string for pages showing totals.
#[derive(Debug, Default, Deserialize)]
pub struct ShippingQuery {
    pub shipping: Option<String>,
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: ProductId,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: ProductId,
    pub quantity: u32,
    pub shipping: Option<String>,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: ProductId,
    pub shipping: Option<String>,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub company: CompanyView,
    pub cart: CartView,
    pub totals: TotalsView,
    pub shipping_options: Vec<ShippingOption>,
}

/// Cart items plus totals fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub company: CompanyView,
    pub cart: CartView,
    pub totals: TotalsView,
}

/// Totals fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/totals.html")]
pub struct TotalsTemplate {
    pub totals: TotalsView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

fn is_htmx(headers: &HeaderMap) -> bool {
    headers.contains_key("hx-request")
}

fn cart_path(company: &Company) -> String {
    format!("/shop/{}/cart", company.slug)
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(state, cart))]
pub async fn show(
    State(state): State<AppState>,
    Path(ShopPath { company }): Path<ShopPath>,
    Query(query): Query<ShippingQuery>,
    cart: CartService<SessionCartStore>,
) -> Result<impl IntoResponse> {
    let company = load_company(&state, &company).await?;
    let method = parse_shipping(query.shipping.as_deref())?;
    let (current, totals) = cart.view(company.id, method).await?;

    Ok(CartShowTemplate {
        company: CompanyView::from(&company),
        cart: CartView::from(&current),
        totals: TotalsView::new(&totals, method),
        shipping_options: shipping_options(method, company.currency_code),
    })
}

/// Totals for the current cart and a shipping method (HTMX).
#[instrument(skip(state, cart))]
pub async fn totals(
    State(state): State<AppState>,
    Path(ShopPath { company }): Path<ShopPath>,
    Query(query): Query<ShippingQuery>,
    cart: CartService<SessionCartStore>,
) -> Result<impl IntoResponse> {
    let company = load_company(&state, &company).await?;
    let method = parse_shipping(query.shipping.as_deref())?;
    let (_, totals) = cart.view(company.id, method).await?;

    Ok(TotalsTemplate {
        totals: TotalsView::new(&totals, method),
    })
}

/// Add a product to the cart.
///
/// Name, price and image are snapshotted from the current catalog entry.
#[instrument(skip(state, cart, headers))]
pub async fn add(
    State(state): State<AppState>,
    Path(ShopPath { company }): Path<ShopPath>,
    headers: HeaderMap,
    cart: CartService<SessionCartStore>,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let company = load_company(&state, &company).await?;
    let product = state
        .backend()
        .get_product(company.id, form.product_id)
        .await?;

    if !product.is_available() {
        return Err(AppError::BadRequest(format!(
            "{} is out of stock",
            product.name
        )));
    }

    let quantity = form.quantity.unwrap_or(1);
    let updated = cart.add(company.id, product.to_cart_line(quantity)).await?;

    add_breadcrumb(
        "cart",
        "Added to cart",
        &[
            ("product_id", product.id.to_string()),
            ("quantity", quantity.to_string()),
        ],
    );

    if !is_htmx(&headers) {
        return Ok(Redirect::to(&cart_path(&company)).into_response());
    }

    Ok((
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartCountTemplate {
            count: updated.item_count(),
        },
    )
        .into_response())
}

/// Update a line's quantity.
#[instrument(skip(state, cart, headers))]
pub async fn update(
    State(state): State<AppState>,
    Path(ShopPath { company }): Path<ShopPath>,
    headers: HeaderMap,
    cart: CartService<SessionCartStore>,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let company = load_company(&state, &company).await?;
    let method = parse_shipping(form.shipping.as_deref())?;
    let updated = cart
        .update_quantity(company.id, form.product_id, form.quantity)
        .await?;

    Ok(items_response(&headers, &company, &updated, method))
}

/// Remove a line.
#[instrument(skip(state, cart, headers))]
pub async fn remove(
    State(state): State<AppState>,
    Path(ShopPath { company }): Path<ShopPath>,
    headers: HeaderMap,
    cart: CartService<SessionCartStore>,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let company = load_company(&state, &company).await?;
    let method = parse_shipping(form.shipping.as_deref())?;
    let updated = cart.remove(company.id, form.product_id).await?;

    Ok(items_response(&headers, &company, &updated, method))
}

fn items_response(
    headers: &HeaderMap,
    company: &Company,
    cart: &Cart,
    method: ShippingMethod,
) -> Response {
    if !is_htmx(headers) {
        return Redirect::to(&format!("{}?shipping={method}", cart_path(company))).into_response();
    }

    (
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartItemsTemplate {
            company: CompanyView::from(company),
            cart: CartView::from(cart),
            totals: TotalsView::new(&cart.totals(method), method),
        },
    )
        .into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shipping() {
        assert_eq!(parse_shipping(None).unwrap(), ShippingMethod::Standard);
        assert_eq!(parse_shipping(Some(" ")).unwrap(), ShippingMethod::Standard);
        assert_eq!(
            parse_shipping(Some("express")).unwrap(),
            ShippingMethod::Express
        );
        assert!(matches!(
            parse_shipping(Some("overnight")),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_shipping_options_show_fees() {
        let options = shipping_options(ShippingMethod::Express, CurrencyCode::USD);
        let labels: Vec<_> = options.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(
            labels,
            ["Free shipping ($0.00)", "Standard ($10.00)", "Express ($25.00)"]
        );
        assert!(options[2].selected);
        assert!(!options[1].selected);
    }

    #[test]
    fn test_cart_template_renders_totals() {
        let mut cart = Cart::new(stockyard_core::CompanyId::new(1));
        cart.add(
            stockyard_core::CompanyId::new(1),
            CartLine::new(ProductId::new(9), "Oak crate", Price::usd_cents(10_000), 2),
        )
        .unwrap();
        let method = ShippingMethod::Standard;

        let html = CartItemsTemplate {
            company: CompanyView {
                slug: "acme".to_string(),
                name: "Acme".to_string(),
            },
            cart: CartView::from(&cart),
            totals: TotalsView::new(&cart.totals(method), method),
        }
        .render()
        .unwrap();

        assert!(html.contains("Oak crate"));
        assert!(html.contains("$200.00"));
        assert!(html.contains("$10.00"));
        assert!(html.contains("$210.00"));
    }
}

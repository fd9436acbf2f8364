//! Checkout route handlers.
//!
//! A failed submission re-renders the form with the shopper's input and a
//! message; the cart is left as it was. A successful one renders the
//! confirmation page directly.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use stockyard_core::{Company, CustomerDetails, Email, Order, PaymentMethod, ShippingAddress};

use crate::cart_store::{CartService, SessionCartStore};
use crate::checkout::{CheckoutError, CheckoutRequest, submit_order};
use crate::error::{Result, add_breadcrumb};
use crate::routes::cart::{
    CartItemView, CartView, CompanyView, ShippingOption, ShippingQuery, TotalsView,
    parse_shipping, shipping_options,
};
use crate::routes::{ShopPath, load_company};
use crate::state::AppState;

/// Checkout form data.
///
/// Every field defaults to empty so that incomplete submissions reach
/// validation and come back with a readable message.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CheckoutForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub line1: String,
    pub line2: String,
    pub city: String,
    pub region: String,
    pub postal_code: String,
    pub country: String,
    pub payment_method: String,
    pub shipping: String,
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl CheckoutForm {
    /// Convert the raw form into a checkout request.
    ///
    /// # Errors
    ///
    /// Returns the message to show when the email, payment method or
    /// shipping method cannot be parsed. Blank required fields are left to
    /// order assembly.
    pub fn to_request(&self) -> std::result::Result<CheckoutRequest, String> {
        let email = Email::parse(&self.email).map_err(|e| match e {
            stockyard_core::EmailError::Empty => "Email is required.".to_string(),
            _ => "Please enter a valid email address.".to_string(),
        })?;
        let payment_method = self
            .payment_method
            .parse::<PaymentMethod>()
            .map_err(|_| "Please choose a payment method.".to_string())?;
        let shipping_method = parse_shipping(Some(&self.shipping))
            .map_err(|_| "Please choose a shipping method.".to_string())?;

        Ok(CheckoutRequest {
            customer: CustomerDetails {
                name: self.name.trim().to_string(),
                email,
                phone: non_empty(&self.phone),
                address: ShippingAddress {
                    line1: self.line1.trim().to_string(),
                    line2: non_empty(&self.line2),
                    city: self.city.trim().to_string(),
                    region: non_empty(&self.region),
                    postal_code: self.postal_code.trim().to_string(),
                    country: self.country.trim().to_string(),
                },
            },
            payment_method,
            shipping_method,
        })
    }
}

/// One entry of the payment method selector.
#[derive(Clone)]
pub struct PaymentOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

fn payment_options(selected: &str) -> Vec<PaymentOption> {
    let selected = selected.parse::<PaymentMethod>().unwrap_or_default();
    PaymentMethod::ALL
        .into_iter()
        .map(|method| PaymentOption {
            value: method.as_str(),
            label: method.label(),
            selected: method == selected,
        })
        .collect()
}

/// Checkout form template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub company: CompanyView,
    pub cart: CartView,
    pub totals: TotalsView,
    pub form: CheckoutForm,
    pub shipping_options: Vec<ShippingOption>,
    pub payment_options: Vec<PaymentOption>,
    pub error: Option<String>,
}

/// Order confirmation display data.
#[derive(Clone)]
pub struct OrderView {
    pub id: String,
    pub customer_name: String,
    pub email: String,
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub shipping: String,
    pub total: String,
    pub shipping_method: &'static str,
    pub payment_method: &'static str,
    pub status: &'static str,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            customer_name: order.customer.name.clone(),
            email: order.customer.email.to_string(),
            items: order
                .items
                .iter()
                .map(|item| CartItemView {
                    product_id: item.product_id.as_i32(),
                    name: item.name.clone(),
                    quantity: item.quantity,
                    unit_price: item.unit_price.to_string(),
                    line_total: item.line_total().to_string(),
                    image_ref: None,
                })
                .collect(),
            subtotal: order.subtotal.to_string(),
            shipping: order.shipping.to_string(),
            total: order.total.to_string(),
            shipping_method: order.shipping_method.label(),
            payment_method: order.payment.method.label(),
            status: order.status.label(),
        }
    }
}

/// Order confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/confirmation.html")]
pub struct ConfirmationTemplate {
    pub company: CompanyView,
    pub order: OrderView,
}

async fn render_form(
    company: &Company,
    cart: &CartService<SessionCartStore>,
    form: CheckoutForm,
    error: Option<String>,
) -> Result<CheckoutTemplate> {
    let method = parse_shipping(Some(&form.shipping)).unwrap_or_default();
    let (current, totals) = cart.view(company.id, method).await?;

    Ok(CheckoutTemplate {
        company: CompanyView::from(company),
        cart: CartView::from(&current),
        totals: TotalsView::new(&totals, method),
        shipping_options: shipping_options(method, company.currency_code),
        payment_options: payment_options(&form.payment_method),
        form,
        error,
    })
}

const fn error_status(error: &CheckoutError, server_error: bool) -> StatusCode {
    if server_error {
        return StatusCode::BAD_GATEWAY;
    }
    match error {
        CheckoutError::AlreadySubmitting => StatusCode::CONFLICT,
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

/// Display the checkout form.
#[instrument(skip(state, cart))]
pub async fn show(
    State(state): State<AppState>,
    Path(ShopPath { company }): Path<ShopPath>,
    Query(query): Query<ShippingQuery>,
    cart: CartService<SessionCartStore>,
) -> Result<Response> {
    let company = load_company(&state, &company).await?;
    let method = parse_shipping(query.shipping.as_deref())?;

    let form = CheckoutForm {
        shipping: method.as_str().to_string(),
        payment_method: PaymentMethod::default().as_str().to_string(),
        ..CheckoutForm::default()
    };
    let page = render_form(&company, &cart, form, None).await?;

    if page.cart.is_empty() {
        return Ok(Redirect::to(&format!("/shop/{}/cart", company.slug)).into_response());
    }

    Ok(page.into_response())
}

/// Submit the order.
#[instrument(skip(state, cart, form), fields(shipping = %form.shipping))]
pub async fn submit(
    State(state): State<AppState>,
    Path(ShopPath { company }): Path<ShopPath>,
    cart: CartService<SessionCartStore>,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let company = load_company(&state, &company).await?;

    let request = match form.to_request() {
        Ok(request) => request,
        Err(message) => {
            let page = render_form(&company, &cart, form, Some(message)).await?;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    match submit_order(cart.store(), state.backend(), company.id, request).await {
        Ok(order) => {
            add_breadcrumb(
                "checkout",
                "Order placed",
                &[
                    ("order_id", order.id.to_string()),
                    ("total", order.total.to_string()),
                ],
            );
            Ok(ConfirmationTemplate {
                company: CompanyView::from(&company),
                order: OrderView::from(&order),
            }
            .into_response())
        }
        Err(e) => {
            let server_error = e.is_server_error();
            if server_error {
                let event_id = sentry::capture_error(&e);
                tracing::error!(error = %e, sentry_event_id = %event_id, "Checkout failed");
            }
            let status = error_status(&e, server_error);
            let page = render_form(&company, &cart, form, Some(e.user_message())).await?;
            Ok((status, page).into_response())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use stockyard_core::ShippingMethod;

    use super::*;

    fn filled_form() -> CheckoutForm {
        CheckoutForm {
            name: " Ada Lovelace ".to_string(),
            email: "ada@Example.COM".to_string(),
            phone: String::new(),
            line1: "12 Analytical St".to_string(),
            line2: "  ".to_string(),
            city: "London".to_string(),
            region: String::new(),
            postal_code: "N1 9GU".to_string(),
            country: "GB".to_string(),
            payment_method: "card".to_string(),
            shipping: "EXPRESS".to_string(),
        }
    }

    #[test]
    fn test_form_to_request() {
        let request = filled_form().to_request().unwrap();
        assert_eq!(request.customer.name, "Ada Lovelace");
        assert_eq!(request.customer.email.as_str(), "ada@example.com");
        assert_eq!(request.customer.phone, None);
        assert_eq!(request.customer.address.line2, None);
        assert_eq!(request.payment_method, PaymentMethod::Card);
        assert_eq!(request.shipping_method, ShippingMethod::Express);
    }

    #[test]
    fn test_form_errors_are_readable() {
        let mut form = filled_form();
        form.email = "ada.example.com".to_string();
        assert_eq!(
            form.to_request().unwrap_err(),
            "Please enter a valid email address."
        );

        form.email = String::new();
        assert_eq!(form.to_request().unwrap_err(), "Email is required.");

        let mut form = filled_form();
        form.payment_method = "barter".to_string();
        assert_eq!(
            form.to_request().unwrap_err(),
            "Please choose a payment method."
        );
    }

    #[test]
    fn test_blank_shipping_uses_default() {
        let mut form = filled_form();
        form.shipping = String::new();
        assert_eq!(
            form.to_request().unwrap().shipping_method,
            ShippingMethod::Standard
        );
    }

    #[test]
    fn test_payment_options_select_current() {
        let options = payment_options("bank_transfer");
        assert_eq!(options.len(), 3);
        assert!(options.iter().any(|o| o.selected && o.value == "bank_transfer"));
        assert!(payment_options("").iter().any(|o| o.selected && o.value == "cash_on_delivery"));
    }

    #[test]
    fn test_error_status() {
        assert_eq!(
            error_status(&CheckoutError::AlreadySubmitting, false),
            StatusCode::CONFLICT
        );
        assert_eq!(
            error_status(
                &CheckoutError::Draft(stockyard_core::DraftError::EmptyCart),
                false
            ),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}

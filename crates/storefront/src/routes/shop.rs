//! Product listing for a company's shop.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::instrument;

use stockyard_core::{Product, ShippingMethod};

use crate::cart_store::{CartService, SessionCartStore};
use crate::error::Result;
use crate::routes::cart::CompanyView;
use crate::routes::{ShopPath, load_company};
use crate::state::AppState;

/// Product display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub price: String,
    pub image_ref: Option<String>,
    pub available: bool,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.as_i32(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.to_string(),
            image_ref: product.image_ref.clone(),
            available: product.is_available(),
        }
    }
}

/// Shop index template.
#[derive(Template, WebTemplate)]
#[template(path = "shop/index.html")]
pub struct ShopIndexTemplate {
    pub company: CompanyView,
    pub products: Vec<ProductView>,
    pub cart_count: u32,
}

/// List a company's active products.
#[instrument(skip(state, cart))]
pub async fn index(
    State(state): State<AppState>,
    Path(ShopPath { company }): Path<ShopPath>,
    cart: CartService<SessionCartStore>,
) -> Result<impl IntoResponse> {
    let company = load_company(&state, &company).await?;
    let products = state.backend().list_products(company.id).await?;
    let (current, _) = cart.view(company.id, ShippingMethod::default()).await?;

    Ok(ShopIndexTemplate {
        company: CompanyView::from(&company),
        products: products
            .iter()
            .filter(|p| p.active)
            .map(ProductView::from)
            .collect(),
        cart_count: current.item_count(),
    })
}

//! Cart persistence behind an injectable store.
//!
//! Handlers never reach for a global cart. They receive a [`CartService`]
//! through its extractor, which wraps whatever [`CartStore`] the request
//! carries (the session in production, an in-memory map in tests).

use std::future::Future;

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use chrono::Utc;
use thiserror::Error;
use tower_sessions::Session;

use stockyard_core::{Cart, CartError, CartLine, CompanyId, OrderTotals, ProductId, ShippingMethod};

use crate::models::session_keys;

/// How long an unfinished checkout blocks a new one, in seconds.
const CHECKOUT_MARKER_TTL_SECS: i64 = 120;

/// Errors from loading or saving a cart.
#[derive(Debug, Error)]
pub enum CartStoreError {
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error(transparent)]
    Cart(#[from] CartError),
}

/// Storage for one shopper's carts, one per company.
///
/// Cart writes are last-write-wins. The checkout marker and the cart
/// clear that follows a recorded order must be visible to concurrent
/// requests of the same shopper as soon as they return.
pub trait CartStore: Send + Sync {
    /// Load the cart for `company_id`, or an empty one.
    fn load(&self, company_id: CompanyId) -> impl Future<Output = Result<Cart, CartStoreError>> + Send;

    /// Persist `cart`, replacing any previous cart for the same company.
    fn save(&self, cart: &Cart) -> impl Future<Output = Result<(), CartStoreError>> + Send;

    /// Drop the cart for `company_id`.
    fn clear(&self, company_id: CompanyId) -> impl Future<Output = Result<(), CartStoreError>> + Send;

    /// Mark a checkout as in flight. Returns `false` if one already is.
    fn begin_checkout(
        &self,
        company_id: CompanyId,
    ) -> impl Future<Output = Result<bool, CartStoreError>> + Send;

    /// Clear the in-flight checkout marker.
    fn finish_checkout(
        &self,
        company_id: CompanyId,
    ) -> impl Future<Output = Result<(), CartStoreError>> + Send;
}

/// Cart store backed by the request's session.
#[derive(Clone)]
pub struct SessionCartStore {
    session: Session,
}

impl SessionCartStore {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }
}

impl CartStore for SessionCartStore {
    async fn load(&self, company_id: CompanyId) -> Result<Cart, CartStoreError> {
        let cart = self
            .session
            .get::<Cart>(&session_keys::cart(company_id))
            .await?;
        Ok(cart.unwrap_or_else(|| Cart::new(company_id)))
    }

    async fn save(&self, cart: &Cart) -> Result<(), CartStoreError> {
        self.session
            .insert(&session_keys::cart(cart.company_id), cart)
            .await?;
        Ok(())
    }

    async fn clear(&self, company_id: CompanyId) -> Result<(), CartStoreError> {
        self.session
            .remove::<Cart>(&session_keys::cart(company_id))
            .await?;
        self.session.save().await?;
        Ok(())
    }

    async fn begin_checkout(&self, company_id: CompanyId) -> Result<bool, CartStoreError> {
        let key = session_keys::checkout_in_flight(company_id);
        let now = Utc::now().timestamp();
        // A marker outlives its request if the client disconnects mid-submit
        if let Some(started_at) = self.session.get::<i64>(&key).await?
            && now - started_at < CHECKOUT_MARKER_TTL_SECS
        {
            return Ok(false);
        }
        self.session.insert(&key, now).await?;
        // Written through now; the session layer only saves after the response
        self.session.save().await?;
        Ok(true)
    }

    async fn finish_checkout(&self, company_id: CompanyId) -> Result<(), CartStoreError> {
        self.session
            .remove::<i64>(&session_keys::checkout_in_flight(company_id))
            .await?;
        self.session.save().await?;
        Ok(())
    }
}

/// Cart operations for one shopper.
pub struct CartService<S> {
    store: S,
}

impl<S: CartStore> CartService<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Current cart plus its totals for `method`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn view(
        &self,
        company_id: CompanyId,
        method: ShippingMethod,
    ) -> Result<(Cart, OrderTotals), CartStoreError> {
        let cart = self.store.load(company_id).await?;
        let totals = cart.totals(method);
        Ok((cart, totals))
    }

    /// Add a line (merging with an existing line for the same product).
    ///
    /// # Errors
    ///
    /// Returns `Cart` errors for invalid lines; the stored cart is unchanged.
    pub async fn add(&self, company_id: CompanyId, line: CartLine) -> Result<Cart, CartStoreError> {
        let mut cart = self.store.load(company_id).await?;
        cart.add(company_id, line)?;
        self.store.save(&cart).await?;
        Ok(cart)
    }

    /// Set a line's quantity (minimum 1).
    ///
    /// # Errors
    ///
    /// Returns `Cart` errors for zero quantities or unknown products.
    pub async fn update_quantity(
        &self,
        company_id: CompanyId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart, CartStoreError> {
        let mut cart = self.store.load(company_id).await?;
        cart.update_quantity(product_id, quantity)?;
        self.store.save(&cart).await?;
        Ok(cart)
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns `Cart` errors for unknown products.
    pub async fn remove(
        &self,
        company_id: CompanyId,
        product_id: ProductId,
    ) -> Result<Cart, CartStoreError> {
        let mut cart = self.store.load(company_id).await?;
        cart.remove(product_id)?;
        self.store.save(&cart).await?;
        Ok(cart)
    }
}

impl<S> FromRequestParts<S> for CartService<SessionCartStore>
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by SessionManagerLayer
        let session = parts.extensions.get::<Session>().cloned().ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Session layer is not installed",
        ))?;

        Ok(Self::new(SessionCartStore::new(session)))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory cart store for unit tests.

    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    use super::{CartStore, CartStoreError};
    use stockyard_core::{Cart, CompanyId};

    #[derive(Default)]
    pub struct MemoryCartStore {
        carts: Mutex<HashMap<CompanyId, Cart>>,
        in_flight: Mutex<HashSet<CompanyId>>,
    }

    #[allow(clippy::unwrap_used)]
    impl MemoryCartStore {
        pub fn with_cart(cart: Cart) -> Self {
            let store = Self::default();
            store.carts.lock().unwrap().insert(cart.company_id, cart);
            store
        }

        pub fn snapshot(&self, company_id: CompanyId) -> Option<Cart> {
            self.carts.lock().unwrap().get(&company_id).cloned()
        }

        pub fn is_in_flight(&self, company_id: CompanyId) -> bool {
            self.in_flight.lock().unwrap().contains(&company_id)
        }
    }

    #[allow(clippy::unwrap_used)]
    impl CartStore for MemoryCartStore {
        async fn load(&self, company_id: CompanyId) -> Result<Cart, CartStoreError> {
            Ok(self
                .snapshot(company_id)
                .unwrap_or_else(|| Cart::new(company_id)))
        }

        async fn save(&self, cart: &Cart) -> Result<(), CartStoreError> {
            self.carts
                .lock()
                .unwrap()
                .insert(cart.company_id, cart.clone());
            Ok(())
        }

        async fn clear(&self, company_id: CompanyId) -> Result<(), CartStoreError> {
            self.carts.lock().unwrap().remove(&company_id);
            Ok(())
        }

        async fn begin_checkout(&self, company_id: CompanyId) -> Result<bool, CartStoreError> {
            Ok(self.in_flight.lock().unwrap().insert(company_id))
        }

        async fn finish_checkout(&self, company_id: CompanyId) -> Result<(), CartStoreError> {
            self.in_flight.lock().unwrap().remove(&company_id);
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::testing::MemoryCartStore;
    use super::*;
    use stockyard_core::Price;

    const COMPANY: CompanyId = CompanyId::new(1);

    fn line(id: i32, cents: i64, quantity: u32) -> CartLine {
        CartLine::new(ProductId::new(id), "Tote", Price::usd_cents(cents), quantity)
    }

    #[tokio::test]
    async fn test_add_persists_through_store() {
        let service = CartService::new(MemoryCartStore::default());
        service.add(COMPANY, line(1, 10_000, 2)).await.unwrap();

        let (cart, totals) = service.view(COMPANY, ShippingMethod::Standard).await.unwrap();
        assert_eq!(cart.item_count(), 2);
        assert_eq!(totals.total, Price::usd_cents(21_000));
    }

    #[tokio::test]
    async fn test_invalid_update_leaves_store_untouched() {
        let service = CartService::new(MemoryCartStore::default());
        service.add(COMPANY, line(1, 500, 3)).await.unwrap();

        let result = service.update_quantity(COMPANY, ProductId::new(1), 0).await;
        assert!(matches!(
            result,
            Err(CartStoreError::Cart(CartError::InvalidQuantity(0)))
        ));

        let stored = service.store().snapshot(COMPANY).unwrap();
        assert_eq!(stored.line(ProductId::new(1)).unwrap().quantity, 3);
    }

    #[tokio::test]
    async fn test_remove_line() {
        let service = CartService::new(MemoryCartStore::default());
        service.add(COMPANY, line(1, 500, 1)).await.unwrap();
        service.add(COMPANY, line(2, 700, 1)).await.unwrap();

        let cart = service.remove(COMPANY, ProductId::new(1)).await.unwrap();
        assert_eq!(cart.lines().len(), 1);
        assert!(service.remove(COMPANY, ProductId::new(1)).await.is_err());
    }

    #[tokio::test]
    async fn test_carts_are_scoped_per_company() {
        let service = CartService::new(MemoryCartStore::default());
        service.add(COMPANY, line(1, 500, 1)).await.unwrap();

        let (other, totals) = service
            .view(CompanyId::new(2), ShippingMethod::Express)
            .await
            .unwrap();
        assert!(other.is_empty());
        assert!(totals.total.is_zero());
    }

    #[tokio::test]
    async fn test_checkout_marker_is_visible_to_concurrent_session_copies() {
        use std::sync::Arc;

        use tower_sessions::MemoryStore;

        let backing = Arc::new(MemoryStore::default());
        let first = SessionCartStore::new(Session::new(None, backing.clone(), None));
        let mut cart = Cart::new(COMPANY);
        cart.add(COMPANY, line(1, 10_000, 1)).unwrap();
        first.save(&cart).await.unwrap();
        assert!(first.begin_checkout(COMPANY).await.unwrap());

        // A second request of the same shopper loads its own copy
        let id = first.session.id();
        assert!(id.is_some());
        let second = SessionCartStore::new(Session::new(id, backing.clone(), None));
        assert!(!second.begin_checkout(COMPANY).await.unwrap());
        assert!(!second.load(COMPANY).await.unwrap().is_empty());

        first.clear(COMPANY).await.unwrap();
        first.finish_checkout(COMPANY).await.unwrap();

        let third = SessionCartStore::new(Session::new(id, backing, None));
        assert!(third.load(COMPANY).await.unwrap().is_empty());
        assert!(third.begin_checkout(COMPANY).await.unwrap());
    }
}

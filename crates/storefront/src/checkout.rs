//! Order assembly and submission.
//!
//! Checkout snapshots the shopper's cart into an [`OrderDraft`] and hands it
//! to an [`OrderRecorder`]. The cart is cleared only after the recorder
//! succeeds; on any failure it is left exactly as it was so the shopper can
//! fix the problem and resubmit. There is no retry and no idempotency key.

use std::future::Future;

use thiserror::Error;
use tracing::instrument;

use stockyard_core::{
    CompanyId, CustomerDetails, DraftError, Order, OrderDraft, PaymentMethod, ShippingMethod,
};

use crate::backend::BackendError;
use crate::cart_store::{CartStore, CartStoreError};

/// Persists an order draft and returns the recorded order.
///
/// The recorder assigns the order ID and creation timestamp.
pub trait OrderRecorder: Send + Sync {
    fn record(&self, draft: &OrderDraft) -> impl Future<Output = Result<Order, BackendError>> + Send;
}

/// Why a checkout did not produce an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The draft could not be assembled (empty cart, missing fields).
    #[error(transparent)]
    Draft(#[from] DraftError),

    /// Another checkout for this cart has not finished yet.
    #[error("a checkout is already in progress")]
    AlreadySubmitting,

    /// The recorder rejected or failed to record the order.
    #[error("order submission failed: {0}")]
    Backend(#[from] BackendError),

    /// The cart could not be read or cleared.
    #[error("cart storage failed: {0}")]
    Store(#[from] CartStoreError),
}

impl CheckoutError {
    /// The message shown next to the checkout form.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Draft(DraftError::EmptyCart) => "Your cart is empty.".to_string(),
            Self::Draft(DraftError::MissingField(field)) => {
                let mut message = field.to_string();
                if let Some(first) = message.get_mut(..1) {
                    first.make_ascii_uppercase();
                }
                format!("{message} is required.")
            }
            Self::AlreadySubmitting => {
                "Your order is already being submitted, please wait.".to_string()
            }
            Self::Backend(e) => e.user_message(),
            Self::Store(_) => "We could not read your cart, please try again.".to_string(),
        }
    }

    /// Whether this failure should be reported as a server error.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        match self {
            Self::Backend(BackendError::Status { status, .. }) => *status >= 500,
            Self::Backend(
                BackendError::Http(_) | BackendError::Parse(_) | BackendError::RateLimited(_),
            )
            | Self::Store(_) => true,
            Self::Backend(BackendError::NotFound(_)) | Self::Draft(_) | Self::AlreadySubmitting => {
                false
            }
        }
    }
}

/// What the shopper filled in on the checkout form.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub customer: CustomerDetails,
    pub payment_method: PaymentMethod,
    pub shipping_method: ShippingMethod,
}

/// Submit the shopper's cart for `company_id` as an order.
///
/// On success the cart is cleared and the recorded order is returned. On
/// failure the cart is untouched.
///
/// # Errors
///
/// See [`CheckoutError`]; [`CheckoutError::user_message`] gives the text to
/// show the shopper.
#[instrument(skip_all, fields(company_id = %company_id, shipping = %request.shipping_method))]
pub async fn submit_order<S, R>(
    store: &S,
    recorder: &R,
    company_id: CompanyId,
    request: CheckoutRequest,
) -> Result<Order, CheckoutError>
where
    S: CartStore,
    R: OrderRecorder,
{
    if !store.begin_checkout(company_id).await? {
        tracing::warn!("Duplicate checkout submission rejected");
        return Err(CheckoutError::AlreadySubmitting);
    }

    let result = record_cart(store, recorder, company_id, request).await;

    if let Err(e) = store.finish_checkout(company_id).await {
        tracing::error!(error = %e, "Failed to clear checkout marker");
    }

    result
}

async fn record_cart<S, R>(
    store: &S,
    recorder: &R,
    company_id: CompanyId,
    request: CheckoutRequest,
) -> Result<Order, CheckoutError>
where
    S: CartStore,
    R: OrderRecorder,
{
    let cart = store.load(company_id).await?;
    let draft = OrderDraft::assemble(
        &cart,
        request.customer,
        request.payment_method,
        request.shipping_method,
    )?;

    let order = recorder.record(&draft).await.inspect_err(|e| {
        tracing::warn!(error = %e, total = %draft.total, "Order submission failed");
    })?;

    if order.total != draft.total {
        tracing::warn!(
            order_id = %order.id,
            submitted = %draft.total,
            recorded = %order.total,
            "Recorded total differs from submitted total"
        );
    }

    // The order exists now; failing to clear the cart must not hide that.
    if let Err(e) = store.clear(company_id).await {
        tracing::error!(order_id = %order.id, error = %e, "Failed to clear cart after checkout");
    }

    Ok(order)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::Utc;
    use stockyard_core::{
        Cart, CartLine, Email, OrderId, OrderStatus, PaymentStatus, Price, ProductId,
        ShippingAddress,
    };

    use super::*;
    use crate::cart_store::testing::MemoryCartStore;

    const COMPANY: CompanyId = CompanyId::new(3);

    /// Recorder that echoes the draft back, or fails with a fixed error.
    #[derive(Default)]
    struct FakeRecorder {
        fail_with: Option<(u16, &'static str)>,
        calls: AtomicUsize,
        last_draft: Mutex<Option<OrderDraft>>,
    }

    impl OrderRecorder for FakeRecorder {
        async fn record(&self, draft: &OrderDraft) -> Result<Order, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_draft.lock().unwrap() = Some(draft.clone());
            match self.fail_with {
                Some((status, message)) => Err(BackendError::Status {
                    status,
                    message: message.to_string(),
                }),
                None => Ok(Order::from_draft(OrderId::new(100), Utc::now(), draft.clone())),
            }
        }
    }

    fn request(shipping_method: ShippingMethod) -> CheckoutRequest {
        CheckoutRequest {
            customer: CustomerDetails {
                name: "Grace Hopper".to_string(),
                email: Email::parse("grace@navy.example.org").unwrap(),
                phone: Some("555-0100".to_string()),
                address: ShippingAddress {
                    line1: "1 Compiler Way".to_string(),
                    line2: None,
                    city: "Arlington".to_string(),
                    region: Some("VA".to_string()),
                    postal_code: "22201".to_string(),
                    country: "US".to_string(),
                },
            },
            payment_method: PaymentMethod::CashOnDelivery,
            shipping_method,
        }
    }

    fn store_with_cart() -> MemoryCartStore {
        let mut cart = Cart::new(COMPANY);
        cart.add(
            COMPANY,
            CartLine::new(ProductId::new(1), "Crate", Price::usd_cents(10_000), 2),
        )
        .unwrap();
        MemoryCartStore::with_cart(cart)
    }

    #[tokio::test]
    async fn test_success_clears_cart_and_returns_submitted_total() {
        let store = store_with_cart();
        let recorder = FakeRecorder::default();

        let order = submit_order(&store, &recorder, COMPANY, request(ShippingMethod::Standard))
            .await
            .unwrap();

        assert_eq!(order.total, Price::usd_cents(21_000));
        assert_eq!(order.subtotal, Price::usd_cents(20_000));
        assert_eq!(order.shipping, Price::usd_cents(1_000));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment.status, PaymentStatus::Pending);
        assert!(store.snapshot(COMPANY).is_none());
        assert!(!store.is_in_flight(COMPANY));
    }

    #[tokio::test]
    async fn test_backend_failure_keeps_cart() {
        let store = store_with_cart();
        let before = store.snapshot(COMPANY).unwrap();
        let recorder = FakeRecorder {
            fail_with: Some((422, "Product 1 is no longer available")),
            ..FakeRecorder::default()
        };

        let err = submit_order(&store, &recorder, COMPANY, request(ShippingMethod::Express))
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), "Product 1 is no longer available");
        assert!(!err.is_server_error());
        assert_eq!(store.snapshot(COMPANY).unwrap(), before);
        assert!(!store.is_in_flight(COMPANY));
    }

    #[tokio::test]
    async fn test_server_failure_message_is_generic() {
        let store = store_with_cart();
        let recorder = FakeRecorder {
            fail_with: Some((503, "upstream connect error")),
            ..FakeRecorder::default()
        };

        let err = submit_order(&store, &recorder, COMPANY, request(ShippingMethod::Free))
            .await
            .unwrap_err();

        assert!(err.is_server_error());
        assert!(!err.user_message().contains("upstream"));
        assert!(store.snapshot(COMPANY).is_some());
    }

    #[tokio::test]
    async fn test_empty_cart_never_reaches_recorder() {
        let store = MemoryCartStore::default();
        let recorder = FakeRecorder::default();

        let err = submit_order(&store, &recorder, COMPANY, request(ShippingMethod::Express))
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::Draft(DraftError::EmptyCart)));
        assert_eq!(err.user_message(), "Your cart is empty.");
        assert_eq!(recorder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_field_message() {
        let store = store_with_cart();
        let recorder = FakeRecorder::default();
        let mut req = request(ShippingMethod::Standard);
        req.customer.address.postal_code = String::new();

        let err = submit_order(&store, &recorder, COMPANY, req)
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Postal code is required.");
    }

    #[tokio::test]
    async fn test_in_flight_checkout_is_rejected() {
        let store = store_with_cart();
        let recorder = FakeRecorder::default();
        assert!(store.begin_checkout(COMPANY).await.unwrap());

        let err = submit_order(&store, &recorder, COMPANY, request(ShippingMethod::Standard))
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::AlreadySubmitting));
        assert_eq!(recorder.calls.load(Ordering::SeqCst), 0);
        assert!(store.snapshot(COMPANY).is_some());
    }

    #[tokio::test]
    async fn test_draft_snapshots_cart_prices() {
        let store = store_with_cart();
        let recorder = FakeRecorder::default();

        submit_order(&store, &recorder, COMPANY, request(ShippingMethod::Free))
            .await
            .unwrap();

        let draft = recorder.last_draft.lock().unwrap().clone().unwrap();
        assert_eq!(draft.items.len(), 1);
        assert_eq!(draft.items[0].unit_price, Price::usd_cents(10_000));
        assert!(draft.shipping.is_zero());
        assert_eq!(draft.total, Price::usd_cents(20_000));
    }
}

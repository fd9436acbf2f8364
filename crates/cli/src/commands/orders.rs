//! Order management commands.
//!
//! # Environment Variables
//!
//! - `BACKEND_URL` - Base URL of the records API
//! - `BACKEND_ADMIN_TOKEN` - Bearer token with order write access

use thiserror::Error;

use stockyard_admin::config::{BackendConfig, ConfigError};
use stockyard_admin::{AdminClient, AdminClientError};
use stockyard_core::{CompanyId, OrderId, OrderStatus, OrderStatusUpdate, PaymentStatus};

#[derive(Debug, Error)]
pub enum OrdersError {
    #[error("Nothing to change: pass --status and/or --payment")]
    NothingToChange,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Backend(#[from] AdminClientError),
}

/// Set an order's status and/or payment status.
#[allow(clippy::print_stdout)]
pub async fn set_status(
    company_id: CompanyId,
    order_id: OrderId,
    status: Option<OrderStatus>,
    payment_status: Option<PaymentStatus>,
) -> Result<(), OrdersError> {
    let update = OrderStatusUpdate {
        status,
        payment_status,
    };
    if update.is_empty() {
        return Err(OrdersError::NothingToChange);
    }

    let _ = dotenvy::dotenv();
    let client = AdminClient::new(&BackendConfig::from_env()?)?;

    let order = stockyard_admin::status::set_status(&client, company_id, order_id, &update).await?;

    println!(
        "Order #{} is {} (payment {})",
        order.id,
        order.status.label(),
        order.payment.status.label()
    );
    Ok(())
}

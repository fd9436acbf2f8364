//! Order status transitions.
//!
//! Any enumerated status may be set from any other. Changes that look like
//! mistakes are logged as warnings and applied anyway.

use tracing::instrument;

use stockyard_core::{CompanyId, Order, OrderId, OrderStatusUpdate, StatusChange};

use crate::client::{AdminClient, AdminClientError};

/// Warnings worth logging for a status change.
#[must_use]
pub fn advisories(change: &StatusChange) -> Vec<&'static str> {
    let mut warnings = Vec::new();
    if change.reopens_terminal() {
        warnings.push("order is leaving a terminal status");
    }
    if change.is_inconsistent() {
        warnings.push("payment marked completed on a cancelled order");
    }
    warnings
}

/// Apply `update` to an order and return the stored result.
///
/// The current order is fetched first so the change can be checked. A patch
/// that changes nothing is not sent.
///
/// # Errors
///
/// Returns any error from the records API.
#[instrument(skip(client))]
pub async fn set_status(
    client: &AdminClient,
    company_id: CompanyId,
    order_id: OrderId,
    update: &OrderStatusUpdate,
) -> Result<Order, AdminClientError> {
    let current = client.get_order(company_id, order_id).await?;
    let change = StatusChange::new(
        (current.status, current.payment.status),
        update.status,
        update.payment_status,
    );

    if update.is_empty() || change.is_noop() {
        tracing::info!("Status unchanged, nothing to send");
        return Ok(current);
    }

    for warning in advisories(&change) {
        tracing::warn!(
            from = %change.from,
            to = %change.to,
            payment_from = %change.payment_from,
            payment_to = %change.payment_to,
            "{warning}"
        );
    }

    let order = client
        .update_order_status(company_id, order_id, update)
        .await?;
    tracing::info!(status = %order.status, payment_status = %order.payment.status, "Order status updated");
    Ok(order)
}

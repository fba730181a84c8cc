//! # Checkout Commands
//!
//! Turns a register's cart into a committed order.
//!
//! ## Checkout Workflow
//! ```text
//! Click "Checkout"
//!      │
//!      ▼
//! checkout(register, 'card')
//!      │
//!      ├── EMPTY_CART / UNAUTHENTICATED ──► nothing sent, cart kept
//!      ├── ORDER_CREATION_FAILED ─────────► nothing written, cart kept
//!      ├── PARTIAL_COMMIT { orderId } ────► header written, cart kept
//!      │        │
//!      │        └─► reconcile_partial_commit(register, orderId)
//!      │
//!      └── receipt ───────────────────────► cart empty
//! ```
//!
//! A checkout dropped mid-commit (frontend gone, request cancelled) shows up
//! in `get_checkout_status` as `header_committed` with `interruptedOrderId`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use tally_core::{CheckoutPhase, Money, OrderId, PaymentMethod};

use crate::config::RegisterConfig;
use crate::error::{ApiError, ErrorCode};
use crate::state::Registers;

/// Receipt for a committed order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptResponse {
    pub order_id: String,
    pub attempt_id: String,
    pub store_name: String,
    pub total: Money,
    pub total_display: String,
    pub payment_method: PaymentMethod,
    pub line_count: usize,
    pub committed_at: DateTime<Utc>,
}

/// Where the register's most recent checkout stands.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutStatusResponse {
    pub phase: CheckoutPhase,
    /// Header left without lines by a checkout that never finished.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interrupted_order_id: Option<String>,
}

/// Outcome of voiding an orphaned order header.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileResponse {
    pub order_id: String,
    pub voided: bool,
}

/// Commits the register's cart as an order.
///
/// ## Arguments
/// * `payment_method` - `"cash"` or `"card"`
///
/// ## Returns
/// The receipt; the cart is empty afterwards. On any error the cart still
/// holds every line it had.
pub async fn checkout(
    registers: &Registers,
    config: &RegisterConfig,
    register_id: &str,
    payment_method: &str,
) -> Result<ReceiptResponse, ApiError> {
    debug!(register_id, payment_method, "checkout command");
    let payment_method: PaymentMethod = payment_method.parse().map_err(ApiError::validation)?;

    let session = registers.session(register_id).await;
    let mut session = session.lock().await;
    let order = session.checkout(payment_method).await?;

    Ok(ReceiptResponse {
        order_id: order.order_id.to_string(),
        attempt_id: order.attempt_id.to_string(),
        store_name: config.store_name.clone(),
        total: order.total_amount,
        total_display: config.format_money(order.total_amount),
        payment_method: order.payment_method,
        line_count: order.line_count,
        committed_at: order.committed_at,
    })
}

/// Phase the register's most recent checkout reached, `idle` for a register
/// that has no session yet.
pub async fn get_checkout_status(
    registers: &Registers,
    register_id: &str,
) -> CheckoutStatusResponse {
    let Some(session) = registers.get(register_id).await else {
        return CheckoutStatusResponse {
            phase: CheckoutPhase::Idle,
            interrupted_order_id: None,
        };
    };
    let session = session.lock().await;
    CheckoutStatusResponse {
        phase: session.phase(),
        interrupted_order_id: session.interrupted_order().map(ToString::to_string),
    }
}

/// Voids an order header left behind by a `PARTIAL_COMMIT`.
///
/// The cart is left as it is; checking out again is a new attempt.
pub async fn reconcile_partial_commit(
    registers: &Registers,
    register_id: &str,
    order_id: &str,
) -> Result<ReconcileResponse, ApiError> {
    debug!(register_id, order_id, "reconcile_partial_commit command");
    if order_id.trim().is_empty() {
        return Err(ApiError::validation("order id is required"));
    }

    let Some(session) = registers.get(register_id).await else {
        return Err(ApiError::new(
            ErrorCode::NotFound,
            format!("Register {} has no open session", register_id),
        ));
    };

    let order_id = OrderId::new(order_id);
    let mut session = session.lock().await;
    session.reconcile_partial_commit(&order_id).await?;

    Ok(ReconcileResponse {
        order_id: order_id.to_string(),
        voided: true,
    })
}

//! # API Error Type
//!
//! Unified error type for register commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Tally POS                              │
//! │                                                                         │
//! │  Frontend                    Register Host                              │
//! │  ────────                    ─────────────                              │
//! │                                                                         │
//! │  checkout(register, 'card')                                             │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Function                                                │  │
//! │  │  Result<T, ApiError>                                             │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Cart rule broken? ──── CartError::OutOfStock ─────┐            │  │
//! │  │         │                                          │            │  │
//! │  │         ▼                                          ▼            │  │
//! │  │  Checkout failed? ───── CheckoutError::PartialCommit ─► ApiError►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ──────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  catch (e) {                                                            │
//! │    // e.code = "PARTIAL_COMMIT"                                         │
//! │    // e.orderId = "7d1c..."  (only for PARTIAL_COMMIT)                  │
//! │  }                                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every failure class gets its own code, so the UI never has to parse a
//! message to tell a stock shortage from a sign-in problem or a failed commit.

use serde::Serialize;
use tally_core::{CartError, CheckoutError, ServiceError, SessionError, ValidationError};

/// API error returned from register commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "INSUFFICIENT_STOCK",
///   "message": "Insufficient stock for cola: available 3, requested 4"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,

    /// Order that needs reconciling, set only for `PARTIAL_COMMIT`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
}

/// Error codes for API responses.
///
/// ## Usage in Frontend
/// ```typescript
/// switch (e.code) {
///   case 'OUT_OF_STOCK':
///   case 'INSUFFICIENT_STOCK':
///     toast(e.message);
///     break;
///   case 'UNAUTHENTICATED':
///     showSignIn();
///     break;
///   case 'PARTIAL_COMMIT':
///     showReconcileDialog(e.orderId);
///     break;
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Product has no stock at all
    OutOfStock,

    /// Requested quantity exceeds stock
    InsufficientStock,

    /// Product is not in the cart
    NotFound,

    /// Cart has too many distinct lines
    CartTooLarge,

    /// Input validation failed
    ValidationError,

    /// Stock level could not be read
    InventoryUnavailable,

    /// Checkout of an empty cart
    EmptyCart,

    /// Nobody signed in at the register
    Unauthenticated,

    /// Order header rejected; nothing was written
    OrderCreationFailed,

    /// Order header written without its lines
    PartialCommit,

    /// Voiding an orphaned order failed
    ReconcileFailed,

    /// Internal error
    Internal,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            order_id: None,
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<CartError> for ApiError {
    fn from(err: CartError) -> Self {
        let code = match &err {
            CartError::OutOfStock { .. } => ErrorCode::OutOfStock,
            CartError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CartError::NotFound(_) => ErrorCode::NotFound,
            CartError::CartTooLarge { .. } => ErrorCode::CartTooLarge,
            CartError::Validation(_) => ErrorCode::ValidationError,
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        match &err {
            CheckoutError::EmptyCart => ApiError::new(ErrorCode::EmptyCart, err.to_string()),
            CheckoutError::Unauthenticated => {
                ApiError::new(ErrorCode::Unauthenticated, err.to_string())
            }
            CheckoutError::OrderCreationFailed { .. } => {
                ApiError::new(ErrorCode::OrderCreationFailed, err.to_string())
            }
            CheckoutError::PartialCommit { order_id, .. } => ApiError {
                code: ErrorCode::PartialCommit,
                message: err.to_string(),
                order_id: Some(order_id.to_string()),
            },
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Cart(e) => e.into(),
            SessionError::Checkout(e) => e.into(),
            e @ SessionError::InventoryUnavailable { .. } => {
                tracing::warn!("Inventory read failed: {}", e);
                ApiError::new(ErrorCode::InventoryUnavailable, e.to_string())
            }
            SessionError::ReconcileFailed { order_id, source } => {
                let message = match source {
                    ServiceError::Unsupported => format!(
                        "Order {} cannot be voided from the register; reconcile it in the back office",
                        order_id
                    ),
                    other => format!("Could not void order {}: {}", order_id, other),
                };
                ApiError {
                    code: ErrorCode::ReconcileFailed,
                    message,
                    order_id: Some(order_id.to_string()),
                }
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tally_core::{AttemptId, OrderId};

    fn all_failures() -> Vec<ApiError> {
        vec![
            CartError::OutOfStock {
                product_id: "p".into(),
                name: "P".into(),
            }
            .into(),
            CartError::InsufficientStock {
                product_id: "p".into(),
                available: 1,
                requested: 2,
            }
            .into(),
            CartError::NotFound("p".into()).into(),
            CartError::CartTooLarge { max: 100 }.into(),
            CartError::Validation(ValidationError::Required {
                field: "product_id".into(),
            })
            .into(),
            SessionError::InventoryUnavailable {
                product_id: "p".into(),
                source: ServiceError::Unavailable("down".into()),
            }
            .into(),
            CheckoutError::EmptyCart.into(),
            CheckoutError::Unauthenticated.into(),
            CheckoutError::OrderCreationFailed {
                attempt_id: AttemptId::new(),
                reason: "timeout".into(),
            }
            .into(),
            CheckoutError::PartialCommit {
                order_id: OrderId::new("o-1"),
                attempt_id: AttemptId::new(),
                reason: "dropped".into(),
            }
            .into(),
            SessionError::ReconcileFailed {
                order_id: OrderId::new("o-1"),
                source: ServiceError::Unsupported,
            }
            .into(),
        ]
    }

    #[test]
    fn test_every_failure_class_has_its_own_code() {
        let failures = all_failures();
        let codes: HashSet<ErrorCode> = failures.iter().map(|e| e.code).collect();
        assert_eq!(codes.len(), failures.len());
        assert!(!codes.contains(&ErrorCode::Internal));
    }

    #[test]
    fn test_partial_commit_carries_order_id() {
        let err: ApiError = SessionError::from(CheckoutError::PartialCommit {
            order_id: OrderId::new("o-9"),
            attempt_id: AttemptId::new(),
            reason: "dropped".into(),
        })
        .into();

        assert_eq!(err.code, ErrorCode::PartialCommit);
        assert_eq!(err.order_id.as_deref(), Some("o-9"));
    }

    #[test]
    fn test_serialization_shape() {
        let err: ApiError = CheckoutError::Unauthenticated.into();
        let json = serde_json::to_value(&err).unwrap();

        assert_eq!(json["code"], "UNAUTHENTICATED");
        assert!(json.get("orderId").is_none());

        let err: ApiError = CheckoutError::PartialCommit {
            order_id: OrderId::new("o-2"),
            attempt_id: AttemptId::new(),
            reason: "x".into(),
        }
        .into();
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "PARTIAL_COMMIT");
        assert_eq!(json["orderId"], "o-2");
    }
}

//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CartError        - Stock/lookup failures, cart unchanged          │
//! │  ├── CheckoutError    - Checkout failures, may follow external effects │
//! │  ├── SessionError     - Either of the above, plus inventory reads      │
//! │  ├── ServiceError     - What a collaborator reports back               │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  Register API errors (in app)                                          │
//! │  └── ApiError         - What the frontend sees (serialized)            │
//! │                                                                         │
//! │  Flow: ValidationError → CartError → SessionError → ApiError           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product id, order id, etc.)
//! 3. Errors are enum variants, never String
//! 4. Stock shortage, authentication and commit failures never share a variant

use thiserror::Error;

use crate::types::{AttemptId, OrderId};

// =============================================================================
// Cart Error
// =============================================================================

/// Cart mutation failures.
///
/// Every variant is returned synchronously and leaves the cart exactly as it
/// was before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// The product has no stock at all, so it cannot enter the cart.
    #[error("{name} is out of stock")]
    OutOfStock { product_id: String, name: String },

    /// The requested quantity exceeds the stock snapshot.
    ///
    /// ## User Workflow
    /// ```text
    /// Cola in cart: qty 3
    ///      │
    ///      ▼
    /// Click "+"  → stock snapshot says 3
    ///      │
    ///      ▼
    /// InsufficientStock { available: 3, requested: 4 }
    ///      │
    ///      ▼
    /// UI shows: "Only 3 in stock"
    /// ```
    #[error("Insufficient stock for {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// The product is not in the cart.
    #[error("Product {0} is not in the cart")]
    NotFound(String),

    /// Cart has reached the maximum number of distinct lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Input validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Checkout Error
// =============================================================================

/// Checkout failures.
///
/// ## Clean vs. Partial
/// ```text
/// EmptyCart / Unauthenticated   → nothing was sent anywhere
/// OrderCreationFailed           → header rejected, nothing exists externally
/// PartialCommit                 → header EXISTS externally without lines
/// ```
/// In every case the cart is left holding its original lines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    /// Checkout was requested with nothing in the cart.
    #[error("Cannot check out an empty cart")]
    EmptyCart,

    /// No signed-in staff member to attribute the order to.
    #[error("You must be signed in to complete a sale")]
    Unauthenticated,

    /// The order header could not be created. No external state was written.
    #[error("Order could not be created: {reason}")]
    OrderCreationFailed { attempt_id: AttemptId, reason: String },

    /// The header was created but its lines were not.
    ///
    /// The order `order_id` now exists without lines and must be reconciled
    /// by an operator or through [`crate::ports::OrderPersistence::void_order`].
    #[error("Order {order_id} was created but its items were not saved ({reason}); the order needs reconciling")]
    PartialCommit {
        order_id: OrderId,
        attempt_id: AttemptId,
        reason: String,
    },
}

impl CheckoutError {
    /// Whether external state was written before the failure.
    pub fn left_external_effects(&self) -> bool {
        matches!(self, CheckoutError::PartialCommit { .. })
    }
}

// =============================================================================
// Service Error
// =============================================================================

/// Failure reported by an external collaborator.
///
/// The core never inspects these beyond turning them into a message; any
/// non-success counts as a failure of the step that made the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The service answered and refused the request.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// The service could not be reached or did not answer.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// The service does not implement this operation.
    #[error("operation not supported by this service")]
    Unsupported,
}

// =============================================================================
// Session Error
// =============================================================================

/// Errors surfaced by [`crate::session::CheckoutSession`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// The stock level could not be read, so the cart was left alone.
    #[error("Stock level for {product_id} is unavailable: {source}")]
    InventoryUnavailable {
        product_id: String,
        #[source]
        source: ServiceError,
    },

    /// A compensating void of an orphaned order header failed.
    #[error("Could not void order {order_id}: {source}")]
    ReconcileFailed {
        order_id: OrderId,
        #[source]
        source: ServiceError,
    },
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Numeric value is below zero where zero is the floor.
    #[error("{field} must not be negative")]
    Negative { field: String },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

pub type CartResult<T> = Result<T, CartError>;
pub type CheckoutResult<T> = Result<T, CheckoutError>;
pub type SessionResult<T> = Result<T, SessionError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CartError::InsufficientStock {
            product_id: "cola".to_string(),
            available: 3,
            requested: 4,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for cola: available 3, requested 4"
        );

        let err = CartError::OutOfStock {
            product_id: "cola".to_string(),
            name: "Cola 330ml".to_string(),
        };
        assert_eq!(err.to_string(), "Cola 330ml is out of stock");
    }

    #[test]
    fn test_checkout_messages_are_distinct() {
        let attempt_id = AttemptId::new();
        let messages = [
            CheckoutError::EmptyCart.to_string(),
            CheckoutError::Unauthenticated.to_string(),
            CheckoutError::OrderCreationFailed {
                attempt_id,
                reason: "timeout".to_string(),
            }
            .to_string(),
            CheckoutError::PartialCommit {
                order_id: OrderId::new("o-1"),
                attempt_id,
                reason: "timeout".to_string(),
            }
            .to_string(),
        ];

        for (i, a) in messages.iter().enumerate() {
            for b in messages.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_only_partial_commit_leaves_effects() {
        assert!(!CheckoutError::EmptyCart.left_external_effects());
        assert!(!CheckoutError::Unauthenticated.left_external_effects());
        assert!(CheckoutError::PartialCommit {
            order_id: OrderId::new("o-1"),
            attempt_id: AttemptId::new(),
            reason: String::new(),
        }
        .left_external_effects());
    }

    #[test]
    fn test_validation_converts_to_cart_error() {
        let validation_err = ValidationError::Required {
            field: "product_id".to_string(),
        };
        let cart_err: CartError = validation_err.into();
        assert!(matches!(cart_err, CartError::Validation(_)));
    }

    #[test]
    fn test_session_error_is_transparent() {
        let err: SessionError = CartError::NotFound("cola".to_string()).into();
        assert_eq!(err.to_string(), "Product cola is not in the cart");
    }
}

//! # Collaborator Contracts
//!
//! The three external services the cart engine talks to. Everything behind
//! these traits (row storage, auth tokens, cache invalidation) belongs to the
//! hosted backend, not to this crate.
//!
//! ```text
//! ┌──────────────────┐   available_stock(id)    ┌──────────────────────┐
//! │                  │ ────────────────────────►│  InventorySource     │
//! │                  │                          └──────────────────────┘
//! │  CheckoutSession │   current_user_id()      ┌──────────────────────┐
//! │                  │ ────────────────────────►│  IdentityProvider    │
//! │                  │                          └──────────────────────┘
//! │                  │   create_order_header()  ┌──────────────────────┐
//! │                  │ ────────────────────────►│  OrderPersistence    │
//! │                  │   create_order_lines()   │                      │
//! └──────────────────┘                          └──────────────────────┘
//! ```
//!
//! Timeouts and cancellation are the implementation's business. The engine
//! treats any `Err` as a failure of the step that made the call.

use async_trait::async_trait;

use crate::error::ServiceError;
use crate::types::{NewOrderHeader, OrderId, OrderLine};

/// Supplies the stock snapshot used by add/update validation.
#[async_trait]
pub trait InventorySource: Send + Sync {
    /// Units currently available for `product_id`.
    async fn available_stock(&self, product_id: &str) -> Result<i64, ServiceError>;
}

/// Resolves the staff member operating the register.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `None` when nobody is signed in.
    async fn current_user_id(&self) -> Option<String>;
}

/// Stores committed orders.
#[async_trait]
pub trait OrderPersistence: Send + Sync {
    /// Checkout step 1. Returns the identifier the service assigned.
    async fn create_order_header(&self, header: NewOrderHeader) -> Result<OrderId, ServiceError>;

    /// Checkout step 2. All lines reference the header created in step 1.
    async fn create_order_lines(
        &self,
        order_id: &OrderId,
        lines: &[OrderLine],
    ) -> Result<(), ServiceError>;

    /// Compensates a partial commit by voiding a header that has no lines.
    ///
    /// Only ever called on an operator's request, never by checkout itself.
    async fn void_order(&self, _order_id: &OrderId) -> Result<(), ServiceError> {
        Err(ServiceError::Unsupported)
    }
}

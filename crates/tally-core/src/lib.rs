//! # tally-core: Cart Engine and Checkout for Tally POS
//!
//! Everything a register needs to build an order and commit it, with the
//! external services reduced to three traits.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Frontend (web)                               │   │
//! │  │    Product Grid ──► Cart Panel ──► Checkout Button              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    apps/register                                │   │
//! │  │    add_to_cart, update_cart_item, checkout, ...                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌──────────────┐   │   │
//! │  │   │  money   │  │   cart   │  │ checkout │  │   session    │   │   │
//! │  │   │  Money   │  │   Cart   │  │ phases   │  │ CheckoutSess │   │   │
//! │  │   └──────────┘  └──────────┘  └──────────┘  └──────────────┘   │   │
//! │  │                                                                 │   │
//! │  │   ports: InventorySource • IdentityProvider • OrderPersistence  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ trait calls only                       │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │        Hosted backend (catalog, auth, order tables)             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Integer-cent money type
//! - [`types`] - Products, orders, identifiers
//! - [`cart`] - The cart and its stock-ceiling rules
//! - [`checkout`] - Two-phase commit state machine
//! - [`session`] - Per-register session wiring the collaborators
//! - [`ports`] - Collaborator traits
//! - [`error`] - Error taxonomy
//! - [`validation`] - Field rules
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::{Cart, Money, Product};
//!
//! let bread = Product::new("bread", "Bread", Money::from_cents(250), 10);
//! let mut cart = Cart::new();
//!
//! cart.add_item(&bread, 10).unwrap();
//! cart.set_quantity("bread", 3, 10).unwrap();
//!
//! assert_eq!(cart.total().to_string(), "$7.50");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod checkout;
pub mod error;
pub mod money;
pub mod ports;
pub mod session;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartSnapshot, CartTotals, LineItem, PendingClear};
pub use checkout::{checkout, CheckoutFailure, CheckoutPhase, CheckoutRun, PendingOrder};
pub use error::{
    CartError, CartResult, CheckoutError, CheckoutResult, ServiceError, SessionError,
    SessionResult, ValidationError,
};
pub use money::Money;
pub use ports::{IdentityProvider, InventorySource, OrderPersistence};
pub use session::{CheckoutSession, Collaborators};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line, whatever the stock figure says.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Highest unit price a line may carry, in cents ($1,000,000.00).
///
/// Together with the two limits above this bounds a cart total well inside
/// `i64`, so cart arithmetic cannot overflow.
pub const MAX_UNIT_PRICE_CENTS: i64 = 100_000_000;

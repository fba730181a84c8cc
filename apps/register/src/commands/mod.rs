//! # Register Commands
//!
//! Frontend-facing operations. Each takes the state it needs plus the
//! register id, and returns a serializable response or an [`ApiError`].
//!
//! ```text
//! commands/
//! ├── cart.rs      get_cart, add_to_cart, update_cart_item,
//! │                remove_from_cart, clear_cart
//! └── checkout.rs  checkout, get_checkout_status, reconcile_partial_commit
//! ```
//!
//! [`ApiError`]: crate::error::ApiError

pub mod cart;
pub mod checkout;

//! # Checkout Session
//!
//! One register's cart plus handles to the collaborators it needs.
//!
//! There is no global cart: every register (and every test) owns its own
//! `CheckoutSession`, so two sessions never see each other's lines.
//!
//! ## Session Flow
//! ```text
//! add_product(p) ──► inventory.available_stock(p.id) ──► cart.add_item(p, n)
//! set_quantity   ──► inventory.available_stock(id)   ──► cart.set_quantity
//! remove_item    ──────────────────────────────────────► cart.remove_item
//! checkout(m)    ──► CheckoutRun::execute(cart, m, identity, orders)
//! abandon        ──────────────────────────────────────► cart.clear
//! ```
//! Stock is read once per operation; the cart is only touched after the read
//! succeeds.
//!
//! The session keeps the most recent [`CheckoutRun`]. If a checkout future is
//! dropped after the header was written, [`CheckoutSession::interrupted_order`]
//! still names the orphaned order.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cart::{Cart, CartTotals};
use crate::checkout::{CheckoutPhase, CheckoutRun};
use crate::error::{CartError, SessionError, SessionResult};
use crate::money::Money;
use crate::ports::{IdentityProvider, InventorySource, OrderPersistence};
use crate::types::{CommittedOrder, OrderId, PaymentMethod, Product};
use crate::validation::validate_quantity;

/// Handles to the external services, shared between sessions.
#[derive(Clone)]
pub struct Collaborators {
    pub inventory: Arc<dyn InventorySource>,
    pub identity: Arc<dyn IdentityProvider>,
    pub orders: Arc<dyn OrderPersistence>,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

/// A single register's checkout session.
#[derive(Debug)]
pub struct CheckoutSession {
    cart: Cart,
    services: Collaborators,
    last_run: CheckoutRun,
}

impl CheckoutSession {
    /// Creates a session with an empty cart.
    pub fn new(services: Collaborators) -> Self {
        CheckoutSession {
            cart: Cart::new(),
            services,
            last_run: CheckoutRun::new(),
        }
    }

    /// Read access to the cart.
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn total(&self) -> Money {
        self.cart.total()
    }

    pub fn totals(&self) -> CartTotals {
        self.cart.totals()
    }

    /// Phase of the most recent checkout, `Idle` if none ran yet.
    ///
    /// `HeaderCommitted` here means that checkout was dropped mid-commit.
    pub fn phase(&self) -> CheckoutPhase {
        self.last_run.phase()
    }

    /// Order header written by a checkout that was dropped before its lines
    /// were saved, if the most recent checkout ended that way.
    pub fn interrupted_order(&self) -> Option<&OrderId> {
        self.last_run.interrupted_order()
    }

    /// Adds one unit of `product` after reading its current stock.
    pub async fn add_product(&mut self, product: &Product) -> SessionResult<()> {
        let available = self.stock_for(&product.id).await?;
        self.cart.add_item(product, available)?;
        debug!(product_id = %product.id, available, "Added to cart");
        Ok(())
    }

    /// Sets a line's quantity after reading the product's current stock.
    ///
    /// A quantity of zero or less removes the line without a stock read.
    pub async fn set_quantity(&mut self, product_id: &str, quantity: i64) -> SessionResult<()> {
        if quantity <= 0 {
            self.cart.set_quantity(product_id, quantity, 0)?;
            return Ok(());
        }
        if !self.cart.contains(product_id) {
            return Err(CartError::NotFound(product_id.to_string()).into());
        }
        validate_quantity(quantity).map_err(CartError::from)?;

        let available = self.stock_for(product_id).await?;
        self.cart.set_quantity(product_id, quantity, available)?;
        Ok(())
    }

    /// Removes a line; a no-op for products that are not in the cart.
    pub fn remove_item(&mut self, product_id: &str) -> bool {
        self.cart.remove_item(product_id)
    }

    /// Empties the cart without placing an order.
    pub fn abandon(&mut self) {
        if !self.cart.is_empty() {
            info!(lines = self.cart.len(), "Cart abandoned");
        }
        self.cart.clear();
    }

    /// Commits the cart as an order. See [`CheckoutRun::execute`].
    pub async fn checkout(&mut self, payment_method: PaymentMethod) -> SessionResult<CommittedOrder> {
        if let Some(order_id) = self.last_run.interrupted_order() {
            warn!(order_id = %order_id, "Starting checkout with an interrupted order still unreconciled");
        }

        self.last_run = CheckoutRun::new();
        let order = self
            .last_run
            .execute(
                &mut self.cart,
                payment_method,
                self.services.identity.as_ref(),
                self.services.orders.as_ref(),
            )
            .await?;
        Ok(order)
    }

    /// Voids an order header left behind by a partial commit.
    ///
    /// The cart is not touched; the operator decides whether to check out
    /// again (as a new attempt).
    pub async fn reconcile_partial_commit(&mut self, order_id: &OrderId) -> SessionResult<()> {
        match self.services.orders.void_order(order_id).await {
            Ok(()) => {
                info!(order_id = %order_id, "Orphaned order header voided");
                if self.last_run.interrupted_order() == Some(order_id) {
                    self.last_run.close_interrupted();
                }
                Ok(())
            }
            Err(source) => {
                warn!(order_id = %order_id, error = %source, "Could not void orphaned order header");
                Err(SessionError::ReconcileFailed {
                    order_id: order_id.clone(),
                    source,
                })
            }
        }
    }

    async fn stock_for(&self, product_id: &str) -> SessionResult<i64> {
        self.services
            .inventory
            .available_stock(product_id)
            .await
            .map_err(|source| SessionError::InventoryUnavailable {
                product_id: product_id.to_string(),
                source,
            })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Cart Engine
//!
//! Holds the in-progress order and enforces per-line stock ceilings.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Frontend Action          Cart Engine              Outcome              │
//! │  ───────────────          ───────────              ───────              │
//! │                                                                         │
//! │  Click Product ──────────► add_item(p, stock) ───► +1 or new line      │
//! │                                                    OutOfStock          │
//! │                                                    InsufficientStock   │
//! │                                                                         │
//! │  Change Quantity ────────► set_quantity(id, n) ──► replace / remove    │
//! │                                                    NotFound            │
//! │                                                    InsufficientStock   │
//! │                                                                         │
//! │  Click Remove ───────────► remove_item(id) ──────► idempotent          │
//! │                                                                         │
//! │  View Cart ──────────────► total() ──────────────► (read only)         │
//! │                                                                         │
//! │  NOTE: Every failing call leaves the cart exactly as it was.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Lines are unique by `product_id` and kept in insertion order
//! - `1 <= quantity <= stock_ceiling` for every line
//! - `quantity <= MAX_ITEM_QUANTITY` and `unit_price <= MAX_UNIT_PRICE_CENTS`
//! - At most [`MAX_CART_ITEMS`](crate::MAX_CART_ITEMS) distinct lines
//!
//! The three limits keep every total far below `i64::MAX`.
//!
//! The stock figure passed into `add_item`/`set_quantity` is a point-in-time
//! snapshot from the inventory source. The cart never re-reads it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CartError, CartResult};
use crate::money::Money;
use crate::types::{OrderLine, Product};
use crate::validation::{
    normalize_stock, validate_cart_size, validate_product_id, validate_product_name,
    validate_quantity, validate_unit_price,
};
use crate::MAX_CART_ITEMS;

// =============================================================================
// Line Item
// =============================================================================

/// A product entry in the cart.
///
/// ## Design Notes
/// - `unit_price` is frozen when the product is first added. A price change
///   in the catalog mid-session never touches an in-progress cart.
/// - `stock_ceiling` is the last stock snapshot that validated this line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItem {
    pub product_id: String,

    /// Product name at time of adding (display only).
    pub name: String,

    /// Unit price at time of adding (frozen).
    pub unit_price: Money,

    pub quantity: i64,

    pub stock_ceiling: i64,

    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl LineItem {
    fn from_product(product: &Product, stock_ceiling: i64) -> Self {
        LineItem {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_price: product.price,
            quantity: 1,
            stock_ceiling,
            added_at: Utc::now(),
        }
    }

    /// Unit price × quantity.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }

    /// The order line this cart line becomes at checkout.
    pub fn to_order_line(&self) -> OrderLine {
        OrderLine {
            product_id: self.product_id.clone(),
            quantity: self.quantity,
            price_at_checkout: self.unit_price,
        }
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The in-progress order of one checkout session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<LineItem>,

    /// When the cart was created/last cleared
    created_at: DateTime<Utc>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart {
            lines: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Adds one unit of `product`, validated against `available_stock`.
    ///
    /// ## Behavior
    /// - Already in cart: quantity + 1, if that stays within the stock
    ///   snapshot; otherwise [`CartError::InsufficientStock`]
    /// - Not in cart: new line with quantity 1 if at least one unit is
    ///   available; otherwise [`CartError::OutOfStock`]
    /// - A line already at `MAX_ITEM_QUANTITY` is not incremented
    ///   ([`CartError::Validation`])
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::{Cart, CartError, Money, Product};
    ///
    /// let cola = Product::new("cola", "Cola", Money::from_cents(150), 2);
    /// let mut cart = Cart::new();
    ///
    /// cart.add_item(&cola, 2).unwrap();
    /// cart.add_item(&cola, 2).unwrap();
    /// assert!(matches!(
    ///     cart.add_item(&cola, 2),
    ///     Err(CartError::InsufficientStock { available: 2, requested: 3, .. })
    /// ));
    /// assert_eq!(cart.get("cola").unwrap().quantity, 2);
    /// ```
    pub fn add_item(&mut self, product: &Product, available_stock: i64) -> CartResult<()> {
        validate_product_id(&product.id)?;
        validate_product_name(&product.name)?;
        validate_unit_price(product.price)?;

        let available = normalize_stock(available_stock);

        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product.id) {
            let requested = line.quantity.saturating_add(1);
            validate_quantity(requested)?;
            if requested > available {
                return Err(CartError::InsufficientStock {
                    product_id: product.id.clone(),
                    available,
                    requested,
                });
            }
            line.quantity = requested;
            line.stock_ceiling = available;
            return Ok(());
        }

        if available < 1 {
            return Err(CartError::OutOfStock {
                product_id: product.id.clone(),
                name: product.name.clone(),
            });
        }

        validate_cart_size(self.lines.len())
            .map_err(|_| CartError::CartTooLarge { max: MAX_CART_ITEMS })?;

        self.lines.push(LineItem::from_product(product, available));
        Ok(())
    }

    /// Replaces the quantity of a line, validated against `available_stock`.
    ///
    /// ## Behavior
    /// - Product not in cart: [`CartError::NotFound`]
    /// - `new_quantity <= 0`: the line is removed
    /// - `new_quantity > MAX_ITEM_QUANTITY`: [`CartError::Validation`]
    /// - `new_quantity > available_stock`: [`CartError::InsufficientStock`]
    pub fn set_quantity(
        &mut self,
        product_id: &str,
        new_quantity: i64,
        available_stock: i64,
    ) -> CartResult<()> {
        let index = self
            .position(product_id)
            .ok_or_else(|| CartError::NotFound(product_id.to_string()))?;

        if new_quantity <= 0 {
            self.lines.remove(index);
            return Ok(());
        }

        validate_quantity(new_quantity)?;

        let available = normalize_stock(available_stock);
        if new_quantity > available {
            return Err(CartError::InsufficientStock {
                product_id: product_id.to_string(),
                available,
                requested: new_quantity,
            });
        }

        let line = &mut self.lines[index];
        line.quantity = new_quantity;
        line.stock_ceiling = available;
        Ok(())
    }

    /// Removes a line. Removing a product that is not in the cart is a no-op.
    ///
    /// Returns whether a line was removed.
    pub fn remove_item(&mut self, product_id: &str) -> bool {
        let initial_len = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);
        self.lines.len() != initial_len
    }

    /// Clears all lines from the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.created_at = Utc::now();
    }

    /// Sum of `unit_price × quantity` over all lines.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::{Cart, Money, Product};
    ///
    /// let mut cart = Cart::new();
    /// let bread = Product::new("bread", "Bread", Money::from_cents(250), 10);
    /// let milk = Product::new("milk", "Milk", Money::from_cents(100), 10);
    ///
    /// cart.add_item(&bread, 10).unwrap();
    /// cart.set_quantity("bread", 3, 10).unwrap();
    /// cart.add_item(&milk, 10).unwrap();
    ///
    /// assert_eq!(cart.total(), Money::from_cents(850));
    /// ```
    pub fn total(&self) -> Money {
        self.lines.iter().map(LineItem::line_total).sum()
    }

    /// Returns the total quantity of all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Returns the number of distinct lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Looks up a line by product id.
    pub fn get(&self, product_id: &str) -> Option<&LineItem> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }

    pub fn contains(&self, product_id: &str) -> bool {
        self.position(product_id).is_some()
    }

    /// Lines in insertion order.
    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Summary used by the register's cart display.
    pub fn totals(&self) -> CartTotals {
        CartTotals::from(self)
    }

    // =========================================================================
    // Snapshot / Rollback
    // =========================================================================

    /// Captures the current lines without changing the cart.
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            lines: self.lines.clone(),
            created_at: self.created_at,
        }
    }

    /// Captures the current lines and leaves the cart empty.
    ///
    /// Used for optimistic updates: the caller shows an empty cart while an
    /// external call is in flight and either keeps it empty (success) or puts
    /// the snapshot back with [`Cart::restore`] (failure).
    pub fn take_snapshot(&mut self) -> CartSnapshot {
        CartSnapshot {
            lines: std::mem::take(&mut self.lines),
            created_at: self.created_at,
        }
    }

    /// Puts a snapshot back verbatim, replacing whatever the cart holds.
    pub fn restore(&mut self, snapshot: CartSnapshot) {
        self.lines = snapshot.lines;
        self.created_at = snapshot.created_at;
    }

    /// Optimistically empties the cart until the returned guard is committed.
    ///
    /// Dropping the guard without [`PendingClear::commit`] puts every line
    /// back, including when the future holding it is dropped mid-await.
    pub fn begin_clear(&mut self) -> PendingClear<'_> {
        let snapshot = self.take_snapshot();
        PendingClear {
            cart: self,
            snapshot,
            committed: false,
        }
    }

    fn position(&self, product_id: &str) -> Option<usize> {
        self.lines.iter().position(|l| l.product_id == product_id)
    }
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Snapshot
// =============================================================================

/// An owned copy of a cart's lines, restorable with [`Cart::restore`].
#[derive(Debug, Clone, PartialEq)]
pub struct CartSnapshot {
    lines: Vec<LineItem>,
    created_at: DateTime<Utc>,
}

impl CartSnapshot {
    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of the captured line totals.
    pub fn total(&self) -> Money {
        self.lines.iter().map(LineItem::line_total).sum()
    }
}

// =============================================================================
// Pending Clear
// =============================================================================

/// Guard returned by [`Cart::begin_clear`].
#[derive(Debug)]
pub struct PendingClear<'a> {
    cart: &'a mut Cart,
    snapshot: CartSnapshot,
    committed: bool,
}

impl PendingClear<'_> {
    /// The lines that were in the cart when the clear began.
    pub fn snapshot(&self) -> &CartSnapshot {
        &self.snapshot
    }

    /// Keeps the cart empty and discards the snapshot.
    pub fn commit(mut self) {
        self.committed = true;
        self.cart.clear();
    }

    /// Puts the snapshot back right away.
    pub fn rollback(self) {}
}

impl Drop for PendingClear<'_> {
    fn drop(&mut self) {
        if !self.committed {
            let snapshot = CartSnapshot {
                lines: std::mem::take(&mut self.snapshot.lines),
                created_at: self.snapshot.created_at,
            };
            self.cart.restore(snapshot);
        }
    }
}

// =============================================================================
// Totals
// =============================================================================

/// Cart totals summary for API responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartTotals {
    pub line_count: usize,
    pub total_quantity: i64,
    pub total: Money,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        CartTotals {
            line_count: cart.len(),
            total_quantity: cart.total_quantity(),
            total: cart.total(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Cart Commands
//!
//! Commands for cart manipulation at one register.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Lifecycle                                       │
//! │                                                                         │
//! │  ┌──────────┐     ┌──────────┐     ┌──────────┐                         │
//! │  │  Empty   │────►│ In Cart  │────►│ Committed│                         │
//! │  │  Cart    │     │          │     │  Order   │                         │
//! │  └──────────┘     └──────────┘     └──────────┘                         │
//! │                        │                 ▲                              │
//! │                   add_to_cart       checkout                           │
//! │                   update_item       (checkout.rs)                      │
//! │                   remove_item                                           │
//! │                        │                                                │
//! │                        ▼                                                │
//! │                   clear_cart ──────────────────────►                   │
//! │                                                      (back to empty)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use tracing::debug;

use tally_core::validation::validate_product_id;
use tally_core::{Cart, CartTotals, LineItem, Product};

use crate::config::RegisterConfig;
use crate::error::ApiError;
use crate::state::Registers;

/// Cart response including lines and totals.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub lines: Vec<LineItem>,
    pub totals: CartTotals,
    /// Total formatted with the register's currency symbol.
    pub total_display: String,
}

impl CartResponse {
    pub fn from_cart(cart: &Cart, config: &RegisterConfig) -> Self {
        let totals = cart.totals();
        CartResponse {
            lines: cart.lines().to_vec(),
            total_display: config.format_money(totals.total),
            totals,
        }
    }
}

/// Gets the current cart contents.
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Cart Panel (always visible on the POS screen)                         │
/// │                                                                         │
/// │  ┌────────────────────────────────────────────────────────────────┐    │
/// │  │  CART                                              2 lines     │    │
/// │  ├────────────────────────────────────────────────────────────────┤    │
/// │  │  Drip Coffee             [-] 3 [+]  [x]      $7.50             │    │
/// │  │  Plain Bagel             [-] 1 [+]  [x]      $1.00             │    │
/// │  ├────────────────────────────────────────────────────────────────┤    │
/// │  │  TOTAL                                       $8.50             │    │
/// │  └────────────────────────────────────────────────────────────────┘    │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn get_cart(
    registers: &Registers,
    config: &RegisterConfig,
    register_id: &str,
) -> CartResponse {
    debug!(register_id, "get_cart command");
    let Some(session) = registers.get(register_id).await else {
        return CartResponse::from_cart(&Cart::new(), config);
    };
    let session = session.lock().await;
    CartResponse::from_cart(session.cart(), config)
}

/// Adds one unit of a product to the cart.
///
/// ## Behavior
/// - Already in cart: quantity + 1, bounded by live stock
/// - Not in cart: new line, rejected with `OUT_OF_STOCK` at zero stock
/// - Price is frozen at the first add
///
/// The product comes from the product grid the frontend is showing; stock is
/// re-read from the inventory source before the cart changes.
pub async fn add_to_cart(
    registers: &Registers,
    config: &RegisterConfig,
    register_id: &str,
    product: Product,
) -> Result<CartResponse, ApiError> {
    debug!(register_id, product_id = %product.id, "add_to_cart command");
    validate_product_id(&product.id)?;

    let session = registers.session(register_id).await;
    let mut session = session.lock().await;
    session.add_product(&product).await?;

    Ok(CartResponse::from_cart(session.cart(), config))
}

/// Sets the quantity of a cart line.
///
/// ## Behavior
/// - Quantity 0 or less: removes the line
/// - Quantity above live stock: `INSUFFICIENT_STOCK`, line unchanged
/// - Product not in cart: `NOT_FOUND`
pub async fn update_cart_item(
    registers: &Registers,
    config: &RegisterConfig,
    register_id: &str,
    product_id: &str,
    quantity: i64,
) -> Result<CartResponse, ApiError> {
    debug!(register_id, product_id, quantity, "update_cart_item command");

    let session = registers.session(register_id).await;
    let mut session = session.lock().await;
    session.set_quantity(product_id, quantity).await?;

    Ok(CartResponse::from_cart(session.cart(), config))
}

/// Removes a line from the cart. Removing a missing line is not an error.
pub async fn remove_from_cart(
    registers: &Registers,
    config: &RegisterConfig,
    register_id: &str,
    product_id: &str,
) -> CartResponse {
    debug!(register_id, product_id, "remove_from_cart command");

    let Some(session) = registers.get(register_id).await else {
        return CartResponse::from_cart(&Cart::new(), config);
    };
    let mut session = session.lock().await;
    session.remove_item(product_id);

    CartResponse::from_cart(session.cart(), config)
}

/// Clears all lines from the cart.
///
/// ## When Used
/// - Cashier cancels the sale
pub async fn clear_cart(
    registers: &Registers,
    config: &RegisterConfig,
    register_id: &str,
) -> CartResponse {
    debug!(register_id, "clear_cart command");

    let Some(session) = registers.get(register_id).await else {
        return CartResponse::from_cart(&Cart::new(), config);
    };
    let mut session = session.lock().await;
    session.abandon();

    CartResponse::from_cart(session.cart(), config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::memory::{demo_catalog, MemoryCatalog, MemoryOrderBook, StaticIdentity};
    use std::sync::Arc;
    use tally_core::{Collaborators, Money};

    struct Fixture {
        registers: Registers,
        catalog: Arc<MemoryCatalog>,
        config: RegisterConfig,
    }

    fn fixture() -> Fixture {
        let catalog = Arc::new(MemoryCatalog::with_products(demo_catalog()));
        let registers = Registers::new(Collaborators {
            inventory: catalog.clone(),
            identity: Arc::new(StaticIdentity::signed_in("staff-1")),
            orders: Arc::new(MemoryOrderBook::new()),
        });
        Fixture {
            registers,
            catalog,
            config: RegisterConfig::default(),
        }
    }

    async fn product(f: &Fixture, id: &str) -> Product {
        f.catalog.get(id).await.unwrap()
    }

    #[tokio::test]
    async fn test_add_and_update() {
        let f = fixture();
        let coffee = product(&f, "coffee").await;
        let bagel = product(&f, "bagel").await;

        add_to_cart(&f.registers, &f.config, "r1", coffee).await.unwrap();
        update_cart_item(&f.registers, &f.config, "r1", "coffee", 3)
            .await
            .unwrap();
        let cart = add_to_cart(&f.registers, &f.config, "r1", bagel).await.unwrap();

        assert_eq!(cart.totals.total, Money::from_cents(850));
        assert_eq!(cart.totals.line_count, 2);
        assert_eq!(cart.total_display, "$8.50");
        assert_eq!(cart.lines[0].product_id, "coffee");
    }

    #[tokio::test]
    async fn test_out_of_stock_code() {
        let f = fixture();
        let muffin = product(&f, "muffin").await;

        let err = add_to_cart(&f.registers, &f.config, "r1", muffin)
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::OutOfStock);
        assert!(get_cart(&f.registers, &f.config, "r1").await.lines.is_empty());
    }

    #[tokio::test]
    async fn test_stock_is_read_live() {
        let f = fixture();
        let bagel = product(&f, "bagel").await;
        add_to_cart(&f.registers, &f.config, "r1", bagel).await.unwrap();

        f.catalog.adjust_stock("bagel", -10).await.unwrap();
        let err = update_cart_item(&f.registers, &f.config, "r1", "bagel", 3)
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::InsufficientStock);
        let cart = get_cart(&f.registers, &f.config, "r1").await;
        assert_eq!(cart.lines[0].quantity, 1);
    }

    #[tokio::test]
    async fn test_inventory_offline_code() {
        let f = fixture();
        let coffee = product(&f, "coffee").await;
        f.catalog.set_offline(true);

        let err = add_to_cart(&f.registers, &f.config, "r1", coffee)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InventoryUnavailable);
    }

    #[tokio::test]
    async fn test_update_missing_line() {
        let f = fixture();
        let err = update_cart_item(&f.registers, &f.config, "r1", "coffee", 2)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_blank_product_id_rejected() {
        let f = fixture();
        let bogus = Product::new(" ", "Nothing", Money::from_cents(100), 5);

        let err = add_to_cart(&f.registers, &f.config, "r1", bogus)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let f = fixture();
        add_to_cart(&f.registers, &f.config, "r1", product(&f, "coffee").await)
            .await
            .unwrap();
        add_to_cart(&f.registers, &f.config, "r1", product(&f, "bagel").await)
            .await
            .unwrap();

        let cart = remove_from_cart(&f.registers, &f.config, "r1", "coffee").await;
        assert_eq!(cart.lines.len(), 1);
        let cart = remove_from_cart(&f.registers, &f.config, "r1", "coffee").await;
        assert_eq!(cart.lines.len(), 1);

        let cart = clear_cart(&f.registers, &f.config, "r1").await;
        assert!(cart.lines.is_empty());
        assert_eq!(cart.total_display, "$0.00");
    }

    #[tokio::test]
    async fn test_reads_do_not_open_sessions() {
        let f = fixture();

        let cart = get_cart(&f.registers, &f.config, "typo-1").await;
        assert!(cart.lines.is_empty());
        assert_eq!(cart.total_display, "$0.00");
        remove_from_cart(&f.registers, &f.config, "typo-1", "coffee").await;
        clear_cart(&f.registers, &f.config, "typo-1").await;

        assert!(f.registers.register_ids().await.is_empty());
    }

    #[tokio::test]
    async fn test_quantity_cap_code() {
        let f = fixture();
        add_to_cart(&f.registers, &f.config, "r1", product(&f, "coffee").await)
            .await
            .unwrap();
        f.catalog.adjust_stock("coffee", 5_000).await.unwrap();

        let err = update_cart_item(&f.registers, &f.config, "r1", "coffee", 1_000)
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "Validation error: quantity must be between 1 and 999");
        let cart = get_cart(&f.registers, &f.config, "r1").await;
        assert_eq!(cart.lines[0].quantity, 1);
    }

    #[tokio::test]
    async fn test_response_shape() {
        let f = fixture();
        let cart = add_to_cart(&f.registers, &f.config, "r1", product(&f, "coffee").await)
            .await
            .unwrap();

        let json = serde_json::to_value(&cart).unwrap();
        assert!(json.get("lines").is_some());
        assert!(json.get("totals").is_some());
        assert_eq!(json["totalDisplay"], "$2.50");
    }
}

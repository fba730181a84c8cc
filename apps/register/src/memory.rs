//! # In-Memory Collaborators
//!
//! Development stand-ins for the hosted catalog, auth and order services.
//! Nothing here is durable; a restart forgets every order.
//!
//! ```text
//! MemoryCatalog    ── InventorySource   (stock by product id)
//! StaticIdentity   ── IdentityProvider  (sign in / sign out)
//! MemoryOrderBook  ── OrderPersistence  (headers, lines, void, fault injection)
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use tally_core::{
    AttemptId, IdentityProvider, InventorySource, Money, NewOrderHeader, OrderId, OrderLine,
    OrderPersistence, OrderStatus, PaymentStatus, Product, ServiceError,
};

// =============================================================================
// Catalog
// =============================================================================

/// Product catalog with live stock levels.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    products: RwLock<HashMap<String, Product>>,
    offline: AtomicBool,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let map = products.into_iter().map(|p| (p.id.clone(), p)).collect();
        MemoryCatalog {
            products: RwLock::new(map),
            offline: AtomicBool::new(false),
        }
    }

    pub async fn get(&self, product_id: &str) -> Option<Product> {
        self.products.read().await.get(product_id).cloned()
    }

    /// All products, sorted by name.
    pub async fn list(&self) -> Vec<Product> {
        let mut products: Vec<Product> = self.products.read().await.values().cloned().collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        products
    }

    /// Adjusts stock by `delta`. Refuses to take stock below zero.
    pub async fn adjust_stock(&self, product_id: &str, delta: i64) -> Result<i64, ServiceError> {
        let mut products = self.products.write().await;
        let product = products
            .get_mut(product_id)
            .ok_or_else(|| ServiceError::Rejected(format!("unknown product {}", product_id)))?;

        let new_stock = product.stock + delta;
        if new_stock < 0 {
            return Err(ServiceError::Rejected(
                "cannot reduce stock below 0".to_string(),
            ));
        }
        product.stock = new_stock;
        debug!(product_id, stock = new_stock, "Stock adjusted");
        Ok(new_stock)
    }

    /// Simulates the catalog being unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

#[async_trait]
impl InventorySource for MemoryCatalog {
    async fn available_stock(&self, product_id: &str) -> Result<i64, ServiceError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(ServiceError::Unavailable("catalog offline".to_string()));
        }
        self.products
            .read()
            .await
            .get(product_id)
            .map(|p| p.stock)
            .ok_or_else(|| ServiceError::Rejected(format!("unknown product {}", product_id)))
    }
}

/// A small catalog for demos and manual testing.
pub fn demo_catalog() -> Vec<Product> {
    let mut coffee = Product::new("coffee", "Drip Coffee", Money::from_cents(250), 40);
    coffee.category_id = Some("drinks".to_string());

    let mut bagel = Product::new("bagel", "Plain Bagel", Money::from_cents(100), 12);
    bagel.category_id = Some("bakery".to_string());
    bagel.description = Some("Baked this morning".to_string());

    let mut muffin = Product::new("muffin", "Blueberry Muffin", Money::from_cents(325), 0);
    muffin.category_id = Some("bakery".to_string());

    vec![coffee, bagel, muffin]
}

// =============================================================================
// Identity
// =============================================================================

/// The staff member signed in at this register, if any.
#[derive(Debug, Default)]
pub struct StaticIdentity {
    staff_id: RwLock<Option<String>>,
}

impl StaticIdentity {
    pub fn signed_in(staff_id: impl Into<String>) -> Self {
        StaticIdentity {
            staff_id: RwLock::new(Some(staff_id.into())),
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }

    pub async fn sign_in(&self, staff_id: impl Into<String>) {
        let staff_id = staff_id.into();
        info!(staff_id = %staff_id, "Staff signed in");
        *self.staff_id.write().await = Some(staff_id);
    }

    pub async fn sign_out(&self) {
        info!("Staff signed out");
        *self.staff_id.write().await = None;
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn current_user_id(&self) -> Option<String> {
        self.staff_id.read().await.clone()
    }
}

// =============================================================================
// Order Book
// =============================================================================

/// An order as the in-memory book holds it.
#[derive(Debug, Clone, Serialize)]
pub struct StoredOrder {
    pub order_id: OrderId,
    pub header: NewOrderHeader,
    pub lines: Vec<OrderLine>,
    pub voided: bool,
    pub created_at: DateTime<Utc>,
}

/// Which call the next injected failure hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    Header,
    Lines,
}

#[derive(Debug, Default)]
struct Book {
    orders: HashMap<OrderId, StoredOrder>,
    by_attempt: HashMap<AttemptId, OrderId>,
}

/// Order storage with one-shot failure injection.
///
/// A header whose `attempt_id` was already seen returns the existing order
/// id instead of creating a second order.
#[derive(Debug, Default)]
pub struct MemoryOrderBook {
    book: Mutex<Book>,
    fail_header: AtomicBool,
    fail_lines: AtomicBool,
}

impl MemoryOrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next call at `point` fail once.
    pub fn fail_next(&self, point: FailPoint) {
        match point {
            FailPoint::Header => self.fail_header.store(true, Ordering::SeqCst),
            FailPoint::Lines => self.fail_lines.store(true, Ordering::SeqCst),
        }
    }

    pub async fn order(&self, order_id: &OrderId) -> Option<StoredOrder> {
        self.book.lock().await.orders.get(order_id).cloned()
    }

    /// All orders, oldest first.
    pub async fn orders(&self) -> Vec<StoredOrder> {
        let mut orders: Vec<StoredOrder> =
            self.book.lock().await.orders.values().cloned().collect();
        orders.sort_by_key(|o| o.created_at);
        orders
    }

    /// Headers that exist without lines and have not been voided.
    pub async fn orphaned(&self) -> Vec<OrderId> {
        self.book
            .lock()
            .await
            .orders
            .values()
            .filter(|o| o.lines.is_empty() && !o.voided)
            .map(|o| o.order_id.clone())
            .collect()
    }
}

#[async_trait]
impl OrderPersistence for MemoryOrderBook {
    async fn create_order_header(&self, header: NewOrderHeader) -> Result<OrderId, ServiceError> {
        if self.fail_header.swap(false, Ordering::SeqCst) {
            return Err(ServiceError::Unavailable("injected header failure".to_string()));
        }

        let mut book = self.book.lock().await;
        if let Some(existing) = book.by_attempt.get(&header.attempt_id) {
            debug!(attempt_id = %header.attempt_id, order_id = %existing, "Replayed order header");
            return Ok(existing.clone());
        }

        let order_id = OrderId::new(Uuid::new_v4().to_string());
        book.by_attempt.insert(header.attempt_id, order_id.clone());
        book.orders.insert(
            order_id.clone(),
            StoredOrder {
                order_id: order_id.clone(),
                header,
                lines: Vec::new(),
                voided: false,
                created_at: Utc::now(),
            },
        );
        Ok(order_id)
    }

    async fn create_order_lines(
        &self,
        order_id: &OrderId,
        lines: &[OrderLine],
    ) -> Result<(), ServiceError> {
        if self.fail_lines.swap(false, Ordering::SeqCst) {
            return Err(ServiceError::Unavailable("injected line failure".to_string()));
        }

        let mut book = self.book.lock().await;
        let order = book
            .orders
            .get_mut(order_id)
            .ok_or_else(|| ServiceError::Rejected(format!("unknown order {}", order_id)))?;

        if order.voided {
            return Err(ServiceError::Rejected(format!("order {} is void", order_id)));
        }
        if !order.lines.is_empty() {
            return Err(ServiceError::Rejected(format!(
                "order {} already has lines",
                order_id
            )));
        }

        order.lines = lines.to_vec();
        Ok(())
    }

    async fn void_order(&self, order_id: &OrderId) -> Result<(), ServiceError> {
        let mut book = self.book.lock().await;
        let order = book
            .orders
            .get_mut(order_id)
            .ok_or_else(|| ServiceError::Rejected(format!("unknown order {}", order_id)))?;

        if !order.lines.is_empty() {
            return Err(ServiceError::Rejected(format!(
                "order {} has lines and cannot be voided",
                order_id
            )));
        }
        order.voided = true;
        order.header.status = OrderStatus::Cancelled;
        order.header.payment_status = PaymentStatus::Failed;
        info!(order_id = %order_id, "Order voided");
        Ok(())
    }
}

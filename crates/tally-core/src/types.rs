//! # Domain Types
//!
//! Core domain types shared by the cart, the checkout state machine and the
//! collaborator contracts.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │ NewOrderHeader  │   │   OrderLine     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  attempt_id     │   │  product_id     │       │
//! │  │  name           │   │  staff_id       │   │  quantity       │       │
//! │  │  price          │   │  total_amount   │   │  price_at_      │       │
//! │  │  stock          │   │  payment_method │   │    checkout     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ PaymentMethod   │   │  OrderStatus    │   │ CommittedOrder  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Cash           │   │  Pending        │   │  order_id       │       │
//! │  │  Card           │   │  Completed      │   │  (opaque, from  │       │
//! │  └─────────────────┘   │  Cancelled      │   │   the service)  │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Orders themselves are owned by the order-persistence service. This crate
//! only describes what it sends (`NewOrderHeader`, `OrderLine`) and what it
//! keeps from the reply (`OrderId`, `CommittedOrder`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;
use uuid::Uuid;

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A catalog product as the register sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Identifier assigned by the catalog service.
    pub id: String,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    /// Optional description for product details.
    pub description: Option<String>,

    /// Current unit price.
    pub price: Money,

    /// Stock level at the time the catalog was read.
    pub stock: i64,

    /// Category this product is filed under, if any.
    pub category_id: Option<String>,
}

impl Product {
    /// Creates a product with no description or category.
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: Money, stock: i64) -> Self {
        Product {
            id: id.into(),
            name: name.into(),
            description: None,
            price,
            stock,
            category_id: None,
        }
    }

    /// Whether the catalog snapshot shows any units left.
    #[inline]
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How the customer paid at the till.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on the card terminal.
    Card,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "cash"),
            PaymentMethod::Card => write!(f, "card"),
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" | "credit" | "debit" => Ok(PaymentMethod::Card),
            other => Err(format!(
                "Unknown payment method: '{}'. Valid options: cash, card",
                other
            )),
        }
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// Lifecycle status written on an order header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order recorded but not yet settled.
    #[default]
    Pending,
    /// Order settled at the till.
    Completed,
    /// Order voided after the fact (used to compensate a partial commit).
    Cancelled,
}

/// Payment status written on an order header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

// =============================================================================
// Order Identity
// =============================================================================

/// Opaque order identifier assigned by the order-persistence service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    pub fn new(id: impl Into<String>) -> Self {
        OrderId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Idempotency key for one checkout attempt.
///
/// A fresh key is minted every time checkout starts, so a retry after a
/// partial commit is never mistaken for the attempt that left an orphaned
/// header behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttemptId(Uuid);

impl AttemptId {
    pub fn new() -> Self {
        AttemptId(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AttemptId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// =============================================================================
// Order Payloads
// =============================================================================

/// Order header sent to the order-persistence service (checkout step 1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewOrderHeader {
    /// Idempotency key of the checkout attempt that produced this header.
    #[ts(as = "String")]
    pub attempt_id: AttemptId,
    /// Staff member ringing up the order.
    pub staff_id: String,
    pub total_amount: Money,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
}

/// One order line sent to the order-persistence service (checkout step 2).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderLine {
    pub product_id: String,
    pub quantity: i64,
    /// Unit price frozen when the item was added to the cart.
    pub price_at_checkout: Money,
}

impl OrderLine {
    #[inline]
    pub fn line_total(&self) -> Money {
        self.price_at_checkout.multiply_quantity(self.quantity)
    }
}

/// Reference to an order that was fully committed (header and all lines).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CommittedOrder {
    pub order_id: OrderId,
    #[ts(as = "String")]
    pub attempt_id: AttemptId,
    pub total_amount: Money,
    pub payment_method: PaymentMethod,
    pub line_count: usize,
    #[ts(as = "String")]
    pub committed_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_method_parsing() {
        assert_eq!("cash".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cash);
        assert_eq!("Card".parse::<PaymentMethod>().unwrap(), PaymentMethod::Card);
        assert_eq!("debit".parse::<PaymentMethod>().unwrap(), PaymentMethod::Card);
        assert!("cheque".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_payment_method_serializes_snake_case() {
        let json = serde_json::to_string(&PaymentMethod::Card).unwrap();
        assert_eq!(json, "\"card\"");
    }

    #[test]
    fn test_order_status_default() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
        assert_eq!(PaymentStatus::default(), PaymentStatus::Pending);
    }

    #[test]
    fn test_attempt_ids_are_unique() {
        assert_ne!(AttemptId::new(), AttemptId::new());
    }

    #[test]
    fn test_order_line_total() {
        let line = OrderLine {
            product_id: "p-1".to_string(),
            quantity: 3,
            price_at_checkout: Money::from_cents(250),
        };
        assert_eq!(line.line_total(), Money::from_cents(750));
    }

    #[test]
    fn test_product_in_stock() {
        assert!(Product::new("p", "Cola", Money::from_cents(150), 2).in_stock());
        assert!(!Product::new("p", "Cola", Money::from_cents(150), 0).in_stock());
    }
}

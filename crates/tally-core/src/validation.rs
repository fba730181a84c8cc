//! # Validation Module
//!
//! Input validation for cart operations.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Frontend (TypeScript)                                        │
//! │  ├── Disable "Add" on zero stock, disable "-" at quantity 1            │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Register command (Rust)                                      │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── THIS MODULE: field rules before the cart is touched               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Cart Engine                                                  │
//! │  └── Stock ceilings, uniqueness, line limits                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY, MAX_UNIT_PRICE_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates a product identifier.
///
/// ## Rules
/// - Must not be empty or whitespace
/// - At most 64 characters
///
/// ## Example
/// ```rust
/// use tally_core::validation::validate_product_id;
///
/// assert!(validate_product_id("9b2f4c1e").is_ok());
/// assert!(validate_product_id("  ").is_err());
/// ```
pub fn validate_product_id(id: &str) -> ValidationResult<()> {
    let id = id.trim();

    if id.is_empty() {
        return Err(ValidationError::Required {
            field: "product_id".to_string(),
        });
    }

    if id.len() > 64 {
        return Err(ValidationError::TooLong {
            field: "product_id".to_string(),
            max: 64,
        });
    }

    Ok(())
}

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty
/// - Must be between 1 and 200 characters
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a unit price.
///
/// ## Rules
/// - Zero is allowed (free items), negative is not
/// - At most MAX_UNIT_PRICE_CENTS ($1,000,000.00)
///
/// ## Example
/// ```rust
/// use tally_core::money::Money;
/// use tally_core::validation::validate_unit_price;
///
/// assert!(validate_unit_price(Money::from_cents(250)).is_ok());
/// assert!(validate_unit_price(Money::zero()).is_ok());
/// assert!(validate_unit_price(Money::from_cents(-1)).is_err());
/// ```
pub fn validate_unit_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::Negative {
            field: "price".to_string(),
        });
    }

    if price.cents() > MAX_UNIT_PRICE_CENTS {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_UNIT_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates a line quantity that is about to be stored.
///
/// ## Rules
/// - Must be positive (zero and below mean "remove", handled by the cart)
/// - Must not exceed MAX_ITEM_QUANTITY (999), whatever the stock figure
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Cart Panel: type a quantity                                            │
/// │                                                                         │
/// │  Cashier enters 5000 for bottled water (stock 12000)                    │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(5000) ← THIS FUNCTION                               │
/// │       │                                                                 │
/// │       ├── qty > 999? → "quantity must be between 1 and 999"            │
/// │       │                                                                 │
/// │       └── OK → stock ceiling check                                     │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if !(1..=MAX_ITEM_QUANTITY).contains(&qty) {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates cart size before a new distinct line is added.
///
/// ## Rules
/// - Must not exceed MAX_CART_ITEMS (100)
pub fn validate_cart_size(current_items: usize) -> ValidationResult<()> {
    if current_items >= MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "cart items".to_string(),
            min: 0,
            max: MAX_CART_ITEMS as i64,
        });
    }

    Ok(())
}

/// Clamps a stock figure reported by the inventory source to `>= 0`.
///
/// Catalogs can briefly report negative stock after concurrent sales at other
/// terminals; for ceiling checks that means "nothing available".
#[inline]
pub fn normalize_stock(available: i64) -> i64 {
    available.max(0)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_product_id() {
        assert!(validate_product_id("p-1").is_ok());
        assert!(validate_product_id("550e8400-e29b-41d4-a716-446655440000").is_ok());

        assert!(validate_product_id("").is_err());
        assert!(validate_product_id("   ").is_err());
        assert!(validate_product_id(&"a".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Cola 330ml").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_unit_price() {
        assert!(validate_unit_price(Money::zero()).is_ok());
        assert!(validate_unit_price(Money::from_cents(1099)).is_ok());
        assert!(validate_unit_price(Money::from_cents(MAX_UNIT_PRICE_CENTS)).is_ok());
        assert!(validate_unit_price(Money::from_cents(MAX_UNIT_PRICE_CENTS + 1)).is_err());
        assert!(validate_unit_price(Money::from_cents(i64::MAX)).is_err());
    }

    #[test]
    fn test_negative_price_message() {
        let err = validate_unit_price(Money::from_cents(-100)).unwrap_err();
        assert_eq!(err.to_string(), "price must not be negative");
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_ITEM_QUANTITY).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(MAX_ITEM_QUANTITY + 1).is_err());
        assert!(validate_quantity(i64::MAX).is_err());
        assert!(validate_quantity(i64::MIN).is_err());
    }

    #[test]
    fn test_validate_cart_size() {
        assert!(validate_cart_size(0).is_ok());
        assert!(validate_cart_size(MAX_CART_ITEMS - 1).is_ok());
        assert!(validate_cart_size(MAX_CART_ITEMS).is_err());
    }

    #[test]
    fn test_normalize_stock() {
        assert_eq!(normalize_stock(5), 5);
        assert_eq!(normalize_stock(0), 0);
        assert_eq!(normalize_stock(-2), 0);
    }
}

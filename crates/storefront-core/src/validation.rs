//! # Validation Module
//!
//! Input validation for order placement requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Route handler                                                 │
//! │  ├── JSON deserialization (OrderItemRequest)                            │
//! │  └── Authenticated user id                                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (before any store is touched)                     │
//! │  ├── Non-empty item list, line count limit                              │
//! │  ├── Variant id present and positive                                    │
//! │  └── Quantity present, positive and within limit                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                             │
//! │  ├── CHECK (stock >= 0)                                                 │
//! │  └── Foreign key constraints                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use storefront_core::validation::{validate_order_items, OrderLimits};
//! use storefront_core::OrderItemRequest;
//!
//! let items = [OrderItemRequest::new(1, 2)];
//! let valid = validate_order_items(&items, &OrderLimits::default()).unwrap();
//! assert_eq!(valid[0].quantity, 2);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{OrderItemRequest, ValidItem};
use crate::{DEFAULT_PAYMENT_METHOD, MAX_ITEM_QUANTITY, MAX_LINE_ITEMS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest payment method label accepted.
pub const MAX_PAYMENT_METHOD_LEN: usize = 50;

// =============================================================================
// Limits
// =============================================================================

/// Per-order limits applied during validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLimits {
    pub max_item_quantity: i64,
    pub max_line_items: usize,
}

impl Default for OrderLimits {
    fn default() -> Self {
        OrderLimits {
            max_item_quantity: MAX_ITEM_QUANTITY,
            max_line_items: MAX_LINE_ITEMS,
        }
    }
}

// =============================================================================
// Item Validators
// =============================================================================

/// Validates a variant identifier.
///
/// ## Rules
/// - Must be present
/// - Must be positive (> 0)
pub fn validate_variant_id(id: Option<i64>) -> ValidationResult<i64> {
    match id {
        None => Err(ValidationError::Required {
            field: "variant_id".to_string(),
        }),
        Some(id) if id <= 0 => Err(ValidationError::MustBePositive {
            field: "variant_id".to_string(),
        }),
        Some(id) => Ok(id),
    }
}

/// Validates a quantity value.
///
/// ## Rules
/// - Must be present
/// - Must be positive (> 0)
/// - Must not exceed `max`
///
/// ## Example
/// ```rust
/// use storefront_core::validation::validate_quantity;
///
/// assert_eq!(validate_quantity(Some(5), 999), Ok(5));
/// assert!(validate_quantity(Some(0), 999).is_err());
/// assert!(validate_quantity(None, 999).is_err());
/// ```
pub fn validate_quantity(qty: Option<i64>, max: i64) -> ValidationResult<i64> {
    let qty = qty.ok_or_else(|| ValidationError::Required {
        field: "quantity".to_string(),
    })?;

    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > max {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max,
        });
    }

    Ok(qty)
}

/// Validates the full item list of a placement request.
///
/// Fails fast with the first problem found, in submission order.
///
/// ## Flow
/// ```text
/// items ──► empty? ──► EmptyOrder
///   │
///   ├──► more than max_line_items? ──► InvalidItem { index: max, TooMany }
///   │
///   └──► for (index, item):
///          variant_id missing / <= 0 ──► InvalidItem { index, .. }
///          quantity missing / <= 0 / > max ──► InvalidItem { index, .. }
/// ```
pub fn validate_order_items(
    items: &[OrderItemRequest],
    limits: &OrderLimits,
) -> CoreResult<Vec<ValidItem>> {
    if items.is_empty() {
        return Err(CoreError::EmptyOrder);
    }

    if items.len() > limits.max_line_items {
        return Err(CoreError::InvalidItem {
            index: limits.max_line_items,
            reason: ValidationError::TooMany {
                field: "items".to_string(),
                max: limits.max_line_items,
            },
        });
    }

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let variant_id = validate_variant_id(item.variant_id)
                .map_err(|reason| CoreError::InvalidItem { index, reason })?;
            let quantity = validate_quantity(item.quantity, limits.max_item_quantity)
                .map_err(|reason| CoreError::InvalidItem { index, reason })?;
            Ok(ValidItem {
                variant_id,
                quantity,
            })
        })
        .collect()
}

// =============================================================================
// Payment Method
// =============================================================================

/// Normalizes the payment method label.
///
/// Blank or absent labels fall back to `default`; others are trimmed.
///
/// ## Example
/// ```rust
/// use storefront_core::validation::normalize_payment_method;
///
/// assert_eq!(normalize_payment_method(None, "cash_on_delivery").unwrap(), "cash_on_delivery");
/// assert_eq!(normalize_payment_method(Some("  "), "cash_on_delivery").unwrap(), "cash_on_delivery");
/// assert_eq!(normalize_payment_method(Some(" card "), "cash_on_delivery").unwrap(), "card");
/// ```
pub fn normalize_payment_method(label: Option<&str>, default: &str) -> ValidationResult<String> {
    let label = match label.map(str::trim) {
        Some(l) if !l.is_empty() => l,
        _ => default.trim(),
    };

    if label.is_empty() {
        return Err(ValidationError::Required {
            field: "payment_method".to_string(),
        });
    }

    if label.chars().count() > MAX_PAYMENT_METHOD_LEN {
        return Err(ValidationError::TooLong {
            field: "payment_method".to_string(),
            max: MAX_PAYMENT_METHOD_LEN,
        });
    }

    Ok(label.to_string())
}

/// The fallback label used when neither caller nor config provides one.
pub fn default_payment_method() -> String {
    DEFAULT_PAYMENT_METHOD.to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_quantity() {
        assert_eq!(validate_quantity(Some(1), 999), Ok(1));
        assert_eq!(validate_quantity(Some(999), 999), Ok(999));

        assert!(validate_quantity(Some(0), 999).is_err());
        assert!(validate_quantity(Some(-1), 999).is_err());
        assert!(validate_quantity(Some(1000), 999).is_err());
        assert!(validate_quantity(None, 999).is_err());
    }

    #[test]
    fn test_validate_variant_id() {
        assert_eq!(validate_variant_id(Some(3)), Ok(3));
        assert!(validate_variant_id(Some(0)).is_err());
        assert!(validate_variant_id(None).is_err());
    }

    #[test]
    fn test_empty_items_rejected() {
        let err = validate_order_items(&[], &OrderLimits::default()).unwrap_err();
        assert!(matches!(err, CoreError::EmptyOrder));
    }

    #[test]
    fn test_reports_first_invalid_index() {
        let items = [
            OrderItemRequest::new(1, 1),
            OrderItemRequest {
                variant_id: Some(2),
                quantity: None,
            },
            OrderItemRequest::new(-3, 1),
        ];

        let err = validate_order_items(&items, &OrderLimits::default()).unwrap_err();
        match err {
            CoreError::InvalidItem { index, reason } => {
                assert_eq!(index, 1);
                assert_eq!(
                    reason,
                    ValidationError::Required {
                        field: "quantity".to_string()
                    }
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_line_limit() {
        let limits = OrderLimits {
            max_item_quantity: 10,
            max_line_items: 2,
        };
        let items = vec![OrderItemRequest::new(1, 1); 3];
        let err = validate_order_items(&items, &limits).unwrap_err();
        assert!(matches!(err, CoreError::InvalidItem { index: 2, .. }));

        assert_eq!(validate_order_items(&items[..2], &limits).unwrap().len(), 2);
    }

    #[test]
    fn test_normalize_payment_method() {
        assert_eq!(
            normalize_payment_method(Some("paypal"), "cash_on_delivery").unwrap(),
            "paypal"
        );
        assert_eq!(
            normalize_payment_method(None, &default_payment_method()).unwrap(),
            "cash_on_delivery"
        );
        assert!(normalize_payment_method(Some(""), "").is_err());
        assert!(normalize_payment_method(Some(&"x".repeat(51)), "cash").is_err());
    }
}

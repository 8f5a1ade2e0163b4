//! # Domain Types
//!
//! Core domain types used throughout the storefront.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Variant      │   │      Order      │   │   OrderLine     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  order_id (FK)  │       │
//! │  │  product_name   │   │  user_id        │   │  variant_id?    │       │
//! │  │  size/color/ed. │   │  total_amount   │   │  name snapshot  │       │
//! │  │  price, stock   │   │  status, paid   │   │  unit_price     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    CartLine     │   │  OrderStatus    │   │ActivityLogEntry │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  user_id        │   │  Pending        │   │  user_id        │       │
//! │  │  variant_id     │   │  Processing ... │   │  action tag     │       │
//! │  │  quantity > 0   │   │  Cancelled      │   │  description    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Read Types vs. Write Types
//! Rows read back from storage (`Order`, `OrderLine`) carry database ids.
//! Their `New*` counterparts are what the service hands to the stores
//! before ids exist.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Variant
// =============================================================================

/// A purchasable variant of a product (one size/color/edition combination).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Variant {
    /// Variant identifier.
    pub id: i64,

    /// Owning product.
    pub product_id: i64,

    /// Product name, joined from the products table.
    pub product_name: String,

    pub size: Option<String>,
    pub color: Option<String>,
    pub edition: Option<String>,

    /// Current unit price.
    #[ts(as = "String")]
    pub price: Money,

    /// Units on hand. Never negative.
    pub stock: i64,
}

// =============================================================================
// Cart Line
// =============================================================================

/// A pending item in a shopper's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    pub id: i64,
    pub user_id: i64,
    pub variant_id: i64,
    pub quantity: i64,
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

// =============================================================================
// Order Status
// =============================================================================

/// Fulfilment status of an order.
///
/// Placement always creates `Processing`; the other states belong to
/// fulfilment tooling outside this workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Returns the stored lowercase label.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Order
// =============================================================================

/// A placed order with its lines.
///
/// ## JSON Shape
/// ```text
/// {
///   "id": 42, "user_id": 7, "total_amount": "20.00",
///   "payment_method": "cash_on_delivery", "paid": true,
///   "status": "processing", "created_at": "2024-05-01T10:00:00Z",
///   "items": [ { "product_name": "Linen Shirt", "unit_price": "10.00", ... } ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,

    /// Sum of line subtotals, fixed at placement.
    #[ts(as = "String")]
    pub total_amount: Money,

    pub payment_method: String,
    pub paid: bool,
    pub status: OrderStatus,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    pub items: Vec<OrderLine>,
}

// =============================================================================
// Order Line
// =============================================================================

/// A line item in an order.
/// Uses snapshot pattern to freeze variant data at time of purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderLine {
    pub id: i64,
    pub order_id: i64,
    /// Cleared when the variant is deleted; the snapshot stays.
    pub variant_id: Option<i64>,
    /// Product name at time of purchase (frozen).
    pub product_name: String,
    pub size: Option<String>,
    pub color: Option<String>,
    pub edition: Option<String>,
    /// Unit price at time of purchase (frozen).
    #[ts(as = "String")]
    pub unit_price: Money,
    pub quantity: i64,
    /// unit_price × quantity.
    #[ts(as = "String")]
    pub subtotal: Money,
}

// =============================================================================
// Activity Log
// =============================================================================

/// An append-only audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    pub id: i64,
    pub user_id: i64,
    pub action: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Requests
// =============================================================================

/// One requested line item as submitted by the client.
///
/// Both fields are optional on the wire so a missing value surfaces as an
/// `InvalidItem` with its position rather than a deserialization failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderItemRequest {
    #[serde(default)]
    pub variant_id: Option<i64>,
    #[serde(default)]
    pub quantity: Option<i64>,
}

impl OrderItemRequest {
    /// Shorthand for a fully populated request.
    pub fn new(variant_id: i64, quantity: i64) -> Self {
        OrderItemRequest {
            variant_id: Some(variant_id),
            quantity: Some(quantity),
        }
    }
}

/// A line item that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidItem {
    pub variant_id: i64,
    pub quantity: i64,
}

// =============================================================================
// Write Types
// =============================================================================

/// An order ready to be written by the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub user_id: i64,
    pub total_amount: Money,
    pub payment_method: String,
    pub paid: bool,
    pub status: OrderStatus,
    pub lines: Vec<NewOrderLine>,
}

/// A line snapshot ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderLine {
    pub variant_id: i64,
    pub product_name: String,
    pub size: Option<String>,
    pub color: Option<String>,
    pub edition: Option<String>,
    pub unit_price: Money,
    pub quantity: i64,
    pub subtotal: Money,
}

/// An audit record ready to be appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActivity {
    pub user_id: i64,
    pub action: String,
    pub description: String,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_default() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn test_order_status_labels() {
        assert_eq!(OrderStatus::Processing.to_string(), "processing");
        assert_eq!(
            serde_json::to_string(&OrderStatus::Cancelled).unwrap(),
            "\"cancelled\""
        );
    }

    #[test]
    fn test_item_request_missing_fields_deserialize() {
        let item: OrderItemRequest = serde_json::from_str(r#"{"quantity": 2}"#).unwrap();
        assert_eq!(item.variant_id, None);
        assert_eq!(item.quantity, Some(2));
    }

    #[test]
    fn test_order_json_shape() {
        let order = Order {
            id: 1,
            user_id: 7,
            total_amount: Money::from_cents(2000),
            payment_method: "cash_on_delivery".to_string(),
            paid: true,
            status: OrderStatus::Processing,
            created_at: Utc::now(),
            items: vec![OrderLine {
                id: 1,
                order_id: 1,
                variant_id: Some(3),
                product_name: "Linen Shirt".to_string(),
                size: Some("M".to_string()),
                color: None,
                edition: None,
                unit_price: Money::from_cents(1000),
                quantity: 2,
                subtotal: Money::from_cents(2000),
            }],
        };

        let value = serde_json::to_value(&order).unwrap();
        assert_eq!(value["total_amount"], "20.00");
        assert_eq!(value["status"], "processing");
        assert_eq!(value["items"][0]["unit_price"], "10.00");
        assert_eq!(value["items"][0]["subtotal"], "20.00");
    }
}

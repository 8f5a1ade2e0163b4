//! # Checkout Planning
//!
//! Turns validated line items plus a snapshot of the referenced variants
//! into the order that will be written. Pure: no stores, no clock.
//!
//! ## Planning Steps
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  items (validated)          variants (read inside the transaction)     │
//! │        │                              │                                 │
//! │        └──────────────┬───────────────┘                                 │
//! │                       ▼                                                 │
//! │  1. every distinct id resolved?      no ──► VariantNotFound { missing } │
//! │                       │                                                 │
//! │  2. scan in submission order,                                           │
//! │     consuming a running stock map    short ──► InsufficientStock        │
//! │                       │                                                 │
//! │  3. subtotal = unit_price × qty,                                        │
//! │     total = Σ subtotal (checked)     overflow ──► InvalidItem           │
//! │                       │                                                 │
//! │  4. snapshot name/size/color/edition/price into NewOrderLine            │
//! │                       ▼                                                 │
//! │                   OrderPlan                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Repeated variant ids stay as separate lines. The second occurrence is
//! checked against what the first one left, so `[{v1, 3}, {v1, 3}]` against
//! stock 5 fails on index 1.

use std::collections::{HashMap, HashSet};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{NewActivity, NewOrder, NewOrderLine, Order, OrderStatus, ValidItem, Variant};
use crate::ORDER_PLACED_ACTION;

// =============================================================================
// Order Plan
// =============================================================================

/// Everything the unit of work needs to write for one placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderPlan {
    pub order: NewOrder,
}

impl OrderPlan {
    /// Stock decrements to apply, one per line, in line order.
    pub fn stock_decrements(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        self.order
            .lines
            .iter()
            .map(|line| (line.variant_id, line.quantity))
    }

    /// Order total.
    pub fn total(&self) -> Money {
        self.order.total_amount
    }
}

// =============================================================================
// Planning
// =============================================================================

/// Distinct variant ids in first-seen order.
pub fn distinct_variant_ids(items: &[ValidItem]) -> Vec<i64> {
    let mut seen = HashSet::with_capacity(items.len());
    items
        .iter()
        .map(|item| item.variant_id)
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Builds the order for `items` against the `variants` snapshot.
///
/// `variants` may arrive in any order and may contain fewer rows than
/// requested; missing ids are reported together.
pub fn plan_order(
    user_id: i64,
    items: &[ValidItem],
    variants: &[Variant],
    payment_method: String,
) -> CoreResult<OrderPlan> {
    let by_id: HashMap<i64, &Variant> = variants.iter().map(|v| (v.id, v)).collect();

    let missing: Vec<i64> = distinct_variant_ids(items)
        .into_iter()
        .filter(|id| !by_id.contains_key(id))
        .collect();
    if !missing.is_empty() {
        return Err(CoreError::VariantNotFound { missing });
    }

    let mut remaining: HashMap<i64, i64> = by_id.iter().map(|(id, v)| (*id, v.stock)).collect();
    let mut lines = Vec::with_capacity(items.len());
    let mut total = Money::zero();

    for (index, item) in items.iter().enumerate() {
        let variant = by_id
            .get(&item.variant_id)
            .ok_or_else(|| CoreError::VariantNotFound {
                missing: vec![item.variant_id],
            })?;
        let available = remaining.entry(item.variant_id).or_insert(variant.stock);

        if *available < item.quantity {
            return Err(CoreError::InsufficientStock {
                variant_id: variant.id,
                product_name: variant.product_name.clone(),
                size: variant.size.clone(),
                color: variant.color.clone(),
                requested: item.quantity,
                available: *available,
            });
        }
        *available -= item.quantity;

        let subtotal = variant
            .price
            .checked_multiply_quantity(item.quantity)
            .ok_or_else(|| overflow(index, "subtotal"))?;
        total = total
            .checked_add(subtotal)
            .ok_or_else(|| overflow(index, "total_amount"))?;

        lines.push(NewOrderLine {
            variant_id: variant.id,
            product_name: variant.product_name.clone(),
            size: variant.size.clone(),
            color: variant.color.clone(),
            edition: variant.edition.clone(),
            unit_price: variant.price,
            quantity: item.quantity,
            subtotal,
        });
    }

    Ok(OrderPlan {
        order: NewOrder {
            user_id,
            total_amount: total,
            payment_method,
            paid: true,
            status: OrderStatus::Processing,
            lines,
        },
    })
}

fn overflow(index: usize, field: &str) -> CoreError {
    CoreError::InvalidItem {
        index,
        reason: ValidationError::Overflow {
            field: field.to_string(),
        },
    }
}

/// The audit record appended for a placed order.
pub fn order_placed_activity(order: &Order) -> NewActivity {
    let count = order.items.len();
    NewActivity {
        user_id: order.user_id,
        action: ORDER_PLACED_ACTION.to_string(),
        description: format!(
            "Placed order #{} with {} item{}",
            order.id,
            count,
            if count == 1 { "" } else { "s" }
        ),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn variant(id: i64, price_cents: i64, stock: i64) -> Variant {
        Variant {
            id,
            product_id: 1,
            product_name: format!("Product {id}"),
            size: Some("M".to_string()),
            color: Some("Blue".to_string()),
            edition: None,
            price: Money::from_cents(price_cents),
            stock,
        }
    }

    fn item(variant_id: i64, quantity: i64) -> ValidItem {
        ValidItem {
            variant_id,
            quantity,
        }
    }

    #[test]
    fn test_plan_computes_total_and_snapshots() {
        let variants = [variant(1, 1000, 5), variant(2, 250, 10)];
        let plan = plan_order(
            7,
            &[item(1, 2), item(2, 3)],
            &variants,
            "cash_on_delivery".to_string(),
        )
        .unwrap();

        assert_eq!(plan.total(), Money::from_cents(2750));
        assert_eq!(plan.order.status, OrderStatus::Processing);
        assert!(plan.order.paid);
        assert_eq!(plan.order.lines[0].subtotal, Money::from_cents(2000));
        assert_eq!(plan.order.lines[0].product_name, "Product 1");
        assert_eq!(plan.order.lines[1].unit_price, Money::from_cents(250));
        assert_eq!(plan.stock_decrements().collect::<Vec<_>>(), vec![(1, 2), (2, 3)]);
    }

    #[test]
    fn test_plan_snapshots_edition() {
        let mut gold = variant(1, 4500, 2);
        gold.edition = Some("Gold".to_string());

        let plan = plan_order(1, &[item(1, 1)], &[gold], "card".to_string()).unwrap();

        let line = &plan.order.lines[0];
        assert_eq!(line.edition.as_deref(), Some("Gold"));
        assert_eq!(line.size.as_deref(), Some("M"));
        assert_eq!(line.color.as_deref(), Some("Blue"));
        assert_eq!(line.unit_price, Money::from_cents(4500));
    }

    #[test]
    fn test_missing_variants_reported_together() {
        let err = plan_order(
            1,
            &[item(9999, 1), item(1, 1), item(42, 1), item(9999, 2)],
            &[variant(1, 100, 5)],
            "card".to_string(),
        )
        .unwrap_err();

        match err {
            CoreError::VariantNotFound { missing } => assert_eq!(missing, vec![9999, 42]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_insufficient_stock_reports_details() {
        let err = plan_order(1, &[item(1, 2)], &[variant(1, 1000, 1)], "card".to_string())
            .unwrap_err();

        match err {
            CoreError::InsufficientStock {
                product_name,
                size,
                color,
                requested,
                available,
                ..
            } => {
                assert_eq!(product_name, "Product 1");
                assert_eq!(size.as_deref(), Some("M"));
                assert_eq!(color.as_deref(), Some("Blue"));
                assert_eq!(requested, 2);
                assert_eq!(available, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_repeated_variant_checked_cumulatively() {
        let variants = [variant(1, 100, 5)];

        let err = plan_order(1, &[item(1, 3), item(1, 3)], &variants, "card".to_string())
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock {
                requested: 3,
                available: 2,
                ..
            }
        ));

        let plan = plan_order(1, &[item(1, 3), item(1, 2)], &variants, "card".to_string())
            .unwrap();
        assert_eq!(plan.order.lines.len(), 2);
        assert_eq!(plan.total(), Money::from_cents(500));
    }

    #[test]
    fn test_overflow_is_invalid_item() {
        let variants = [variant(1, i64::MAX / 2, 10)];
        let err = plan_order(1, &[item(1, 1), item(1, 3)], &variants, "card".to_string())
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidItem { index: 1, .. }));
    }

    #[test]
    fn test_distinct_ids_keep_first_seen_order() {
        let ids = distinct_variant_ids(&[item(3, 1), item(1, 1), item(3, 1), item(2, 1)]);
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_order_placed_activity() {
        let order = Order {
            id: 12,
            user_id: 4,
            total_amount: Money::from_cents(100),
            payment_method: "card".to_string(),
            paid: true,
            status: OrderStatus::Processing,
            created_at: Utc::now(),
            items: Vec::new(),
        };
        let activity = order_placed_activity(&order);
        assert_eq!(activity.user_id, 4);
        assert_eq!(activity.action, "order.placed");
        assert_eq!(activity.description, "Placed order #12 with 0 items");
    }
}

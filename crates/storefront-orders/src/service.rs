//! # Order Placement Service
//!
//! Orchestrates one placement: validate, then run every read and write
//! inside a single unit of work and commit only if all of them succeed.
//!
//! ## Failure Handling
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Stage                 Failure                 Effect                   │
//! │  ─────────────────     ─────────────────────   ──────────────────────   │
//! │  validate              EmptyOrder/InvalidItem  nothing opened           │
//! │  begin                 Persistence             nothing opened           │
//! │  fetch + plan          VariantNotFound/        rollback                 │
//! │                        InsufficientStock                                │
//! │  create/decrement/     Persistence             rollback                 │
//! │  clear/record                                                           │
//! │  commit                Persistence             store discards the tx    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failed rollback is logged and the original error is returned.

use tracing::{debug, error, info, warn};

use storefront_core::checkout::{distinct_variant_ids, order_placed_activity, plan_order};
use storefront_core::validation::{normalize_payment_method, validate_order_items, OrderLimits};
use storefront_core::{CoreError, Order, OrderItemRequest, ValidItem, DEFAULT_PAYMENT_METHOD};

use crate::error::OrderError;
use crate::ports::{ActivityRecorder, CartStore, OrderLedger, UnitOfWork, VariantStore};

// =============================================================================
// Settings
// =============================================================================

/// Tunables of the placement service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementSettings {
    /// Label used when the caller sends no payment method.
    pub default_payment_method: String,

    /// Item count and quantity ceilings.
    pub limits: OrderLimits,
}

impl Default for PlacementSettings {
    fn default() -> Self {
        PlacementSettings {
            default_payment_method: DEFAULT_PAYMENT_METHOD.to_string(),
            limits: OrderLimits::default(),
        }
    }
}

// =============================================================================
// Service
// =============================================================================

/// Places orders against injected collaborators.
///
/// Generic over the unit of work `U` and the four stores, which must all
/// work on `U::Tx`. Shared across tasks behind an `Arc`.
#[derive(Debug)]
pub struct OrderPlacementService<U, V, C, L, A> {
    uow: U,
    variants: V,
    carts: C,
    ledger: L,
    activity: A,
    settings: PlacementSettings,
}

impl<U, V, C, L, A> OrderPlacementService<U, V, C, L, A>
where
    U: UnitOfWork,
    V: VariantStore<U::Tx>,
    C: CartStore<U::Tx>,
    L: OrderLedger<U::Tx>,
    A: ActivityRecorder<U::Tx>,
{
    /// Creates a service from its collaborators.
    pub fn new(
        uow: U,
        variants: V,
        carts: C,
        ledger: L,
        activity: A,
        settings: PlacementSettings,
    ) -> Self {
        OrderPlacementService {
            uow,
            variants,
            carts,
            ledger,
            activity,
            settings,
        }
    }

    /// Returns the active settings.
    pub fn settings(&self) -> &PlacementSettings {
        &self.settings
    }

    /// Places an order for `user_id`.
    ///
    /// On success the order and its lines are committed, stock is reduced
    /// per line, the user's cart is empty and one `order.placed` activity
    /// entry exists. On failure nothing of this is observable.
    ///
    /// Callers must not retry on `InsufficientStock`.
    pub async fn place_order(
        &self,
        user_id: i64,
        items: &[OrderItemRequest],
        payment_method: Option<&str>,
    ) -> Result<Order, OrderError> {
        let valid = validate_order_items(items, &self.settings.limits).map_err(|err| {
            warn!(user_id, error = %err, "Order rejected by validation");
            err
        })?;
        let payment_method =
            normalize_payment_method(payment_method, &self.settings.default_payment_method)
                .map_err(CoreError::from)?;

        let mut tx = self.uow.begin().await?;

        match self.place_in(&mut tx, user_id, &valid, payment_method).await {
            Ok(order) => {
                self.uow.commit(tx).await.map_err(|err| {
                    error!(user_id, order_id = order.id, error = %err, "Commit failed");
                    err
                })?;
                info!(
                    user_id,
                    order_id = order.id,
                    lines = order.items.len(),
                    total = %order.total_amount,
                    "Order placed"
                );
                Ok(order)
            }
            Err(err) => {
                if let Err(rollback_err) = self.uow.rollback(tx).await {
                    warn!(user_id, error = %rollback_err, "Rollback failed");
                }
                warn!(user_id, kind = ?err.kind(), error = %err, "Order not placed");
                Err(err)
            }
        }
    }

    /// Everything that runs on the open transaction.
    async fn place_in(
        &self,
        tx: &mut U::Tx,
        user_id: i64,
        items: &[ValidItem],
        payment_method: String,
    ) -> Result<Order, OrderError> {
        let ids = distinct_variant_ids(items);
        let variants = self.variants.find_many_by_ids(tx, &ids).await?;
        debug!(requested = ids.len(), found = variants.len(), "Variants loaded");

        let plan = plan_order(user_id, items, &variants, payment_method)?;

        let order = self.ledger.create_order(tx, &plan.order).await?;

        for (variant_id, amount) in plan.stock_decrements() {
            self.variants.decrement_stock(tx, variant_id, amount).await?;
        }

        let removed = self.carts.clear_for_user(tx, user_id).await?;
        debug!(user_id, removed, "Cart cleared");

        let entry = order_placed_activity(&order);
        self.activity.record(tx, &entry).await.map_err(|err| {
            error!(user_id, order_id = order.id, error = %err, "Activity log write failed");
            err
        })?;

        Ok(order)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
//
// The end-to-end scenarios live next to the adapters (memory.rs, sqlite.rs).

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = PlacementSettings::default();
        assert_eq!(settings.default_payment_method, "cash_on_delivery");
        assert_eq!(settings.limits.max_item_quantity, 999);
        assert_eq!(settings.limits.max_line_items, 100);
    }
}

//! # In-Memory Adapter
//!
//! A process-local store implementing every collaborator trait. Used by
//! tests and demos that need the full placement flow without SQLite.
//!
//! ## Transaction Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  begin     lock the shared state (owned guard), copy it into `working`  │
//! │  ops       read and write `working` only                                │
//! │  commit    write `working` back through the guard, release the lock     │
//! │  rollback  drop `working`, release the lock                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Holding the lock for the whole unit serializes placements, the same
//! guarantee the SQLite adapter gets from its writer gate.
//!
//! ## Fault Injection
//! Only compiled for this crate's tests or with the `test-util` feature.
//! `MemoryStore::fail_decrement_for` and `MemoryStore::fail_activity` make
//! every matching call return `StoreError::Injected`.

use std::collections::BTreeMap;
#[cfg(any(test, feature = "test-util"))]
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use storefront_core::{
    ActivityLogEntry, CartLine, Money, NewActivity, NewOrder, Order, OrderLine, Variant,
};

use crate::error::{StoreError, StoreResult};
use crate::ports::{ActivityRecorder, CartStore, OrderLedger, UnitOfWork, VariantStore};
use crate::service::{OrderPlacementService, PlacementSettings};

// =============================================================================
// State
// =============================================================================

#[derive(Debug, Clone, Default)]
struct MemoryState {
    variants: BTreeMap<i64, Variant>,
    cart: Vec<CartLine>,
    orders: Vec<Order>,
    activity: Vec<ActivityLogEntry>,
    last_product_id: i64,
    last_variant_id: i64,
    last_cart_id: i64,
    last_order_id: i64,
    last_line_id: i64,
    last_activity_id: i64,
}

/// Bumps an id counter and returns the new id (ids start at 1).
fn next_id(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Default)]
struct Faults {
    /// Variant whose decrement fails; 0 means none.
    fail_decrement_for: AtomicI64,
    fail_activity: AtomicBool,
    begins: AtomicUsize,
}

/// Open unit of work of a [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

// =============================================================================
// Store
// =============================================================================

/// In-memory implementation of all five collaborators.
///
/// Cloning is cheap; clones share the same state and fault switches.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    #[cfg(any(test, feature = "test-util"))]
    faults: Arc<Faults>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a product with one variant and returns the variant id.
    pub async fn seed_variant(
        &self,
        product_name: &str,
        size: Option<&str>,
        color: Option<&str>,
        edition: Option<&str>,
        price: Money,
        stock: i64,
    ) -> i64 {
        let mut state = self.state.lock().await;
        let product_id = next_id(&mut state.last_product_id);
        let id = next_id(&mut state.last_variant_id);
        state.variants.insert(
            id,
            Variant {
                id,
                product_id,
                product_name: product_name.to_string(),
                size: size.map(str::to_string),
                color: color.map(str::to_string),
                edition: edition.map(str::to_string),
                price,
                stock,
            },
        );
        id
    }

    /// Puts a pending line into the user's cart.
    pub async fn add_to_cart(&self, user_id: i64, variant_id: i64, quantity: i64) {
        let mut state = self.state.lock().await;
        let id = next_id(&mut state.last_cart_id);
        state.cart.push(CartLine {
            id,
            user_id,
            variant_id,
            quantity,
            added_at: Utc::now(),
        });
    }

    /// Changes a variant's current price. Returns false if it does not exist.
    pub async fn set_price(&self, variant_id: i64, price: Money) -> bool {
        let mut state = self.state.lock().await;
        match state.variants.get_mut(&variant_id) {
            Some(variant) => {
                variant.price = price;
                true
            }
            None => false,
        }
    }

    pub async fn stock_of(&self, variant_id: i64) -> Option<i64> {
        let state = self.state.lock().await;
        state.variants.get(&variant_id).map(|v| v.stock)
    }

    pub async fn cart_len(&self, user_id: i64) -> usize {
        let state = self.state.lock().await;
        state.cart.iter().filter(|line| line.user_id == user_id).count()
    }

    /// Committed orders, oldest first.
    pub async fn orders(&self) -> Vec<Order> {
        self.state.lock().await.orders.clone()
    }

    /// Committed activity entries, oldest first.
    pub async fn activity(&self) -> Vec<ActivityLogEntry> {
        self.state.lock().await.activity.clone()
    }
}

// =============================================================================
// Fault Injection
// =============================================================================

#[cfg(any(test, feature = "test-util"))]
impl MemoryStore {
    /// Makes every decrement of `variant_id` fail.
    pub fn fail_decrement_for(&self, variant_id: i64) {
        self.faults
            .fail_decrement_for
            .store(variant_id, Ordering::SeqCst);
    }

    /// Makes every activity write fail while `fail` is true.
    pub fn fail_activity(&self, fail: bool) {
        self.faults.fail_activity.store(fail, Ordering::SeqCst);
    }

    /// How many units of work were opened so far.
    pub fn begin_count(&self) -> usize {
        self.faults.begins.load(Ordering::SeqCst)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

#[async_trait]
impl UnitOfWork for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> StoreResult<MemoryTx> {
        #[cfg(any(test, feature = "test-util"))]
        self.faults.begins.fetch_add(1, Ordering::SeqCst);
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = (*guard).clone();
        Ok(MemoryTx { guard, working })
    }

    async fn commit(&self, tx: MemoryTx) -> StoreResult<()> {
        let MemoryTx { mut guard, working } = tx;
        *guard = working;
        Ok(())
    }

    async fn rollback(&self, tx: MemoryTx) -> StoreResult<()> {
        drop(tx);
        Ok(())
    }
}

#[async_trait]
impl VariantStore<MemoryTx> for MemoryStore {
    async fn find_many_by_ids(&self, tx: &mut MemoryTx, ids: &[i64]) -> StoreResult<Vec<Variant>> {
        Ok(ids
            .iter()
            .filter_map(|id| tx.working.variants.get(id).cloned())
            .collect())
    }

    async fn decrement_stock(
        &self,
        tx: &mut MemoryTx,
        variant_id: i64,
        amount: i64,
    ) -> StoreResult<()> {
        #[cfg(any(test, feature = "test-util"))]
        if self.faults.fail_decrement_for.load(Ordering::SeqCst) == variant_id {
            return Err(StoreError::Injected(format!(
                "decrement of variant {variant_id}"
            )));
        }

        match tx.working.variants.get_mut(&variant_id) {
            Some(variant) if variant.stock >= amount => {
                variant.stock -= amount;
                Ok(())
            }
            _ => Err(StoreError::StockGuard {
                variant_id,
                requested: amount,
            }),
        }
    }
}

#[async_trait]
impl CartStore<MemoryTx> for MemoryStore {
    async fn clear_for_user(&self, tx: &mut MemoryTx, user_id: i64) -> StoreResult<u64> {
        let before = tx.working.cart.len();
        tx.working.cart.retain(|line| line.user_id != user_id);
        Ok((before - tx.working.cart.len()) as u64)
    }
}

#[async_trait]
impl OrderLedger<MemoryTx> for MemoryStore {
    async fn create_order(&self, tx: &mut MemoryTx, order: &NewOrder) -> StoreResult<Order> {
        let state = &mut tx.working;
        let order_id = next_id(&mut state.last_order_id);

        let mut items = Vec::with_capacity(order.lines.len());
        for line in &order.lines {
            items.push(OrderLine {
                id: next_id(&mut state.last_line_id),
                order_id,
                variant_id: Some(line.variant_id),
                product_name: line.product_name.clone(),
                size: line.size.clone(),
                color: line.color.clone(),
                edition: line.edition.clone(),
                unit_price: line.unit_price,
                quantity: line.quantity,
                subtotal: line.subtotal,
            });
        }

        let created = Order {
            id: order_id,
            user_id: order.user_id,
            total_amount: order.total_amount,
            payment_method: order.payment_method.clone(),
            paid: order.paid,
            status: order.status,
            created_at: Utc::now(),
            items,
        };
        state.orders.push(created.clone());
        Ok(created)
    }
}

#[async_trait]
impl ActivityRecorder<MemoryTx> for MemoryStore {
    async fn record(&self, tx: &mut MemoryTx, entry: &NewActivity) -> StoreResult<()> {
        #[cfg(any(test, feature = "test-util"))]
        if self.faults.fail_activity.load(Ordering::SeqCst) {
            return Err(StoreError::Injected("activity log".to_string()));
        }

        let state = &mut tx.working;
        let id = next_id(&mut state.last_activity_id);
        state.activity.push(ActivityLogEntry {
            id,
            user_id: entry.user_id,
            action: entry.action.clone(),
            description: entry.description.clone(),
            created_at: Utc::now(),
        });
        Ok(())
    }
}

/// Placement service wired entirely to one [`MemoryStore`].
pub type MemoryPlacementService =
    OrderPlacementService<MemoryStore, MemoryStore, MemoryStore, MemoryStore, MemoryStore>;

impl MemoryPlacementService {
    /// Builds a service whose collaborators all share `store`.
    pub fn in_memory(store: MemoryStore, settings: PlacementSettings) -> Self {
        OrderPlacementService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store,
            settings,
        )
    }
}

// =============================================================================
// Tests
// =============================================================================

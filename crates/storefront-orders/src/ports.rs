//! # Collaborator Traits
//!
//! The service talks to storage only through these traits. Every
//! operation takes the unit of work's transaction handle `Tx`, so all
//! writes of one placement land in the same atomic unit.
//!
//! ```text
//! UnitOfWork::begin() ──► Tx ──► &mut Tx passed to every store call
//!                               │
//!                               ├── commit(Tx)   all or
//!                               └── rollback(Tx) nothing
//! ```
//!
//! Dropping a `Tx` without committing must discard its writes.

use async_trait::async_trait;

use storefront_core::{NewActivity, NewOrder, Order, Variant};

use crate::error::StoreResult;

/// Opens and finishes atomic units.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Transaction handle threaded through the stores.
    type Tx: Send;

    async fn begin(&self) -> StoreResult<Self::Tx>;

    async fn commit(&self, tx: Self::Tx) -> StoreResult<()>;

    async fn rollback(&self, tx: Self::Tx) -> StoreResult<()>;
}

/// Product variants and their stock counters.
#[async_trait]
pub trait VariantStore<Tx: Send>: Send + Sync {
    /// Existing variants among `ids`, read in one query.
    async fn find_many_by_ids(&self, tx: &mut Tx, ids: &[i64]) -> StoreResult<Vec<Variant>>;

    /// Decrements stock, failing (never clamping) if it would go negative.
    async fn decrement_stock(&self, tx: &mut Tx, variant_id: i64, amount: i64) -> StoreResult<()>;
}

/// Per-user pending cart lines.
#[async_trait]
pub trait CartStore<Tx: Send>: Send + Sync {
    /// Removes every cart line of the user; returns how many were removed.
    async fn clear_for_user(&self, tx: &mut Tx, user_id: i64) -> StoreResult<u64>;
}

/// Order and order-line creation.
#[async_trait]
pub trait OrderLedger<Tx: Send>: Send + Sync {
    async fn create_order(&self, tx: &mut Tx, order: &NewOrder) -> StoreResult<Order>;
}

/// Append-only audit trail.
#[async_trait]
pub trait ActivityRecorder<Tx: Send>: Send + Sync {
    async fn record(&self, tx: &mut Tx, entry: &NewActivity) -> StoreResult<()>;
}

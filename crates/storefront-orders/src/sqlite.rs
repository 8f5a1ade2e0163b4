//! # SQLite Adapter
//!
//! Implements every collaborator trait on top of `storefront-db`.
//! The transaction handle is a [`WriteTransaction`], which also holds the
//! writer gate, so two placements never interleave their read and write
//! phases inside one process.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Placement A                          Placement B                       │
//! │  begin  (gate acquired)                begin ... waits on gate          │
//! │  read stock=5, plan qty 3                         │                     │
//! │  write order, stock=2                             │                     │
//! │  commit (gate released) ─────────────► begin (gate acquired)            │
//! │                                        read stock=2 → InsufficientStock │
//! │                                        rollback                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Writers in other processes are covered by the guarded decrement.

use async_trait::async_trait;

use storefront_core::{NewActivity, NewOrder, Order, Variant};
use storefront_db::pool::WriteTransaction;
use storefront_db::{
    ActivityRepository, CartRepository, Database, OrderRepository, VariantRepository,
};

use crate::error::StoreResult;
use crate::ports::{ActivityRecorder, CartStore, OrderLedger, UnitOfWork, VariantStore};
use crate::service::{OrderPlacementService, PlacementSettings};

/// All five collaborators backed by one SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        SqliteStore { db }
    }

    /// The underlying database handle (read-side queries, seeding).
    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl UnitOfWork for SqliteStore {
    type Tx = WriteTransaction;

    async fn begin(&self) -> StoreResult<WriteTransaction> {
        Ok(self.db.begin_write().await?)
    }

    async fn commit(&self, tx: WriteTransaction) -> StoreResult<()> {
        Ok(tx.commit().await?)
    }

    async fn rollback(&self, tx: WriteTransaction) -> StoreResult<()> {
        Ok(tx.rollback().await?)
    }
}

#[async_trait]
impl VariantStore<WriteTransaction> for SqliteStore {
    async fn find_many_by_ids(
        &self,
        tx: &mut WriteTransaction,
        ids: &[i64],
    ) -> StoreResult<Vec<Variant>> {
        Ok(VariantRepository::find_many_by_ids_in(tx.conn(), ids).await?)
    }

    async fn decrement_stock(
        &self,
        tx: &mut WriteTransaction,
        variant_id: i64,
        amount: i64,
    ) -> StoreResult<()> {
        Ok(VariantRepository::decrement_stock_in(tx.conn(), variant_id, amount).await?)
    }
}

#[async_trait]
impl CartStore<WriteTransaction> for SqliteStore {
    async fn clear_for_user(&self, tx: &mut WriteTransaction, user_id: i64) -> StoreResult<u64> {
        Ok(CartRepository::clear_for_user_in(tx.conn(), user_id).await?)
    }
}

#[async_trait]
impl OrderLedger<WriteTransaction> for SqliteStore {
    async fn create_order(&self, tx: &mut WriteTransaction, order: &NewOrder) -> StoreResult<Order> {
        Ok(OrderRepository::create_in(tx.conn(), order).await?)
    }
}

#[async_trait]
impl ActivityRecorder<WriteTransaction> for SqliteStore {
    async fn record(&self, tx: &mut WriteTransaction, entry: &NewActivity) -> StoreResult<()> {
        ActivityRepository::record_in(tx.conn(), entry).await?;
        Ok(())
    }
}

/// Placement service wired entirely to SQLite.
pub type SqlitePlacementService =
    OrderPlacementService<SqliteStore, SqliteStore, SqliteStore, SqliteStore, SqliteStore>;

impl SqlitePlacementService {
    /// Builds the production service on `db`.
    pub fn sqlite(db: Database, settings: PlacementSettings) -> Self {
        let store = SqliteStore::new(db);
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use storefront_core::{CoreError, Money, OrderItemRequest, OrderStatus};
    use storefront_db::{DbConfig, DbError, NewVariant};

    use crate::error::{ErrorKind, OrderError, StoreError};

    struct Fixture {
        db: Database,
        user_id: i64,
        variant_id: i64,
    }

    async fn fixture(price_cents: i64, stock: i64) -> Fixture {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let user_id = db.users().insert("Ann", "ann@example.com").await.unwrap();
        let variant_id = add_variant(&db, "Linen Shirt", price_cents, stock).await;
        Fixture {
            db,
            user_id,
            variant_id,
        }
    }

    async fn add_variant(db: &Database, name: &str, price_cents: i64, stock: i64) -> i64 {
        let product_id = db.variants().insert_product(name, None).await.unwrap();
        db.variants()
            .insert(&NewVariant {
                product_id,
                size: Some("M".to_string()),
                color: Some("Blue".to_string()),
                edition: Some("Gold".to_string()),
                price: Money::from_cents(price_cents),
                stock,
            })
            .await
            .unwrap()
    }

    async fn stock(db: &Database, variant_id: i64) -> i64 {
        db.variants()
            .get_by_id(variant_id)
            .await
            .unwrap()
            .unwrap()
            .stock
    }

    /// Delegates reads but fails the decrement of one variant.
    struct FailingDecrement {
        inner: SqliteStore,
        fail_for: i64,
    }

    #[async_trait]
    impl VariantStore<WriteTransaction> for FailingDecrement {
        async fn find_many_by_ids(
            &self,
            tx: &mut WriteTransaction,
            ids: &[i64],
        ) -> StoreResult<Vec<Variant>> {
            self.inner.find_many_by_ids(tx, ids).await
        }

        async fn decrement_stock(
            &self,
            tx: &mut WriteTransaction,
            variant_id: i64,
            amount: i64,
        ) -> StoreResult<()> {
            if variant_id == self.fail_for {
                return Err(StoreError::Injected("decrement".to_string()));
            }
            self.inner.decrement_stock(tx, variant_id, amount).await
        }
    }

    struct FailingRecorder;

    #[async_trait]
    impl ActivityRecorder<WriteTransaction> for FailingRecorder {
        async fn record(&self, _tx: &mut WriteTransaction, _entry: &NewActivity) -> StoreResult<()> {
            Err(StoreError::Injected("activity log".to_string()))
        }
    }

    #[tokio::test]
    async fn test_places_order_and_commits_everything() {
        let f = fixture(1000, 5).await;
        f.db.carts().add_item(f.user_id, f.variant_id, 2).await.unwrap();
        let service = SqlitePlacementService::sqlite(f.db.clone(), PlacementSettings::default());

        let order = service
            .place_order(f.user_id, &[OrderItemRequest::new(f.variant_id, 2)], None)
            .await
            .unwrap();

        assert_eq!(order.total_amount.to_string(), "20.00");
        assert_eq!(order.status, OrderStatus::Processing);
        assert!(order.paid);
        assert_eq!(order.payment_method, "cash_on_delivery");
        assert_eq!(stock(&f.db, f.variant_id).await, 3);
        assert_eq!(f.db.carts().count_for_user(f.user_id).await.unwrap(), 0);

        let line = &order.items[0];
        assert_eq!(line.product_name, "Linen Shirt");
        assert_eq!(line.size.as_deref(), Some("M"));
        assert_eq!(line.color.as_deref(), Some("Blue"));
        assert_eq!(line.edition.as_deref(), Some("Gold"));

        let stored = f.db.orders().find_by_id(order.id).await.unwrap().unwrap();
        assert_eq!(stored.items, order.items);
        assert_eq!(stored.items[0].edition.as_deref(), Some("Gold"));
        assert_eq!(stored.total_amount, order.total_amount);

        let activity = f.db.activity().list_for_user(f.user_id).await.unwrap();
        assert_eq!(activity.len(), 1);
        assert_eq!(activity[0].action, "order.placed");
        assert!(activity[0].description.contains(&format!("#{}", order.id)));
    }

    #[tokio::test]
    async fn test_insufficient_stock_leaves_nothing_behind() {
        let f = fixture(1000, 1).await;
        let service = SqlitePlacementService::sqlite(f.db.clone(), PlacementSettings::default());

        let err = service
            .place_order(f.user_id, &[OrderItemRequest::new(f.variant_id, 2)], None)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(stock(&f.db, f.variant_id).await, 1);
        assert_eq!(f.db.orders().count().await.unwrap(), 0);
        assert_eq!(f.db.activity().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_variant_rejects_whole_order() {
        let f = fixture(1000, 5).await;
        let service = SqlitePlacementService::sqlite(f.db.clone(), PlacementSettings::default());

        let err = service
            .place_order(
                f.user_id,
                &[
                    OrderItemRequest::new(f.variant_id, 1),
                    OrderItemRequest::new(9999, 1),
                ],
                None,
            )
            .await
            .unwrap_err();

        match err {
            OrderError::Rejected(CoreError::VariantNotFound { missing }) => {
                assert_eq!(missing, vec![9999])
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(stock(&f.db, f.variant_id).await, 5);
        assert_eq!(f.db.orders().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failed_second_decrement_rolls_back_first() {
        let f = fixture(1000, 5).await;
        let second = add_variant(&f.db, "Canvas Tote", 500, 5).await;
        f.db.carts().add_item(f.user_id, f.variant_id, 1).await.unwrap();

        let store = SqliteStore::new(f.db.clone());
        let service = OrderPlacementService::new(
            store.clone(),
            FailingDecrement {
                inner: store.clone(),
                fail_for: second,
            },
            store.clone(),
            store.clone(),
            store,
            PlacementSettings::default(),
        );

        let err = service
            .place_order(
                f.user_id,
                &[
                    OrderItemRequest::new(f.variant_id, 2),
                    OrderItemRequest::new(second, 1),
                ],
                None,
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Persistence);
        assert_eq!(stock(&f.db, f.variant_id).await, 5);
        assert_eq!(stock(&f.db, second).await, 5);
        assert_eq!(f.db.orders().count().await.unwrap(), 0);
        assert_eq!(f.db.orders().count_lines().await.unwrap(), 0);
        assert_eq!(f.db.carts().count_for_user(f.user_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failed_activity_log_rolls_back_order() {
        let f = fixture(1000, 5).await;
        let store = SqliteStore::new(f.db.clone());
        let service = OrderPlacementService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store,
            FailingRecorder,
            PlacementSettings::default(),
        );

        let err = service
            .place_order(f.user_id, &[OrderItemRequest::new(f.variant_id, 2)], None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            OrderError::Persistence(StoreError::Injected(_))
        ));
        assert_eq!(stock(&f.db, f.variant_id).await, 5);
        assert_eq!(f.db.orders().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_constraint_violation_is_persistence() {
        // No user row: the order insert trips the foreign key.
        let f = fixture(1000, 5).await;
        let service = SqlitePlacementService::sqlite(f.db.clone(), PlacementSettings::default());

        let err = service
            .place_order(404, &[OrderItemRequest::new(f.variant_id, 1)], None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            OrderError::Persistence(StoreError::Db(DbError::ForeignKeyViolation { .. }))
        ));
        assert_eq!(stock(&f.db, f.variant_id).await, 5);
    }

    #[tokio::test]
    async fn test_price_change_after_order_keeps_snapshot() {
        let f = fixture(1000, 5).await;
        let service = SqlitePlacementService::sqlite(f.db.clone(), PlacementSettings::default());

        let order = service
            .place_order(f.user_id, &[OrderItemRequest::new(f.variant_id, 2)], Some("card"))
            .await
            .unwrap();

        f.db.variants()
            .update_price(f.variant_id, Money::from_cents(2500))
            .await
            .unwrap();

        let stored = f.db.orders().find_by_id(order.id).await.unwrap().unwrap();
        assert_eq!(stored.total_amount, Money::from_cents(2000));
        assert_eq!(stored.items[0].unit_price, Money::from_cents(1000));
        assert_eq!(stored.payment_method, "card");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_orders_never_oversell() {
        let f = fixture(1000, 5).await;
        let service = Arc::new(SqlitePlacementService::sqlite(
            f.db.clone(),
            PlacementSettings::default(),
        ));

        let mut handles = Vec::new();
        for _ in 0..2 {
            let service = Arc::clone(&service);
            let (user_id, variant_id) = (f.user_id, f.variant_id);
            handles.push(tokio::spawn(async move {
                service
                    .place_order(user_id, &[OrderItemRequest::new(variant_id, 3)], None)
                    .await
            }));
        }

        let mut placed = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => placed += 1,
                Err(err) if err.kind() == ErrorKind::Conflict => conflicts += 1,
                Err(err) => panic!("unexpected error: {err:?}"),
            }
        }

        assert_eq!((placed, conflicts), (1, 1));
        assert_eq!(stock(&f.db, f.variant_id).await, 2);
        assert_eq!(f.db.orders().count().await.unwrap(), 1);
    }
}

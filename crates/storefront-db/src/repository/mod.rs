//! # Repository Module
//!
//! Database repository implementations for the storefront.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Pool path (reads, seeding, tests)                                      │
//! │       db.orders().find_by_id(42)                                        │
//! │                                                                         │
//! │  Transaction path (order placement)                                     │
//! │       let mut tx = db.begin_write().await?;                             │
//! │       VariantRepository::find_many_by_ids_in(tx.conn(), &ids)           │
//! │       OrderRepository::create_in(tx.conn(), &new_order)                 │
//! │       VariantRepository::decrement_stock_in(tx.conn(), id, qty)         │
//! │       CartRepository::clear_for_user_in(tx.conn(), user_id)             │
//! │       ActivityRepository::record_in(tx.conn(), &activity)               │
//! │       tx.commit().await?;                                               │
//! │                                                                         │
//! │  Both paths share the same SQL; the `_in` functions take               │
//! │  `&mut SqliteConnection` and the pool methods acquire one.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`variant::VariantRepository`] - Variants, stock, product inserts
//! - [`cart::CartRepository`] - Cart lines per user
//! - [`order::OrderRepository`] - Orders with their line snapshots
//! - [`activity::ActivityRepository`] - Audit trail
//! - [`user::UserRepository`] - Shopper rows referenced by the above

pub mod activity;
pub mod cart;
pub mod order;
pub mod user;
pub mod variant;

#[cfg(test)]
pub(crate) mod test_support {
    use storefront_core::Money;

    use crate::repository::variant::NewVariant;
    use crate::{Database, DbConfig};

    /// Fresh in-memory database with one user (id returned) and one
    /// variant priced at `price_cents` with `stock` units.
    pub async fn setup(price_cents: i64, stock: i64) -> (Database, i64, i64) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let user_id = db.users().insert("Ann", "ann@example.com").await.unwrap();
        let product_id = db.variants().insert_product("Linen Shirt", None).await.unwrap();
        let variant_id = db
            .variants()
            .insert(&NewVariant {
                product_id,
                size: Some("M".to_string()),
                color: Some("Blue".to_string()),
                edition: None,
                price: Money::from_cents(price_cents),
                stock,
            })
            .await
            .unwrap();
        (db, user_id, variant_id)
    }
}

//! # Variant Repository
//!
//! Database operations for products and their purchasable variants.
//!
//! ## Guarded Decrement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UPDATE product_variants                                                │
//! │     SET stock = stock - :amount                                         │
//! │   WHERE id = :id AND stock >= :amount                                   │
//! │                                                                         │
//! │  rows_affected == 1  ──► decremented                                    │
//! │  rows_affected == 0  ──► DbError::InsufficientStock (never clamps)      │
//! │                                                                         │
//! │  The WHERE clause re-checks stock at write time, so a writer in        │
//! │  another process cannot drive stock below zero between our read and    │
//! │  our write.                                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::sqlite::SqliteConnection;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use storefront_core::{Money, Variant};

const SELECT_VARIANT: &str = r#"
    SELECT
        v.id,
        v.product_id,
        p.name AS product_name,
        v.size,
        v.color,
        v.edition,
        v.price_cents,
        v.stock
    FROM product_variants v
    JOIN products p ON p.id = v.product_id
"#;

// =============================================================================
// Row Types
// =============================================================================

#[derive(Debug, FromRow)]
struct VariantRow {
    id: i64,
    product_id: i64,
    product_name: String,
    size: Option<String>,
    color: Option<String>,
    edition: Option<String>,
    price_cents: i64,
    stock: i64,
}

impl From<VariantRow> for Variant {
    fn from(row: VariantRow) -> Self {
        Variant {
            id: row.id,
            product_id: row.product_id,
            product_name: row.product_name,
            size: row.size,
            color: row.color,
            edition: row.edition,
            price: Money::from_cents(row.price_cents),
            stock: row.stock,
        }
    }
}

/// Input for creating a variant.
#[derive(Debug, Clone)]
pub struct NewVariant {
    pub product_id: i64,
    pub size: Option<String>,
    pub color: Option<String>,
    pub edition: Option<String>,
    pub price: Money,
    pub stock: i64,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product and variant database operations.
#[derive(Debug, Clone)]
pub struct VariantRepository {
    pool: SqlitePool,
}

impl VariantRepository {
    /// Creates a new VariantRepository.
    pub fn new(pool: SqlitePool) -> Self {
        VariantRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Transaction-scoped operations
    // -------------------------------------------------------------------------

    /// Fetches every existing variant among `ids` in a single query.
    ///
    /// Unknown ids are simply absent from the result; row order is by id.
    pub async fn find_many_by_ids_in(
        conn: &mut SqliteConnection,
        ids: &[i64],
    ) -> DbResult<Vec<Variant>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        debug!(count = ids.len(), "Fetching variants by id");

        let mut query = QueryBuilder::<Sqlite>::new(SELECT_VARIANT);
        query.push(" WHERE v.id IN (");
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY v.id");

        let rows: Vec<VariantRow> = query.build_query_as().fetch_all(&mut *conn).await?;
        Ok(rows.into_iter().map(Variant::from).collect())
    }

    /// Decrements stock by `amount`, failing instead of going negative.
    pub async fn decrement_stock_in(
        conn: &mut SqliteConnection,
        variant_id: i64,
        amount: i64,
    ) -> DbResult<()> {
        debug!(variant_id, amount, "Decrementing stock");

        let result = sqlx::query(
            "UPDATE product_variants SET stock = stock - ?2 WHERE id = ?1 AND stock >= ?2",
        )
        .bind(variant_id)
        .bind(amount)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::InsufficientStock {
                variant_id,
                requested: amount,
            });
        }

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Pool operations
    // -------------------------------------------------------------------------

    /// Fetches every existing variant among `ids`.
    pub async fn find_many_by_ids(&self, ids: &[i64]) -> DbResult<Vec<Variant>> {
        let mut conn = self.pool.acquire().await?;
        Self::find_many_by_ids_in(&mut conn, ids).await
    }

    /// Gets a variant by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Variant>> {
        let sql = format!("{SELECT_VARIANT} WHERE v.id = ?1");
        let row: Option<VariantRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Variant::from))
    }

    /// Decrements stock outside any placement (admin adjustments, tests).
    pub async fn decrement_stock(&self, variant_id: i64, amount: i64) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        Self::decrement_stock_in(&mut conn, variant_id, amount).await
    }

    /// Counts all variants.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM product_variants")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Inserts a product and returns its id.
    pub async fn insert_product(&self, name: &str, description: Option<&str>) -> DbResult<i64> {
        debug!(name = %name, "Inserting product");

        let result = sqlx::query("INSERT INTO products (name, description) VALUES (?1, ?2)")
            .bind(name)
            .bind(description)
            .execute(&self.pool)
            .await?;

        Ok(result.last_insert_rowid())
    }

    /// Inserts a variant and returns its id.
    pub async fn insert(&self, variant: &NewVariant) -> DbResult<i64> {
        debug!(product_id = variant.product_id, "Inserting variant");

        let result = sqlx::query(
            r#"
            INSERT INTO product_variants (product_id, size, color, edition, price_cents, stock)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(variant.product_id)
        .bind(&variant.size)
        .bind(&variant.color)
        .bind(&variant.edition)
        .bind(variant.price.cents())
        .bind(variant.stock)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Changes the current price of a variant.
    ///
    /// Existing order lines keep the price they were placed at.
    pub async fn update_price(&self, variant_id: i64, price: Money) -> DbResult<()> {
        debug!(variant_id, price = %price, "Updating variant price");

        let result = sqlx::query("UPDATE product_variants SET price_cents = ?2 WHERE id = ?1")
            .bind(variant_id)
            .bind(price.cents())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Variant", variant_id));
        }

        Ok(())
    }

    /// Deletes a variant from the catalog.
    ///
    /// Order lines referencing it keep their snapshot with a null variant id.
    pub async fn delete(&self, variant_id: i64) -> DbResult<()> {
        debug!(variant_id, "Deleting variant");

        let result = sqlx::query("DELETE FROM product_variants WHERE id = ?1")
            .bind(variant_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Variant", variant_id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::setup;

    #[tokio::test]
    async fn test_find_many_skips_unknown_ids() {
        let (db, _, variant_id) = setup(1000, 5).await;

        let variants = db
            .variants()
            .find_many_by_ids(&[variant_id, 9999])
            .await
            .unwrap();

        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].product_name, "Linen Shirt");
        assert_eq!(variants[0].price, Money::from_cents(1000));
        assert_eq!(variants[0].stock, 5);
    }

    #[tokio::test]
    async fn test_find_many_empty_input() {
        let (db, _, _) = setup(1000, 5).await;
        assert!(db.variants().find_many_by_ids(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_decrement_is_guarded() {
        let (db, _, variant_id) = setup(1000, 3).await;
        let repo = db.variants();

        repo.decrement_stock(variant_id, 2).await.unwrap();

        let err = repo.decrement_stock(variant_id, 2).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::InsufficientStock { requested: 2, .. }
        ));

        // Never clamps.
        let variant = repo.get_by_id(variant_id).await.unwrap().unwrap();
        assert_eq!(variant.stock, 1);

        repo.decrement_stock(variant_id, 1).await.unwrap();
        let variant = repo.get_by_id(variant_id).await.unwrap().unwrap();
        assert_eq!(variant.stock, 0);
    }

    #[tokio::test]
    async fn test_update_price_and_delete() {
        let (db, _, variant_id) = setup(1000, 3).await;
        let repo = db.variants();

        repo.update_price(variant_id, Money::from_cents(1500)).await.unwrap();
        let variant = repo.get_by_id(variant_id).await.unwrap().unwrap();
        assert_eq!(variant.price.to_string(), "15.00");

        repo.delete(variant_id).await.unwrap();
        assert!(repo.get_by_id(variant_id).await.unwrap().is_none());
        assert!(matches!(
            repo.delete(variant_id).await,
            Err(DbError::NotFound { .. })
        ));
    }
}

//! # Cart Repository
//!
//! Pending line items per user. Placement only ever clears a cart;
//! adding lines is here for seeding and tests.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteConnection;
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use storefront_core::CartLine;

#[derive(Debug, FromRow)]
struct CartRow {
    id: i64,
    user_id: i64,
    variant_id: i64,
    quantity: i64,
    added_at: DateTime<Utc>,
}

impl From<CartRow> for CartLine {
    fn from(row: CartRow) -> Self {
        CartLine {
            id: row.id,
            user_id: row.user_id,
            variant_id: row.variant_id,
            quantity: row.quantity,
            added_at: row.added_at,
        }
    }
}

/// Repository for cart database operations.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    /// Creates a new CartRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// Deletes every cart line of `user_id`, returning how many were removed.
    ///
    /// An empty cart is not an error.
    pub async fn clear_for_user_in(conn: &mut SqliteConnection, user_id: i64) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = ?1")
            .bind(user_id)
            .execute(&mut *conn)
            .await?;

        debug!(user_id, removed = result.rows_affected(), "Cleared cart");
        Ok(result.rows_affected())
    }

    /// Pool variant of [`CartRepository::clear_for_user_in`].
    pub async fn clear_for_user(&self, user_id: i64) -> DbResult<u64> {
        let mut conn = self.pool.acquire().await?;
        Self::clear_for_user_in(&mut conn, user_id).await
    }

    /// Adds `quantity` of a variant to the cart, merging with an existing line.
    pub async fn add_item(&self, user_id: i64, variant_id: i64, quantity: i64) -> DbResult<()> {
        debug!(user_id, variant_id, quantity, "Adding cart line");

        sqlx::query(
            r#"
            INSERT INTO cart_items (user_id, variant_id, quantity)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (user_id, variant_id)
            DO UPDATE SET quantity = quantity + excluded.quantity
            "#,
        )
        .bind(user_id)
        .bind(variant_id)
        .bind(quantity)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Lists the cart lines of a user, oldest first.
    pub async fn list_for_user(&self, user_id: i64) -> DbResult<Vec<CartLine>> {
        let rows: Vec<CartRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, variant_id, quantity, added_at
            FROM cart_items
            WHERE user_id = ?1
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CartLine::from).collect())
    }

    /// Counts the cart lines of a user.
    pub async fn count_for_user(&self, user_id: i64) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cart_items WHERE user_id = ?1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use crate::repository::test_support::setup;

    #[tokio::test]
    async fn test_add_merges_and_clear_counts() {
        let (db, user_id, variant_id) = setup(1000, 5).await;
        let carts = db.carts();

        carts.add_item(user_id, variant_id, 1).await.unwrap();
        carts.add_item(user_id, variant_id, 2).await.unwrap();

        let lines = carts.list_for_user(user_id).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 3);

        assert_eq!(carts.clear_for_user(user_id).await.unwrap(), 1);
        assert_eq!(carts.count_for_user(user_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_clear_empty_cart_is_noop() {
        let (db, user_id, _) = setup(1000, 5).await;
        assert_eq!(db.carts().clear_for_user(user_id).await.unwrap(), 0);
    }
}

//! # Order Repository
//!
//! Writes orders with their line snapshots and reads them back.
//!
//! ## Write Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_in(conn, &NewOrder)                                             │
//! │     ├── INSERT INTO orders ...            → order id                    │
//! │     ├── INSERT INTO order_items ... (×N)  → line ids                    │
//! │     └── Order { id, items: [OrderLine; N], .. }                         │
//! │                                                                         │
//! │  Runs on the caller's connection; the caller owns the transaction.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Orders are immutable once written: there is no update path.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteConnection;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use std::collections::HashMap;
use tracing::debug;

use crate::error::DbResult;
use storefront_core::{Money, NewOrder, Order, OrderLine, OrderStatus};

// =============================================================================
// Row Types
// =============================================================================

#[derive(Debug, FromRow)]
struct OrderRow {
    id: i64,
    user_id: i64,
    total_amount_cents: i64,
    payment_method: String,
    paid: bool,
    status: OrderStatus,
    created_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderLine>) -> Order {
        Order {
            id: self.id,
            user_id: self.user_id,
            total_amount: Money::from_cents(self.total_amount_cents),
            payment_method: self.payment_method,
            paid: self.paid,
            status: self.status,
            created_at: self.created_at,
            items,
        }
    }
}

#[derive(Debug, FromRow)]
struct OrderLineRow {
    id: i64,
    order_id: i64,
    variant_id: Option<i64>,
    product_name: String,
    size: Option<String>,
    color: Option<String>,
    edition: Option<String>,
    unit_price_cents: i64,
    quantity: i64,
    subtotal_cents: i64,
}

impl From<OrderLineRow> for OrderLine {
    fn from(row: OrderLineRow) -> Self {
        OrderLine {
            id: row.id,
            order_id: row.order_id,
            variant_id: row.variant_id,
            product_name: row.product_name,
            size: row.size,
            color: row.color,
            edition: row.edition,
            unit_price: Money::from_cents(row.unit_price_cents),
            quantity: row.quantity,
            subtotal: Money::from_cents(row.subtotal_cents),
        }
    }
}

const SELECT_ORDER: &str = r#"
    SELECT id, user_id, total_amount_cents, payment_method, paid, status, created_at
    FROM orders
"#;

const SELECT_LINE: &str = r#"
    SELECT id, order_id, variant_id, product_name, size, color, edition,
           unit_price_cents, quantity, subtotal_cents
    FROM order_items
"#;

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Inserts the order row and every line row on `conn`.
    pub async fn create_in(conn: &mut SqliteConnection, order: &NewOrder) -> DbResult<Order> {
        let created_at = Utc::now();

        debug!(
            user_id = order.user_id,
            lines = order.lines.len(),
            total = %order.total_amount,
            "Inserting order"
        );

        let order_id = sqlx::query(
            r#"
            INSERT INTO orders (user_id, total_amount_cents, payment_method, paid, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(order.user_id)
        .bind(order.total_amount.cents())
        .bind(&order.payment_method)
        .bind(order.paid)
        .bind(order.status)
        .bind(created_at)
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();

        let mut items = Vec::with_capacity(order.lines.len());
        for line in &order.lines {
            let line_id = sqlx::query(
                r#"
                INSERT INTO order_items (
                    order_id, variant_id, product_name, size, color, edition,
                    unit_price_cents, quantity, subtotal_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )
            .bind(order_id)
            .bind(line.variant_id)
            .bind(&line.product_name)
            .bind(&line.size)
            .bind(&line.color)
            .bind(&line.edition)
            .bind(line.unit_price.cents())
            .bind(line.quantity)
            .bind(line.subtotal.cents())
            .execute(&mut *conn)
            .await?
            .last_insert_rowid();

            items.push(OrderLine {
                id: line_id,
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

        Ok(Order {
            id: order_id,
            user_id: order.user_id,
            total_amount: order.total_amount,
            payment_method: order.payment_method.clone(),
            paid: order.paid,
            status: order.status,
            created_at,
            items,
        })
    }

    /// Gets an order with its lines.
    pub async fn find_by_id(&self, order_id: i64) -> DbResult<Option<Order>> {
        let sql = format!("{SELECT_ORDER} WHERE id = ?1");
        let row: Option<OrderRow> = sqlx::query_as(&sql)
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let sql = format!("{SELECT_LINE} WHERE order_id = ?1 ORDER BY id");
        let lines: Vec<OrderLineRow> = sqlx::query_as(&sql)
            .bind(order_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(Some(
            row.into_order(lines.into_iter().map(OrderLine::from).collect()),
        ))
    }

    /// Lists a user's orders, newest first, with their lines.
    pub async fn list_for_user(&self, user_id: i64) -> DbResult<Vec<Order>> {
        let sql = format!("{SELECT_ORDER} WHERE user_id = ?1 ORDER BY created_at DESC, id DESC");
        let rows: Vec<OrderRow> = sqlx::query_as(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = QueryBuilder::<Sqlite>::new(SELECT_LINE);
        query.push(" WHERE order_id IN (");
        let mut separated = query.separated(", ");
        for row in &rows {
            separated.push_bind(row.id);
        }
        separated.push_unseparated(") ORDER BY id");

        let lines: Vec<OrderLineRow> = query.build_query_as().fetch_all(&self.pool).await?;

        let mut by_order: HashMap<i64, Vec<OrderLine>> = HashMap::new();
        for line in lines {
            by_order
                .entry(line.order_id)
                .or_default()
                .push(OrderLine::from(line));
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let items = by_order.remove(&row.id).unwrap_or_default();
                row.into_order(items)
            })
            .collect())
    }

    /// Counts all orders.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Counts all order lines.
    pub async fn count_lines(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_items")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

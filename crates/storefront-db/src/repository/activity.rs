//! # Activity Repository
//!
//! Append-only audit trail. Rows are never updated or deleted here.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteConnection;
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use storefront_core::{ActivityLogEntry, NewActivity};

#[derive(Debug, FromRow)]
struct ActivityRow {
    id: i64,
    user_id: i64,
    action: String,
    description: String,
    created_at: DateTime<Utc>,
}

impl From<ActivityRow> for ActivityLogEntry {
    fn from(row: ActivityRow) -> Self {
        ActivityLogEntry {
            id: row.id,
            user_id: row.user_id,
            action: row.action,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

/// Repository for the activity log.
#[derive(Debug, Clone)]
pub struct ActivityRepository {
    pool: SqlitePool,
}

impl ActivityRepository {
    /// Creates a new ActivityRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ActivityRepository { pool }
    }

    /// Appends one entry on `conn`.
    pub async fn record_in(conn: &mut SqliteConnection, entry: &NewActivity) -> DbResult<i64> {
        debug!(user_id = entry.user_id, action = %entry.action, "Recording activity");

        let result = sqlx::query(
            r#"
            INSERT INTO activity_logs (user_id, action, description, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(entry.user_id)
        .bind(&entry.action)
        .bind(&entry.description)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Lists a user's entries, oldest first.
    pub async fn list_for_user(&self, user_id: i64) -> DbResult<Vec<ActivityLogEntry>> {
        let rows: Vec<ActivityRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, action, description, created_at
            FROM activity_logs
            WHERE user_id = ?1
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ActivityLogEntry::from).collect())
    }

    /// Counts all entries.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM activity_logs")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

//! # User Repository
//!
//! Minimal shopper rows. Accounts are owned by the auth service; the
//! storefront only needs ids for foreign keys.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};

/// Repository for user rows.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Inserts a user and returns its id.
    pub async fn insert(&self, name: &str, email: &str) -> DbResult<i64> {
        debug!(email = %email, "Inserting user");

        let result = sqlx::query("INSERT INTO users (name, email) VALUES (?1, ?2)")
            .bind(name)
            .bind(email)
            .execute(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { field, .. } => DbError::duplicate(field, email),
                other => other,
            })?;

        Ok(result.last_insert_rowid())
    }

    /// Looks up a user id by email.
    pub async fn find_id_by_email(&self, email: &str) -> DbResult<Option<i64>> {
        let id: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE email = ?1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id)
    }

    /// Counts all users.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig, DbError};

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let users = db.users();

        let id = users.insert("Ann", "ann@example.com").await.unwrap();
        assert_eq!(users.find_id_by_email("ann@example.com").await.unwrap(), Some(id));

        let err = users.insert("Ann", "ann@example.com").await.unwrap_err();
        match err {
            DbError::UniqueViolation { value, .. } => assert_eq!(value, "ann@example.com"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

//! # Placement Errors
//!
//! What the route layer sees when `place_order` fails.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow                                           │
//! │                                                                         │
//! │  CoreError (storefront-core)  ──► OrderError::Rejected                  │
//! │     EmptyOrder / InvalidItem        kind = validation   → 400           │
//! │     VariantNotFound                 kind = not_found    → 404           │
//! │     InsufficientStock               kind = conflict     → 409           │
//! │                                                                         │
//! │  DbError (storefront-db)                                                │
//! │     └──► StoreError ──────────► OrderError::Persistence                 │
//! │                                     kind = persistence  → 500           │
//! │                                     message is opaque in ErrorBody      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;

use storefront_core::CoreError;
use storefront_db::DbError;

// =============================================================================
// Store Error
// =============================================================================

/// Failure of a collaborator inside the atomic unit.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite adapter failure.
    #[error(transparent)]
    Db(#[from] DbError),

    /// The guarded decrement of the in-memory store matched nothing.
    #[error("Stock guard rejected decrement of {requested} for variant {variant_id}")]
    StockGuard { variant_id: i64, requested: i64 },

    /// A failure injected by a test double.
    #[cfg(any(test, feature = "test-util"))]
    #[error("Injected failure: {0}")]
    Injected(String),
}

/// Result type for collaborator operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Order Error
// =============================================================================

/// Error returned by `OrderPlacementService::place_order`.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The request was refused; nothing was written.
    #[error(transparent)]
    Rejected(#[from] CoreError),

    /// Something failed inside the atomic unit; it was rolled back.
    #[error("Order could not be saved: {0}")]
    Persistence(#[from] StoreError),
}

impl From<DbError> for OrderError {
    fn from(err: DbError) -> Self {
        OrderError::Persistence(StoreError::Db(err))
    }
}

/// Classification the route layer maps to a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Persistence,
}

impl ErrorKind {
    /// Suggested HTTP status code.
    pub const fn http_status(&self) -> u16 {
        match self {
            ErrorKind::Validation => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::Persistence => 500,
        }
    }
}

impl OrderError {
    /// Returns the classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderError::Rejected(CoreError::EmptyOrder)
            | OrderError::Rejected(CoreError::InvalidItem { .. })
            | OrderError::Rejected(CoreError::Validation(_)) => ErrorKind::Validation,
            OrderError::Rejected(CoreError::VariantNotFound { .. }) => ErrorKind::NotFound,
            OrderError::Rejected(CoreError::InsufficientStock { .. }) => ErrorKind::Conflict,
            OrderError::Persistence(_) => ErrorKind::Persistence,
        }
    }

    /// Builds the body the route layer returns to the client.
    pub fn to_body(&self) -> ErrorBody {
        let message = match self {
            OrderError::Rejected(err) => err.to_string(),
            OrderError::Persistence(_) => "The order could not be saved. Please try again.".to_string(),
        };
        ErrorBody {
            code: self.kind(),
            message,
        }
    }
}

/// Serialized error returned to clients.
///
/// ```json
/// { "code": "conflict", "message": "Insufficient stock for Linen Shirt ..." }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    /// Machine-readable classification
    pub code: ErrorKind,

    /// Human-readable message for display
    pub message: String,
}

// =============================================================================
// Config Error
// =============================================================================

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_core::ValidationError;

    #[test]
    fn test_kinds() {
        assert_eq!(
            OrderError::from(CoreError::EmptyOrder).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            OrderError::from(CoreError::InvalidItem {
                index: 0,
                reason: ValidationError::MustBePositive {
                    field: "quantity".to_string()
                },
            })
            .kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            OrderError::from(CoreError::VariantNotFound { missing: vec![1] }).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            OrderError::from(CoreError::InsufficientStock {
                variant_id: 1,
                product_name: "Tote".to_string(),
                size: None,
                color: None,
                requested: 2,
                available: 1,
            })
            .kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            OrderError::from(DbError::PoolExhausted).kind(),
            ErrorKind::Persistence
        );
    }

    #[test]
    fn test_persistence_body_is_opaque() {
        let err = OrderError::from(DbError::QueryFailed("database is locked".to_string()));
        let body = serde_json::to_value(err.to_body()).unwrap();
        assert_eq!(body["code"], "persistence");
        assert!(!body["message"].as_str().unwrap().contains("locked"));
        assert_eq!(err.kind().http_status(), 500);
    }

    #[test]
    fn test_rejection_body_carries_details() {
        let err = OrderError::from(CoreError::VariantNotFound {
            missing: vec![9999],
        });
        let body = err.to_body();
        assert_eq!(body.code, ErrorKind::NotFound);
        assert!(body.message.contains("9999"));
    }
}

//! # Error Types
//!
//! Domain-specific error types for storefront-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  storefront-core errors (this file)                                     │
//! │  ├── CoreError        - Order rejections (empty, invalid, stock)        │
//! │  └── ValidationError  - Why a single input value was refused            │
//! │                                                                         │
//! │  storefront-db errors (separate crate)                                  │
//! │  └── DbError          - Database operation failures                     │
//! │                                                                         │
//! │  storefront-orders errors                                               │
//! │  └── OrderError       - What the route layer sees (classified)          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → OrderError ← DbError               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (variant id, item index, etc.)
//! 3. Errors are enum variants, never String

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Reasons an order is refused before anything is written.
///
/// Every variant here is a caller problem (4xx). Storage failures live in
/// the db and service crates.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The request carried no line items.
    #[error("Order must contain at least one item")]
    EmptyOrder,

    /// A line item is malformed.
    ///
    /// `index` is the zero-based position of the item in the submission.
    #[error("Invalid item at position {index}: {reason}")]
    InvalidItem {
        index: usize,
        #[source]
        reason: ValidationError,
    },

    /// One or more referenced variants do not exist.
    ///
    /// A single unknown id rejects the whole order.
    #[error("Product variants not found: {missing:?}")]
    VariantNotFound { missing: Vec<i64> },

    /// Not enough stock to cover a line item.
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout (qty: 2)
    ///      │
    ///      ▼
    /// Check stock: available=1
    ///      │
    ///      ▼
    /// InsufficientStock { product_name: "Linen Shirt", size: "M", .. }
    ///      │
    ///      ▼
    /// UI shows: "Only 1 Linen Shirt (M, Blue) left"
    /// ```
    #[error(
        "Insufficient stock for {product_name} (size: {}, color: {}): available {available}, requested {requested}",
        size.as_deref().unwrap_or("-"),
        color.as_deref().unwrap_or("-")
    )]
    InsufficientStock {
        variant_id: i64,
        product_name: String,
        size: Option<String>,
        color: Option<String>,
        requested: i64,
        available: i64,
    },

    /// Validation error outside a specific line item.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before any store is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Collection holds more entries than allowed.
    #[error("{field} cannot have more than {max} entries")]
    TooMany { field: String, max: usize },

    /// A computed amount does not fit the money representation.
    #[error("{field} is too large")]
    Overflow { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

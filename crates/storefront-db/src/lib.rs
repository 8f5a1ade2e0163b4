//! # storefront-db: Database Layer for the Storefront
//!
//! This crate provides database access for order placement.
//! It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Storefront Data Flow                               │
//! │                                                                         │
//! │  OrderPlacementService (storefront-orders)                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  storefront-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ VariantRepo   │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ CartRepo      │    │ 0001_initial │  │   │
//! │  │   │ Writer gate   │    │ OrderRepo     │    │ _schema.sql  │  │   │
//! │  │   │               │    │ ActivityRepo  │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │                  storefront.db (WAL journal)                    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation, configuration and the writer gate
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (variant, cart, order, etc.)
//!
//! ## Pool vs. Transaction Methods
//!
//! Repository methods on `&self` run against the pool. The associated
//! functions ending in `_in` take `&mut SqliteConnection` so the placement
//! service can run them on one open transaction.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use storefront_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("storefront.db")).await?;
//! db.run_migrations().await?;
//!
//! let history = db.orders().list_for_user(7).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig, WriteTransaction};

// Repository re-exports for convenience
pub use repository::activity::ActivityRepository;
pub use repository::cart::CartRepository;
pub use repository::order::OrderRepository;
pub use repository::user::UserRepository;
pub use repository::variant::{NewVariant, VariantRepository};

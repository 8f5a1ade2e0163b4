//! # storefront-orders: Order Placement
//!
//! Validates a shopper's line items, checks stock against a consistent
//! snapshot and commits the order, its lines, the stock decrements, the
//! cart clear and the audit record as one atomic unit.
//!
//! ## Placement Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  place_order(user_id, items, payment_method?)                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate (no store access) ──────────────► EmptyOrder / InvalidItem    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  UnitOfWork::begin ─────────────────────────────────────────────┐       │
//! │       │                                                         │       │
//! │       ├── VariantStore::find_many_by_ids   → VariantNotFound    │       │
//! │       ├── plan_order (storefront-core)     → InsufficientStock  │ any   │
//! │       ├── OrderLedger::create_order                             │ error │
//! │       ├── VariantStore::decrement_stock (per line, guarded)     │  ──►  │
//! │       ├── CartStore::clear_for_user                             │ roll  │
//! │       └── ActivityRecorder::record                              │ back  │
//! │       │                                                         │       │
//! │       ▼                                                         │       │
//! │  UnitOfWork::commit ◄───────────────────────────────────────────┘       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Order (with lines)                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Adapters
//! - [`sqlite::SqliteStore`] - production, one SQLite transaction per order
//! - [`memory::MemoryStore`] - in-process store with fault injection
//!
//! ## Example
//! ```rust,ignore
//! let db = Database::new(config.database.to_db_config()).await?;
//! let service = SqlitePlacementService::sqlite(db, config.placement_settings());
//! let order = service
//!     .place_order(7, &[OrderItemRequest::new(3, 2)], None)
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod memory;
pub mod ports;
pub mod service;
pub mod sqlite;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::StorefrontConfig;
pub use error::{ConfigError, ErrorBody, ErrorKind, OrderError, StoreError, StoreResult};
pub use memory::{MemoryPlacementService, MemoryStore};
pub use ports::{ActivityRecorder, CartStore, OrderLedger, UnitOfWork, VariantStore};
pub use service::{OrderPlacementService, PlacementSettings};
pub use sqlite::{SqlitePlacementService, SqliteStore};

use tracing_subscriber::EnvFilter;

/// Default log filter when neither `RUST_LOG` nor config provide one.
pub const DEFAULT_LOG_FILTER: &str = "info,storefront=debug,sqlx=warn";

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages (wins over `filter`)
/// - `RUST_LOG=storefront_orders=trace` - Trace this crate only
/// - Otherwise `filter`, e.g. [`DEFAULT_LOG_FILTER`]
///
/// Calling it twice is harmless; the first subscriber stays installed.
pub fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_err()
    {
        tracing::debug!("Tracing subscriber already installed");
    }
}

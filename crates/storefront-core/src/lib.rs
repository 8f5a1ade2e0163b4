//! # storefront-core: Pure Business Logic for Order Placement
//!
//! This crate holds the order-placement rules of the storefront as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Storefront Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              HTTP route layer (outside this workspace)          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ place_order(user, items, payment)      │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │          storefront-orders (placement service, unit of work)    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ storefront-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌────────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  checkout  │  │ validation│  │   │
//! │  │   │  Variant  │  │   Money   │  │  plan_order│  │   rules   │  │   │
//! │  │   │   Order   │  │  (cents)  │  │  snapshots │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └────────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                storefront-db (Database Layer)                   │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Variant, Order, OrderLine, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Item validation
//! - [`checkout`] - Stock checks, totals and line snapshots for one placement
//!
//! ## Example Usage
//!
//! ```rust
//! use storefront_core::money::Money;
//!
//! let price: Money = "10.00".parse().unwrap();
//! let subtotal = price.checked_multiply_quantity(2).unwrap();
//! assert_eq!(subtotal.to_string(), "20.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use checkout::{plan_order, OrderPlan};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;
pub use validation::OrderLimits;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of line items accepted in a single order.
///
/// Mirrors the cart size ceiling; overridable through `OrderLimits`.
pub const MAX_LINE_ITEMS: usize = 100;

/// Maximum quantity of a single line item.
///
/// Guards against typos such as 1000 instead of 10.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Payment label used when the caller does not name one.
pub const DEFAULT_PAYMENT_METHOD: &str = "cash_on_delivery";

/// Activity tag appended for every placed order.
pub const ORDER_PLACED_ACTION: &str = "order.placed";

//! # Storefront Configuration
//!
//! Settings for the database, order placement limits and logging.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                            │
//! │     STOREFRONT_DB_PATH=/var/lib/storefront/storefront.db                │
//! │     STOREFRONT_LOG=debug                                                │
//! │                                                                         │
//! │  2. TOML Config File                                                    │
//! │     ~/.config/orders/storefront.toml (Linux)                            │
//! │     ~/Library/Application Support/com.storefront.orders/ (macOS)        │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # storefront.toml
//! [database]
//! path = "storefront.db"
//! max_connections = 5
//! connect_timeout_secs = 30
//! busy_timeout_ms = 5000
//!
//! [orders]
//! default_payment_method = "cash_on_delivery"
//! max_item_quantity = 999
//! max_line_items = 100
//!
//! [logging]
//! filter = "info,storefront=debug,sqlx=warn"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use storefront_core::validation::normalize_payment_method;
use storefront_core::{OrderLimits, DEFAULT_PAYMENT_METHOD, MAX_ITEM_QUANTITY, MAX_LINE_ITEMS};
use storefront_db::DbConfig;

use crate::error::ConfigError;
use crate::service::PlacementSettings;
use crate::DEFAULT_LOG_FILTER;

/// Upper bound for `orders.max_line_items`.
///
/// Each distinct variant of an order is one bound parameter of the variant
/// lookup; SQLite builds before 3.32 cap those at 999.
pub const MAX_CONFIGURABLE_LINE_ITEMS: usize = 999;

// =============================================================================
// Database Settings
// =============================================================================

/// Where the database lives and how the pool behaves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file path.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Pool acquire timeout.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// How long SQLite waits on a locked database before failing.
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("storefront.db")
}
fn default_max_connections() -> u32 {
    5
}
fn default_connect_timeout() -> u64 {
    30
}
fn default_busy_timeout() -> u64 {
    5000
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
            connect_timeout_secs: default_connect_timeout(),
            busy_timeout_ms: default_busy_timeout(),
        }
    }
}

impl DatabaseSettings {
    /// Builds the pool configuration for `storefront-db`.
    pub fn to_db_config(&self) -> DbConfig {
        DbConfig::new(&self.path)
            .max_connections(self.max_connections)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .busy_timeout(Duration::from_millis(self.busy_timeout_ms))
    }
}

// =============================================================================
// Order Settings
// =============================================================================

/// Placement defaults and ceilings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSettings {
    /// Label stored when a request carries no payment method.
    #[serde(default = "default_payment_method")]
    pub default_payment_method: String,

    #[serde(default = "default_max_item_quantity")]
    pub max_item_quantity: i64,

    #[serde(default = "default_max_line_items")]
    pub max_line_items: usize,
}

fn default_payment_method() -> String {
    DEFAULT_PAYMENT_METHOD.to_string()
}
fn default_max_item_quantity() -> i64 {
    MAX_ITEM_QUANTITY
}
fn default_max_line_items() -> usize {
    MAX_LINE_ITEMS
}

impl Default for OrderSettings {
    fn default() -> Self {
        OrderSettings {
            default_payment_method: default_payment_method(),
            max_item_quantity: default_max_item_quantity(),
            max_line_items: default_max_line_items(),
        }
    }
}

// =============================================================================
// Logging Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `EnvFilter` directive; `RUST_LOG` still wins when set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            filter: default_log_filter(),
        }
    }
}

// =============================================================================
// Storefront Config
// =============================================================================

/// Complete configuration of the order placement service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorefrontConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub orders: OrderSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl StorefrontConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (storefront.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading storefront config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if self.orders.max_item_quantity <= 0 {
            return Err(ConfigError::Invalid(
                "orders.max_item_quantity must be greater than 0".into(),
            ));
        }

        if self.orders.max_line_items == 0
            || self.orders.max_line_items > MAX_CONFIGURABLE_LINE_ITEMS
        {
            return Err(ConfigError::Invalid(format!(
                "orders.max_line_items must be between 1 and {MAX_CONFIGURABLE_LINE_ITEMS}"
            )));
        }

        // The default is used verbatim for orders without a label.
        normalize_payment_method(None, &self.orders.default_payment_method).map_err(|e| {
            ConfigError::Invalid(format!("orders.default_payment_method: {e}"))
        })?;

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from `lookup`; unparsable numbers are ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("STOREFRONT_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(max) = lookup("STOREFRONT_DB_MAX_CONNECTIONS") {
            match max.parse::<u32>() {
                Ok(n) => self.database.max_connections = n,
                Err(_) => warn!(value = %max, "Ignoring invalid STOREFRONT_DB_MAX_CONNECTIONS"),
            }
        }

        if let Some(label) = lookup("STOREFRONT_DEFAULT_PAYMENT_METHOD") {
            self.orders.default_payment_method = label;
        }

        if let Some(max) = lookup("STOREFRONT_MAX_ITEM_QUANTITY") {
            match max.parse::<i64>() {
                Ok(n) => self.orders.max_item_quantity = n,
                Err(_) => warn!(value = %max, "Ignoring invalid STOREFRONT_MAX_ITEM_QUANTITY"),
            }
        }

        if let Some(filter) = lookup("STOREFRONT_LOG") {
            self.logging.filter = filter;
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "storefront", "orders")
            .map(|dirs| dirs.config_dir().join("storefront.toml"))
    }

    /// Settings handed to the placement service.
    pub fn placement_settings(&self) -> PlacementSettings {
        PlacementSettings {
            default_payment_method: self.orders.default_payment_method.trim().to_string(),
            limits: OrderLimits {
                max_item_quantity: self.orders.max_item_quantity,
                max_line_items: self.orders.max_line_items,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = StorefrontConfig::default();
        assert_eq!(config.database.path, PathBuf::from("storefront.db"));
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.orders.default_payment_method, "cash_on_delivery");
        assert_eq!(config.orders.max_item_quantity, 999);
        assert_eq!(config.orders.max_line_items, 100);
        assert_eq!(config.logging.filter, DEFAULT_LOG_FILTER);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: StorefrontConfig = toml::from_str(
            r#"
            [database]
            path = "/tmp/shop.db"

            [orders]
            max_item_quantity = 20
            "#,
        )
        .unwrap();

        assert_eq!(config.database.path, PathBuf::from("/tmp/shop.db"));
        assert_eq!(config.database.busy_timeout_ms, 5000);
        assert_eq!(config.orders.max_item_quantity, 20);
        assert_eq!(config.orders.max_line_items, 100);
        assert_eq!(config.logging, LoggingSettings::default());
    }

    #[test]
    fn test_overrides_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("STOREFRONT_DB_PATH", "/data/store.db"),
            ("STOREFRONT_DB_MAX_CONNECTIONS", "not-a-number"),
            ("STOREFRONT_DEFAULT_PAYMENT_METHOD", "card"),
            ("STOREFRONT_MAX_ITEM_QUANTITY", "50"),
            ("STOREFRONT_LOG", "debug"),
        ]
        .into_iter()
        .collect();

        let mut config = StorefrontConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.database.path, PathBuf::from("/data/store.db"));
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.orders.default_payment_method, "card");
        assert_eq!(config.orders.max_item_quantity, 50);
        assert_eq!(config.logging.filter, "debug");
    }

    #[test]
    fn test_config_validation() {
        let mut config = StorefrontConfig::default();
        config.database.max_connections = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = StorefrontConfig::default();
        config.orders.max_item_quantity = 0;
        assert!(config.validate().is_err());

        let mut config = StorefrontConfig::default();
        config.orders.max_line_items = 0;
        assert!(config.validate().is_err());

        let mut config = StorefrontConfig::default();
        config.orders.default_payment_method = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_line_item_ceiling_is_bounded() {
        let mut config = StorefrontConfig::default();
        config.orders.max_line_items = MAX_CONFIGURABLE_LINE_ITEMS;
        assert!(config.validate().is_ok());

        config.orders.max_line_items = MAX_CONFIGURABLE_LINE_ITEMS + 1;
        match config.validate() {
            Err(ConfigError::Invalid(msg)) => assert!(msg.contains("max_line_items")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_overlong_default_payment_method_is_rejected() {
        let mut config = StorefrontConfig::default();
        config.orders.default_payment_method = "x".repeat(60);

        match config.validate() {
            Err(ConfigError::Invalid(msg)) => assert!(msg.contains("default_payment_method")),
            other => panic!("unexpected result: {other:?}"),
        }

        config.orders.default_payment_method = "x".repeat(50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_settings_conversion() {
        let mut config = StorefrontConfig::default();
        config.orders.max_item_quantity = 10;
        config.database.busy_timeout_ms = 250;

        let settings = config.placement_settings();
        assert_eq!(settings.limits.max_item_quantity, 10);
        assert_eq!(settings.default_payment_method, "cash_on_delivery");

        let db = config.database.to_db_config();
        assert_eq!(db.busy_timeout, Duration::from_millis(250));
        assert_eq!(db.max_connections, 5);
    }

    #[test]
    fn test_toml_serialization() {
        let toml_str = toml::to_string_pretty(&StorefrontConfig::default()).unwrap();
        assert!(toml_str.contains("[database]"));
        assert!(toml_str.contains("[orders]"));
        assert!(toml_str.contains("[logging]"));
    }
}

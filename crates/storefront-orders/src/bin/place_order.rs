//! # Place Order
//!
//! Places one order from the command line and prints it as JSON.
//!
//! ## Usage
//! ```bash
//! # Two of variant 3 and one of variant 8 for user 1
//! cargo run -p storefront-orders --bin place-order -- \
//!     --user 1 --item 3:2 --item 8:1
//!
//! # Explicit database and payment label
//! cargo run -p storefront-orders --bin place-order -- \
//!     --db ./storefront_dev.db --user 1 --item 3:2 --payment card
//! ```
//!
//! Failures print the error body (`{"code": ..., "message": ...}`) to
//! stderr and exit with status 1.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use tracing::error;

use storefront_core::OrderItemRequest;
use storefront_db::Database;
use storefront_orders::{init_tracing, SqlitePlacementService, StorefrontConfig};

struct Args {
    config: Option<PathBuf>,
    db: Option<PathBuf>,
    user_id: Option<i64>,
    items: Vec<OrderItemRequest>,
    payment: Option<String>,
}

fn print_help() {
    println!("Storefront Order Placement");
    println!();
    println!("Usage: place-order --user <ID> --item <VARIANT:QTY>... [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -u, --user <ID>            Ordering user id");
    println!("  -i, --item <VARIANT:QTY>   Line item, repeatable");
    println!("      --payment <LABEL>      Payment method label (default from config)");
    println!("  -c, --config <PATH>        Config file (default: platform config dir)");
    println!("  -d, --db <PATH>            Database file, overrides config");
    println!("  -h, --help                 Show this help message");
}

/// Parses `variant:qty`. Unparsable halves become missing fields so the
/// service reports them like any other invalid item.
fn parse_item(raw: &str) -> OrderItemRequest {
    let (variant, qty) = raw.split_once(':').unwrap_or((raw, "1"));
    OrderItemRequest {
        variant_id: variant.trim().parse().ok(),
        quantity: qty.trim().parse().ok(),
    }
}

/// Returns `None` when help was requested.
fn parse_args(args: &[String]) -> Result<Option<Args>, String> {
    let mut parsed = Args {
        config: None,
        db: None,
        user_id: None,
        items: Vec::new(),
        payment: None,
    };

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        if matches!(flag, "--help" | "-h") {
            return Ok(None);
        }

        let value = args
            .get(i + 1)
            .ok_or_else(|| format!("Missing value for {flag}"))?;
        match flag {
            "--config" | "-c" => parsed.config = Some(PathBuf::from(value)),
            "--db" | "-d" => parsed.db = Some(PathBuf::from(value)),
            "--user" | "-u" => {
                parsed.user_id = Some(
                    value
                        .parse()
                        .map_err(|_| format!("Invalid user id: {value}"))?,
                )
            }
            "--item" | "-i" => parsed.items.push(parse_item(value)),
            "--payment" => parsed.payment = Some(value.clone()),
            other => return Err(format!("Unknown option: {other}")),
        }
        i += 2;
    }

    Ok(Some(parsed))
}

#[tokio::main]
async fn main() -> ExitCode {
    let raw: Vec<String> = env::args().collect();
    let args = match parse_args(&raw) {
        Ok(Some(args)) => args,
        Ok(None) => {
            print_help();
            return ExitCode::SUCCESS;
        }
        Err(message) => {
            eprintln!("{message}");
            eprintln!("Run with --help for usage.");
            return ExitCode::from(2);
        }
    };

    let Some(user_id) = args.user_id else {
        eprintln!("--user is required");
        return ExitCode::from(2);
    };

    let mut config = match StorefrontConfig::load(args.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(2);
        }
    };
    if let Some(db) = args.db {
        config.database.path = db;
    }

    init_tracing(&config.logging.filter);

    let db = match Database::new(config.database.to_db_config()).await {
        Ok(db) => db,
        Err(err) => {
            error!(error = %err, "Failed to open database");
            return ExitCode::FAILURE;
        }
    };

    let service = SqlitePlacementService::sqlite(db.clone(), config.placement_settings());
    let result = service
        .place_order(user_id, &args.items, args.payment.as_deref())
        .await;
    db.close().await;

    match result {
        Ok(order) => match serde_json::to_string_pretty(&order) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(err) => {
                error!(error = %err, "Failed to serialize order");
                ExitCode::FAILURE
            }
        },
        Err(err) => {
            match serde_json::to_string_pretty(&err.to_body()) {
                Ok(body) => eprintln!("{body}"),
                Err(_) => eprintln!("{err}"),
            }
            ExitCode::FAILURE
        }
    }
}

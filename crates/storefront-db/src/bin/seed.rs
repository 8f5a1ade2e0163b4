//! # Seed Data Generator
//!
//! Populates the database with shoppers, products and variants for
//! development.
//!
//! ## Usage
//! ```bash
//! # Seed ./storefront_dev.db with the default catalog
//! cargo run -p storefront-db --bin seed
//!
//! # Fewer products, different file
//! cargo run -p storefront-db --bin seed -- --products 5 --db ./data/storefront.db
//! ```
//!
//! ## Generated Data
//! - Three shoppers (`ann@example.com`, `ben@example.com`, `cho@example.com`)
//! - Apparel products, each with every size × color combination
//! - Deterministic prices 9.99 - 59.99 and stock 0 - 25
//! - A couple of cart lines for the first shopper

use std::env;
use storefront_core::Money;
use storefront_db::{Database, DbConfig, NewVariant};

/// Product names with their base price in cents.
const PRODUCTS: &[(&str, i64)] = &[
    ("Linen Shirt", 2999),
    ("Denim Jacket", 5999),
    ("Canvas Tote", 999),
    ("Wool Beanie", 1499),
    ("Chino Shorts", 2499),
    ("Rain Shell", 4999),
    ("Crew Socks", 999),
    ("Hoodie", 3999),
];

const SIZES: &[&str] = &["S", "M", "L", "XL"];

const COLORS: &[&str] = &["Black", "Navy", "Sand"];

const USERS: &[(&str, &str)] = &[
    ("Ann", "ann@example.com"),
    ("Ben", "ben@example.com"),
    ("Cho", "cho@example.com"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut product_count: usize = PRODUCTS.len();
    let mut db_path = String::from("./storefront_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--products" | "-p" => {
                if i + 1 < args.len() {
                    product_count = args[i + 1].parse().unwrap_or(PRODUCTS.len());
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Storefront Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -p, --products <N>  Number of products to generate (default: {})", PRODUCTS.len());
                println!("  -d, --db <PATH>     Database file path (default: ./storefront_dev.db)");
                println!("  -h, --help          Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Storefront Seed Data Generator");
    println!("=================================");
    println!("Database: {}", db_path);
    println!("Products: {}", product_count.min(PRODUCTS.len()));
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.variants().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} variants", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let mut user_ids = Vec::with_capacity(USERS.len());
    for (name, email) in USERS {
        user_ids.push(db.users().insert(name, email).await?);
    }
    println!("✓ Created {} users", user_ids.len());

    let start = std::time::Instant::now();
    let mut variant_ids = Vec::new();

    for (product_idx, (name, base_price)) in PRODUCTS.iter().take(product_count).enumerate() {
        let product_id = db.variants().insert_product(name, None).await?;

        for (size_idx, size) in SIZES.iter().enumerate() {
            for (color_idx, color) in COLORS.iter().enumerate() {
                let seed = product_idx * 100 + size_idx * 10 + color_idx;
                let variant = generate_variant(product_id, size, color, *base_price, seed);

                match db.variants().insert(&variant).await {
                    Ok(id) => variant_ids.push(id),
                    Err(e) => eprintln!("Failed to insert {} {} {}: {}", name, size, color, e),
                }
            }
        }
    }

    println!(
        "✓ Generated {} variants in {:?}",
        variant_ids.len(),
        start.elapsed()
    );

    if let (Some(user_id), Some(first), Some(second)) =
        (user_ids.first(), variant_ids.first(), variant_ids.get(1))
    {
        db.carts().add_item(*user_id, *first, 1).await?;
        db.carts().add_item(*user_id, *second, 2).await?;
        println!("✓ Filled cart for {}", USERS[0].1);
    }

    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}

/// Generates one variant with deterministic price and stock.
fn generate_variant(
    product_id: i64,
    size: &str,
    color: &str,
    base_price: i64,
    seed: usize,
) -> NewVariant {
    // Larger sizes cost a little more
    let size_addon = match size {
        "L" => 200,
        "XL" => 400,
        _ => 0,
    };

    NewVariant {
        product_id,
        size: Some(size.to_string()),
        color: Some(color.to_string()),
        edition: None,
        price: Money::from_cents(base_price + size_addon),
        stock: ((seed * 7) % 26) as i64,
    }
}

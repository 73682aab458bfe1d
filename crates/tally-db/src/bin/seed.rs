//! # Seed Data Generator
//!
//! Populates the database with test products for development and walks one
//! checkout and one replenishment through the full stack as a smoke test.
//!
//! ## Usage
//! ```bash
//! # Generate 200 products (default)
//! cargo run -p tally-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p tally-db --bin seed -- --count 1000
//!
//! # Specify database path
//! cargo run -p tally-db --bin seed -- --db ./data/tally.db
//! ```

use chrono::Utc;
use std::env;
use std::sync::Arc;
use tally_core::{CartLine, Money, OrderProcessor, Product, StockAdjuster, StockReceipt};
use tally_db::{Database, DbConfig};
use uuid::Uuid;

/// Product names for realistic test data, cycled across the count.
const NAMES: &[&str] = &[
    "Coca-Cola 330ml",
    "Pepsi 330ml",
    "Sprite 330ml",
    "Dasani Water 500ml",
    "Red Bull 250ml",
    "Lays Classic",
    "Doritos Nacho",
    "Snickers Bar",
    "Kit Kat",
    "Oreos Pack",
    "Whole Milk 1L",
    "Greek Yogurt",
    "Cheddar Cheese 200g",
    "White Bread",
    "Pasta Penne 500g",
    "Rice White 1kg",
    "Canned Beans",
    "Peanut Butter",
    "Instant Coffee",
    "Green Tea Box",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./tally_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
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
                println!("Tally POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./tally_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Tally POS Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    // Connect to database
    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Check existing products
    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Generate products
    println!();
    println!("Generating products...");

    let mut first_id = None;
    let start = std::time::Instant::now();

    for seed in 0..count {
        let product = generate_product(seed);
        if first_id.is_none() {
            first_id = Some(product.id.clone());
        }

        if let Err(e) = db.products().insert(&product).await {
            eprintln!("Failed to insert {}: {}", product.name, e);
            continue;
        }

        if (seed + 1) % 500 == 0 {
            println!("  Generated {} products...", seed + 1);
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} products in {:?}", count, elapsed);

    // Walk one checkout and one replenishment through the real repositories.
    let Some(product_id) = first_id else {
        println!("✓ Seed complete!");
        return Ok(());
    };

    println!();
    println!("Running smoke checkout...");

    let adjuster = StockAdjuster::new(Arc::new(db.products()), Arc::new(db.stock_movements()));
    let movement = adjuster
        .receive_stock(StockReceipt {
            product_id: product_id.clone(),
            quantity: 10,
            base_price_cents: 120,
            sell_price_cents: 199,
            received_at: Utc::now(),
            note: Some("seed replenishment".to_string()),
        })
        .await?;
    println!("  Received 10 units (movement {})", movement.id);

    let processor = OrderProcessor::new(Arc::new(db.products()), Arc::new(db.sales()));
    let outcome = processor
        .create_order(&[CartLine::new(&product_id, 2)], Money::from_cents(10_00))
        .await?;
    println!(
        "  Sale {} for {} (change {})",
        outcome.sale.id,
        outcome.sale.amount(),
        outcome.change
    );

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates a single product with realistic data.
fn generate_product(seed: usize) -> Product {
    let now = Utc::now();

    let name = format!("{} #{:03}", NAMES[seed % NAMES.len()], seed);

    // Price $0.99 - $8.99, cost 60-80% of price
    let sell_price_cents = 99 + ((seed * 17) % 800) as i64;
    let cost_pct = 60 + (seed % 20) as i64;
    let base_price_cents = sell_price_cents * cost_pct / 100;

    Product {
        id: Uuid::new_v4().to_string(),
        name,
        sell_price_cents,
        base_price_cents,
        stock: (seed % 101) as i64,
        minimum_stock: 5,
        created_at: now,
        updated_at: now,
    }
}

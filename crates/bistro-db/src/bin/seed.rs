//! # Seed Data Generator
//!
//! Fills a database with a demo restaurant and prints the report charts.
//!
//! ## Usage
//! ```bash
//! # Seed the default database ($BISTRO_DB_PATH or the platform data dir)
//! cargo run -p bistro-db --bin seed
//!
//! # Custom file and number of back-dated orders
//! cargo run -p bistro-db --bin seed -- --db ./bistro_dev.db --orders 500
//!
//! # Weekly instead of monthly sales chart
//! cargo run -p bistro-db --bin seed -- --period weekly
//! ```
//!
//! ## Generated Data
//! - Ingredients in several categories (Cereal, Dairy, Protein, ...)
//! - Menus built from those ingredients
//! - A handful of clients
//! - Orders spread over the last 180 days
//!
//! An already populated database is left untouched; only the charts are
//! printed.

use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::env;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bistro_core::{
    IngredientQuantities, NewClient, NewIngredient, NewMenu, NewOrder, ReportKind, SalesPeriod,
};
use bistro_db::{Database, DbConfig};

/// (name, kind, stock, unit)
const INGREDIENTS: &[(&str, &str, f64, &str)] = &[
    ("Flour", "Cereal", 25.0, "kg"),
    ("Rice", "Cereal", 20.0, "kg"),
    ("Tomato", "Vegetable", 12.0, "kg"),
    ("Onion", "Vegetable", 8.0, "kg"),
    ("Basil", "Vegetable", 0.5, "kg"),
    ("Chicken", "Protein", 15.0, "kg"),
    ("Beef", "Protein", 10.0, "kg"),
    ("Mozzarella", "Dairy", 6.0, "kg"),
    ("Milk", "Dairy", 20.0, "l"),
    ("Salt", "Seasoning", 3.0, "kg"),
    ("Olive Oil", "Other", 5.0, "l"),
    ("Eggs", "Protein", 120.0, "units"),
];

/// (name, description, price, [(ingredient, quantity per menu)])
const MENUS: &[(&str, &str, &str, &[(&str, f64)])] = &[
    (
        "Margherita Pizza",
        "Tomato, mozzarella and basil",
        "9.50",
        &[("Flour", 0.25), ("Tomato", 0.15), ("Mozzarella", 0.12), ("Basil", 0.01), ("Olive Oil", 0.02)],
    ),
    (
        "Chicken Risotto",
        "Creamy rice with chicken",
        "12.00",
        &[("Rice", 0.12), ("Chicken", 0.2), ("Onion", 0.05), ("Milk", 0.1), ("Salt", 0.005)],
    ),
    (
        "Beef Stew",
        "",
        "14.25",
        &[("Beef", 0.3), ("Onion", 0.1), ("Tomato", 0.1), ("Salt", 0.005)],
    ),
    (
        "Tomato Soup",
        "Served with basil oil",
        "6.75",
        &[("Tomato", 0.3), ("Onion", 0.05), ("Basil", 0.005), ("Olive Oil", 0.01)],
    ),
    (
        "Pancakes",
        "Three pancakes",
        "7.00",
        &[("Flour", 0.15), ("Milk", 0.2), ("Eggs", 2.0)],
    ),
];

const CLIENTS: &[(&str, &str)] = &[
    ("Ana Torres", "ana.torres@example.com"),
    ("Ben Okafor", "ben.okafor@example.com"),
    ("Chloe Martin", "chloe.martin@example.com"),
    ("Diego Silva", "diego.silva@example.com"),
    ("Emma Novak", "emma.novak@example.com"),
];

const SEED_DAYS: i64 = 180;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    let mut orders: usize = 200;
    let mut db_path: Option<String> = None;
    let mut period = SalesPeriod::Monthly;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--orders" | "-o" => {
                if i + 1 < args.len() {
                    orders = args[i + 1].parse().unwrap_or(200);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--period" | "-p" => {
                if i + 1 < args.len() {
                    period = args[i + 1].parse()?;
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Bistro Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -o, --orders <N>     Back-dated orders to generate (default: 200)");
                println!("  -d, --db <PATH>      Database file (default: $BISTRO_DB_PATH or data dir)");
                println!("  -p, --period <P>     Sales chart period: daily, weekly, monthly, yearly");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            other => warn!(argument = %other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    let config = match db_path {
        Some(path) => DbConfig::new(path),
        None => DbConfig::from_env()?,
    };

    println!("Bistro Seed Data Generator");
    println!("==========================");
    println!("Database: {}", config.database_path.display());
    println!();

    let db = Database::new(config).await?;

    if db.ingredients().count().await? > 0 {
        println!("Database already has data; skipping seed.");
    } else {
        let start = std::time::Instant::now();
        let placed = seed(&db, orders).await?;
        println!(
            "Seeded {} ingredients, {} menus, {} clients, {} orders in {:?}",
            INGREDIENTS.len(),
            MENUS.len(),
            CLIENTS.len(),
            placed,
            start.elapsed()
        );
    }

    println!();
    for kind in ReportKind::ALL {
        let chart = db.reports().chart(kind, period).await?;
        println!("{}", serde_json::to_string_pretty(&chart)?);
    }

    db.close().await;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,bistro=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Writes the demo restaurant. Returns the number of orders placed.
async fn seed(db: &Database, order_count: usize) -> Result<usize, Box<dyn std::error::Error>> {
    let mut ingredient_ids = HashMap::new();
    for (name, kind, stock, unit) in INGREDIENTS {
        let ingredient = db
            .ingredients()
            .create(&NewIngredient::new(*name, *kind, *stock, *unit))
            .await?;
        ingredient_ids.insert(*name, ingredient.id);
    }

    let mut menus = Vec::with_capacity(MENUS.len());
    for (name, description, price, pairs) in MENUS {
        let mut ingredients = IngredientQuantities::new();
        for (ingredient, qty) in pairs.iter() {
            let id = ingredient_ids
                .get(ingredient)
                .ok_or_else(|| format!("menu {name} uses unknown ingredient {ingredient}"))?;
            ingredients.insert(id.clone(), *qty);
        }

        let menu = db
            .menus()
            .create(&NewMenu {
                name: name.to_string(),
                description: Some(description.to_string()),
                price_cents: bistro_core::validation::parse_price(price)?.cents(),
                ingredients,
            })
            .await?;
        menus.push(menu);
    }

    let mut clients = Vec::with_capacity(CLIENTS.len());
    for (name, email) in CLIENTS {
        clients.push(db.clients().create(&NewClient::new(*name, *email)).await?);
    }

    let now = Utc::now();
    let mut placed = 0;
    for n in 0..order_count {
        // Deterministic spread; earlier menus are ordered more often
        let menu = &menus[(n * n + n / 3) % menus.len()];
        let client = &clients[(n * 7) % clients.len()];
        let quantity = 1 + (n % 4) as i64;
        let days_ago = ((n as i64) * 37) % SEED_DAYS;
        let placed_at = now - Duration::days(days_ago) - Duration::minutes(((n * 53) % 600) as i64);

        db.orders()
            .create_at(&NewOrder::new(&client.id, &menu.id, quantity), placed_at)
            .await?;
        placed += 1;

        if placed % 50 == 0 {
            info!(placed, "Generating orders");
        }
    }

    Ok(placed)
}

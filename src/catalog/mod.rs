//! Store catalog
//!
//! Catalog items live in the `catalog` SQLite table. Recommendation works on
//! an immutable snapshot of the catalog bundled with its vector index (see
//! [`snapshot`]).

use anyhow::Result;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

pub mod snapshot;

pub use snapshot::CatalogHandle;

/// A sellable product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Display name, unique within the catalog
    pub product: String,
    pub category: String,
    pub price: f64,
    /// Units in stock
    pub quantity: i64,
}

impl CatalogItem {
    pub fn new(product: &str, category: &str, price: f64, quantity: i64) -> Self {
        Self {
            product: product.to_string(),
            category: category.to_string(),
            price,
            quantity,
        }
    }

    /// Lowercased product name, the key used for ownership and dedup checks
    pub fn key(&self) -> String {
        self.product.to_lowercase()
    }

    pub fn in_stock(&self) -> bool {
        self.quantity > 0
    }
}

/// Catalog store backed by SQLite
pub struct CatalogStore {
    conn: Connection,
}

impl CatalogStore {
    /// Open the catalog in the database at `db_path`, creating tables if needed
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = crate::storage::open_database(db_path)?;
        Ok(Self { conn })
    }

    /// All catalog items in insertion order
    pub fn list_all(&self) -> Result<Vec<CatalogItem>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT product, category, price, quantity FROM catalog ORDER BY id",
        )?;

        let items = stmt
            .query_map([], |row| {
                Ok(CatalogItem {
                    product: row.get(0)?,
                    category: row.get(1)?,
                    price: row.get(2)?,
                    quantity: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        debug!("Loaded {} catalog items", items.len());
        Ok(items)
    }

    /// Number of catalog items
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM catalog", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Insert every item that is not already present, in one transaction
    pub fn seed(&mut self, items: &[CatalogItem]) -> Result<SeedReport> {
        let tx = self.conn.transaction()?;
        let mut report = SeedReport::default();
        {
            let mut stmt = tx.prepare_cached(
                "INSERT OR IGNORE INTO catalog (product, category, price, quantity)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;

            for item in items {
                let changes =
                    stmt.execute(params![item.product, item.category, item.price, item.quantity])?;
                if changes > 0 {
                    report.inserted.push(item.product.clone());
                } else {
                    report.skipped.push(item.product.clone());
                }
            }
        }
        tx.commit()?;
        Ok(report)
    }
}

/// Result of a seed run
#[derive(Debug, Default)]
pub struct SeedReport {
    pub inserted: Vec<String>,
    pub skipped: Vec<String>,
}

/// The starter catalog loaded by `seed`
pub fn default_products() -> Vec<CatalogItem> {
    vec![
        // Dairy
        CatalogItem::new("Milk", "dairy", 40.0, 100),
        CatalogItem::new("Cheese", "dairy", 120.0, 50),
        CatalogItem::new("Yogurt", "dairy", 50.0, 80),
        CatalogItem::new("Butter", "dairy", 80.0, 60),
        // Fruits
        CatalogItem::new("Apple", "fruit", 100.0, 200),
        CatalogItem::new("Banana", "fruit", 40.0, 300),
        CatalogItem::new("Orange", "fruit", 80.0, 180),
        CatalogItem::new("Mango", "fruit", 150.0, 120),
        // Drinks
        CatalogItem::new("Cola", "drinks", 60.0, 90),
        CatalogItem::new("Orange Juice", "drinks", 90.0, 70),
        CatalogItem::new("Mineral Water", "drinks", 20.0, 500),
        CatalogItem::new("Energy Drink", "drinks", 120.0, 40),
        // Snacks
        CatalogItem::new("Potato Chips", "snacks", 30.0, 150),
        CatalogItem::new("Chocolate Bar", "snacks", 50.0, 200),
        CatalogItem::new("Cookies", "snacks", 70.0, 100),
        CatalogItem::new("Popcorn", "snacks", 40.0, 130),
        // Grains
        CatalogItem::new("Rice", "grains", 60.0, 400),
        CatalogItem::new("Wheat Flour", "grains", 55.0, 350),
        CatalogItem::new("Oats", "grains", 90.0, 200),
        CatalogItem::new("Barley", "grains", 75.0, 160),
    ]
}

/// Load the starter catalog into the store
pub async fn seed_command() -> Result<()> {
    let db_path = crate::storage::db_path()?;
    let mut store = CatalogStore::open(&db_path)?;

    let report = store.seed(&default_products())?;
    for product in &report.inserted {
        println!("✅ Inserted {}", product);
    }
    for product in &report.skipped {
        println!("⚠️  Skipped {} (already exists)", product);
    }

    info!(
        "Seeded catalog: {} inserted, {} skipped",
        report.inserted.len(),
        report.skipped.len()
    );
    Ok(())
}

/// Print the catalog
pub async fn list_command() -> Result<()> {
    let db_path = crate::storage::db_path()?;
    let store = CatalogStore::open(&db_path)?;
    let items = store.list_all()?;

    if items.is_empty() {
        println!("Catalog is empty. Run 'wishcart seed' to load the starter catalog.");
        return Ok(());
    }

    println!("{:<20} {:<10} {:>8} {:>8}", "Product", "Category", "Price", "Stock");
    println!("{}", "-".repeat(49));
    for item in &items {
        println!(
            "{:<20} {:<10} {:>8.2} {:>8}",
            item.product, item.category, item.price, item.quantity
        );
    }
    println!();
    println!("{} products", items.len());

    Ok(())
}

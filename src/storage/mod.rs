//! Storage module for wishcart
//!
//! Owns the data directory layout, the SQLite schema shared by the catalog
//! and wishlist stores, and status reporting.

use anyhow::Result;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::{self, Config};

/// Database file inside the data directory
pub const DB_FILE: &str = "wishcart.sqlite";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS catalog (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    product TEXT UNIQUE NOT NULL,
    category TEXT NOT NULL,
    price REAL NOT NULL DEFAULT 0,
    quantity INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS users (
    username TEXT PRIMARY KEY,
    created_at DATETIME DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS wishlist_entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL,
    product TEXT NOT NULL,
    quantity INTEGER NOT NULL,
    category TEXT NOT NULL,
    action TEXT NOT NULL,
    status TEXT NOT NULL,
    timestamp TEXT NOT NULL,
    FOREIGN KEY (username) REFERENCES users(username) ON DELETE CASCADE
);

-- Intents that removed products, kept for the user's history
CREATE TABLE IF NOT EXISTS wishlist_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL,
    product TEXT NOT NULL,
    quantity INTEGER NOT NULL,
    category TEXT NOT NULL,
    action TEXT NOT NULL,
    status TEXT NOT NULL,
    timestamp TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_wishlist_user ON wishlist_entries(username);
CREATE INDEX IF NOT EXISTS idx_history_user ON wishlist_history(username);
"#;

/// Open the database at `db_path`, creating the schema if needed
pub fn open_database(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.execute_batch(SCHEMA)?;
    Ok(conn)
}

/// Locate the data directory: `./.wishcart` if it exists, else `~/.wishcart`
pub fn data_dir() -> Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    let project_dir = cwd.join(".wishcart");
    if project_dir.exists() {
        return Ok(project_dir);
    }

    let home = dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
    Ok(home.join(".wishcart"))
}

/// Path of the database file
pub fn db_path() -> Result<PathBuf> {
    Ok(data_dir()?.join(DB_FILE))
}

/// Load `config.toml` from the data directory
pub fn load_config() -> Result<Config> {
    config::load(&data_dir()?.join(config::CONFIG_FILE))
}

/// Initialize the data directory, database and default configuration
pub async fn init() -> Result<()> {
    let dir = data_dir()?;
    std::fs::create_dir_all(&dir)?;

    open_database(&dir.join(DB_FILE))?;
    info!("wishcart initialized at {:?}", dir);

    let config_path = dir.join(config::CONFIG_FILE);
    if !config_path.exists() {
        std::fs::write(&config_path, config::DEFAULT_CONFIG)?;
        info!("Created default configuration at {:?}", config_path);
    }

    println!("✅ Initialized {}", dir.display());
    Ok(())
}

/// Show current status
pub async fn show_status() -> Result<()> {
    let dir = data_dir()?;

    println!("wishcart Status");
    println!("===============");
    println!();

    if !dir.exists() {
        println!("Status: NOT INITIALIZED");
        println!("Run 'wishcart init' to initialize");
        return Ok(());
    }

    println!("Status: INITIALIZED");
    println!("Data directory: {:?}", dir);

    let db_path = dir.join(DB_FILE);
    if !db_path.exists() {
        println!("Database: NOT FOUND");
        return Ok(());
    }

    let conn = open_database(&db_path)?;
    let count = |sql: &str| -> i64 { conn.query_row(sql, [], |row| row.get(0)).unwrap_or(0) };

    let products = crate::catalog::CatalogStore::open(&db_path)?.count()?;
    println!("Catalog products: {}", products);
    println!("  Out of stock: {}", count("SELECT COUNT(*) FROM catalog WHERE quantity <= 0"));
    println!("Users: {}", count("SELECT COUNT(*) FROM users"));
    println!("Wishlist entries: {}", count("SELECT COUNT(*) FROM wishlist_entries"));

    let config = load_config()?;
    println!();
    println!("Embedding model: {} ({} dims)", config.embeddings.model, config.embeddings.dimensions);
    println!("Neighbors per query: {}", config.recommend.neighbors);

    Ok(())
}

//! Per-user wishlists
//!
//! Wishlists and removal history are stored in SQLite. A user row exists
//! once anything was ever added for that user, which is how "no wishlist"
//! is told apart from "empty wishlist".

use anyhow::Result;
use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

pub mod matching;

use crate::catalog::{CatalogItem, CatalogStore};
use crate::intent::{extract_json_object, validate_intent, Action, ShoppingIntent};
use matching::closest_match;

/// A product on a user's wishlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistEntry {
    pub product: String,
    pub quantity: i64,
    pub category: String,
    pub action: String,
    pub status: String,
    /// ISO-8601 UTC
    pub timestamp: String,
}

/// Failure while applying an intent to a wishlist
#[derive(Debug, Error)]
pub enum WishlistError {
    #[error("No similar item found in store for '{0}'")]
    NoStoreMatch(String),
    #[error("Only {available} × {product} available in store")]
    InsufficientStock { available: i64, product: String },
    #[error("No wishlist found")]
    NoWishlist,
    #[error("No matching product found in wishlist for '{0}'")]
    NoWishlistMatch(String),
    #[error("Unsupported action: {0}")]
    UnsupportedAction(String),
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Result of a successful wishlist update
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WishlistUpdate {
    pub message: String,
    /// The intent as applied, timestamped
    pub data: WishlistEntry,
}

/// Source of wishlists for the recommender
pub trait WishlistSource {
    /// `None` when the user has no wishlist record at all
    fn get_wishlist(&self, username: &str) -> Result<Option<Vec<WishlistEntry>>, WishlistError>;
}

/// Wishlist store backed by SQLite
pub struct WishlistStore {
    conn: Connection,
}

impl WishlistStore {
    /// Open the wishlist tables in the database at `db_path`
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = crate::storage::open_database(db_path)?;
        Ok(Self { conn })
    }

    fn user_exists(&self, username: &str) -> Result<bool, WishlistError> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM users WHERE username = ?1",
                params![username],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn load_entries(&self, username: &str) -> Result<Vec<WishlistEntry>, WishlistError> {
        let mut stmt = self.conn.prepare_cached(
            r#"
            SELECT product, quantity, category, action, status, timestamp
            FROM wishlist_entries
            WHERE username = ?1
            ORDER BY id
            "#,
        )?;

        let entries = stmt
            .query_map(params![username], |row| {
                Ok(WishlistEntry {
                    product: row.get(0)?,
                    quantity: row.get(1)?,
                    category: row.get(2)?,
                    action: row.get(3)?,
                    status: row.get(4)?,
                    timestamp: row.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    /// Removed intents for a user, oldest first
    pub fn history(&self, username: &str) -> Result<Vec<WishlistEntry>, WishlistError> {
        let mut stmt = self.conn.prepare_cached(
            r#"
            SELECT product, quantity, category, action, status, timestamp
            FROM wishlist_history
            WHERE username = ?1
            ORDER BY id
            "#,
        )?;

        let entries = stmt
            .query_map(params![username], |row| {
                Ok(WishlistEntry {
                    product: row.get(0)?,
                    quantity: row.get(1)?,
                    category: row.get(2)?,
                    action: row.get(3)?,
                    status: row.get(4)?,
                    timestamp: row.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    /// Apply a validated intent. `catalog` is the current store catalog,
    /// used to resolve spoken names to official product names on add.
    pub fn apply_intent(
        &mut self,
        username: &str,
        intent: &ShoppingIntent,
        catalog: &[CatalogItem],
    ) -> Result<WishlistUpdate, WishlistError> {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

        match intent.action() {
            Some(Action::Add) => self.add(username, intent, catalog, timestamp),
            Some(Action::Remove) => self.remove(username, intent, timestamp),
            None => Err(WishlistError::UnsupportedAction(intent.action.clone())),
        }
    }

    fn add(
        &mut self,
        username: &str,
        intent: &ShoppingIntent,
        catalog: &[CatalogItem],
        timestamp: String,
    ) -> Result<WishlistUpdate, WishlistError> {
        let store_item = closest_match(&intent.product, catalog.iter().map(|i| i.product.as_str()))
            .map(|idx| &catalog[idx])
            .ok_or_else(|| WishlistError::NoStoreMatch(intent.product.clone()))?;

        if intent.quantity > store_item.quantity {
            return Err(WishlistError::InsufficientStock {
                available: store_item.quantity,
                product: store_item.product.clone(),
            });
        }

        let entry = WishlistEntry {
            product: store_item.product.clone(),
            quantity: intent.quantity,
            category: store_item.category.clone(),
            action: "add".to_string(),
            status: intent.status.clone(),
            timestamp,
        };

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT OR IGNORE INTO users (username) VALUES (?1)",
            params![username],
        )?;
        tx.execute(
            r#"
            INSERT INTO wishlist_entries (username, product, quantity, category, action, status, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                username,
                entry.product,
                entry.quantity,
                entry.category,
                entry.action,
                entry.status,
                entry.timestamp
            ],
        )?;
        tx.commit()?;

        info!("Added {} × {} to wishlist of {}", entry.quantity, entry.product, username);
        Ok(WishlistUpdate {
            message: format!("Product '{}' added to wishlist", entry.product),
            data: entry,
        })
    }

    fn remove(
        &mut self,
        username: &str,
        intent: &ShoppingIntent,
        timestamp: String,
    ) -> Result<WishlistUpdate, WishlistError> {
        if !self.user_exists(username)? {
            return Err(WishlistError::NoWishlist);
        }

        let wishlist = self.load_entries(username)?;
        let closest = closest_match(&intent.product, wishlist.iter().map(|e| e.product.as_str()))
            .map(|idx| &wishlist[idx])
            .ok_or_else(|| WishlistError::NoWishlistMatch(intent.product.clone()))?;

        let record = WishlistEntry {
            product: intent.product.clone(),
            quantity: intent.quantity,
            category: intent.category.clone(),
            action: intent.action.clone(),
            status: intent.status.clone(),
            timestamp,
        };

        let tx = self.conn.transaction()?;
        let removed = tx.execute(
            "DELETE FROM wishlist_entries WHERE username = ?1 AND product = ?2",
            params![username, closest.product],
        )?;
        tx.execute(
            r#"
            INSERT INTO wishlist_history (username, product, quantity, category, action, status, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                username,
                record.product,
                record.quantity,
                record.category,
                record.action,
                record.status,
                record.timestamp
            ],
        )?;
        tx.commit()?;

        debug!("Removed {} entries of {} for {}", removed, closest.product, username);
        Ok(WishlistUpdate {
            message: format!("Product '{}' removed from wishlist", closest.product),
            data: record,
        })
    }
}

impl WishlistSource for WishlistStore {
    fn get_wishlist(&self, username: &str) -> Result<Option<Vec<WishlistEntry>>, WishlistError> {
        if !self.user_exists(username)? {
            return Ok(None);
        }
        self.load_entries(username).map(Some)
    }
}

/// Print a user's wishlist
pub async fn show_command(username: &str, json: bool) -> Result<()> {
    let db_path = crate::storage::db_path()?;
    let store = WishlistStore::open(&db_path)?;
    let wishlist = store.get_wishlist(username)?.unwrap_or_default();

    if json {
        println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "wishlist": wishlist }))?);
        return Ok(());
    }

    if wishlist.is_empty() {
        println!("Wishlist for {} is empty.", username);
    } else {
        println!("Wishlist for {}", username);
        println!("{}", "-".repeat(40));
        for entry in &wishlist {
            println!("  {:>3} × {:<20} [{}]", entry.quantity, entry.product, entry.category);
        }
    }

    let history = store.history(username)?;
    if !history.is_empty() {
        println!();
        println!("Recently removed:");
        for entry in history.iter().rev().take(5) {
            println!("  {} ({})", entry.product, entry.timestamp);
        }
    }

    Ok(())
}

/// Apply an intent to a user's wishlist and print the outcome
pub async fn apply_command(username: &str, intent: &ShoppingIntent) -> Result<()> {
    let db_path = crate::storage::db_path()?;
    let catalog = CatalogStore::open(&db_path)?.list_all()?;
    let mut store = WishlistStore::open(&db_path)?;

    let update = store.apply_intent(username, intent, &catalog)?;
    println!("✅ {}", update.message);
    Ok(())
}

/// Validate raw intent JSON (as returned by the language model) and apply it.
/// Text around the JSON object, such as a code fence, is ignored.
pub async fn apply_json_command(username: &str, raw: &str) -> Result<()> {
    let value = extract_json_object(raw)?;
    let intent = validate_intent(&value)?;
    apply_command(username, &intent).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::default_products;
    use tempfile::TempDir;

    fn intent(action: &str, product: &str, quantity: i64) -> ShoppingIntent {
        ShoppingIntent {
            product: product.to_string(),
            quantity,
            category: "unknown".to_string(),
            action: action.to_string(),
            status: "ai_generated".to_string(),
        }
    }

    fn open_store(temp: &TempDir) -> WishlistStore {
        WishlistStore::open(&temp.path().join("wishcart.sqlite")).unwrap()
    }

    #[test]
    fn test_unknown_user_has_no_wishlist() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        assert_eq!(store.get_wishlist("nobody").unwrap(), None);
    }

    #[test]
    fn test_add_uses_official_catalog_name() {
        let temp = TempDir::new().unwrap();
        let mut store = open_store(&temp);
        let catalog = default_products();

        let update = store.apply_intent("alice", &intent("add", "apples", 3), &catalog).unwrap();
        assert_eq!(update.message, "Product 'Apple' added to wishlist");

        let wishlist = store.get_wishlist("alice").unwrap().unwrap();
        assert_eq!(wishlist.len(), 1);
        assert_eq!(wishlist[0].product, "Apple");
        assert_eq!(wishlist[0].category, "fruit");
        assert_eq!(wishlist[0].quantity, 3);
        assert_eq!(wishlist[0].action, "add");
        assert!(wishlist[0].timestamp.ends_with('Z'));
    }

    #[test]
    fn test_add_rejects_unknown_product_and_overstock() {
        let temp = TempDir::new().unwrap();
        let mut store = open_store(&temp);
        let catalog = default_products();

        let err = store.apply_intent("alice", &intent("add", "unicorn meat", 1), &catalog).unwrap_err();
        assert_eq!(err.to_string(), "No similar item found in store for 'unicorn meat'");

        let err = store.apply_intent("alice", &intent("add", "cheese", 51), &catalog).unwrap_err();
        assert_eq!(err.to_string(), "Only 50 × Cheese available in store");

        // Failed adds do not create a wishlist
        assert_eq!(store.get_wishlist("alice").unwrap(), None);
    }

    #[test]
    fn test_remove_leaves_empty_wishlist_and_history() {
        let temp = TempDir::new().unwrap();
        let mut store = open_store(&temp);
        let catalog = default_products();

        store.apply_intent("bob", &intent("add", "milk", 1), &catalog).unwrap();
        store.apply_intent("bob", &intent("add", "milk", 2), &catalog).unwrap();

        let update = store.apply_intent("bob", &intent("DELETE", "Milk", 1), &catalog).unwrap();
        assert_eq!(update.message, "Product 'Milk' removed from wishlist");

        assert_eq!(store.get_wishlist("bob").unwrap(), Some(Vec::new()));

        let history = store.history("bob").unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].action, "DELETE");
    }

    #[test]
    fn test_remove_errors() {
        let temp = TempDir::new().unwrap();
        let mut store = open_store(&temp);
        let catalog = default_products();

        let err = store.apply_intent("carol", &intent("remove", "milk", 1), &catalog).unwrap_err();
        assert!(matches!(err, WishlistError::NoWishlist));

        store.apply_intent("carol", &intent("add", "rice", 1), &catalog).unwrap();
        let err = store.apply_intent("carol", &intent("remove", "cola", 1), &catalog).unwrap_err();
        assert_eq!(err.to_string(), "No matching product found in wishlist for 'cola'");
    }

    #[test]
    fn test_unsupported_action() {
        let temp = TempDir::new().unwrap();
        let mut store = open_store(&temp);

        let err = store
            .apply_intent("dave", &intent("buy", "milk", 1), &default_products())
            .unwrap_err();
        assert_eq!(err.to_string(), "Unsupported action: buy");
    }
}

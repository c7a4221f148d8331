//! Wishlist-driven product recommendations
//!
//! For every product on the wishlist, fetch its nearest catalog neighbors,
//! drop products the user already wants or that are out of stock, keep the
//! best score per product, then assemble a diversified list (see
//! [`selection`]). When nothing survives, the first catalog items are
//! returned instead.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

pub mod scoring;
pub mod selection;

use crate::catalog::{CatalogHandle, CatalogItem, CatalogStore};
use crate::config::RecommendConfig;
use crate::embeddings::{embed_checked, EmbeddingError, EmbeddingModel, EmbeddingProvider, IndexError};
use crate::wishlist::{WishlistEntry, WishlistError, WishlistSource, WishlistStore};
use scoring::{CandidatePool, ScoreWeights};
pub use selection::MAX_RESULTS;

/// Recommendation failure. No partial result accompanies any of these.
#[derive(Debug, Error)]
pub enum RecommendError {
    #[error("catalog index is not ready")]
    NotReady,
    #[error("recommendation failed: {0}")]
    EmbeddingFailure(#[from] EmbeddingError),
    #[error("recommendation failed: similarity search: {0}")]
    IndexSearchFailure(#[from] IndexError),
    #[error("recommendation failed: {0}")]
    Wishlist(#[from] WishlistError),
}

/// Why a recommendation result is empty without being an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecommendationNote {
    #[serde(rename = "No wishlist found")]
    NoWishlist,
    #[serde(rename = "Wishlist empty")]
    EmptyWishlist,
}

/// Recommendations for a user, as returned to callers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendations {
    #[serde(rename = "recommendations")]
    pub items: Vec<CatalogItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<RecommendationNote>,
}

impl fmt::Display for RecommendationNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoWishlist => f.write_str("No wishlist found"),
            Self::EmptyWishlist => f.write_str("Wishlist empty"),
        }
    }
}

impl Recommendations {
    fn empty(note: RecommendationNote) -> Self {
        Self {
            items: Vec::new(),
            note: Some(note),
        }
    }
}

/// Recommendation engine over a shared catalog index
pub struct Recommender<P> {
    provider: P,
    catalog: Arc<CatalogHandle>,
    weights: ScoreWeights,
    neighbors: usize,
}

impl<P: EmbeddingProvider> Recommender<P> {
    pub fn new(provider: P, catalog: Arc<CatalogHandle>, config: &RecommendConfig) -> Self {
        Self {
            provider,
            catalog,
            weights: ScoreWeights::from(config),
            neighbors: config.neighbors,
        }
    }

    /// Recommendations for `username`; a missing or empty wishlist yields
    /// an empty list with a note
    pub fn recommend_for_user<S: WishlistSource + ?Sized>(
        &self,
        wishlists: &S,
        username: &str,
    ) -> Result<Recommendations, RecommendError> {
        let wishlist = match wishlists.get_wishlist(username)? {
            None => return Ok(Recommendations::empty(RecommendationNote::NoWishlist)),
            Some(entries) if entries.is_empty() => {
                return Ok(Recommendations::empty(RecommendationNote::EmptyWishlist))
            }
            Some(entries) => entries,
        };

        Ok(Recommendations {
            items: self.recommend(&wishlist)?,
            note: None,
        })
    }

    /// Up to [`MAX_RESULTS`] catalog items for a wishlist
    pub fn recommend(&self, wishlist: &[WishlistEntry]) -> Result<Vec<CatalogItem>, RecommendError> {
        if wishlist.is_empty() {
            return Ok(Vec::new());
        }

        let catalog = self.catalog.snapshot().ok_or(RecommendError::NotReady)?;

        let queries: Vec<String> = wishlist.iter().map(|e| e.product.to_lowercase()).collect();
        let owned_names: HashSet<&str> = queries.iter().map(String::as_str).collect();
        let owned_categories: HashSet<String> =
            wishlist.iter().map(|e| e.category.to_lowercase()).collect();

        let query_refs: Vec<&str> = queries.iter().map(String::as_str).collect();
        let vectors = embed_checked(&self.provider, &query_refs)?;

        let mut pool = CandidatePool::new();
        for vector in &vectors {
            for hit in catalog.index().search(vector, self.neighbors)? {
                let Some(candidate) = catalog.item(hit.position) else {
                    continue;
                };
                if owned_names.contains(candidate.key().as_str()) || !candidate.in_stock() {
                    continue;
                }

                let same_category = owned_categories.contains(&candidate.category.to_lowercase());
                pool.offer(candidate, self.weights.adjust(hit.distance, same_category));
            }
        }

        debug!(
            "{} candidates from {} wishlist items (catalog v{})",
            pool.len(),
            wishlist.len(),
            catalog.version()
        );

        let ranked = pool.into_ranked();
        let mut picks = selection::assemble(&ranked, &owned_categories);

        if picks.is_empty() {
            debug!("No candidates, falling back to first catalog items");
            picks = catalog.items().iter().take(MAX_RESULTS).cloned().collect();
        }

        picks.truncate(MAX_RESULTS);
        Ok(picks)
    }
}

/// Build the catalog index and print recommendations for a user
pub async fn recommend_command(username: &str, json: bool) -> Result<()> {
    let config = crate::storage::load_config()?;
    let db_path = crate::storage::db_path()?;

    let items = CatalogStore::open(&db_path)?.list_all()?;
    let model = EmbeddingModel::from_config(&config.embeddings);

    let handle = Arc::new(CatalogHandle::new());
    let catalog = handle.rebuild(items, &model)?;
    debug!(
        "Catalog index built at {} with {} {} ({} bytes)",
        catalog.built_at(),
        model.name(),
        model.version(),
        catalog.index().size_bytes()
    );

    let recommender = Recommender::new(model, handle, &config.recommend);
    let wishlists = WishlistStore::open(&db_path)?;
    let result = recommender.recommend_for_user(&wishlists, username)?;

    info!("{} recommendations for {}", result.items.len(), username);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if let Some(note) = result.note {
        println!("{} for {}.", note, username);
        return Ok(());
    }

    println!("Recommendations for {}", username);
    println!("{}", "-".repeat(40));
    for (rank, item) in result.items.iter().enumerate() {
        println!(
            "  {:>2}. {:<20} [{}] {:.2}",
            rank + 1,
            item.product,
            item.category,
            item.price
        );
    }

    Ok(())
}

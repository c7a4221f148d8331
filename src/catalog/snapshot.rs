//! Catalog snapshot bundled with its vector index
//!
//! `CatalogIndex` owns both the ordered catalog items and the vector index
//! built from their names, so position `i` in the index is always item `i`.
//! It is never mutated after construction: a refresh builds a new value and
//! `CatalogHandle` swaps the shared reference.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Instant;
use thiserror::Error;
use tracing::info;

use super::CatalogItem;
use crate::embeddings::{embed_checked, EmbeddingError, EmbeddingProvider, IndexError, VectorIndex};

/// Failure while building a catalog index
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to embed catalog: {0}")]
    Embedding(#[from] EmbeddingError),
    #[error("failed to index catalog: {0}")]
    Index(#[from] IndexError),
}

/// Immutable catalog snapshot and its aligned vector index
#[derive(Debug)]
pub struct CatalogIndex {
    version: u64,
    built_at: DateTime<Utc>,
    items: Vec<CatalogItem>,
    index: VectorIndex,
}

impl CatalogIndex {
    /// Embed every product name and index the vectors in catalog order
    pub fn build<P: EmbeddingProvider + ?Sized>(
        items: Vec<CatalogItem>,
        provider: &P,
        version: u64,
    ) -> Result<Self, BuildError> {
        let names: Vec<&str> = items.iter().map(|item| item.product.as_str()).collect();
        let vectors = if names.is_empty() {
            Vec::new()
        } else {
            embed_checked(provider, &names)?
        };
        let index = VectorIndex::build(provider.dimensions(), &vectors)?;

        Ok(Self {
            version,
            built_at: Utc::now(),
            items,
            index,
        })
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// Catalog items in snapshot order
    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    /// Item at an index position; `None` for positions that match nothing
    pub fn item(&self, position: usize) -> Option<&CatalogItem> {
        self.items.get(position)
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

/// Shared slot holding the current `CatalogIndex`.
///
/// Empty until the first `install`; readers get `None` until then and must
/// treat that as "not ready".
#[derive(Debug, Default)]
pub struct CatalogHandle {
    current: RwLock<Option<Arc<CatalogIndex>>>,
    next_version: AtomicU64,
}

impl CatalogHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// The installed snapshot, if initialization has finished
    pub fn snapshot(&self) -> Option<Arc<CatalogIndex>> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        guard.clone()
    }

    /// Replace the current snapshot. Requests already holding the old one keep it.
    pub fn install(&self, catalog: CatalogIndex) -> Arc<CatalogIndex> {
        let catalog = Arc::new(catalog);
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(Arc::clone(&catalog));
        catalog
    }

    /// Build a new snapshot from `items` and install it
    pub fn rebuild<P: EmbeddingProvider + ?Sized>(
        &self,
        items: Vec<CatalogItem>,
        provider: &P,
    ) -> Result<Arc<CatalogIndex>, BuildError> {
        let started = Instant::now();
        let version = self.next_version.fetch_add(1, Ordering::SeqCst) + 1;
        let catalog = CatalogIndex::build(items, provider, version)?;

        info!(
            "Built catalog index v{} ({} items, {} dims) in {}ms",
            version,
            catalog.len(),
            catalog.index().dimensions(),
            started.elapsed().as_millis()
        );
        Ok(self.install(catalog))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::default_products;
    use crate::embeddings::EmbeddingModel;
    use std::thread;

    #[test]
    fn test_build_aligns_items_with_index() {
        let model = EmbeddingModel::with_dimensions("test", 32);
        let catalog = CatalogIndex::build(default_products(), &model, 1).unwrap();

        assert_eq!(catalog.len(), catalog.index().len());

        // Each product is its own nearest neighbor
        let vectors = model.embed(&["Cheese", "Mineral Water"]).unwrap();
        for (name, vector) in ["Cheese", "Mineral Water"].iter().zip(&vectors) {
            let hits = catalog.index().search(vector, 1).unwrap();
            let item = catalog.item(hits[0].position).unwrap();
            assert_eq!(&item.product, name);
        }
    }

    #[test]
    fn test_build_empty_catalog() {
        let model = EmbeddingModel::with_dimensions("test", 8);
        let catalog = CatalogIndex::build(Vec::new(), &model, 1).unwrap();
        assert_eq!(catalog.len(), 0);
        assert!(catalog.index().is_empty());
        assert!(catalog.item(0).is_none());
    }

    #[test]
    fn test_handle_not_ready_until_installed() {
        let handle = CatalogHandle::new();
        assert!(handle.snapshot().is_none());

        let model = EmbeddingModel::with_dimensions("test", 8);
        handle.rebuild(default_products(), &model).unwrap();
        assert!(handle.snapshot().is_some());
    }

    #[test]
    fn test_rebuild_swaps_without_touching_old_snapshot() {
        let handle = CatalogHandle::new();
        let model = EmbeddingModel::with_dimensions("test", 8);

        let first = handle.rebuild(default_products(), &model).unwrap();
        let held = handle.snapshot().unwrap();

        let second = handle
            .rebuild(vec![CatalogItem::new("Tea", "drinks", 10.0, 5)], &model)
            .unwrap();

        assert_eq!(first.version(), 1);
        assert_eq!(second.version(), 2);
        assert_eq!(held.len(), default_products().len());
        assert_eq!(handle.snapshot().unwrap().len(), 1);
    }

    #[test]
    fn test_concurrent_readers_see_complete_snapshots() {
        let handle = Arc::new(CatalogHandle::new());
        let model = EmbeddingModel::with_dimensions("test", 8);
        handle.rebuild(default_products(), &model).unwrap();

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let handle = Arc::clone(&handle);
                thread::spawn(move || {
                    for _ in 0..100 {
                        let snapshot = handle.snapshot().unwrap();
                        assert_eq!(snapshot.len(), snapshot.index().len());
                    }
                })
            })
            .collect();

        for _ in 0..10 {
            handle.rebuild(default_products(), &model).unwrap();
        }

        for reader in readers {
            reader.join().unwrap();
        }
    }
}

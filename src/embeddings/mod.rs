//! Embeddings module for product similarity
//!
//! Maps product names to fixed-dimension vectors so that catalog items
//! can be retrieved by nearest-neighbor search instead of string matching.
//!
//! Architecture:
//! - EmbeddingProvider: text -> vectors seam used by the index builder and the recommender
//! - EmbeddingModel: local hash-projection provider
//! - VectorIndex: flat k-nearest-neighbor index over squared Euclidean distance

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod index;
mod model;

pub use index::{IndexError, VectorIndex};
pub use model::EmbeddingModel;

/// Embedding dimensions for the default model (all-MiniLM-L6-v2)
pub const EMBEDDING_DIM: usize = 384;

/// Configuration for embeddings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Model name (all-MiniLM-L6-v2, gte-small, etc.)
    pub model: String,
    /// Embedding dimensions
    pub dimensions: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "all-MiniLM-L6-v2".to_string(),
            dimensions: EMBEDDING_DIM,
        }
    }
}

/// Failure to turn text into vectors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EmbeddingError {
    #[error("embedding provider returned {got} vectors for {expected} inputs")]
    CountMismatch { expected: usize, got: usize },
    #[error("embedding has {got} dimensions, expected {expected}")]
    Dimension { expected: usize, got: usize },
}

/// Anything that can embed a batch of strings.
///
/// Implementations must return exactly one vector per input, in input order.
pub trait EmbeddingProvider: Send + Sync {
    /// Length of every vector this provider produces
    fn dimensions(&self) -> usize;

    /// Embed a batch of texts
    fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

/// Embed `texts` and check the provider kept its contract
pub fn embed_checked<P: EmbeddingProvider + ?Sized>(
    provider: &P,
    texts: &[&str],
) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    let vectors = provider.embed(texts)?;
    if vectors.len() != texts.len() {
        return Err(EmbeddingError::CountMismatch {
            expected: texts.len(),
            got: vectors.len(),
        });
    }

    let expected = provider.dimensions();
    if let Some(bad) = vectors.iter().find(|v| v.len() != expected) {
        return Err(EmbeddingError::Dimension {
            expected,
            got: bad.len(),
        });
    }

    Ok(vectors)
}

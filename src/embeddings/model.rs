//! Embedding model implementation
//!
//! Generates product-name embeddings locally with a hash-projection
//! approach: deterministic, dependency-free, and good enough to put names
//! that share words next to each other.

use super::{EmbeddingConfig, EmbeddingError, EmbeddingProvider};

/// Embedding model for generating text embeddings
#[derive(Debug, Clone)]
pub struct EmbeddingModel {
    /// Model name
    name: String,
    /// Model version
    version: String,
    /// Dimensions
    dimensions: usize,
}

impl EmbeddingModel {
    /// Create a model with explicit dimensions
    pub fn with_dimensions(model_name: &str, dimensions: usize) -> Self {
        Self {
            name: model_name.to_string(),
            version: "1.0-hash".to_string(),
            dimensions,
        }
    }

    /// Create a model from the `[embeddings]` config section
    pub fn from_config(config: &EmbeddingConfig) -> Self {
        Self::with_dimensions(&config.model, config.dimensions)
    }

    /// Get model name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get model version
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Generate a hash-based embedding
    ///
    /// 1. Tokenize the text into words
    /// 2. For each word and each adjacent word pair, add a deterministic pseudo-random vector
    /// 3. Normalize the sum to unit length
    fn hash_embed(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];

        let lower = text.to_lowercase();
        let tokens: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|s| s.len() > 1)
            .collect();

        if tokens.is_empty() {
            return embedding;
        }

        for token in &tokens {
            add_token_embedding(&mut embedding, token);
        }

        for window in tokens.windows(2) {
            let bigram = format!("{}_{}", window[0], window[1]);
            add_token_embedding(&mut embedding, &bigram);
        }

        normalize_l2(&mut embedding);
        embedding
    }
}

impl EmbeddingProvider for EmbeddingModel {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|t| self.hash_embed(t)).collect())
    }
}

/// Add a token's contribution to the embedding vector
fn add_token_embedding(embedding: &mut [f32], token: &str) {
    let mut hash = fnv1a_hash(token.as_bytes());

    for value in embedding.iter_mut() {
        // pseudo-random value in [-1, 1]
        hash = lcg_next(hash);
        let rand_val = ((hash as f32) / (u64::MAX as f32)) * 2.0 - 1.0;
        *value += rand_val;
    }
}

/// FNV-1a hash function (64-bit)
fn fnv1a_hash(data: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    let mut hash = FNV_OFFSET;
    for byte in data {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Linear congruential generator for deterministic pseudo-random sequence
fn lcg_next(state: u64) -> u64 {
    const A: u64 = 6364136223846793005;
    const C: u64 = 1442695040888963407;
    state.wrapping_mul(A).wrapping_add(C)
}

/// Normalize a vector to unit length (L2 normalization)
fn normalize_l2(vec: &mut [f32]) {
    let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 1e-10 {
        for x in vec.iter_mut() {
            *x /= norm;
        }
    }
}

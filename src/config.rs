//! Configuration loaded from `config.toml` in the data directory

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::embeddings::EmbeddingConfig;

pub const CONFIG_FILE: &str = "config.toml";

/// Written by `wishcart init`
pub const DEFAULT_CONFIG: &str = r#"# wishcart configuration

[embeddings]
# Embedding model name and vector size
model = "all-MiniLM-L6-v2"
dimensions = 384

[recommend]
# Nearest neighbors fetched per wishlist item
neighbors = 20
# Distance multiplier for candidates in a category already on the wishlist
same_category_boost = 0.8
# Distance multiplier for every other candidate
cross_category_penalty = 1.2

[intent]
# OpenAI-compatible chat-completions endpoint (used with --features groq)
api_url = "https://api.groq.com/openai/v1/chat/completions"
model = "llama-3.3-70b-versatile"
"#;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub embeddings: EmbeddingConfig,
    pub recommend: RecommendConfig,
    pub intent: IntentConfig,
}

/// Recommendation tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendConfig {
    pub neighbors: usize,
    pub same_category_boost: f32,
    pub cross_category_penalty: f32,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            neighbors: 20,
            same_category_boost: 0.8,
            cross_category_penalty: 1.2,
        }
    }
}

/// Language model endpoint for intent extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntentConfig {
    pub api_url: String,
    pub model: String,
}

impl Default for IntentConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.groq.com/openai/v1/chat/completions".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
        }
    }
}

/// Load configuration, falling back to defaults when the file is missing
pub fn load(config_path: &Path) -> Result<Config> {
    if !config_path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(config_path)?;
    let config: Config = toml::from_str(&content)?;
    Ok(config)
}

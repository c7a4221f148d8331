//! Shopping intents
//!
//! A transcribed voice command is normalized, handed to a hosted language
//! model (see [`groq`], behind the `groq` feature), and the JSON it returns
//! is validated into a [`ShoppingIntent`] before it may touch a wishlist.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;
use thiserror::Error;

#[cfg(feature = "groq")]
pub mod groq;

/// Status stamped on intents produced by the language model
#[cfg(feature = "groq")]
pub const AI_GENERATED: &str = "ai_generated";

const REQUIRED_KEYS: [&str; 5] = ["product", "quantity", "category", "action", "status"];

/// Phrase rewrites applied by `normalize_user_text`, first match wins
static PHRASE_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (
            Regex::new(r"(i want to buy|add|put|include)\s+(.*)").unwrap(),
            "add ${2} to list",
        ),
        (
            Regex::new(r"(remove|delete|take out)\s+(.*)").unwrap(),
            "remove ${2} from list",
        ),
        (
            Regex::new(r"(show|display|what's in|list items)").unwrap(),
            "show my list",
        ),
    ]
});

/// Why a model response was rejected
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IntentError {
    #[error("intent is not a JSON object")]
    NotAnObject,
    #[error("model reported an error: {0}")]
    ModelError(String),
    #[error("intent is missing required field '{0}'")]
    MissingField(&'static str),
    #[error("quantity is not an integer: {0}")]
    InvalidQuantity(String),
    #[error("could not find a JSON object in model output")]
    NoJson,
    #[error("model output is not valid JSON: {0}")]
    Malformed(String),
    #[cfg(feature = "groq")]
    #[error("language model request failed: {0}")]
    Request(String),
}

/// A structured shopping command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShoppingIntent {
    pub product: String,
    pub quantity: i64,
    pub category: String,
    /// add, remove or delete; anything else is rejected when applied
    pub action: String,
    pub status: String,
}

/// Wishlist operation named by an intent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Add,
    Remove,
}

impl Action {
    /// Parse an action name case-insensitively; `delete` is an alias of `remove`
    pub fn parse(action: &str) -> Option<Self> {
        match action.trim().to_lowercase().as_str() {
            "add" => Some(Self::Add),
            "remove" | "delete" => Some(Self::Remove),
            _ => None,
        }
    }
}

impl ShoppingIntent {
    pub fn action(&self) -> Option<Action> {
        Action::parse(&self.action)
    }
}

/// Lowercase and trim `text`, then rewrite common phrasings into a
/// canonical command ("add X to list", "remove X from list", "show my list").
/// Text matching no rule is returned lowercased and trimmed.
pub fn normalize_user_text(text: &str) -> String {
    let text = text.trim().to_lowercase();

    for (pattern, replacement) in PHRASE_RULES.iter() {
        if pattern.is_match(&text) {
            return pattern.replace_all(&text, *replacement).into_owned();
        }
    }

    text
}

/// Validate a model response and convert it into a typed intent
pub fn validate_intent(response: &Value) -> Result<ShoppingIntent, IntentError> {
    let object = response.as_object().ok_or(IntentError::NotAnObject)?;

    if let Some(error) = object.get("error") {
        return Err(IntentError::ModelError(value_to_string(error)));
    }

    for key in REQUIRED_KEYS {
        if !object.contains_key(key) {
            return Err(IntentError::MissingField(key));
        }
    }

    let field = |key: &str| object.get(key).map(value_to_string).unwrap_or_default();

    Ok(ShoppingIntent {
        product: field("product"),
        quantity: parse_quantity(&object["quantity"])?,
        category: field("category"),
        action: field("action"),
        status: field("status"),
    })
}

/// Pull the outermost `{ ... }` out of free-form model output and parse it
pub fn extract_json_object(content: &str) -> Result<Value, IntentError> {
    let start = content.find('{').ok_or(IntentError::NoJson)?;
    let end = content.rfind('}').ok_or(IntentError::NoJson)?;
    if end < start {
        return Err(IntentError::NoJson);
    }

    serde_json::from_str(&content[start..=end]).map_err(|e| IntentError::Malformed(e.to_string()))
}

/// Accept integers, floats (truncated) and integer strings
fn parse_quantity(value: &Value) -> Result<i64, IntentError> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .ok_or_else(|| IntentError::InvalidQuantity(n.to_string())),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| IntentError::InvalidQuantity(s.clone())),
        Value::Bool(b) => Ok(i64::from(*b)),
        other => Err(IntentError::InvalidQuantity(other.to_string())),
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Normalize a transcribed command and, when built with `groq`, run it
/// through the language model and print the validated intent
pub async fn parse_command(text: &str, config: &crate::config::IntentConfig) -> anyhow::Result<()> {
    let normalized = normalize_user_text(text);
    println!("Recognized text: {}", text);
    println!("Normalized text: {}", normalized);

    #[cfg(feature = "groq")]
    {
        let client = groq::GroqClient::from_env(config)?;
        let response = client.process_command(&normalized).await?;
        tracing::debug!("LLM response: {}", response);

        let intent = validate_intent(&response)?;
        println!("{}", serde_json::to_string_pretty(&intent)?);
    }

    #[cfg(not(feature = "groq"))]
    {
        let _ = config;
        println!();
        println!("Language model parsing not available. Rebuild with: cargo build --release --features groq");
    }

    Ok(())
}

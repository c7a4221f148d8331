//! Hosted language model client for intent extraction
//!
//! Talks to an OpenAI-compatible chat-completions endpoint (Groq by
//! default). The API key is read from `GROQ_API_KEY`.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::{extract_json_object, IntentError};
use crate::config::IntentConfig;

/// Chat-completions client
pub struct GroqClient {
    client: reqwest::Client,
    api_url: String,
    model: String,
    api_key: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

impl GroqClient {
    /// Create a client using `GROQ_API_KEY`
    pub fn from_env(config: &IntentConfig) -> Result<Self> {
        let api_key = std::env::var("GROQ_API_KEY")
            .map_err(|_| anyhow!("GROQ_API_KEY is not set"))?;

        Ok(Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            model: config.model.clone(),
            api_key,
        })
    }

    /// Ask the model to turn a normalized command into intent JSON
    pub async fn process_command(&self, user_text: &str) -> Result<Value, IntentError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: build_prompt(user_text),
            }],
            temperature: 0.2,
        };

        debug!("Sending command to {} ({})", self.api_url, self.model);

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| IntentError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Language model returned {}: {}", status, body);
            return Err(IntentError::Request(format!("HTTP {}", status)));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| IntentError::Request(e.to_string()))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| IntentError::Request("unexpected response: no choices".to_string()))?;

        extract_json_object(content.trim())
    }
}

/// Prompt asking for exactly the five intent fields
fn build_prompt(user_text: &str) -> String {
    format!(
        r#"You are an AI working as a store assistant.
Parse the following user command into a JSON object with these exact fields.
If the command is irrelevant and contains no shopping information, return {{"error": "<reason>"}}.

- product: name of the item (string)
- quantity: number (default = 1 if not mentioned)
- category: guess item category (e.g., dairy, fruit, drinks, snacks, grains)
- action: one of ["add", "remove", "delete"]
- status: always "{status}"

User command: "{user_text}"

Return only valid JSON, no explanation."#,
        status = super::AI_GENERATED,
        user_text = user_text,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_command() {
        let prompt = build_prompt("add milk to list");
        assert!(prompt.contains(r#"User command: "add milk to list""#));
        assert!(prompt.contains(r#"status: always "ai_generated""#));
    }

    #[test]
    fn test_response_parsing() {
        let body: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"{\"product\":\"milk\"}"}}]}"#,
        )
        .unwrap();
        assert_eq!(body.choices[0].message.content, r#"{"product":"milk"}"#);

        let empty: ChatResponse = serde_json::from_str(r#"{"error":{"message":"bad key"}}"#).unwrap();
        assert!(empty.choices.is_empty());
    }
}

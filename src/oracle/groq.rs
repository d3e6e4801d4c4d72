//! Chat-completions client for the Groq API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::prompts::{build_prompt, parse_content};
use super::types::{ContentRequest, OracleConfig};
use super::ContentGenerator;
use crate::core::errors::{DocsmithError, DocsmithResultExt, Result};
use crate::docstring::SemanticContent;

/// Chat-completions request structure
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub temperature: f32,
    pub messages: Vec<ChatMessage>,
}

/// One message of a chat request or response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Response from the chat-completions endpoint.
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<ChatChoice>,
}

/// Candidate completion.
#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
}

/// Content generator backed by a Groq-hosted model.
pub struct GroqOracle {
    config: OracleConfig,
    client: reqwest::Client,
}

impl GroqOracle {
    /// Create a new oracle with the given configuration
    pub fn new(config: OracleConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_generic_err("building HTTP client")?;
        Ok(Self { config, client })
    }

    /// Model in use.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Send `prompt` and return the first completion's text.
    async fn complete(&self, prompt: String) -> Result<String> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            temperature: self.config.temperature,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&self.config.api_endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_generic_err("sending request to Groq API")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(DocsmithError::generation(format!(
                "Groq API error ({status}): {error_text}"
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_generic_err("parsing Groq API response")?;

        chat.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| DocsmithError::generation("No choices in Groq response"))
    }
}

#[async_trait]
impl ContentGenerator for GroqOracle {
    async fn generate(&self, request: &ContentRequest) -> Result<SemanticContent> {
        debug!("Requesting content for '{}' from {}", request.name, self.config.model);
        let text = self.complete(build_prompt(request)).await?;
        parse_content(&text)
    }
}

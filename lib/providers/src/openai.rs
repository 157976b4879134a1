//! OpenAI chat completions and embeddings.

use crate::http::{build_client, endpoint, post_json};
use reframe_core::{Embedder, Error, GenerationRequest, OpenAiConfig, Result, TextGenerator};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const SERVICE: &str = "openai";

/// Chat completions client
#[derive(Clone)]
pub struct OpenAiChat {
    client: Client,
    endpoint: String,
}

impl OpenAiChat {
    pub fn new(api_key: &str, config: &OpenAiConfig) -> Result<Self> {
        let client = build_client(SERVICE, Duration::from_secs(config.timeout_secs), Some(api_key))?;
        Ok(Self {
            client,
            endpoint: endpoint(&config.base_url, "chat/completions"),
        })
    }
}

impl TextGenerator for OpenAiChat {
    fn generate(&self, request: &GenerationRequest<'_>) -> Result<String> {
        let body = ChatRequest::from_request(request);
        let parsed: ChatResponse = post_json(&self.client, SERVICE, &self.endpoint, &body)?;
        parsed.into_content()
    }
}

/// Embeddings client, one input per request
#[derive(Clone)]
pub struct OpenAiEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    dimensions: Option<usize>,
}

impl OpenAiEmbedder {
    pub fn new(
        api_key: &str,
        config: &OpenAiConfig,
        model: impl Into<String>,
        dimensions: Option<usize>,
    ) -> Result<Self> {
        let model = model.into();
        if model.trim().is_empty() {
            return Err(Error::InvalidConfig("missing OpenAI embedding model".to_string()));
        }
        let client = build_client(SERVICE, Duration::from_secs(config.timeout_secs), Some(api_key))?;
        Ok(Self {
            client,
            endpoint: endpoint(&config.base_url, "embeddings"),
            model,
            dimensions,
        })
    }
}

impl Embedder for OpenAiEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = EmbeddingRequest {
            model: &self.model,
            input: text,
            dimensions: self.dimensions,
        };
        let parsed: EmbeddingResponse = post_json(&self.client, SERVICE, &self.endpoint, &body)?;
        parsed.into_first()
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

impl<'a> ChatRequest<'a> {
    fn from_request(request: &GenerationRequest<'a>) -> Self {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: request.prompt,
        });
        Self {
            model: request.model,
            temperature: request.temperature,
            messages,
        }
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

impl ChatResponse {
    fn into_content(self) -> Result<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| Error::transport(SERVICE, "chat response has no content"))
    }
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

impl EmbeddingResponse {
    fn into_first(self) -> Result<Vec<f32>> {
        self.data
            .into_iter()
            .next()
            .map(|entry| entry.embedding)
            .filter(|embedding| !embedding.is_empty())
            .ok_or_else(|| Error::transport(SERVICE, "embedding response has no data"))
    }
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

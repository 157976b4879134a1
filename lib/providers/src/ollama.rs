//! Ollama `/api/generate` client.

use crate::http::{build_client, endpoint, post_json};
use reframe_core::{Error, GenerationRequest, OllamaConfig, Result, TextGenerator};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const SERVICE: &str = "ollama";

#[derive(Clone)]
pub struct OllamaGenerate {
    client: Client,
    endpoint: String,
}

impl OllamaGenerate {
    pub fn new(config: &OllamaConfig) -> Result<Self> {
        let client = build_client(SERVICE, Duration::from_secs(config.timeout_secs), None)?;
        Ok(Self {
            client,
            endpoint: endpoint(&config.base_url, "api/generate"),
        })
    }
}

impl TextGenerator for OllamaGenerate {
    fn generate(&self, request: &GenerationRequest<'_>) -> Result<String> {
        let body = GenerateRequest::from_request(request);
        let parsed: GenerateResponse = post_json(&self.client, SERVICE, &self.endpoint, &body)?;
        if let Some(error) = parsed.error {
            return Err(Error::transport(SERVICE, error));
        }
        parsed
            .response
            .ok_or_else(|| Error::transport(SERVICE, "generate response has no text"))
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    stream: bool,
    options: GenerateOptions,
}

impl<'a> GenerateRequest<'a> {
    fn from_request(request: &GenerationRequest<'a>) -> Self {
        Self {
            model: request.model,
            prompt: request.prompt,
            system: request.system,
            stream: false,
            options: GenerateOptions {
                temperature: request.temperature,
            },
        }
    }
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_body() {
        let request = GenerationRequest {
            prompt: "Give me pairs",
            system: Some("JSON only"),
            model: "dolphin-mistral",
            temperature: 0.5,
        };
        let body = serde_json::to_value(GenerateRequest::from_request(&request)).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "dolphin-mistral",
                "prompt": "Give me pairs",
                "system": "JSON only",
                "stream": false,
                "options": {"temperature": 0.5}
            })
        );
    }

    #[test]
    fn test_request_without_system() {
        let request = GenerationRequest {
            prompt: "p",
            system: None,
            model: "llama3",
            temperature: 0.0,
        };
        let body = serde_json::to_value(GenerateRequest::from_request(&request)).unwrap();
        assert!(body.get("system").is_none());
    }

    #[test]
    fn test_response_parsing() {
        let parsed: GenerateResponse = serde_json::from_value(json!({
            "model": "dolphin-mistral",
            "response": "[]",
            "done": true
        }))
        .unwrap();
        assert_eq!(parsed.response.as_deref(), Some("[]"));
        assert!(parsed.error.is_none());
    }
}

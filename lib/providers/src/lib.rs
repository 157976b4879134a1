//! # reframe Providers
//!
//! Blocking HTTP clients for the external services:
//!
//! - [`OpenAiChat`] - OpenAI chat completions as a [`TextGenerator`]
//! - [`OllamaGenerate`] - Ollama `/api/generate` as a [`TextGenerator`]
//! - [`OpenAiEmbedder`] - OpenAI embeddings as an [`Embedder`]
//!
//! Every failure to reach a service or read its reply is an
//! [`Error::Transport`].

mod http;
pub mod ollama;
pub mod openai;

pub use ollama::OllamaGenerate;
pub use openai::{OpenAiChat, OpenAiEmbedder};

use reframe_core::{Embedder, Error, OpenAiConfig, ProviderKind, Result, Settings, TextGenerator};
use tracing::info;

/// Read the OpenAI API key from the configured environment variable
pub fn openai_api_key(config: &OpenAiConfig) -> Result<String> {
    match std::env::var(&config.api_key_env) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(Error::InvalidConfig(format!(
            "OpenAI API key is not set. Please set the {} environment variable.",
            config.api_key_env
        ))),
    }
}

/// Generation client for `kind`
pub fn generator_for(kind: ProviderKind, settings: &Settings) -> Result<Box<dyn TextGenerator>> {
    info!("Using {} generation backend", kind.as_str());
    match kind {
        ProviderKind::OpenAi => {
            let key = openai_api_key(&settings.openai)?;
            Ok(Box::new(OpenAiChat::new(&key, &settings.openai)?))
        }
        ProviderKind::Ollama => Ok(Box::new(OllamaGenerate::new(&settings.ollama)?)),
    }
}

/// Embedding client from the `embedding` and `openai` settings
pub fn embedder_for(settings: &Settings) -> Result<Box<dyn Embedder>> {
    let key = openai_api_key(&settings.openai)?;
    let embedder = OpenAiEmbedder::new(
        &key,
        &settings.openai,
        settings.embedding.model.clone(),
        settings.embedding.dimension,
    )?;
    Ok(Box::new(embedder))
}

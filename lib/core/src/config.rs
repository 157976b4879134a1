//! Runtime settings.
//!
//! Everything that used to be a module-level constant (model names, attempt
//! budgets, embedding dimensionality, paths) lives here and is handed to each
//! component when it is constructed. Settings load from an optional TOML file;
//! every field has a default.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Expected record schema for a generation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    /// Each record carries both `dysfunctional` and `functional` text
    Pairs,
    /// Each record carries only `dysfunctional` text
    DysfunctionalOnly,
}

impl GenerationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationMode::Pairs => "pairs",
            GenerationMode::DysfunctionalOnly => "dysfunctional_only",
        }
    }
}

/// Which backend serves a generation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[serde(alias = "open_ai")]
    OpenAi,
    Ollama,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Ollama => "ollama",
        }
    }
}

/// Top-level settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub generation: GenerationConfig,
    pub rewrite: RewriteConfig,
    pub embedding: EmbeddingConfig,
    pub retrieval: RetrievalConfig,
    pub paths: PathsConfig,
    pub openai: OpenAiConfig,
    pub ollama: OllamaConfig,
    pub topics: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            generation: GenerationConfig::default(),
            rewrite: RewriteConfig::default(),
            embedding: EmbeddingConfig::default(),
            retrieval: RetrievalConfig::default(),
            paths: PathsConfig::default(),
            openai: OpenAiConfig::default(),
            ollama: OllamaConfig::default(),
            topics: crate::topics::default_topics(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file, or defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let settings = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                Self::from_toml(&raw)?
            }
            None => Self::default(),
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.topics.is_empty() {
            return Err(Error::InvalidConfig("topic catalogue is empty".to_string()));
        }
        if self.topics.iter().any(|t| t.trim().is_empty()) {
            return Err(Error::InvalidConfig("topic labels must not be blank".to_string()));
        }
        self.generation.validate()?;
        validate_model("rewrite", &self.rewrite.model, self.rewrite.temperature)?;
        if self.embedding.model.trim().is_empty() {
            return Err(Error::InvalidConfig("embedding model is empty".to_string()));
        }
        if self.embedding.dimension == Some(0) {
            return Err(Error::InvalidConfig("embedding dimension must be positive".to_string()));
        }
        if self.retrieval.top_n == 0 {
            return Err(Error::InvalidConfig("retrieval.top_n must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Structured generation settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
    /// Records requested per topic; the service may return more or fewer
    pub records_per_topic: usize,
    pub pairs_max_attempts: u32,
    pub dysfunctional_only_max_attempts: u32,
    pub sources: Vec<SourceConfig>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            records_per_topic: 5,
            pairs_max_attempts: 5,
            dysfunctional_only_max_attempts: 3,
            sources: vec![
                SourceConfig {
                    provider: ProviderKind::OpenAi,
                    model: "gpt-3.5-turbo".to_string(),
                    temperature: 0.0,
                    mode: GenerationMode::Pairs,
                },
                SourceConfig {
                    provider: ProviderKind::Ollama,
                    model: "dolphin-mistral".to_string(),
                    temperature: 0.8,
                    mode: GenerationMode::Pairs,
                },
            ],
        }
    }
}

impl GenerationConfig {
    /// Attempt budget for one topic under `mode`
    pub fn max_attempts(&self, mode: GenerationMode) -> u32 {
        match mode {
            GenerationMode::Pairs => self.pairs_max_attempts,
            GenerationMode::DysfunctionalOnly => self.dysfunctional_only_max_attempts,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.records_per_topic == 0 {
            return Err(Error::InvalidConfig(
                "generation.records_per_topic must be at least 1".to_string(),
            ));
        }
        if self.pairs_max_attempts == 0 || self.dysfunctional_only_max_attempts == 0 {
            return Err(Error::InvalidConfig(
                "generation attempt budgets must be at least 1".to_string(),
            ));
        }
        if self.sources.is_empty() {
            return Err(Error::InvalidConfig("no generation sources configured".to_string()));
        }
        for source in &self.sources {
            validate_model("generation source", &source.model, source.temperature)?;
        }
        Ok(())
    }
}

/// One generation backend and the schema it is asked for
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceConfig {
    pub provider: ProviderKind,
    pub model: String,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_mode")]
    pub mode: GenerationMode,
}

fn default_mode() -> GenerationMode {
    GenerationMode::Pairs
}

/// Backend used to rewrite dysfunctional text into functional text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RewriteConfig {
    pub provider: ProviderKind,
    pub model: String,
    pub temperature: f32,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::OpenAi,
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,
    /// When set, the store rejects embeddings of any other length
    pub dimension: Option<usize>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimension: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of few-shot examples selected per prompt
    pub top_n: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_n: 5 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
    pub database: PathBuf,
    pub prompts_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data_synthetic"),
            database: PathBuf::from("embeddings.db"),
            prompts_dir: PathBuf::from("dynamic_fewshot_prompts"),
        }
    }
}

impl PathsConfig {
    /// Database location; relative names resolve inside `data_dir`
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database)
    }

    /// `synthetic_data_{label}.json` / `.csv` inside `data_dir`
    pub fn dataset_paths(&self, label: Option<&str>) -> (PathBuf, PathBuf) {
        let stem = match label {
            Some(label) => format!("synthetic_data_{}", label),
            None => "synthetic_data".to_string(),
        };
        (
            self.data_dir.join(format!("{}.json", stem)),
            self.data_dir.join(format!("{}.csv", stem)),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OpenAiConfig {
    pub base_url: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OllamaConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            timeout_secs: 300,
        }
    }
}

fn validate_model(section: &str, model: &str, temperature: f32) -> Result<()> {
    if model.trim().is_empty() {
        return Err(Error::InvalidConfig(format!("{} model is empty", section)));
    }
    if !temperature.is_finite() || !(0.0..=2.0).contains(&temperature) {
        return Err(Error::InvalidConfig(format!(
            "{} temperature {} outside [0, 2]",
            section, temperature
        )));
    }
    Ok(())
}

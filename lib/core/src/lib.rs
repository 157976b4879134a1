//! # reframe Core
//!
//! Core library for reframe.
//!
//! This crate provides the types shared by every stage of the pipeline:
//!
//! - [`Vector`] - Dense embedding vector with cosine similarity
//! - [`ExamplePair`] / [`Example`] - Corpus entries, before and after storage
//! - [`RetrievalResult`] - Ranked example pairs with scores
//! - [`TextGenerator`] / [`Embedder`] - Seams to the external services
//! - [`Settings`] - Explicit configuration handed to each component
//!
//! ## Example
//!
//! ```rust
//! use reframe_core::{ExamplePair, NewExample, Vector};
//!
//! let pair = ExamplePair::new(
//!     "You always forget the school pickup.",
//!     "Can we set a reminder for the school pickup?",
//! );
//! let example = NewExample::new(pair, vec![0.1, 0.7, 0.2]);
//! assert_eq!(example.embedding.dim(), 3);
//!
//! let query = Vector::new(vec![0.1, 0.7, 0.2]);
//! assert!((query.cosine_similarity(&example.embedding) - 1.0).abs() < 1e-6);
//! ```

pub mod config;
pub mod error;
pub mod example;
pub mod service;
pub mod topics;
pub mod vector;

pub use config::{
    EmbeddingConfig, GenerationConfig, GenerationMode, OllamaConfig, OpenAiConfig, PathsConfig,
    ProviderKind, RetrievalConfig, RewriteConfig, Settings, SourceConfig,
};
pub use error::{Error, Result};
pub use example::{
    Example, ExampleId, ExamplePair, GeneratedRecord, NewExample, RetrievalResult,
};
pub use service::{Embedder, GenerationRequest, TextGenerator};
pub use topics::{default_topics, DEFAULT_TOPICS};
pub use vector::Vector;

//! # reframe
//!
//! Builds a corpus of dysfunctional/functional text pairs and uses it to
//! write dynamic few-shot prompts.
//!
//! ## Pipeline
//!
//! 1. A text-generation service produces records per topic; invalid replies
//!    are retried within a fixed attempt budget
//! 2. Records without functional text are rewritten by a second call
//! 3. Each pair's dysfunctional text is embedded and stored in SQLite
//! 4. A new text is embedded, the closest pairs are selected by cosine
//!    similarity and rendered as worked examples in the prompt
//!
//! ## Quick Start
//!
//! ### As a CLI
//!
//! ```bash
//! reframe run --rewrite --index
//! reframe prompt --text "You never pick the kids up on time."
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use reframe::prelude::*;
//!
//! let store = EmbeddingStore::open_in_memory(Some(2)).unwrap();
//! store
//!     .insert(&[
//!         NewExample::new(ExamplePair::new("You never call.", "Please call more often."), vec![1.0, 0.0]),
//!         NewExample::new(ExamplePair::new("You're useless.", "I need more help."), vec![0.0, 1.0]),
//!     ])
//!     .unwrap();
//!
//! let query = Vector::new(vec![0.9, 0.1]);
//! let result = try_rank(&query, store.scan_all(), 1).unwrap();
//! let prompt = fewshot_prompt(&result.examples, "You always forget to call.");
//! assert!(prompt.contains("Please call more often."));
//! ```
//!
//! ## Crate Structure
//!
//! - [`reframe-core`](https://docs.rs/reframe-core) - Shared types, errors, service traits, settings
//! - [`reframe-storage`](https://docs.rs/reframe-storage) - SQLite embedding store, dataset export
//! - [`reframe-similarity`](https://docs.rs/reframe-similarity) - Cosine ranker
//! - [`reframe-prompt`](https://docs.rs/reframe-prompt) - Few-shot prompt assembly
//! - [`reframe-generation`](https://docs.rs/reframe-generation) - Structured generation with retries
//! - [`reframe-providers`](https://docs.rs/reframe-providers) - OpenAI and Ollama clients

pub mod pipeline;

// Re-export core types
pub use reframe_core::{
    Embedder, Error, Example, ExampleId, ExamplePair, GeneratedRecord, GenerationMode,
    GenerationRequest, NewExample, ProviderKind, Result, RetrievalConfig, RetrievalResult,
    Settings, SourceConfig, TextGenerator, Vector,
};

// Re-export storage
pub use reframe_storage::{read_json, write_csv, write_dataset, write_json, EmbeddingStore};

// Re-export ranking, prompting and generation
pub use reframe_generation::{
    FunctionalRewriter, GenerationEngine, GenerationOutput, TopicReport, ValidationError,
};
pub use reframe_prompt::{assemble, fewshot_prompt, rewrite_prompt, INSTRUCTION_HEADER};
pub use reframe_similarity::{rank, try_rank, Ranker};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Embedder, EmbeddingStore, Error, Example, ExamplePair, GeneratedRecord,
        GenerationEngine, GenerationMode, NewExample, Result, RetrievalResult, Settings,
        TextGenerator, Vector,
        fewshot_prompt, rank, try_rank,
    };
}

//! # reframe Generation
//!
//! Structured synthetic data generation.
//!
//! ## Overview
//!
//! For every topic in the catalogue the engine asks a text-generation service
//! for a batch of records and checks the raw reply against the record schema.
//! Replies that fail validation are retried with the identical prompt until the
//! attempt budget is spent; the topic then contributes nothing and the run
//! carries on. Service failures stop the run.
//!
//! **Modes:**
//! - `Pairs`: each record needs `dysfunctional` and `functional` text
//! - `DysfunctionalOnly`: each record needs `dysfunctional` text; the
//!   [`FunctionalRewriter`] fills in the functional side afterwards
//!
//! ## Example
//!
//! ```rust
//! use reframe_core::{GenerationConfig, GenerationMode, GenerationRequest, Result, TextGenerator};
//! use reframe_generation::GenerationEngine;
//!
//! struct Canned;
//!
//! impl TextGenerator for Canned {
//!     fn generate(&self, _request: &GenerationRequest<'_>) -> Result<String> {
//!         Ok(r#"[{"dysfunctional": "You never listen.", "functional": "I'd like to feel heard."}]"#.to_string())
//!     }
//! }
//!
//! let engine = GenerationEngine::new(Canned, "canned", 0.0, &GenerationConfig::default());
//! let output = engine.generate(&["Communication"], 1, GenerationMode::Pairs).unwrap();
//! assert_eq!(output.produced(), 1);
//! ```

pub mod engine;
pub mod rewrite;
pub mod schema;
pub mod state;
pub mod templates;

pub use engine::{GenerationEngine, GenerationOutput, TopicReport};
pub use rewrite::FunctionalRewriter;
pub use schema::{parse_records, ValidationError};
pub use state::{transition, IllegalTransition, TopicEvent, TopicState};
pub use templates::{topic_prompt, SYSTEM_MESSAGE};

//! # reframe Prompt
//!
//! Renders the dynamic few-shot prompt: a fixed instruction header, the
//! retrieved examples as `Input` / `Expected Output` blocks, and the user's text.
//!
//! ```rust
//! use reframe_core::ExamplePair;
//! use reframe_prompt::fewshot_prompt;
//!
//! let examples = vec![ExamplePair::new("You never call.", "I'd love to hear from you more often.")];
//! let prompt = fewshot_prompt(&examples, "You always cancel last minute.");
//! assert!(prompt.contains("- Expected Output: I'd love to hear from you more often."));
//! ```

pub mod assemble;

pub use assemble::{assemble, fewshot_prompt, rewrite_prompt, INSTRUCTION_HEADER};

//! # reframe Similarity
//!
//! Nearest-neighbor selection of few-shot examples.
//!
//! The corpus is small and fixed-dimension, so ranking is a whole-corpus linear
//! scan: every stored embedding is scored against the query with cosine
//! similarity and the top `N` pairs are kept, embeddings stripped.
//!
//! ## Example
//!
//! ```rust
//! use reframe_core::{Example, Vector};
//! use reframe_similarity::rank;
//!
//! let corpus = vec![
//!     Example { id: 1, dysfunctional_text: "a".into(), functional_text: "b".into(), embedding: Vector::new(vec![1.0, 0.0]) },
//!     Example { id: 2, dysfunctional_text: "c".into(), functional_text: "d".into(), embedding: Vector::new(vec![0.0, 1.0]) },
//! ];
//! let result = rank(&Vector::new(vec![1.0, 0.0]), corpus, 1).unwrap();
//! assert_eq!(result.examples[0].dysfunctional_text, "a");
//! ```

pub mod ranker;

pub use ranker::{rank, try_rank, Ranker};

//! # reframe Storage
//!
//! Persistence for the example corpus:
//!
//! - [`EmbeddingStore`] - SQLite table of example pairs and their embeddings
//! - [`export`] - JSON and CSV dataset files

pub mod export;
pub mod schema;
pub mod store;

pub use export::{read_json, write_csv, write_dataset, write_json, DatasetRecord};
pub use store::{EmbeddingStore, ExampleScan};

use reframe_core::Error;

pub(crate) fn to_storage_err(e: impl ToString) -> Error {
    Error::Storage(e.to_string())
}

pub(crate) fn to_init_err(e: impl ToString) -> Error {
    Error::StoreInit(e.to_string())
}

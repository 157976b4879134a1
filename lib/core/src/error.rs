use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Transport error ({service}): {message}")]
    Transport { service: String, message: String },

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Store initialization failed: {0}")]
    StoreInit(String),

    #[error("Insert failed at record {index}: {reason}")]
    Insert { index: usize, reason: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Generation error: {0}")]
    Generation(String),
}

impl Error {
    pub fn transport(service: impl Into<String>, message: impl ToString) -> Self {
        Error::Transport {
            service: service.into(),
            message: message.to_string(),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

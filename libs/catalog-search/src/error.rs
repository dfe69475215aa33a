//! Error types for component catalog search

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to register search index '{name}': {reason}")]
    SchemaRegistration { name: String, reason: String },

    #[error("Search engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Search engine error: {0}")]
    Engine(String),

    #[error("Invalid restriction on field '{field}': {reason}")]
    InvalidRestriction { field: String, reason: String },

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Cannot resolve sort column '{field}' for '{document_type}'")]
    SortResolution {
        document_type: String,
        field: String,
    },

    #[error("Permission check failed: {0}")]
    Permission(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Whether the caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::EngineUnavailable(_))
    }

    /// Whether the request itself was at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidRestriction { .. } | Error::InvalidQuery(_) | Error::Validation(_)
        )
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() || err.is_request() {
            Error::EngineUnavailable(err.to_string())
        } else if err.is_decode() {
            Error::Engine(format!("Malformed engine response: {}", err))
        } else {
            Error::Engine(err.to_string())
        }
    }
}

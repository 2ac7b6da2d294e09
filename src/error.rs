//! Error types for the RAG pipeline.

use thiserror::Error;

use crate::utils::retry::Retryable;

/// Errors raised while loading source documents.
///
/// Per-file problems (corrupt PDF, bad encoding) are logged and skipped by
/// the loader and never surface here; this type covers failures that stop
/// the whole run, such as an unreadable content directory.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("content directory not found: {0}")]
    DirectoryNotFound(String),

    #[error("directory walk error: {0}")]
    WalkError(String),
}

/// Errors related to embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("failed to connect to embedding backend: {0}")]
    ConnectionError(String),

    #[error("embedding backend error: {0}")]
    ServerError(String),

    #[error("embedding request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("embedding timeout")]
    Timeout,
}

impl Retryable for EmbeddingError {
    fn is_retryable(&self) -> bool {
        match self {
            // Connection and timeout errors are retryable
            EmbeddingError::ConnectionError(_) | EmbeddingError::Timeout => true,
            // Server errors might be transient (e.g., 503 Service Unavailable)
            EmbeddingError::ServerError(msg) => {
                msg.contains("503")
                    || msg.contains("502")
                    || msg.contains("504")
                    || msg.contains("429")
                    || msg.to_lowercase().contains("unavailable")
                    || msg.to_lowercase().contains("too many requests")
            }
            // Request errors depend on the underlying cause
            EmbeddingError::RequestError(e) => e.is_timeout() || e.is_connect(),
            // Invalid responses are not retryable
            EmbeddingError::InvalidResponse(_) => false,
        }
    }
}

/// Errors related to vector index operations.
#[derive(Debug, Error)]
pub enum VectorStoreError {
    #[error("failed to connect to vector index: {0}")]
    ConnectionError(String),

    #[error("collection error: {0}")]
    CollectionError(String),

    #[error("upsert error: {0}")]
    UpsertError(String),

    #[error("search error: {0}")]
    SearchError(String),

    #[error("delete error: {0}")]
    DeleteError(String),

    #[error("vector index client error: {0}")]
    ClientError(String),
}

impl Retryable for VectorStoreError {
    fn is_retryable(&self) -> bool {
        match self {
            // Connection errors are always retryable
            VectorStoreError::ConnectionError(_) => true,
            // Other errors might be transient
            VectorStoreError::CollectionError(msg)
            | VectorStoreError::UpsertError(msg)
            | VectorStoreError::SearchError(msg)
            | VectorStoreError::DeleteError(msg)
            | VectorStoreError::ClientError(msg) => {
                let msg_lower = msg.to_lowercase();
                msg_lower.contains("timeout")
                    || msg_lower.contains("connection")
                    || msg_lower.contains("unavailable")
                    || msg_lower.contains("too many")
            }
        }
    }
}

/// Errors related to the persisted index manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),
}

/// Errors related to ingest operations.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("load error: {0}")]
    LoadError(#[from] LoadError),

    #[error("embedding error: {0}")]
    EmbeddingError(#[from] EmbeddingError),

    #[error("vector index error: {0}")]
    VectorStoreError(#[from] VectorStoreError),

    #[error("manifest error: {0}")]
    ManifestError(#[from] ManifestError),

    #[error(
        "index was built with embedding model '{indexed}' but '{configured}' is configured; \
         re-ingest with --reset to switch models"
    )]
    ModelMismatch { indexed: String, configured: String },
}

/// Errors related to retrieval operations.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("embedding error: {0}")]
    EmbeddingError(#[from] EmbeddingError),

    #[error("vector index error: {0}")]
    VectorStoreError(#[from] VectorStoreError),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("index was built with embedding model '{indexed}' but '{configured}' is configured")]
    ModelMismatch { indexed: String, configured: String },
}

/// Errors related to answer generation.
///
/// These never abort a fragment stream that has already started; the
/// generator converts them into a terminal error fragment instead.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("failed to connect to model backend: {0}")]
    ConnectionError(String),

    #[error("model backend error: {0}")]
    ServerError(String),

    #[error("stream error: {0}")]
    StreamError(String),

    #[error("model backend timeout")]
    Timeout,
}

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("path error: {0}")]
    PathError(String),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Application-level errors that wrap domain errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("ingest error: {0}")]
    Index(#[from] IndexError),

    #[error("search error: {0}")]
    Search(#[from] SearchError),

    #[error("generation error: {0}")]
    Generate(#[from] GenerateError),

    #[error("{0}")]
    Other(String),
}

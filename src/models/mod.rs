mod config;
mod document;
mod manifest;
mod search;

pub use config::{
    Config, DEFAULT_COLLECTION, DEFAULT_EMBEDDING_DIMENSION, DEFAULT_EMBEDDING_MODEL,
    DEFAULT_GENERATION_MODEL, DEFAULT_OLLAMA_URL, DEFAULT_QDRANT_URL, EmbeddingConfig,
    GenerationConfig, IndexingConfig, SearchConfig, VectorDriver, VectorStoreConfig,
};
pub use document::{Chunk, IngestReport, PAGE_ABSENT, RawDocument};
pub use manifest::IndexManifest;
pub use search::{OutputFormat, RetrievalResult, RetrievedChunk};

//! Vector index abstraction layer.
//!
//! The index is an external collaborator: it persists chunk vectors plus
//! text and metadata keyed by stable id, and answers nearest-neighbor
//! queries. Backends implement [`VectorIndex`] and are selected by
//! configuration.

mod memory;
mod qdrant;

pub use memory::MemoryBackend;
pub use qdrant::QdrantBackend;

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::VectorStoreError;
use crate::models::{Chunk, RetrievedChunk, VectorDriver, VectorStoreConfig};

/// Collection information.
#[derive(Debug, Clone)]
pub struct CollectionInfo {
    pub points_count: u64,
}

/// Abstract trait for vector index operations.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Check if the index is healthy and accessible.
    async fn health_check(&self) -> Result<bool, VectorStoreError>;

    /// Get information about the collection, `None` if it doesn't exist.
    async fn collection_info(&self) -> Result<Option<CollectionInfo>, VectorStoreError>;

    /// Create the collection if it doesn't exist.
    async fn ensure_collection(&self) -> Result<(), VectorStoreError>;

    /// Insert or replace chunks keyed by their stable ids. Chunks must
    /// carry embeddings; re-upserting an id replaces the previous entry.
    async fn upsert_chunks(&self, chunks: Vec<Chunk>) -> Result<(), VectorStoreError>;

    /// Stable ids of every chunk currently persisted. An absent collection
    /// reads as empty, not as an error.
    async fn existing_ids(&self) -> Result<HashSet<String>, VectorStoreError>;

    /// Nearest-neighbor search, at most `k` results descending by score.
    /// An absent or empty collection returns no results.
    async fn search(
        &self,
        query_vector: Vec<f32>,
        k: u64,
        min_score: Option<f32>,
    ) -> Result<Vec<RetrievedChunk>, VectorStoreError>;

    /// Delete every persisted chunk.
    async fn delete_all(&self) -> Result<(), VectorStoreError>;

    /// Get the collection name.
    fn collection(&self) -> &str;
}

/// Create a vector index backend based on configuration.
pub fn create_backend(
    config: &VectorStoreConfig,
    embedding_dim: u32,
) -> Result<Arc<dyn VectorIndex>, VectorStoreError> {
    match config.driver {
        VectorDriver::Qdrant => {
            let backend = QdrantBackend::new(config, u64::from(embedding_dim))?;
            Ok(Arc::new(backend))
        }
        VectorDriver::Memory => Ok(Arc::new(MemoryBackend::new(
            &config.collection,
            embedding_dim,
        ))),
    }
}

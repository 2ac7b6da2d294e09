//! In-memory vector index.
//!
//! Brute-force cosine similarity over a HashMap, keyed by stable id. Not a
//! persistence backend: data lives for the lifetime of the process. Useful
//! for tests and offline development without a running Qdrant.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{CollectionInfo, VectorIndex};
use crate::error::VectorStoreError;
use crate::models::{Chunk, RetrievedChunk};

pub struct MemoryBackend {
    collection: String,
    #[allow(dead_code)]
    dimension: u32,
    chunks: Arc<RwLock<HashMap<String, Chunk>>>,
}

impl MemoryBackend {
    pub fn new(collection: &str, dimension: u32) -> Self {
        Self {
            collection: collection.to_string(),
            dimension,
            chunks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Compute cosine similarity between two vectors.
    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() {
            return 0.0;
        }

        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        dot / (norm_a * norm_b)
    }
}

#[async_trait]
impl VectorIndex for MemoryBackend {
    async fn health_check(&self) -> Result<bool, VectorStoreError> {
        Ok(true)
    }

    async fn collection_info(&self) -> Result<Option<CollectionInfo>, VectorStoreError> {
        let chunks = self.chunks.read().await;
        Ok(Some(CollectionInfo {
            points_count: chunks.len() as u64,
        }))
    }

    async fn ensure_collection(&self) -> Result<(), VectorStoreError> {
        Ok(())
    }

    async fn upsert_chunks(&self, chunks: Vec<Chunk>) -> Result<(), VectorStoreError> {
        let mut store = self.chunks.write().await;
        for chunk in chunks {
            store.insert(chunk.stable_id.clone(), chunk);
        }
        Ok(())
    }

    async fn existing_ids(&self) -> Result<HashSet<String>, VectorStoreError> {
        let chunks = self.chunks.read().await;
        Ok(chunks.keys().cloned().collect())
    }

    async fn search(
        &self,
        query_vector: Vec<f32>,
        k: u64,
        min_score: Option<f32>,
    ) -> Result<Vec<RetrievedChunk>, VectorStoreError> {
        let chunks = self.chunks.read().await;

        let mut scored: Vec<(f32, &Chunk)> = chunks
            .values()
            .map(|chunk| (Self::cosine_similarity(&query_vector, &chunk.embedding), chunk))
            .filter(|(score, _)| min_score.is_none_or(|floor| *score >= floor))
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(k as usize)
            .map(|(score, chunk)| RetrievedChunk {
                chunk_id: chunk.stable_id.clone(),
                score,
                content: chunk.text.clone(),
                source_path: chunk.source_path.clone(),
                page_number: chunk.page_number,
            })
            .collect())
    }

    async fn delete_all(&self) -> Result<(), VectorStoreError> {
        let mut chunks = self.chunks.write().await;
        chunks.clear();
        Ok(())
    }

    fn collection(&self) -> &str {
        &self.collection
    }
}

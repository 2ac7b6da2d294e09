//! Query-time retrieval: embed the question, nearest-neighbor search.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crate::error::SearchError;
use crate::models::{Config, IndexManifest, RetrievalResult};
use crate::services::embedding::EmbeddingProvider;
use crate::services::vector_store::VectorIndex;

pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    manifest_dir: PathBuf,
    min_score: Option<f32>,
}

impl Retriever {
    pub fn new(
        config: &Config,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
    ) -> Self {
        Self {
            embedder,
            index,
            manifest_dir: config
                .manifest_dir()
                .unwrap_or_else(|| PathBuf::from(".ragdex")),
            min_score: config.search.default_min_score,
        }
    }

    /// Override the similarity floor from configuration.
    pub fn with_min_score(mut self, min_score: Option<f32>) -> Self {
        self.min_score = min_score;
        self
    }

    /// Retrieve at most `k` chunks for a query, descending by similarity.
    ///
    /// An empty or absent index yields an empty result, not an error.
    /// A query embedded with a different model than the one that built the
    /// index is rejected: the two vector spaces are not comparable.
    pub async fn retrieve(&self, query: &str, k: u32) -> Result<RetrievalResult, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::InvalidQuery("query cannot be empty".into()));
        }
        if k == 0 {
            return Err(SearchError::InvalidQuery("k must be at least 1".into()));
        }

        match IndexManifest::load(&self.manifest_dir, self.index.collection()) {
            Ok(Some(manifest)) => {
                if !manifest.matches_model(self.embedder.model_id()) {
                    return Err(SearchError::ModelMismatch {
                        indexed: manifest.embedding_model,
                        configured: self.embedder.model_id().to_string(),
                    });
                }
            }
            Ok(None) => {
                tracing::warn!(
                    "no manifest for collection '{}'; cannot verify the index was built with \
                     embedding model '{}'",
                    self.index.collection(),
                    self.embedder.model_id()
                );
            }
            Err(e) => {
                tracing::warn!("failed to read index manifest: {e}");
            }
        }

        let started = Instant::now();
        let query_vector = self.embedder.embed_query(query).await?;
        let chunks = self
            .index
            .search(query_vector, u64::from(k), self.min_score)
            .await?;

        Ok(RetrievalResult::new(
            query.to_string(),
            chunks,
            started.elapsed().as_millis() as u64,
        ))
    }
}

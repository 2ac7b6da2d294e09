//! Ingest orchestration: load, chunk, identify, diff, embed, upsert.
//!
//! Embedding is the expensive step, so the indexer only embeds chunks whose
//! stable ids are not already in the index. Re-ingesting an unchanged corpus
//! performs zero embedding calls and zero writes.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;

use crate::error::IndexError;
use crate::loader::DocumentLoader;
use crate::models::{Chunk, Config, IndexManifest, IngestReport};
use crate::services::chunker::TextChunker;
use crate::services::embedding::EmbeddingProvider;
use crate::services::identity::assign_identities;
use crate::services::vector_store::VectorIndex;
use crate::utils::retry::retry;

pub struct Indexer {
    loader: DocumentLoader,
    chunker: TextChunker,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    manifest_dir: PathBuf,
    batch_size: usize,
    // The existing-ids read followed by the upsert write is racy across
    // concurrent ingests; one lock per indexer serializes them.
    ingest_lock: Mutex<()>,
}

impl Indexer {
    pub fn new(
        config: &Config,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
    ) -> Self {
        Self {
            loader: DocumentLoader::new(&config.indexing),
            chunker: TextChunker::new(&config.indexing),
            embedder,
            index,
            manifest_dir: config
                .manifest_dir()
                .unwrap_or_else(|| PathBuf::from(".ragdex")),
            batch_size: (config.embedding.batch_size as usize).max(1),
            ingest_lock: Mutex::new(()),
        }
    }

    /// Ingest every supported file under `dir` into the vector index.
    pub async fn ingest(&self, dir: &Path) -> Result<IngestReport, IndexError> {
        self.ingest_with_progress(dir, |_, _| {}).await
    }

    /// Ingest with a progress callback `(chunks_embedded, chunks_total)`.
    pub async fn ingest_with_progress<F>(
        &self,
        dir: &Path,
        mut on_progress: F,
    ) -> Result<IngestReport, IndexError>
    where
        F: FnMut(u64, u64),
    {
        let _guard = self.ingest_lock.lock().await;
        let started = Instant::now();

        let manifest = IndexManifest::load(&self.manifest_dir, self.index.collection())?;
        if let Some(ref manifest) = manifest
            && !manifest.matches_model(self.embedder.model_id())
        {
            return Err(IndexError::ModelMismatch {
                indexed: manifest.embedding_model.clone(),
                configured: self.embedder.model_id().to_string(),
            });
        }

        let outcome = self.loader.load_dir(dir)?;
        tracing::info!(
            "loaded {} documents from {} files",
            outcome.documents.len(),
            outcome.files_loaded
        );

        let mut chunks = self.chunker.split(&outcome.documents);
        assign_identities(&mut chunks);
        let chunks_created = chunks.len() as u64;

        let existing = self.index.existing_ids().await?;
        let new_chunks: Vec<Chunk> = chunks
            .into_iter()
            .filter(|chunk| !existing.contains(&chunk.stable_id))
            .collect();
        let chunks_added = new_chunks.len() as u64;

        if !new_chunks.is_empty() {
            self.index.ensure_collection().await?;
            self.write_new_chunks(new_chunks, &mut on_progress).await?;

            if manifest.is_none() {
                IndexManifest::new(
                    self.index.collection(),
                    self.embedder.model_id(),
                    self.embedder.dimension(),
                )
                .save(&self.manifest_dir)?;
            }
        } else {
            tracing::info!("no new chunks to add");
        }

        Ok(IngestReport {
            documents_loaded: outcome.documents.len() as u64,
            chunks_created,
            chunks_added,
            files_scanned: outcome.files_scanned,
            files_skipped: outcome.files_skipped,
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// Embed and upsert in batches. A batch that fails after retries stops
    /// the run, but batches already written stay valid: their ids will be
    /// diffed away on the next ingest.
    async fn write_new_chunks<F>(
        &self,
        new_chunks: Vec<Chunk>,
        on_progress: &mut F,
    ) -> Result<(), IndexError>
    where
        F: FnMut(u64, u64),
    {
        let total = new_chunks.len() as u64;
        let mut done = 0u64;

        for batch in new_chunks.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|chunk| chunk.text.clone()).collect();
            let embeddings = retry(|| self.embedder.embed_documents(texts.clone())).await?;

            let mut embedded = batch.to_vec();
            for (chunk, embedding) in embedded.iter_mut().zip(embeddings) {
                chunk.embedding = embedding;
            }

            retry(|| self.index.upsert_chunks(embedded.clone())).await?;

            done += batch.len() as u64;
            on_progress(done, total);
        }

        Ok(())
    }

    /// Delete the persisted index and its manifest.
    pub async fn reset(&self) -> Result<(), IndexError> {
        let _guard = self.ingest_lock.lock().await;
        self.index.delete_all().await?;
        IndexManifest::delete(&self.manifest_dir, self.index.collection())?;
        Ok(())
    }
}

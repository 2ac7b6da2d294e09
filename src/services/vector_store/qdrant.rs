//! Qdrant vector index backend.

use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, PayloadIncludeSelector, PointStruct, ScrollPointsBuilder,
    SearchPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder,
};
use std::collections::{HashMap, HashSet};

use super::{CollectionInfo, VectorIndex};
use crate::error::VectorStoreError;
use crate::models::{Chunk, RetrievedChunk, VectorStoreConfig};

/// Qdrant vector index backend.
pub struct QdrantBackend {
    client: Qdrant,
    collection: String,
    embedding_dim: u64,
}

impl QdrantBackend {
    /// Create a new Qdrant backend from configuration.
    pub fn new(config: &VectorStoreConfig, embedding_dim: u64) -> Result<Self, VectorStoreError> {
        let mut builder = Qdrant::from_url(&config.url);

        if let Some(ref api_key) = config.api_key {
            builder = builder.api_key(api_key.clone());
        }

        let client = builder
            .build()
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            collection: config.collection.clone(),
            embedding_dim,
        })
    }

    fn is_missing_collection(msg: &str) -> bool {
        msg.contains("not found") || msg.contains("doesn't exist")
    }

    fn payload_str(payload: &HashMap<String, qdrant_client::qdrant::Value>, key: &str) -> String {
        payload
            .get(key)
            .and_then(|v| match &v.kind {
                Some(qdrant_client::qdrant::value::Kind::StringValue(s)) => Some(s.as_str()),
                _ => None,
            })
            .unwrap_or("")
            .to_string()
    }
}

#[async_trait]
impl VectorIndex for QdrantBackend {
    async fn health_check(&self) -> Result<bool, VectorStoreError> {
        self.client
            .health_check()
            .await
            .map(|_| true)
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))
    }

    async fn collection_info(&self) -> Result<Option<CollectionInfo>, VectorStoreError> {
        match self.client.collection_info(&self.collection).await {
            Ok(info) => Ok(Some(CollectionInfo {
                points_count: info.result.map_or(0, |r| r.points_count.unwrap_or(0)),
            })),
            Err(e) => {
                let msg = e.to_string();
                if Self::is_missing_collection(&msg) {
                    Ok(None)
                } else {
                    Err(VectorStoreError::CollectionError(msg))
                }
            }
        }
    }

    async fn ensure_collection(&self) -> Result<(), VectorStoreError> {
        if self.collection_info().await?.is_some() {
            return Ok(());
        }

        let create_collection = CreateCollectionBuilder::new(&self.collection).vectors_config(
            VectorParamsBuilder::new(self.embedding_dim, Distance::Cosine),
        );

        self.client
            .create_collection(create_collection)
            .await
            .map_err(|e| VectorStoreError::CollectionError(e.to_string()))?;

        Ok(())
    }

    async fn upsert_chunks(&self, chunks: Vec<Chunk>) -> Result<(), VectorStoreError> {
        if chunks.is_empty() {
            return Ok(());
        }

        let points: Vec<PointStruct> = chunks
            .into_iter()
            .map(|chunk| {
                let point_id = Chunk::point_id(&chunk.stable_id);

                let mut payload: HashMap<String, qdrant_client::qdrant::Value> = HashMap::new();
                payload.insert("chunk_id".to_string(), chunk.stable_id.into());
                payload.insert("content".to_string(), chunk.text.into());
                payload.insert("source_path".to_string(), chunk.source_path.into());
                if let Some(page) = chunk.page_number {
                    payload.insert("page_number".to_string(), i64::from(page).into());
                }
                payload.insert(
                    "sequence_index".to_string(),
                    i64::from(chunk.sequence_index).into(),
                );
                payload.insert("checksum".to_string(), chunk.checksum.into());

                PointStruct::new(point_id, chunk.embedding, payload)
            })
            .collect();

        let upsert = UpsertPointsBuilder::new(&self.collection, points);

        self.client
            .upsert_points(upsert)
            .await
            .map_err(|e| VectorStoreError::UpsertError(e.to_string()))?;

        Ok(())
    }

    async fn existing_ids(&self) -> Result<HashSet<String>, VectorStoreError> {
        let mut ids = HashSet::new();
        let mut offset: Option<qdrant_client::qdrant::PointId> = None;
        let batch_size = 256u32;

        loop {
            let mut scroll_builder = ScrollPointsBuilder::new(&self.collection)
                .limit(batch_size)
                .with_payload(PayloadIncludeSelector {
                    fields: vec!["chunk_id".to_string()],
                })
                .with_vectors(false);

            if let Some(off) = offset {
                scroll_builder = scroll_builder.offset(off);
            }

            let response = match self.client.scroll(scroll_builder).await {
                Ok(response) => response,
                Err(e) => {
                    let msg = e.to_string();
                    if Self::is_missing_collection(&msg) {
                        return Ok(HashSet::new());
                    }
                    return Err(VectorStoreError::SearchError(msg));
                }
            };

            let points = response.result;
            if points.is_empty() {
                break;
            }

            for point in &points {
                let id = Self::payload_str(&point.payload, "chunk_id");
                if !id.is_empty() {
                    ids.insert(id);
                }
            }

            offset = response.next_page_offset;
            if offset.is_none() {
                break;
            }
        }

        Ok(ids)
    }

    async fn search(
        &self,
        query_vector: Vec<f32>,
        k: u64,
        min_score: Option<f32>,
    ) -> Result<Vec<RetrievedChunk>, VectorStoreError> {
        let mut search_builder =
            SearchPointsBuilder::new(&self.collection, query_vector, k).with_payload(true);

        if let Some(score) = min_score {
            search_builder = search_builder.score_threshold(score);
        }

        let results = match self.client.search_points(search_builder).await {
            Ok(results) => results,
            Err(e) => {
                let msg = e.to_string();
                if Self::is_missing_collection(&msg) {
                    return Ok(Vec::new());
                }
                return Err(VectorStoreError::SearchError(msg));
            }
        };

        let retrieved: Vec<RetrievedChunk> = results
            .result
            .into_iter()
            .map(|point| {
                let payload = point.payload;

                let page_number = payload.get("page_number").and_then(|v| match &v.kind {
                    Some(qdrant_client::qdrant::value::Kind::IntegerValue(n)) => Some(*n as u32),
                    _ => None,
                });

                RetrievedChunk {
                    chunk_id: Self::payload_str(&payload, "chunk_id"),
                    score: point.score,
                    content: Self::payload_str(&payload, "content"),
                    source_path: Self::payload_str(&payload, "source_path"),
                    page_number,
                }
            })
            .collect();

        Ok(retrieved)
    }

    async fn delete_all(&self) -> Result<(), VectorStoreError> {
        if self.collection_info().await?.is_none() {
            return Ok(());
        }

        self.client
            .delete_collection(&self.collection)
            .await
            .map_err(|e| VectorStoreError::DeleteError(e.to_string()))?;

        Ok(())
    }

    fn collection(&self) -> &str {
        &self.collection
    }
}

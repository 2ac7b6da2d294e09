//! Embedding backends.
//!
//! Ingest and query must embed with the same provider; the index manifest
//! enforces that at the operation boundary.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::EmbeddingError;
use crate::models::EmbeddingConfig;

/// Converts text into fixed-dimension vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of document chunks for indexing.
    async fn embed_documents(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Embed a search query.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Identifier of the underlying model, recorded in the index manifest.
    fn model_id(&self) -> &str;

    /// Output vector dimension.
    fn dimension(&self) -> u32;
}

/// Request body for the Ollama embed endpoint.
#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: Vec<String>,
}

/// Response from the Ollama embed endpoint.
#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
pub struct VersionResponse {
    pub version: String,
}

/// Embedding client backed by a local Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaEmbedding {
    client: Client,
    base_url: String,
    model: String,
    dimension: u32,
    batch_size: usize,
}

impl OllamaEmbedding {
    /// Create a new embedding client with the given configuration.
    pub fn new(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EmbeddingError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            dimension: config.dimension,
            batch_size: (config.batch_size as usize).max(1),
        })
    }

    /// Create a client with default configuration.
    pub fn with_defaults() -> Result<Self, EmbeddingError> {
        Self::new(&EmbeddingConfig::default())
    }

    /// Check that the backend is reachable.
    pub async fn health_check(&self) -> Result<VersionResponse, EmbeddingError> {
        let url = format!("{}/api/version", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| EmbeddingError::ConnectionError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(EmbeddingError::ServerError(format!(
                "health check failed with status: {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))
    }

    /// Embed a single batch within the server's batch limit.
    async fn embed_single_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let url = format!("{}/api/embed", self.base_url);
        let expected = texts.len();
        let request = EmbedRequest {
            model: &self.model,
            input: texts,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EmbeddingError::Timeout
                } else {
                    EmbeddingError::RequestError(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ServerError(format!(
                "status {}: {}",
                status, body
            )));
        }

        let embed_response: EmbedResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        if embed_response.embeddings.len() != expected {
            return Err(EmbeddingError::InvalidResponse(format!(
                "asked for {} embeddings, got {}",
                expected,
                embed_response.embeddings.len()
            )));
        }

        Ok(embed_response.embeddings)
    }

    /// Get the base URL of the embedding backend.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedding {
    async fn embed_documents(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut all_embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.batch_size) {
            let embeddings = self.embed_single_batch(batch.to_vec()).await?;
            all_embeddings.extend(embeddings);
        }

        Ok(all_embeddings)
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let embeddings = self.embed_single_batch(vec![text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::InvalidResponse("empty embedding response".to_string()))
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> u32 {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let config = EmbeddingConfig::default();
        let client = OllamaEmbedding::new(&config);
        assert!(client.is_ok());
    }

    #[test]
    fn test_base_url_trimming() {
        let config = EmbeddingConfig {
            url: "http://localhost:11434/".to_string(),
            ..Default::default()
        };
        let client = OllamaEmbedding::new(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:11434");
    }

    #[test]
    fn test_model_id_from_config() {
        let config = EmbeddingConfig {
            model: "all-minilm".to_string(),
            dimension: 384,
            ..Default::default()
        };
        let client = OllamaEmbedding::new(&config).unwrap();
        assert_eq!(client.model_id(), "all-minilm");
        assert_eq!(client.dimension(), 384);
    }
}

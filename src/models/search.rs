//! Retrieval models and output formats.

use serde::{Deserialize, Serialize};

/// Output format for CLI results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// Machine-parseable JSON format
    Json,
    /// Documentation-friendly Markdown format
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(format!("unknown output format: {}", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

/// A chunk returned from the vector index for a query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    /// The chunk's stable id.
    pub chunk_id: String,

    /// Similarity score, higher is closer.
    pub score: f32,

    /// Chunk content.
    pub content: String,

    /// Path of the originating file.
    pub source_path: String,

    /// Zero-based page number if the source is paginated.
    pub page_number: Option<u32>,
}

/// Ordered retrieval outcome for one query, descending by score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    /// Query that was executed
    pub query: String,

    /// Matching chunks, at most k
    pub chunks: Vec<RetrievedChunk>,

    /// Query execution time in milliseconds
    pub duration_ms: u64,
}

impl RetrievalResult {
    pub fn new(query: String, chunks: Vec<RetrievedChunk>, duration_ms: u64) -> Self {
        Self {
            query,
            chunks,
            duration_ms,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Stable ids of the retrieved chunks, in rank order.
    pub fn chunk_ids(&self) -> Vec<String> {
        self.chunks.iter().map(|c| c.chunk_id.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parse() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!(
            "md".parse::<OutputFormat>().unwrap(),
            OutputFormat::Markdown
        );
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_retrieval_result() {
        let result = RetrievalResult::new("test".to_string(), vec![], 12);
        assert!(result.is_empty());
        assert_eq!(result.len(), 0);
        assert!(result.chunk_ids().is_empty());
    }
}

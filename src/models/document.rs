use serde::{Deserialize, Serialize};

/// Sentinel used in stable ids when a source has no page numbering.
///
/// Indexes built by earlier tooling used this exact rendering, so changing
/// it would orphan every previously persisted chunk.
pub const PAGE_ABSENT: &str = "None";

/// One extractable unit of a source file: a PDF page, or a whole
/// text/Markdown/Word/CSV file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDocument {
    pub text: String,
    /// Path exactly as walked from the ingest root, never canonicalized.
    pub source_path: String,
    /// Zero-based page number for paginated formats.
    pub page_number: Option<u32>,
}

impl RawDocument {
    pub fn new(text: String, source_path: impl Into<String>, page_number: Option<u32>) -> Self {
        Self {
            text,
            source_path: source_path.into(),
            page_number,
        }
    }
}

/// A bounded span of source text sized for embedding.
///
/// `sequence_index` and `stable_id` are empty until the identity pass runs;
/// `embedding` is empty until the indexer fills it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub source_path: String,
    pub page_number: Option<u32>,
    pub sequence_index: u32,
    pub stable_id: String,
    /// Char offsets into the page text this chunk was cut from.
    pub start_offset: u64,
    pub end_offset: u64,
    /// SHA-256 of the chunk text. Stored as metadata only; an unchanged
    /// stable_id is never re-embedded even if the text behind it changed.
    pub checksum: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub embedding: Vec<f32>,
}

impl Chunk {
    pub fn new(
        text: String,
        source_path: impl Into<String>,
        page_number: Option<u32>,
        start_offset: u64,
        end_offset: u64,
    ) -> Self {
        let checksum = crate::utils::file::calculate_checksum(&text);
        Self {
            text,
            source_path: source_path.into(),
            page_number,
            sequence_index: 0,
            stable_id: String::new(),
            start_offset,
            end_offset,
            checksum,
            embedding: Vec::new(),
        }
    }

    /// Render the page component of a stable id.
    pub fn page_repr(page_number: Option<u32>) -> String {
        match page_number {
            Some(page) => page.to_string(),
            None => PAGE_ABSENT.to_string(),
        }
    }

    /// Deterministic point id for the vector index.
    ///
    /// Stable ids are arbitrary strings, but index backends want UUID keys;
    /// a v5 UUID of the stable id keeps upsert-by-id idempotent.
    pub fn point_id(stable_id: &str) -> String {
        use uuid::Uuid;
        Uuid::new_v5(&Uuid::NAMESPACE_OID, stable_id.as_bytes()).to_string()
    }
}

/// Outcome of one ingest run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestReport {
    /// RawDocuments produced by the loader (pages, not files).
    pub documents_loaded: u64,
    /// Chunks produced by the chunker across all documents.
    pub chunks_created: u64,
    /// Chunks actually embedded and written (not already present).
    pub chunks_added: u64,
    pub files_scanned: u64,
    pub files_skipped: u64,
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_repr() {
        assert_eq!(Chunk::page_repr(Some(3)), "3");
        assert_eq!(Chunk::page_repr(None), "None");
    }

    #[test]
    fn test_point_id_deterministic() {
        let a = Chunk::point_id("data/notes.txt:None:0");
        let b = Chunk::point_id("data/notes.txt:None:0");
        assert_eq!(a, b);
        assert_eq!(a.len(), 36);
        assert_eq!(a.chars().filter(|c| *c == '-').count(), 4);

        let c = Chunk::point_id("data/notes.txt:None:1");
        assert_ne!(a, c);
    }

    #[test]
    fn test_chunk_checksum() {
        let chunk = Chunk::new("hello".to_string(), "data/a.txt", None, 0, 5);
        assert_eq!(chunk.checksum.len(), 64);
        assert!(chunk.embedding.is_empty());
        assert!(chunk.stable_id.is_empty());
    }
}

//! Persisted record of how an index was built.
//!
//! Embeddings from different models live in different vector spaces, so
//! querying an index with a model other than the one that built it returns
//! garbage silently. The manifest pins the builder's identity; ingest and
//! query check it before touching the index.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ManifestError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexManifest {
    pub collection: String,
    pub embedding_model: String,
    pub embedding_dimension: u32,
    pub created_at: String,
}

impl IndexManifest {
    pub fn new(collection: &str, embedding_model: &str, embedding_dimension: u32) -> Self {
        Self {
            collection: collection.to_string(),
            embedding_model: embedding_model.to_string(),
            embedding_dimension,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    fn path(dir: &Path, collection: &str) -> PathBuf {
        dir.join(format!("{collection}.manifest.toml"))
    }

    /// Load the manifest for a collection, `None` if one was never written
    /// (an index predating manifest tracking).
    pub fn load(dir: &Path, collection: &str) -> Result<Option<Self>, ManifestError> {
        let path = Self::path(dir, collection);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)?;
        let manifest: IndexManifest = toml::from_str(&content)?;
        Ok(Some(manifest))
    }

    pub fn save(&self, dir: &Path) -> Result<(), ManifestError> {
        std::fs::create_dir_all(dir)?;
        let content = toml::to_string_pretty(self)?;
        std::fs::write(Self::path(dir, &self.collection), content)?;
        Ok(())
    }

    pub fn delete(dir: &Path, collection: &str) -> Result<(), ManifestError> {
        let path = Self::path(dir, collection);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    pub fn matches_model(&self, model: &str) -> bool {
        self.embedding_model == model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = IndexManifest::new("notes", "nomic-embed-text", 768);
        manifest.save(dir.path()).unwrap();

        let loaded = IndexManifest::load(dir.path(), "notes").unwrap().unwrap();
        assert_eq!(loaded.embedding_model, "nomic-embed-text");
        assert_eq!(loaded.embedding_dimension, 768);
        assert!(loaded.matches_model("nomic-embed-text"));
        assert!(!loaded.matches_model("all-minilm"));
    }

    #[test]
    fn test_manifest_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(IndexManifest::load(dir.path(), "absent").unwrap().is_none());
    }

    #[test]
    fn test_manifest_delete() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = IndexManifest::new("notes", "nomic-embed-text", 768);
        manifest.save(dir.path()).unwrap();
        IndexManifest::delete(dir.path(), "notes").unwrap();
        assert!(IndexManifest::load(dir.path(), "notes").unwrap().is_none());
        // Deleting a missing manifest is fine
        IndexManifest::delete(dir.path(), "notes").unwrap();
    }
}

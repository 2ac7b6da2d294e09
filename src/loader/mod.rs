//! Document loading: turn a content directory into normalized page records.
//!
//! Dispatch is by file extension. A file that fails to parse is logged and
//! skipped; only a missing or unwalkable root directory aborts the run.

mod csv;
mod docx;
mod pdf;
mod text;

use std::path::Path;

use walkdir::WalkDir;

use crate::error::LoadError;
use crate::models::{IndexingConfig, RawDocument};

/// What one load pass produced.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    /// Page-level records, in filename order.
    pub documents: Vec<RawDocument>,
    pub files_scanned: u64,
    pub files_loaded: u64,
    pub files_skipped: u64,
}

/// Reads heterogeneous source files into [`RawDocument`] records.
#[derive(Debug)]
pub struct DocumentLoader {
    exclude_patterns: Vec<String>,
    max_file_size: u64,
}

impl DocumentLoader {
    pub fn new(config: &IndexingConfig) -> Self {
        Self {
            exclude_patterns: config.exclude_patterns.clone(),
            max_file_size: config.max_file_size,
        }
    }

    /// Load every supported file under `dir`.
    ///
    /// Files are visited sorted by file name so repeated runs over the same
    /// tree produce records, and therefore chunk ids, in the same order.
    /// Paths are recorded exactly as walked; canonicalizing them would tie
    /// chunk ids to the machine the ingest ran on.
    pub fn load_dir(&self, dir: &Path) -> Result<LoadOutcome, LoadError> {
        if !dir.is_dir() {
            return Err(LoadError::DirectoryNotFound(
                dir.to_string_lossy().to_string(),
            ));
        }

        let mut outcome = LoadOutcome::default();

        for entry in WalkDir::new(dir).follow_links(false).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("skipping unreadable entry: {e}");
                    continue;
                }
            };
            let path = entry.path();

            if !path.is_file() {
                continue;
            }
            outcome.files_scanned += 1;

            if self.is_excluded(path) {
                outcome.files_skipped += 1;
                continue;
            }

            match self.load_file(path) {
                Ok(Some(documents)) => {
                    outcome.files_loaded += 1;
                    outcome.documents.extend(documents);
                }
                Ok(None) => {
                    tracing::warn!("skipping unsupported file type: {}", path.display());
                    outcome.files_skipped += 1;
                }
                Err(e) => {
                    tracing::warn!("failed to load {}: {e:#}", path.display());
                    outcome.files_skipped += 1;
                }
            }
        }

        Ok(outcome)
    }

    /// Load a single file, dispatching on its extension.
    ///
    /// `Ok(None)` means the extension is not supported.
    fn load_file(&self, path: &Path) -> anyhow::Result<Option<Vec<RawDocument>>> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let source_path = path.to_string_lossy().to_string();

        let documents = match ext.as_str() {
            "pdf" => pdf::load(path, &source_path, self.max_file_size)?,
            "txt" | "md" | "markdown" => text::load(path, &source_path, self.max_file_size)?,
            "docx" | "doc" => docx::load(path, &source_path, self.max_file_size)?,
            "csv" => csv::load(path, &source_path, self.max_file_size)?,
            _ => return Ok(None),
        };

        Ok(Some(documents))
    }

    fn is_excluded(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        self.exclude_patterns.iter().any(|pattern| {
            glob::Pattern::new(pattern)
                .map(|p| p.matches(&path_str))
                .unwrap_or(false)
        })
    }
}

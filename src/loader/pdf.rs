//! PDF loading: one record per page.

use std::path::Path;

use anyhow::Context;
use lopdf::Document;

use crate::models::RawDocument;
use crate::utils::file::read_file_bytes;

pub fn load(path: &Path, source_path: &str, max_size: u64) -> anyhow::Result<Vec<RawDocument>> {
    let bytes =
        read_file_bytes(path, max_size).with_context(|| format!("reading {}", path.display()))?;
    let doc = Document::load_mem(&bytes)
        .with_context(|| format!("parsing PDF {}", path.display()))?;

    let mut documents = Vec::new();
    for (page_no, _object_id) in doc.get_pages() {
        let text = match doc.extract_text(&[page_no]) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(
                    "failed to extract text from {} page {}: {e}",
                    path.display(),
                    page_no
                );
                continue;
            }
        };
        // lopdf pages are 1-based; recorded page numbers are 0-based
        documents.push(RawDocument::new(text, source_path, Some(page_no - 1)));
    }

    Ok(documents)
}

//! Plain-text and Markdown loading: one record per file.

use std::path::Path;

use anyhow::Context;

use crate::models::RawDocument;
use crate::utils::file::read_file_content;

pub fn load(path: &Path, source_path: &str, max_size: u64) -> anyhow::Result<Vec<RawDocument>> {
    let text = read_file_content(path, max_size)
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(vec![RawDocument::new(text, source_path, None)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "Paris is the capital of France.").unwrap();

        let docs = load(&path, "data/notes.txt", 1024).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].text, "Paris is the capital of France.");
        assert_eq!(docs[0].source_path, "data/notes.txt");
        assert_eq!(docs[0].page_number, None);
    }

    #[test]
    fn test_load_non_utf8_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.txt");
        fs::write(&path, [0xff, 0xfe, 0x00, 0x9f]).unwrap();

        assert!(load(&path, "data/bad.txt", 1024).is_err());
    }
}

//! File utilities for ingest operations.

use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// Calculate SHA-256 checksum of content.
pub fn calculate_checksum(content: &str) -> String {
    let hash = Sha256::digest(content.as_bytes());
    hex::encode(hash)
}

/// Read file content as UTF-8 with a size limit.
pub fn read_file_content(path: &Path, max_size: u64) -> std::io::Result<String> {
    check_file_size(path, max_size)?;
    fs::read_to_string(path)
}

/// Read raw file bytes with a size limit.
pub fn read_file_bytes(path: &Path, max_size: u64) -> std::io::Result<Vec<u8>> {
    check_file_size(path, max_size)?;
    fs::read(path)
}

fn check_file_size(path: &Path, max_size: u64) -> std::io::Result<()> {
    let metadata = fs::metadata(path)?;

    if metadata.len() > max_size {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!(
                "file exceeds maximum size: {} > {}",
                metadata.len(),
                max_size
            ),
        ));
    }

    Ok(())
}

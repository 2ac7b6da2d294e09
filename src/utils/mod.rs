//! Utility modules.

pub mod file;
pub mod retry;

pub use file::{calculate_checksum, read_file_bytes, read_file_content};
pub use retry::{RetryConfig, RetryResult, Retryable, retry, with_retry};

/// Check if content has meaningful text (not just whitespace).
pub fn has_meaningful_content(content: &str) -> bool {
    content.chars().any(|c| !c.is_whitespace())
}

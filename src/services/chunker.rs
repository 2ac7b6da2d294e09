//! Text chunking with overlap for embedding.

use crate::models::{Chunk, IndexingConfig, RawDocument};
use crate::utils::has_meaningful_content;

/// Splits page text into overlapping windows.
///
/// Each window after the first starts `overlap` characters before the
/// previous window's end, so the windows tile the page with no gaps:
/// dropping each chunk's leading overlap and concatenating reconstructs
/// the page text exactly.
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Target chunk size in characters
    chunk_size: usize,
    /// Overlap size in characters
    overlap: usize,
}

impl TextChunker {
    /// Create a new text chunker with the given configuration.
    pub fn new(config: &IndexingConfig) -> Self {
        let chunk_size = (config.chunk_size as usize).max(1);
        let overlap = (config.chunk_overlap as usize).min(chunk_size - 1);
        Self {
            chunk_size,
            overlap,
        }
    }

    /// Create a chunker with default settings.
    pub fn with_defaults() -> Self {
        Self::new(&IndexingConfig::default())
    }

    /// Chunk every document in order. Sequence indices and stable ids are
    /// not assigned here; the identity pass owns them.
    pub fn split(&self, documents: &[RawDocument]) -> Vec<Chunk> {
        documents
            .iter()
            .flat_map(|doc| self.chunk_document(doc))
            .collect()
    }

    /// Chunk a single page of text.
    pub fn chunk_document(&self, document: &RawDocument) -> Vec<Chunk> {
        let content = &document.text;

        if !has_meaningful_content(content) {
            return Vec::new();
        }

        // A page shorter than the window is exactly one chunk
        if content.chars().count() <= self.chunk_size {
            return vec![Chunk::new(
                content.clone(),
                document.source_path.clone(),
                document.page_number,
                0,
                content.chars().count() as u64,
            )];
        }

        self.split_with_overlap(content)
            .into_iter()
            .map(|(text, start, end)| {
                Chunk::new(
                    text,
                    document.source_path.clone(),
                    document.page_number,
                    start,
                    end,
                )
            })
            .collect()
    }

    /// Split content into overlapping windows with char-offset positions.
    fn split_with_overlap(&self, content: &str) -> Vec<(String, u64, u64)> {
        let chars: Vec<char> = content.chars().collect();
        let total = chars.len();
        let mut chunks = Vec::new();

        let mut start = 0;
        loop {
            let target_end = (start + self.chunk_size).min(total);
            let end = if target_end < total {
                self.find_break_point(&chars, target_end)
            } else {
                total
            };

            let text: String = chars[start..end].iter().collect();
            chunks.push((text, start as u64, end as u64));

            if end >= total {
                break;
            }

            // Carry `overlap` chars into the next window; fall back to a
            // clean continuation if the window was too short to overlap
            let next_start = end.saturating_sub(self.overlap);
            start = if next_start > start { next_start } else { end };
        }

        chunks
    }

    /// Find a natural break point near the target end position.
    ///
    /// Searches the last 20% of the window. Priority: paragraph break >
    /// newline > sentence end > space; a window with none of these is cut
    /// at the target position.
    fn find_break_point(&self, chars: &[char], target_end: usize) -> usize {
        let search_start = target_end.saturating_sub(self.chunk_size / 5);
        let search_range = &chars[search_start..target_end];

        let mut best_break = None;
        let mut last_newline = None;
        let mut last_sentence = None;
        let mut last_space = None;

        for (i, c) in search_range.iter().enumerate() {
            let pos = search_start + i;
            match c {
                '\n' => {
                    // Double newline marks a paragraph break
                    if i > 0 && search_range.get(i.saturating_sub(1)) == Some(&'\n') {
                        best_break = Some(pos + 1);
                    }
                    last_newline = Some(pos + 1);
                }
                '.' | '!' | '?' => {
                    // Sentence end followed by whitespace
                    if search_range.get(i + 1).is_some_and(|c| c.is_whitespace()) {
                        last_sentence = Some(pos + 1);
                    }
                }
                ' ' | '\t' => {
                    last_space = Some(pos + 1);
                }
                _ => {}
            }
        }

        best_break
            .or(last_newline)
            .or(last_sentence)
            .or(last_space)
            .unwrap_or(target_end)
    }
}

//! Chunk identity assignment.
//!
//! A chunk's id is `{source_path}:{page}:{sequence_index}`, where the
//! sequence index restarts at 0 whenever the (path, page) pair changes and
//! increments otherwise, in emission order. The id is a pure function of
//! the pipeline's output order: re-running over unchanged input reproduces
//! the same ids, which is what makes incremental indexing possible.

use crate::models::Chunk;

/// Assign `sequence_index` and `stable_id` to chunks in emission order.
///
/// Single forward pass, no sorting, no randomness.
pub fn assign_identities(chunks: &mut [Chunk]) {
    let mut last_key: Option<(String, Option<u32>)> = None;
    let mut index: u32 = 0;

    for chunk in chunks.iter_mut() {
        let key = (chunk.source_path.clone(), chunk.page_number);
        match last_key {
            Some(ref last) if *last == key => index += 1,
            _ => index = 0,
        }

        chunk.sequence_index = index;
        chunk.stable_id = format!(
            "{}:{}:{}",
            chunk.source_path,
            Chunk::page_repr(chunk.page_number),
            index
        );
        last_key = Some(key);
    }
}

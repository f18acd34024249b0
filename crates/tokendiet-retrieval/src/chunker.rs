// SPDX-FileCopyrightText: 2026 Token-Diet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed-width document chunking.
//!
//! Chunks are contiguous, non-overlapping windows of `chunk_size` characters.
//! Splits may fall mid-word or mid-sentence but never inside a UTF-8 code point.

use tokendiet_core::TokenDietError;

/// Split `text` into consecutive windows of at most `chunk_size` characters.
///
/// Concatenating the returned chunks reproduces `text` exactly. Empty or
/// whitespace-only text yields no chunks.
pub fn split_into_chunks(text: &str, chunk_size: usize) -> Result<Vec<&str>, TokenDietError> {
    if chunk_size == 0 {
        return Err(TokenDietError::Config(
            "chunk_size must be at least 1".to_string(),
        ));
    }
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut chunks = Vec::with_capacity(text.len() / chunk_size + 1);
    let mut start = 0;
    let mut count = 0;
    for (offset, _) in text.char_indices() {
        if count == chunk_size {
            chunks.push(&text[start..offset]);
            start = offset;
            count = 0;
        }
        count += 1;
    }
    chunks.push(&text[start..]);

    Ok(chunks)
}

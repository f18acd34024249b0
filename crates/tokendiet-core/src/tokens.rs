// SPDX-FileCopyrightText: 2026 Token-Diet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! BPE token counting with tiktoken encodings.
//!
//! Counts are vocabulary-dependent: the encoding is chosen from the model
//! identifier, falling back to `cl100k_base` for unknown models. Counting
//! never fails; if no encoding can be loaded at all, a bytes/4 estimate is
//! used instead.

use tiktoken_rs::CoreBPE;
use tracing::{debug, warn};

/// Model whose encoding is used when none is configured.
pub const DEFAULT_TOKENIZER_MODEL: &str = "gpt-4o";

/// Deterministic token counter bound to one BPE encoding.
pub struct TokenCounter {
    bpe: Option<CoreBPE>,
    encoding: &'static str,
}

impl TokenCounter {
    /// Creates a counter using the encoding for `model`.
    ///
    /// Unknown model identifiers fall back to `cl100k_base`.
    pub fn for_model(model: &str) -> Self {
        match tiktoken_rs::get_bpe_from_model(model) {
            Ok(bpe) => {
                debug!(model, "loaded model-specific BPE encoding");
                Self {
                    bpe: Some(bpe),
                    encoding: "model",
                }
            }
            Err(_) => {
                debug!(model, "unknown tokenizer model, using cl100k_base");
                Self::cl100k()
            }
        }
    }

    /// Creates a counter using the `cl100k_base` encoding.
    pub fn cl100k() -> Self {
        match tiktoken_rs::cl100k_base() {
            Ok(bpe) => Self {
                bpe: Some(bpe),
                encoding: "cl100k_base",
            },
            Err(e) => {
                warn!(error = %e, "failed to load cl100k_base, estimating tokens from byte length");
                Self::estimate()
            }
        }
    }

    /// Creates a counter that estimates one token per four bytes.
    pub fn estimate() -> Self {
        Self {
            bpe: None,
            encoding: "bytes-estimate",
        }
    }

    /// Returns the number of tokens in `text`.
    pub fn count_tokens(&self, text: &str) -> usize {
        match &self.bpe {
            Some(bpe) => bpe.encode_with_special_tokens(text).len(),
            None => text.len().div_ceil(4),
        }
    }

    /// Short name of the active encoding, for diagnostics.
    pub fn encoding_name(&self) -> &'static str {
        self.encoding
    }
}

impl Default for TokenCounter {
    fn default() -> Self {
        Self::for_model(DEFAULT_TOKENIZER_MODEL)
    }
}

impl std::fmt::Debug for TokenCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCounter")
            .field("encoding", &self.encoding)
            .finish()
    }
}

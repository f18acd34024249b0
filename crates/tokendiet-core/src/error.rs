// SPDX-FileCopyrightText: 2026 Token-Diet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Token-Diet pipeline.

use thiserror::Error;

/// The primary error type used across all Token-Diet adapters and pipeline stages.
///
/// Judge parse failures and unknown model prices are recovered locally and
/// never surface as a variant here.
#[derive(Debug, Error)]
pub enum TokenDietError {
    /// Configuration errors (invalid values, missing API key, bad header values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Vector index / SQLite errors (connection, query, migration).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Generative model provider errors (HTTP failure, API error, malformed body).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Embedding inference errors (model load, tokenization, tensor shape).
    #[error("embedding error: {0}")]
    Embedding(String),

    /// A document type that text extraction does not support.
    #[error("unsupported document type: {mime}")]
    UnsupportedDocument { mime: String },

    /// Text extraction failed for a supported document type.
    #[error("failed to extract text from {path}: {message}")]
    Extraction { path: String, message: String },

    /// A model call exceeded its configured timeout.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TokenDietError {
    /// Wraps any storage-layer error.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        TokenDietError::Storage {
            source: Box::new(err),
        }
    }
}

// SPDX-FileCopyrightText: 2026 Token-Diet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retriever double that returns a fixed, pre-ranked chunk list.

use std::sync::Mutex;

use async_trait::async_trait;

use tokendiet_core::TokenDietError;
use tokendiet_core::traits::ChunkRetriever;

/// Returns the first `k` of its configured chunks for any query.
///
/// Records each `(query, k)` pair it is asked for.
pub struct FixedRetriever {
    chunks: Vec<String>,
    failure: Option<String>,
    calls: Mutex<Vec<(String, usize)>>,
}

impl FixedRetriever {
    pub fn new<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            chunks: chunks.into_iter().map(Into::into).collect(),
            failure: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A retriever with an empty index.
    pub fn empty() -> Self {
        Self::new(Vec::<String>::new())
    }

    /// A retriever whose every call fails with a storage error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::empty()
        }
    }

    /// Recorded `(query, k)` pairs.
    pub fn calls(&self) -> Vec<(String, usize)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ChunkRetriever for FixedRetriever {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<String>, TokenDietError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((query.to_string(), k));
        }
        if let Some(message) = &self.failure {
            return Err(TokenDietError::Storage {
                source: message.clone().into(),
            });
        }
        Ok(self.chunks.iter().take(k).cloned().collect())
    }
}

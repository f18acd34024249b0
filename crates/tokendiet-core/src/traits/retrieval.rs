// SPDX-FileCopyrightText: 2026 Token-Diet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retrieval trait consumed by the semantic pruner.

use async_trait::async_trait;

use crate::error::TokenDietError;

/// Returns the chunks of a previously ingested corpus most similar to a query.
#[async_trait]
pub trait ChunkRetriever: Send + Sync {
    /// Returns at most `k` chunk texts ordered by descending similarity to `query`.
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<String>, TokenDietError>;
}

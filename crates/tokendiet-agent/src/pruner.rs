// SPDX-FileCopyrightText: 2026 Token-Diet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic pruning: swap a large context for its most relevant chunks, but
//! only when that strictly reduces the token count.

use std::sync::Arc;

use tokendiet_core::{ChunkRetriever, TokenCounter, TokenDietError};
use tracing::{debug, info};

/// Result of one pruning step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PruneOutcome {
    /// Context to send downstream: retrieved chunks or the original, verbatim.
    pub context: String,
    pub original_tokens: usize,
    /// Token count of `context`; never exceeds `original_tokens`.
    pub final_tokens: usize,
    /// Whether the retrieved chunks replaced the original.
    pub pruned: bool,
}

/// Replaces a context with retrieved chunks when that saves tokens.
pub struct SemanticPruner {
    retriever: Arc<dyn ChunkRetriever>,
    counter: Arc<TokenCounter>,
}

impl SemanticPruner {
    pub fn new(retriever: Arc<dyn ChunkRetriever>, counter: Arc<TokenCounter>) -> Self {
        Self { retriever, counter }
    }

    /// Retrieves the top `k` chunks for `query` and keeps them only if they
    /// are non-empty and cost strictly fewer tokens than `original_context`.
    ///
    /// Retrieval failures propagate; the index is only read.
    pub async fn prune(
        &self,
        query: &str,
        original_context: &str,
        k: usize,
    ) -> Result<PruneOutcome, TokenDietError> {
        let original_tokens = self.counter.count_tokens(original_context);
        let chunks = self.retriever.retrieve(query, k).await?;
        let retrieved = chunks.join("\n");
        let retrieved_tokens = self.counter.count_tokens(&retrieved);

        debug!(
            k,
            chunks = chunks.len(),
            original_tokens,
            retrieved_tokens,
            "retrieval finished"
        );

        if !retrieved.is_empty() && retrieved_tokens < original_tokens {
            info!(
                original_tokens,
                final_tokens = retrieved_tokens,
                "context pruned"
            );
            Ok(PruneOutcome {
                context: retrieved,
                original_tokens,
                final_tokens: retrieved_tokens,
                pruned: true,
            })
        } else {
            info!(original_tokens, "retrieval did not reduce tokens, keeping original context");
            Ok(PruneOutcome {
                context: original_context.to_string(),
                original_tokens,
                final_tokens: original_tokens,
                pruned: false,
            })
        }
    }
}

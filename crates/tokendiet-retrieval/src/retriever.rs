// SPDX-FileCopyrightText: 2026 Token-Diet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Context retriever: document ingestion and top-k chunk lookup.
//!
//! Ingestion splits a document into fixed-width chunks, embeds them in one
//! batch, and writes them to the index in one transaction. Retrieval embeds
//! the query with the same embedder and returns the most similar chunks.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use tokendiet_core::TokenDietError;
use tokendiet_core::traits::{ChunkRetriever, EmbeddingAdapter};
use tokendiet_core::types::EmbeddingInput;

use crate::chunker::split_into_chunks;
use crate::store::ChunkStore;
use crate::types::{ChunkRecord, IngestReport, ScoredChunk};

/// Retriever over one collection of the chunk index.
pub struct ContextRetriever {
    store: Arc<ChunkStore>,
    embedder: Arc<dyn EmbeddingAdapter>,
    collection: String,
}

impl ContextRetriever {
    pub fn new(
        store: Arc<ChunkStore>,
        embedder: Arc<dyn EmbeddingAdapter>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            store,
            embedder,
            collection: collection.into(),
        }
    }

    /// Name of the collection this retriever reads and writes.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// The underlying index.
    pub fn store(&self) -> &Arc<ChunkStore> {
        &self.store
    }

    /// Chunk, embed, and index a document.
    ///
    /// Blank documents index nothing. `chunk_size == 0` is a configuration
    /// error.
    pub async fn ingest(
        &self,
        document_text: &str,
        chunk_size: usize,
    ) -> Result<IngestReport, TokenDietError> {
        let chunks = split_into_chunks(document_text, chunk_size)?;
        let mut report = IngestReport {
            collection: self.collection.clone(),
            chunks: 0,
            chars: document_text.chars().count(),
        };
        if chunks.is_empty() {
            debug!(collection = self.collection.as_str(), "blank document, nothing ingested");
            return Ok(report);
        }

        let output = self
            .embedder
            .embed(EmbeddingInput {
                texts: chunks.iter().map(|c| c.to_string()).collect(),
            })
            .await?;
        if output.embeddings.len() != chunks.len() {
            return Err(TokenDietError::Embedding(format!(
                "embedder returned {} vectors for {} chunks",
                output.embeddings.len(),
                chunks.len()
            )));
        }

        let records: Vec<ChunkRecord> = chunks
            .iter()
            .zip(output.embeddings)
            .enumerate()
            .map(|(index, (content, embedding))| {
                ChunkRecord::new(self.collection.as_str(), index, *content, embedding)
            })
            .collect();

        report.chunks = self.store.upsert_chunks(records).await?;
        info!(
            collection = self.collection.as_str(),
            chunks = report.chunks,
            chars = report.chars,
            "document ingested"
        );
        Ok(report)
    }

    /// Top-`k` chunks with their similarity scores.
    pub async fn retrieve_scored(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredChunk>, TokenDietError> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let output = self
            .embedder
            .embed(EmbeddingInput {
                texts: vec![query.to_string()],
            })
            .await?;
        let query_embedding = output
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| TokenDietError::Embedding("embedder returned no vector".to_string()))?;

        let hits = self
            .store
            .query_nearest(&self.collection, &query_embedding, k)
            .await?;
        debug!(
            collection = self.collection.as_str(),
            k,
            hits = hits.len(),
            top_score = hits.first().map(|h| h.score),
            "retrieved chunks"
        );
        Ok(hits)
    }
}

#[async_trait]
impl ChunkRetriever for ContextRetriever {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<String>, TokenDietError> {
        Ok(self
            .retrieve_scored(query, k)
            .await?
            .into_iter()
            .map(|hit| hit.content)
            .collect())
    }
}

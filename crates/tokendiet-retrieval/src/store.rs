// SPDX-FileCopyrightText: 2026 Token-Diet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed chunk index with vector BLOB storage.
//!
//! All reads and writes are serialized through tokio-rusqlite's single
//! background thread. Each batch of chunks is written in one transaction, so
//! concurrent queries observe either none or all of a document's chunks.
//! Nearest-neighbor search is an exact cosine scan over one collection.

use std::path::Path;

use async_trait::async_trait;
use tokio_rusqlite::Connection;
use tracing::{debug, warn};

use tokendiet_config::model::StorageConfig;
use tokendiet_core::TokenDietError;
use tokendiet_core::traits::PluginAdapter;
use tokendiet_core::types::{AdapterType, HealthStatus};

use crate::types::{ChunkRecord, ScoredChunk, blob_to_vec, cosine_similarity, vec_to_blob};

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

fn map_tr_err<E>(e: tokio_rusqlite::Error<E>) -> TokenDietError
where
    tokio_rusqlite::Error<E>: std::error::Error + Send + Sync + 'static,
{
    TokenDietError::storage(e)
}

/// Persistent store of document chunks and their embeddings.
pub struct ChunkStore {
    conn: Connection,
}

impl ChunkStore {
    /// Open (or create) the index database at `path` and apply migrations.
    pub async fn open(path: impl AsRef<Path>, wal_mode: bool) -> Result<Self, TokenDietError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(TokenDietError::storage)?;
        }

        let conn = Connection::open(path)
            .await
            .map_err(TokenDietError::storage)?;
        let store = Self { conn };
        store.initialize(wal_mode).await?;
        debug!(path = %path.display(), "chunk index opened");
        Ok(store)
    }

    /// Open the index configured in `[storage]`.
    pub async fn from_config(config: &StorageConfig) -> Result<Self, TokenDietError> {
        Self::open(&config.database_path, config.wal_mode).await
    }

    /// Open a private in-memory index.
    pub async fn open_in_memory() -> Result<Self, TokenDietError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(TokenDietError::storage)?;
        let store = Self { conn };
        store.initialize(false).await?;
        Ok(store)
    }

    async fn initialize(&self, wal_mode: bool) -> Result<(), TokenDietError> {
        self.conn
            .call(move |conn| -> Result<(), rusqlite::Error> {
                if wal_mode {
                    // journal_mode answers with a row, so it cannot go through execute_batch.
                    conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))?;
                }
                conn.execute_batch("PRAGMA synchronous = NORMAL; PRAGMA busy_timeout = 5000;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;

        self.conn
            .call(|conn| -> Result<(), refinery::Error> {
                embedded::migrations::runner().run(conn)?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    /// Insert or replace a batch of chunks in a single transaction.
    ///
    /// Returns the number of rows written. Records sharing an id replace
    /// each other, so re-ingesting a document is idempotent.
    pub async fn upsert_chunks(&self, records: Vec<ChunkRecord>) -> Result<usize, TokenDietError> {
        if records.is_empty() {
            return Ok(0);
        }

        self.conn
            .call(move |conn| -> Result<usize, rusqlite::Error> {
                let tx = conn.transaction()?;
                {
                    let mut stmt = tx.prepare(
                        "INSERT OR REPLACE INTO chunks (id, collection, chunk_index, content, embedding) \
                         VALUES (?1, ?2, ?3, ?4, ?5)",
                    )?;
                    for record in &records {
                        stmt.execute(rusqlite::params![
                            record.id,
                            record.collection,
                            record.index as i64,
                            record.content,
                            vec_to_blob(&record.embedding),
                        ])?;
                    }
                }
                tx.commit()?;
                Ok(records.len())
            })
            .await
            .map_err(map_tr_err)
    }

    /// Return the `k` chunks of `collection` most similar to `embedding`,
    /// ordered by descending cosine similarity.
    ///
    /// Ties are broken by chunk position so results are deterministic.
    /// Rows whose embedding dimension differs from the query are skipped.
    pub async fn query_nearest(
        &self,
        collection: &str,
        embedding: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredChunk>, TokenDietError> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let collection = collection.to_string();
        let rows = self
            .conn
            .call(move |conn| -> Result<Vec<(String, i64, String, Vec<u8>)>, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT id, chunk_index, content, embedding FROM chunks WHERE collection = ?1",
                )?;
                let rows = stmt
                    .query_map(rusqlite::params![collection], |row| {
                        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(map_tr_err)?;

        let mut skipped = 0usize;
        let mut scored: Vec<ScoredChunk> = rows
            .into_iter()
            .filter_map(|(id, index, content, blob)| {
                match cosine_similarity(embedding, &blob_to_vec(&blob)) {
                    Some(score) => Some(ScoredChunk {
                        id,
                        index: index.max(0) as usize,
                        content,
                        score,
                    }),
                    None => {
                        skipped += 1;
                        None
                    }
                }
            })
            .collect();

        if skipped > 0 {
            warn!(skipped, "chunks with mismatched embedding dimensions ignored");
        }

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.index.cmp(&b.index))
        });
        scored.truncate(k);
        Ok(scored)
    }

    /// Number of chunks stored in `collection`.
    pub async fn count(&self, collection: &str) -> Result<usize, TokenDietError> {
        let collection = collection.to_string();
        self.conn
            .call(move |conn| -> Result<usize, rusqlite::Error> {
                let n: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM chunks WHERE collection = ?1",
                    rusqlite::params![collection],
                    |row| row.get(0),
                )?;
                Ok(n.max(0) as usize)
            })
            .await
            .map_err(map_tr_err)
    }

    /// Delete every chunk of `collection`, returning how many were removed.
    pub async fn clear_collection(&self, collection: &str) -> Result<usize, TokenDietError> {
        let collection = collection.to_string();
        self.conn
            .call(move |conn| -> Result<usize, rusqlite::Error> {
                conn.execute(
                    "DELETE FROM chunks WHERE collection = ?1",
                    rusqlite::params![collection],
                )
            })
            .await
            .map_err(map_tr_err)
    }
}

#[async_trait]
impl PluginAdapter for ChunkStore {
    fn name(&self) -> &str {
        "sqlite-chunk-index"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Index
    }

    async fn health_check(&self) -> Result<HealthStatus, TokenDietError> {
        let result = self
            .conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1 FROM chunks LIMIT 1;")?;
                Ok(())
            })
            .await;
        match result {
            Ok(()) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(index: usize, content: &str, embedding: Vec<f32>) -> ChunkRecord {
        ChunkRecord::new("docs", index, content, embedding)
    }

    #[tokio::test]
    async fn upsert_and_count() {
        let store = ChunkStore::open_in_memory().await.unwrap();
        let written = store
            .upsert_chunks(vec![
                record(0, "alpha", vec![1.0, 0.0]),
                record(1, "beta", vec![0.0, 1.0]),
            ])
            .await
            .unwrap();
        assert_eq!(written, 2);
        assert_eq!(store.count("docs").await.unwrap(), 2);
        assert_eq!(store.count("other").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn reingest_is_idempotent() {
        let store = ChunkStore::open_in_memory().await.unwrap();
        let batch = || vec![record(0, "alpha", vec![1.0, 0.0])];
        store.upsert_chunks(batch()).await.unwrap();
        store.upsert_chunks(batch()).await.unwrap();
        assert_eq!(store.count("docs").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn nearest_orders_by_similarity() {
        let store = ChunkStore::open_in_memory().await.unwrap();
        store
            .upsert_chunks(vec![
                record(0, "east", vec![1.0, 0.0]),
                record(1, "north", vec![0.0, 1.0]),
                record(2, "north-east", vec![0.7, 0.7]),
            ])
            .await
            .unwrap();

        let hits = store.query_nearest("docs", &[0.0, 1.0], 2).await.unwrap();
        let contents: Vec<&str> = hits.iter().map(|h| h.content.as_str()).collect();
        assert_eq!(contents, vec!["north", "north-east"]);
        assert!(hits[0].score >= hits[1].score);
    }

    #[tokio::test]
    async fn nearest_respects_k_and_collection() {
        let store = ChunkStore::open_in_memory().await.unwrap();
        store
            .upsert_chunks(vec![
                record(0, "a", vec![1.0, 0.0]),
                record(1, "b", vec![1.0, 0.1]),
                ChunkRecord::new("elsewhere", 0, "c", vec![1.0, 0.0]),
            ])
            .await
            .unwrap();

        assert_eq!(store.query_nearest("docs", &[1.0, 0.0], 1).await.unwrap().len(), 1);
        assert_eq!(store.query_nearest("docs", &[1.0, 0.0], 10).await.unwrap().len(), 2);
        assert!(store.query_nearest("docs", &[1.0, 0.0], 0).await.unwrap().is_empty());
        assert!(store.query_nearest("empty", &[1.0, 0.0], 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn mismatched_dimensions_are_skipped() {
        let store = ChunkStore::open_in_memory().await.unwrap();
        store
            .upsert_chunks(vec![
                record(0, "two", vec![1.0, 0.0]),
                record(1, "three", vec![1.0, 0.0, 0.0]),
            ])
            .await
            .unwrap();
        let hits = store.query_nearest("docs", &[1.0, 0.0], 5).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].content, "two");
    }

    #[tokio::test]
    async fn clear_collection_removes_rows() {
        let store = ChunkStore::open_in_memory().await.unwrap();
        store
            .upsert_chunks(vec![record(0, "a", vec![1.0])])
            .await
            .unwrap();
        assert_eq!(store.clear_collection("docs").await.unwrap(), 1);
        assert_eq!(store.count("docs").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn file_backed_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("index.db");
        {
            let store = ChunkStore::open(&path, true).await.unwrap();
            store
                .upsert_chunks(vec![record(0, "kept", vec![1.0, 0.0])])
                .await
                .unwrap();
        }
        let reopened = ChunkStore::open(&path, true).await.unwrap();
        assert_eq!(reopened.count("docs").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn health_check_reports_healthy() {
        let store = ChunkStore::open_in_memory().await.unwrap();
        assert_eq!(store.health_check().await.unwrap(), HealthStatus::Healthy);
        assert_eq!(store.adapter_type(), AdapterType::Index);
    }
}

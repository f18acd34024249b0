// SPDX-FileCopyrightText: 2026 Token-Diet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chunk domain types and vector helpers for the retrieval index.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Hex characters of the content hash kept in a chunk id.
const ID_HASH_LEN: usize = 16;

/// A chunk of a document together with its embedding, as stored in the index.
#[derive(Debug, Clone)]
pub struct ChunkRecord {
    /// Stable identifier: `{collection}:{index}:{hash prefix}`.
    pub id: String,
    /// Collection the chunk belongs to.
    pub collection: String,
    /// Position of the chunk within its document.
    pub index: usize,
    /// Chunk text.
    pub content: String,
    /// Embedding vector (384-dim for all-MiniLM-L6-v2).
    pub embedding: Vec<f32>,
}

impl ChunkRecord {
    /// Build a record, deriving the stable id from collection, index and content.
    pub fn new(
        collection: impl Into<String>,
        index: usize,
        content: impl Into<String>,
        embedding: Vec<f32>,
    ) -> Self {
        let collection = collection.into();
        let content = content.into();
        Self {
            id: chunk_id(&collection, index, &content),
            collection,
            index,
            content,
            embedding,
        }
    }
}

/// A chunk returned from a nearest-neighbor query.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredChunk {
    pub id: String,
    pub index: usize,
    pub content: String,
    /// Cosine similarity to the query embedding.
    pub score: f32,
}

/// Summary of one document ingestion.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub collection: String,
    /// Number of chunks written (inserted or replaced).
    pub chunks: usize,
    /// Characters of document text ingested.
    pub chars: usize,
}

/// Stable chunk identifier. Re-ingesting identical text yields identical ids.
pub fn chunk_id(collection: &str, index: usize, content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    let hash = hex::encode(digest);
    format!("{collection}:{index}:{}", &hash[..ID_HASH_LEN])
}

/// Convert f32 vector to bytes for SQLite BLOB storage.
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Convert SQLite BLOB back to f32 vector. Trailing partial floats are dropped.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Cosine similarity between two vectors.
///
/// Returns `None` when the lengths differ. Zero vectors have similarity 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() {
        return None;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a <= f32::EPSILON || norm_b <= f32::EPSILON {
        return Some(0.0);
    }
    Some(dot / (norm_a * norm_b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_id_is_stable_and_content_sensitive() {
        let a = chunk_id("docs", 0, "Paris is the capital of France.");
        let b = chunk_id("docs", 0, "Paris is the capital of France.");
        let c = chunk_id("docs", 0, "Berlin is the capital of Germany.");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("docs:0:"));
        assert_eq!(a.len(), "docs:0:".len() + ID_HASH_LEN);
    }

    #[test]
    fn record_derives_id() {
        let record = ChunkRecord::new("c", 3, "text", vec![1.0]);
        assert_eq!(record.id, chunk_id("c", 3, "text"));
    }

    #[test]
    fn blob_round_trip_384_dim() {
        let vec384: Vec<f32> = (0..384).map(|i| i as f32 / 384.0).collect();
        let blob = vec_to_blob(&vec384);
        assert_eq!(blob.len(), 384 * 4);
        assert_eq!(blob_to_vec(&blob), vec384);
    }

    #[test]
    fn blob_ignores_trailing_bytes() {
        let mut blob = vec_to_blob(&[1.5, -2.0]);
        blob.push(0xff);
        assert_eq!(blob_to_vec(&blob), vec![1.5, -2.0]);
    }

    #[test]
    fn cosine_identical_and_orthogonal() {
        let a = [1.0, 2.0, 3.0];
        let sim = cosine_similarity(&a, &a).unwrap();
        assert!((sim - 1.0).abs() < 1e-6);

        let x = [1.0, 0.0];
        let y = [0.0, 1.0];
        assert!(cosine_similarity(&x, &y).unwrap().abs() < f32::EPSILON);
    }

    #[test]
    fn cosine_is_scale_invariant() {
        let a = [1.0, 1.0];
        let b = [10.0, 10.0];
        assert!((cosine_similarity(&a, &b).unwrap() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_mismatched_lengths() {
        assert!(cosine_similarity(&[1.0], &[1.0, 0.0]).is_none());
    }

    #[test]
    fn cosine_zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), Some(0.0));
    }
}

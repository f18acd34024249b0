// SPDX-FileCopyrightText: 2026 Token-Diet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! ONNX embedding adapter for local inference using all-MiniLM-L6-v2.
//!
//! Produces 384-dimensional, L2-normalized sentence embeddings on CPU.
//! Chunks and queries are embedded with the same model so their cosine
//! similarity is meaningful.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use ndarray::Array2;
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::TensorRef;
use tokenizers::{Tokenizer, TruncationParams};
use tracing::debug;

use tokendiet_core::TokenDietError;
use tokendiet_core::traits::{EmbeddingAdapter, PluginAdapter};
use tokendiet_core::types::{AdapterType, EmbeddingInput, EmbeddingOutput, HealthStatus};

/// Embedding dimensions for all-MiniLM-L6-v2.
pub const EMBEDDING_DIM: usize = 384;

/// Longest token sequence fed to the model; longer inputs are truncated.
const MAX_SEQUENCE_TOKENS: usize = 256;

fn embedding_err(context: &str, e: impl std::fmt::Display) -> TokenDietError {
    TokenDietError::Embedding(format!("{context}: {e}"))
}

/// ONNX-based embedding adapter using all-MiniLM-L6-v2.
pub struct OnnxEmbedder {
    /// ONNX Runtime session, serialized behind a mutex.
    session: Mutex<Session>,
    tokenizer: Tokenizer,
}

// Safety: the session is only reached through the Mutex, and the tokenizer
// is only used for encoding, which takes `&self`.
unsafe impl Send for OnnxEmbedder {}
unsafe impl Sync for OnnxEmbedder {}

impl OnnxEmbedder {
    /// Load the model and its `tokenizer.json` from disk.
    pub fn load(model_path: &Path, tokenizer_path: &Path) -> Result<Self, TokenDietError> {
        let mut tokenizer = Tokenizer::from_file(tokenizer_path).map_err(|e| {
            embedding_err(
                &format!("failed to load tokenizer from {}", tokenizer_path.display()),
                e,
            )
        })?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQUENCE_TOKENS,
                ..Default::default()
            }))
            .map_err(|e| embedding_err("failed to configure truncation", e))?;

        let session = Session::builder()
            .map_err(|e| embedding_err("failed to create ONNX session builder", e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| embedding_err("failed to set optimization level", e))?
            .with_intra_threads(1)
            .map_err(|e| embedding_err("failed to set thread count", e))?
            .commit_from_file(model_path)
            .map_err(|e| {
                embedding_err(
                    &format!("failed to load ONNX model from {}", model_path.display()),
                    e,
                )
            })?;

        debug!(model = %model_path.display(), "ONNX embedder loaded");
        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
        })
    }

    /// Embed a single text, returning a normalized 384-dim vector.
    pub fn embed_text(&self, text: &str) -> Result<Vec<f32>, TokenDietError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| embedding_err("tokenization failed", e))?;

        let widen = |values: &[u32]| values.iter().map(|&v| i64::from(v)).collect::<Vec<i64>>();
        let input_ids = widen(encoding.get_ids());
        let attention_mask = widen(encoding.get_attention_mask());
        let token_type_ids = widen(encoding.get_type_ids());
        let seq_len = input_ids.len();

        let as_batch = |values: Vec<i64>, name: &str| {
            Array2::from_shape_vec((1, seq_len), values)
                .map_err(|e| embedding_err(&format!("failed to shape {name}"), e))
        };
        let input_ids_array = as_batch(input_ids, "input_ids")?;
        let attention_mask_array = as_batch(attention_mask.clone(), "attention_mask")?;
        let token_type_ids_array = as_batch(token_type_ids, "token_type_ids")?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| embedding_err("ONNX session lock poisoned", e))?;

        let outputs = session
            .run(ort::inputs![
                "input_ids" => TensorRef::from_array_view(&input_ids_array)
                    .map_err(|e| embedding_err("input_ids tensor", e))?,
                "attention_mask" => TensorRef::from_array_view(&attention_mask_array)
                    .map_err(|e| embedding_err("attention_mask tensor", e))?,
                "token_type_ids" => TensorRef::from_array_view(&token_type_ids_array)
                    .map_err(|e| embedding_err("token_type_ids tensor", e))?
            ])
            .map_err(|e| embedding_err("ONNX inference failed", e))?;

        // Output shape: [1, seq_len, hidden].
        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| embedding_err("failed to extract output tensor", e))?;
        let hidden_size = shape
            .last()
            .map(|&d| d as usize)
            .filter(|&d| d > 0)
            .ok_or_else(|| TokenDietError::Embedding("output tensor has no hidden dimension".into()))?;

        let pooled = mean_pool_with_attention(data, &attention_mask, seq_len, hidden_size);
        Ok(l2_normalize(&pooled))
    }
}

/// Attention-masked mean pooling over token embeddings.
fn mean_pool_with_attention(
    embeddings: &[f32],
    attention_mask: &[i64],
    seq_len: usize,
    hidden_size: usize,
) -> Vec<f32> {
    let mut sum = vec![0.0f32; hidden_size];
    let mut count = 0.0f32;

    for (token, row) in embeddings.chunks_exact(hidden_size).take(seq_len).enumerate() {
        if attention_mask.get(token).copied().unwrap_or(0) > 0 {
            for (acc, value) in sum.iter_mut().zip(row) {
                *acc += value;
            }
            count += 1.0;
        }
    }

    if count > 0.0 {
        sum.iter_mut().for_each(|v| *v /= count);
    }
    sum
}

fn l2_normalize(vec: &[f32]) -> Vec<f32> {
    let norm: f32 = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        vec.iter().map(|v| v / norm).collect()
    } else {
        vec.to_vec()
    }
}

#[async_trait]
impl PluginAdapter for OnnxEmbedder {
    fn name(&self) -> &str {
        "onnx-minilm"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, TokenDietError> {
        match self.embed_text("health check") {
            Ok(v) if v.len() == EMBEDDING_DIM => Ok(HealthStatus::Healthy),
            Ok(v) => Ok(HealthStatus::Degraded(format!(
                "expected {EMBEDDING_DIM} dimensions, got {}",
                v.len()
            ))),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }
}

#[async_trait]
impl EmbeddingAdapter for OnnxEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, TokenDietError> {
        let embeddings = input
            .texts
            .iter()
            .map(|text| self.embed_text(text))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(EmbeddingOutput {
            embeddings,
            dimensions: EMBEDDING_DIM,
        })
    }
}

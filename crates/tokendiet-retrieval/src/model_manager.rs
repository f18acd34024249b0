// SPDX-FileCopyrightText: 2026 Token-Diet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! First-run download of the ONNX sentence embedding model.
//!
//! Fetches the quantized all-MiniLM-L6-v2 model and its tokenizer from
//! HuggingFace into `<data_dir>/models/<model_name>/` and reuses the cached
//! files on later runs.

use std::path::{Path, PathBuf};

use tokio::sync::OnceCell;
use tracing::info;

use tokendiet_config::model::RetrievalConfig;
use tokendiet_core::TokenDietError;

use crate::embedder::OnnxEmbedder;

const MODEL_URL: &str = "https://huggingface.co/onnx-community/all-MiniLM-L6-v2-ONNX/resolve/main/onnx/model_quantized.onnx";
const TOKENIZER_URL: &str =
    "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main/tokenizer.json";

/// Resolves model file paths and downloads missing files.
pub struct ModelManager {
    data_dir: PathBuf,
    model_name: String,
    /// Downloads run at most once per manager, even with concurrent callers.
    ready: OnceCell<PathBuf>,
}

impl ModelManager {
    pub fn new(data_dir: impl Into<PathBuf>, model_name: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            model_name: model_name.into(),
            ready: OnceCell::new(),
        }
    }

    pub fn from_config(config: &RetrievalConfig) -> Self {
        Self::new(&config.data_dir, &config.model_name)
    }

    /// Directory holding the model files.
    pub fn model_dir(&self) -> PathBuf {
        self.data_dir.join("models").join(&self.model_name)
    }

    pub fn model_path(&self) -> PathBuf {
        self.model_dir().join("model.onnx")
    }

    pub fn tokenizer_path(&self) -> PathBuf {
        self.model_dir().join("tokenizer.json")
    }

    /// True if both model and tokenizer files exist on disk.
    pub fn is_model_available(&self) -> bool {
        self.model_path().exists() && self.tokenizer_path().exists()
    }

    /// Download any missing model files and return the model path.
    pub async fn ensure_model(&self) -> Result<PathBuf, TokenDietError> {
        self.ready
            .get_or_try_init(|| async {
                if self.is_model_available() {
                    return Ok(self.model_path());
                }

                let model_dir = self.model_dir();
                info!(dir = %model_dir.display(), "embedding model not found, downloading");
                tokio::fs::create_dir_all(&model_dir).await.map_err(|e| {
                    TokenDietError::Embedding(format!(
                        "failed to create model directory {}: {e}",
                        model_dir.display()
                    ))
                })?;

                for (dest, url) in [
                    (self.model_path(), MODEL_URL),
                    (self.tokenizer_path(), TOKENIZER_URL),
                ] {
                    if dest.exists() {
                        continue;
                    }
                    match download_file(url, &dest).await {
                        Ok(size) => info!(file = %dest.display(), bytes = size, "downloaded"),
                        Err(e) => {
                            // Never leave a truncated file that would look valid next run.
                            let _ = tokio::fs::remove_file(&dest).await;
                            return Err(e);
                        }
                    }
                }

                Ok::<_, TokenDietError>(self.model_path())
            })
            .await
            .cloned()
    }

    /// Ensure the model is present, then load it.
    pub async fn load_embedder(&self) -> Result<OnnxEmbedder, TokenDietError> {
        let model_path = self.ensure_model().await?;
        let tokenizer_path = self.tokenizer_path();
        tokio::task::spawn_blocking(move || OnnxEmbedder::load(&model_path, &tokenizer_path))
            .await
            .map_err(|e| TokenDietError::Internal(format!("embedder load task failed: {e}")))?
    }
}

async fn download_file(url: &str, dest: &Path) -> Result<usize, TokenDietError> {
    let response = reqwest::get(url)
        .await
        .map_err(|e| TokenDietError::Embedding(format!("failed to download {url}: {e}")))?;

    if !response.status().is_success() {
        return Err(TokenDietError::Embedding(format!(
            "download of {url} failed with status {}",
            response.status()
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| TokenDietError::Embedding(format!("failed to read body from {url}: {e}")))?;

    tokio::fs::write(dest, &bytes).await.map_err(|e| {
        TokenDietError::Embedding(format!("failed to write {}: {e}", dest.display()))
    })?;

    Ok(bytes.len())
}

// SPDX-FileCopyrightText: 2026 Token-Diet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Document retrieval for the Token-Diet pipeline.
//!
//! Provides text extraction, fixed-width chunking, ONNX-based local
//! embedding inference, and a SQLite chunk index with cosine
//! nearest-neighbor search.
//!
//! ## Architecture
//!
//! - **extract**: PDF and plain-text extraction keyed by MIME type
//! - **chunker**: Contiguous, non-overlapping character windows
//! - **OnnxEmbedder**: Local all-MiniLM-L6-v2 model for 384-dim embeddings
//! - **ModelManager**: First-run model download from HuggingFace
//! - **ChunkStore**: SQLite persistence with BLOB vectors
//! - **ContextRetriever**: Ingestion and top-k retrieval over one collection

pub mod chunker;
pub mod embedder;
pub mod extract;
pub mod model_manager;
pub mod retriever;
pub mod store;
pub mod types;

pub use chunker::split_into_chunks;
pub use embedder::OnnxEmbedder;
pub use extract::{extract_text, extract_text_from_file};
pub use model_manager::ModelManager;
pub use retriever::ContextRetriever;
pub use store::ChunkStore;
pub use types::*;

// SPDX-FileCopyrightText: 2026 Token-Diet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Token-Diet.
//!
//! Provides mock adapters for fast, deterministic, CI-runnable tests without
//! external services.
//!
//! # Components
//!
//! - [`MockProvider`] - Mock LLM provider with queued responses and request capture
//! - [`MockEmbedder`] - Deterministic bag-of-words embedder
//! - [`FixedRetriever`] - Retriever that returns a fixed chunk list

pub mod mock_embedder;
pub mod mock_provider;
pub mod mock_retriever;

pub use mock_embedder::MockEmbedder;
pub use mock_provider::MockProvider;
pub use mock_retriever::FixedRetriever;

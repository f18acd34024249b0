// SPDX-FileCopyrightText: 2026 Token-Diet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Token-Diet pipeline.
//!
//! This crate provides the foundational trait definitions, error type,
//! shared request/response types, and the BPE token counter used throughout
//! the workspace. All external services (generative provider, embedder,
//! vector index) are reached through traits defined here so they can be
//! injected at construction time and replaced by fakes in tests.

pub mod error;
pub mod tokens;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::TokenDietError;
pub use tokens::TokenCounter;
pub use types::{AdapterType, HealthStatus, TokenUsage};

pub use traits::{ChunkRetriever, EmbeddingAdapter, PluginAdapter, ProviderAdapter};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ProviderRequest, Role};

    #[test]
    fn error_variants_render() {
        let config = TokenDietError::Config("missing api key".into());
        assert_eq!(config.to_string(), "configuration error: missing api key");

        let unsupported = TokenDietError::UnsupportedDocument {
            mime: "image/png".into(),
        };
        assert!(unsupported.to_string().contains("image/png"));

        let timeout = TokenDietError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        assert!(timeout.to_string().contains("30s"));

        let storage = TokenDietError::storage(std::io::Error::other("disk"));
        assert!(storage.to_string().contains("disk"));
    }

    #[test]
    fn adapter_type_display_round_trip() {
        use std::str::FromStr;

        for variant in [AdapterType::Provider, AdapterType::Embedding, AdapterType::Index] {
            let parsed = AdapterType::from_str(&variant.to_string()).expect("should parse back");
            assert_eq!(variant, parsed);
        }
    }

    #[test]
    fn single_turn_request_layout() {
        let req = ProviderRequest::single_turn("m", "be precise", "question?", 256);
        assert_eq!(req.messages.len(), 2);
        assert_eq!(req.messages[0].role, Role::System);
        assert_eq!(req.system(), Some("be precise"));
        assert_eq!(req.user(), Some("question?"));
    }

    #[test]
    fn usage_accumulates() {
        let mut total = TokenUsage::default();
        total += TokenUsage {
            input_tokens: 10,
            output_tokens: 5,
        };
        total += TokenUsage {
            input_tokens: 3,
            output_tokens: 2,
        };
        assert_eq!(total.input_tokens, 13);
        assert_eq!(total.total(), 20);
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::System).unwrap(), "\"system\"");
        assert_eq!(Role::User.to_string(), "user");
    }

    #[test]
    fn all_traits_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_provider_adapter<T: ProviderAdapter>() {}
        fn _assert_embedding_adapter<T: EmbeddingAdapter>() {}
        fn _assert_chunk_retriever<T: ChunkRetriever>() {}
    }
}

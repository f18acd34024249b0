// SPDX-FileCopyrightText: 2026 Token-Diet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Heuristic query complexity classification.
//!
//! A prompt is complex when its token count exceeds the configured threshold
//! or when it contains any configured keyword (case-insensitive substring).
//! No LLM pre-call, no network, no latency.

use std::sync::Arc;

use serde::Serialize;
use strum::{Display, EnumString};
use tokendiet_config::model::RoutingConfig;
use tokendiet_core::TokenCounter;

/// Query complexity tiers mapped to model tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ComplexityTier {
    /// Economy model: short prompts without complexity keywords.
    Simple,
    /// Premium model: long prompts or prompts asking for reasoning.
    Complex,
}

/// Result of classifying a prompt.
#[derive(Debug, Clone)]
pub struct ClassificationResult {
    /// The classified complexity tier.
    pub tier: ComplexityTier,
    /// Token count of the prompt.
    pub prompt_tokens: usize,
    /// First configured keyword found in the prompt, if any.
    pub matched_keyword: Option<String>,
    /// Whether the prompt exceeded the token threshold.
    pub over_threshold: bool,
}

impl ClassificationResult {
    /// Human-readable reason for the classification.
    pub fn reason(&self, threshold: usize) -> String {
        match (&self.matched_keyword, self.over_threshold) {
            (Some(keyword), true) => format!(
                "{} tokens exceeds {threshold} and contains keyword `{keyword}`",
                self.prompt_tokens
            ),
            (Some(keyword), false) => format!("contains keyword `{keyword}`"),
            (None, true) => format!("{} tokens exceeds {threshold}", self.prompt_tokens),
            (None, false) => format!(
                "{} tokens within {threshold}, no complexity keywords",
                self.prompt_tokens
            ),
        }
    }
}

/// Heuristic query classifier.
pub struct QueryClassifier {
    counter: Arc<TokenCounter>,
    token_threshold: usize,
    /// Lowercased keywords.
    keywords: Vec<String>,
}

impl QueryClassifier {
    /// Create a classifier from an explicit threshold and keyword list.
    pub fn new(counter: Arc<TokenCounter>, token_threshold: usize, keywords: &[String]) -> Self {
        Self {
            counter,
            token_threshold,
            keywords: keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// Create a classifier from the `[routing]` config section.
    pub fn from_config(config: &RoutingConfig, counter: Arc<TokenCounter>) -> Self {
        Self::new(counter, config.token_threshold, &config.complex_keywords)
    }

    /// The token threshold above which prompts are complex.
    pub fn token_threshold(&self) -> usize {
        self.token_threshold
    }

    /// Classify a prompt. Length and keyword signals combine with logical OR.
    pub fn classify(&self, prompt: &str) -> ClassificationResult {
        let prompt_tokens = self.counter.count_tokens(prompt);
        let lower = prompt.to_lowercase();
        let matched_keyword = self
            .keywords
            .iter()
            .find(|k| lower.contains(k.as_str()))
            .cloned();
        let over_threshold = prompt_tokens > self.token_threshold;

        let tier = if over_threshold || matched_keyword.is_some() {
            ComplexityTier::Complex
        } else {
            ComplexityTier::Simple
        };

        ClassificationResult {
            tier,
            prompt_tokens,
            matched_keyword,
            over_threshold,
        }
    }
}

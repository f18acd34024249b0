// SPDX-FileCopyrightText: 2026 Token-Diet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model routing between the economy and premium tiers.
//!
//! Priority order: global `force_model` > classification.

use std::sync::Arc;

use serde::Serialize;
use tokendiet_config::model::RoutingConfig;
use tokendiet_core::TokenCounter;
use tracing::{debug, info};

use crate::classifier::{ComplexityTier, QueryClassifier};

/// Routing decision for one prompt.
#[derive(Debug, Clone, Serialize)]
pub struct RoutingDecision {
    /// Model identifier to send the query to.
    pub model: String,
    /// Classified complexity tier.
    pub tier: ComplexityTier,
    /// Token count of the prompt.
    pub prompt_tokens: usize,
    /// Human-readable reason for the routing decision.
    pub reason: String,
}

/// Selects a model for each prompt.
pub struct ModelRouter {
    classifier: QueryClassifier,
    config: RoutingConfig,
}

impl ModelRouter {
    /// Create a new model router with the given configuration.
    pub fn new(config: RoutingConfig, counter: Arc<TokenCounter>) -> Self {
        Self {
            classifier: QueryClassifier::from_config(&config, counter),
            config,
        }
    }

    /// Route a prompt to the appropriate model.
    ///
    /// Deterministic: the same prompt always yields the same decision.
    pub fn select_model(&self, prompt: &str) -> RoutingDecision {
        let classification = self.classifier.classify(prompt);

        if let Some(forced) = &self.config.force_model {
            debug!(model = forced.as_str(), "routing pinned by force_model");
            return RoutingDecision {
                model: forced.clone(),
                tier: classification.tier,
                prompt_tokens: classification.prompt_tokens,
                reason: "global force_model config".to_string(),
            };
        }

        let model = self.model_for_tier(classification.tier).to_string();
        let reason = classification.reason(self.classifier.token_threshold());

        info!(
            model = model.as_str(),
            tier = %classification.tier,
            prompt_tokens = classification.prompt_tokens,
            reason = reason.as_str(),
            "model selected"
        );

        RoutingDecision {
            model,
            tier: classification.tier,
            prompt_tokens: classification.prompt_tokens,
            reason,
        }
    }

    /// Model identifier configured for a tier.
    pub fn model_for_tier(&self, tier: ComplexityTier) -> &str {
        match tier {
            ComplexityTier::Simple => &self.config.economy_model,
            ComplexityTier::Complex => &self.config.premium_model,
        }
    }

    /// The premium (complex tier) model identifier.
    pub fn premium_model(&self) -> &str {
        &self.config.premium_model
    }

    /// The economy (simple tier) model identifier.
    pub fn economy_model(&self) -> &str {
        &self.config.economy_model
    }
}

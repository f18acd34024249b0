// SPDX-FileCopyrightText: 2026 Token-Diet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model pricing tables and cost calculation.
//!
//! Default prices (input, per million tokens):
//!
//! gpt-4o:                    $2.50
//! gpt-4o-mini:               $0.15
//! llama-3.1-405b-reasoning:  $2.50 (premium tier)
//! llama-3.3-70b-versatile:   $0.15 (economy tier)
//!
//! Models absent from the table cost nothing. Estimates for unlisted models
//! under-report rather than fail.

use std::collections::BTreeMap;

use serde::Serialize;
use tokendiet_config::model::PricingConfig;
use tracing::debug;

const TOKENS_PER_MILLION: f64 = 1_000_000.0;

/// Input token prices keyed by model identifier.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PriceTable {
    per_mtok: BTreeMap<String, f64>,
}

impl PriceTable {
    /// Build a price table from the `[pricing]` config section.
    pub fn from_config(config: &PricingConfig) -> Self {
        Self {
            per_mtok: config.models.clone(),
        }
    }

    /// Add or replace the price for one model.
    pub fn with_price(mut self, model: impl Into<String>, usd_per_mtok: f64) -> Self {
        self.per_mtok.insert(model.into(), usd_per_mtok);
        self
    }

    /// Price per million tokens for `model`, if listed.
    pub fn price_per_mtok(&self, model: &str) -> Option<f64> {
        self.per_mtok.get(model).copied()
    }

    /// Estimated USD cost of sending `token_count` tokens to `model`.
    ///
    /// Returns 0.0 for models that have no listed price.
    pub fn calculate_cost(&self, token_count: usize, model: &str) -> f64 {
        match self.price_per_mtok(model) {
            Some(price) => (token_count as f64 / TOKENS_PER_MILLION) * price,
            None => {
                debug!(model, token_count, "no price listed for model, cost reported as 0");
                0.0
            }
        }
    }
}

/// Money saved by pruning and routing, in USD.
///
/// Compares the unpruned context priced at the premium model against the
/// pruned context priced at the economy model. Observational only: the
/// result can be negative when both models share a price and pruning did
/// not shrink the context enough, and it says nothing about the model that
/// actually served the query.
pub fn money_saved(
    prices: &PriceTable,
    original_tokens: usize,
    final_tokens: usize,
    premium_model: &str,
    economy_model: &str,
) -> f64 {
    prices.calculate_cost(original_tokens, premium_model)
        - prices.calculate_cost(final_tokens, economy_model)
}

// SPDX-FileCopyrightText: 2026 Token-Diet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as non-empty model identifiers, positive chunk sizes, and non-negative prices.

use crate::diagnostic::ConfigError;
use crate::model::TokenDietConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &TokenDietConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let mut require_non_empty = |key: &str, value: &str| {
        if value.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("{key} must not be empty"),
            });
        }
    };

    require_non_empty("provider.base_url", &config.provider.base_url);
    require_non_empty("routing.economy_model", &config.routing.economy_model);
    require_non_empty("routing.premium_model", &config.routing.premium_model);
    require_non_empty("judge.model", &config.judge.model);
    require_non_empty("retrieval.collection", &config.retrieval.collection);
    require_non_empty("storage.database_path", &config.storage.database_path);
    if let Some(forced) = &config.routing.force_model {
        require_non_empty("routing.force_model", forced);
    }

    if !LOG_LEVELS.contains(&config.agent.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "agent.log_level `{}` is not one of {}",
                config.agent.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if config.provider.timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "provider.timeout_secs must be greater than 0".to_string(),
        });
    }

    if config.provider.max_tokens == 0 {
        errors.push(ConfigError::Validation {
            message: "provider.max_tokens must be greater than 0".to_string(),
        });
    }

    if let Some(temperature) = config.provider.temperature
        && !(0.0..=2.0).contains(&temperature)
    {
        errors.push(ConfigError::Validation {
            message: format!("provider.temperature must be between 0.0 and 2.0, got {temperature}"),
        });
    }

    if config.retrieval.top_k == 0 {
        errors.push(ConfigError::Validation {
            message: "retrieval.top_k must be at least 1".to_string(),
        });
    }

    if config.retrieval.chunk_size == 0 {
        errors.push(ConfigError::Validation {
            message: "retrieval.chunk_size must be at least 1".to_string(),
        });
    }

    if config.judge.max_tokens == 0 {
        errors.push(ConfigError::Validation {
            message: "judge.max_tokens must be greater than 0".to_string(),
        });
    }

    for (model, price) in &config.pricing.models {
        if !price.is_finite() || *price < 0.0 {
            errors.push(ConfigError::Validation {
                message: format!("pricing.models.{model} must be a non-negative number, got {price}"),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

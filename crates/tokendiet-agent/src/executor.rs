// SPDX-FileCopyrightText: 2026 Token-Diet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Context-constrained answer generation.

use std::sync::Arc;
use std::time::Duration;

use tokendiet_config::model::ProviderConfig;
use tokendiet_core::types::{ProviderRequest, ProviderResponse};
use tokendiet_core::{ProviderAdapter, TokenDietError};
use tracing::{info, warn};

use crate::state::StateDelta;

/// System instructions for every executor call.
pub const EXECUTOR_INSTRUCTIONS: &str = "You are a precise assistant. Answer ONLY using the provided context. \
If the answer is not present, say 'Information not available.'";

/// User turn carrying the pruned context and the question.
pub fn build_user_turn(context: &str, prompt: &str) -> String {
    format!("Context:\n{context}\n\nQuestion:\n{prompt}")
}

/// Sends `request`, failing with [`TokenDietError::Timeout`] after `timeout`.
pub(crate) async fn complete_within(
    provider: &dyn ProviderAdapter,
    request: ProviderRequest,
    timeout: Duration,
) -> Result<ProviderResponse, TokenDietError> {
    match tokio::time::timeout(timeout, provider.complete(request)).await {
        Ok(result) => result,
        Err(_) => {
            warn!(timeout_secs = timeout.as_secs_f64(), "provider call timed out");
            Err(TokenDietError::Timeout { duration: timeout })
        }
    }
}

/// Generates one answer per call against the selected model.
pub struct Executor {
    provider: Arc<dyn ProviderAdapter>,
    max_tokens: u32,
    temperature: Option<f32>,
    timeout: Duration,
}

impl Executor {
    pub fn new(provider: Arc<dyn ProviderAdapter>, config: &ProviderConfig) -> Self {
        Self {
            provider,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Runs one completion and returns the `Executed` delta.
    ///
    /// No transport retry: any provider error or timeout is returned as-is.
    pub async fn execute(
        &self,
        model: &str,
        context: &str,
        prompt: &str,
    ) -> Result<StateDelta, TokenDietError> {
        let mut request = ProviderRequest::single_turn(
            model,
            EXECUTOR_INSTRUCTIONS,
            build_user_turn(context, prompt),
            self.max_tokens,
        );
        request.temperature = self.temperature;

        let response = complete_within(self.provider.as_ref(), request, self.timeout).await?;
        info!(
            model,
            output_tokens = response.usage.output_tokens,
            "executor produced a response"
        );

        Ok(StateDelta::Executed {
            response: response.content,
            usage: response.usage,
        })
    }
}

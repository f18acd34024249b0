// SPDX-FileCopyrightText: 2026 Token-Diet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI-compatible chat completions provider for Token-Diet.
//!
//! Implements [`ProviderAdapter`] against any `/chat/completions` endpoint
//! (Groq by default). The same adapter serves both the executor and the
//! judge; only the request contents differ.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use tokendiet_config::model::ProviderConfig;
use tokendiet_core::TokenDietError;
use tokendiet_core::traits::{PluginAdapter, ProviderAdapter};
use tokendiet_core::types::{
    AdapterType, HealthStatus, ProviderRequest, ProviderResponse, TokenUsage,
};
use tracing::{debug, info};

use crate::client::OpenAiClient;
use crate::types::{ApiMessage, ChatCompletionRequest, ChatCompletionResponse};

/// Chat completions provider implementing [`ProviderAdapter`].
///
/// API key resolution order: `provider.api_key` (which the config loader
/// also fills from `GROQ_API_KEY`) -> `GROQ_API_KEY` env var -> error.
pub struct OpenAiProvider {
    client: OpenAiClient,
}

impl OpenAiProvider {
    /// Creates a provider from the `[provider]` config section.
    pub fn new(config: &ProviderConfig) -> Result<Self, TokenDietError> {
        let api_key = resolve_api_key(&config.api_key)?;
        let client = OpenAiClient::new(
            &api_key,
            &config.base_url,
            Duration::from_secs(config.timeout_secs),
        )?;

        info!(base_url = client.base_url(), "chat completions provider initialized");
        Ok(Self { client })
    }

    /// Creates a provider around an existing client.
    pub fn with_client(client: OpenAiClient) -> Self {
        Self { client }
    }

    fn to_api_request(request: &ProviderRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: request.model.clone(),
            messages: request
                .messages
                .iter()
                .map(|m| ApiMessage {
                    role: m.role.to_string(),
                    content: Some(m.content.clone()),
                })
                .collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stream: false,
        }
    }
}

/// Converts the wire response into the pipeline's response type.
///
/// Only the first choice is used. A missing `content` becomes an empty string.
fn from_api_response(response: ChatCompletionResponse) -> Result<ProviderResponse, TokenDietError> {
    let usage = response
        .usage
        .map(|u| TokenUsage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        })
        .unwrap_or_default();

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| TokenDietError::Provider {
            message: "API response contained no choices".into(),
            source: None,
        })?;

    Ok(ProviderResponse {
        id: response.id,
        content: choice.message.content.unwrap_or_default(),
        model: response.model,
        stop_reason: choice.finish_reason,
        usage,
    })
}

#[async_trait]
impl PluginAdapter for OpenAiProvider {
    fn name(&self) -> &str {
        "openai-compatible"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, TokenDietError> {
        // Listing models is authenticated but consumes no tokens.
        match self.client.list_models().await {
            Ok(()) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiProvider {
    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> Result<ProviderResponse, TokenDietError> {
        let api_request = Self::to_api_request(&request);
        let response = self.client.chat_completion(&api_request).await?;
        let response = from_api_response(response)?;
        debug!(
            model = response.model.as_str(),
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "completion finished"
        );
        Ok(response)
    }
}

/// Resolves the API key from config, falling back to `GROQ_API_KEY`.
fn resolve_api_key(config_key: &Option<String>) -> Result<String, TokenDietError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(key.clone());
    }

    std::env::var("GROQ_API_KEY")
        .ok()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| {
            TokenDietError::Config(
                "API key not found. Set provider.api_key in config or the GROQ_API_KEY environment variable.".into(),
            )
        })
}

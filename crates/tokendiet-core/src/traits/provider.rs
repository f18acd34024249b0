// SPDX-FileCopyrightText: 2026 Token-Diet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider adapter trait for generative completion services.

use async_trait::async_trait;

use crate::error::TokenDietError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ProviderRequest, ProviderResponse};

/// Adapter for generative language model APIs.
///
/// Used identically by the executor and the judge with different
/// instruction templates. Implementations must not retry transport failures;
/// the only retry in the pipeline is the quality-driven loop.
#[async_trait]
pub trait ProviderAdapter: PluginAdapter {
    /// Sends a completion request and returns the full response.
    async fn complete(&self, request: ProviderRequest)
    -> Result<ProviderResponse, TokenDietError>;
}

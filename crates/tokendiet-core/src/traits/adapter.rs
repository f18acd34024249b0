// SPDX-FileCopyrightText: 2026 Token-Diet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base adapter trait shared by every external service handle.

use async_trait::async_trait;

use crate::error::TokenDietError;
use crate::types::{AdapterType, HealthStatus};

/// The base trait for all Token-Diet adapters.
///
/// Every adapter (provider, embedder, index) provides identity and a health
/// check so the `doctor` command can probe the whole stack.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Returns the human-readable name of this adapter instance.
    fn name(&self) -> &str;

    /// Returns the semantic version of this adapter.
    fn version(&self) -> semver::Version;

    /// Returns the type of adapter.
    fn adapter_type(&self) -> AdapterType;

    /// Performs a health check and returns the adapter's current status.
    async fn health_check(&self) -> Result<HealthStatus, TokenDietError>;
}

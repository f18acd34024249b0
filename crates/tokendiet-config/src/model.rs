// SPDX-FileCopyrightText: 2026 Token-Diet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Token-Diet pipeline.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Top-level Token-Diet configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TokenDietConfig {
    /// Agent identity and logging settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Generative model provider settings.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Model routing settings.
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Chunking, embedding, and retrieval settings.
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Vector index storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Response judge settings.
    #[serde(default)]
    pub judge: JudgeConfig,

    /// Token counting and per-model pricing.
    #[serde(default)]
    pub pricing: PricingConfig,
}

/// Agent identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the agent.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "tokendiet".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// OpenAI-compatible chat completions provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// API key. `None` requires `TOKENDIET_PROVIDER_API_KEY` or `GROQ_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL of the chat completions API (without `/chat/completions`).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Timeout in seconds applied to each executor and judge call.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum tokens to generate per executor response.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature. `None` uses the provider default.
    #[serde(default)]
    pub temperature: Option<f32>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            max_tokens: default_max_tokens(),
            temperature: None,
        }
    }
}

fn default_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_tokens() -> u32 {
    1024
}

/// Model routing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RoutingConfig {
    /// Model identifier for simple queries.
    #[serde(default = "default_economy_model")]
    pub economy_model: String,

    /// Model identifier for complex queries.
    #[serde(default = "default_premium_model")]
    pub premium_model: String,

    /// Force all queries to a specific model, bypassing classification.
    #[serde(default)]
    pub force_model: Option<String>,

    /// Prompts with more tokens than this route to the premium model.
    #[serde(default = "default_token_threshold")]
    pub token_threshold: usize,

    /// Case-insensitive substrings that mark a prompt as complex.
    #[serde(default = "default_complex_keywords")]
    pub complex_keywords: Vec<String>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            economy_model: default_economy_model(),
            premium_model: default_premium_model(),
            force_model: None,
            token_threshold: default_token_threshold(),
            complex_keywords: default_complex_keywords(),
        }
    }
}

pub fn default_economy_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

pub fn default_premium_model() -> String {
    "llama-3.1-405b-reasoning".to_string()
}

fn default_token_threshold() -> usize {
    200
}

fn default_complex_keywords() -> Vec<String> {
    [
        "analyze",
        "debug",
        "optimize",
        "calculate",
        "rewrite",
        "evaluate",
        "why",
        "architect",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Chunking, embedding, and retrieval configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetrievalConfig {
    /// Number of chunks retrieved per pruning step.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Chunk width in characters used at ingestion.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Name of the index collection documents are ingested into.
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Extra chunks requested on each retry iteration (0 keeps k fixed).
    #[serde(default)]
    pub retry_k_step: usize,

    /// Name of the local embedding model.
    #[serde(default = "default_embedding_model")]
    pub model_name: String,

    /// Directory where the embedding model is cached.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            chunk_size: default_chunk_size(),
            collection: default_collection(),
            retry_k_step: 0,
            model_name: default_embedding_model(),
            data_dir: default_data_dir(),
        }
    }
}

fn default_top_k() -> usize {
    3
}

fn default_chunk_size() -> usize {
    500
}

fn default_collection() -> String {
    "token_diet_context".to_string()
}

fn default_embedding_model() -> String {
    "all-MiniLM-L6-v2".to_string()
}

fn default_data_dir() -> String {
    dirs::data_dir()
        .map(|p| p.join("tokendiet"))
        .unwrap_or_else(|| std::path::PathBuf::from(".tokendiet"))
        .to_string_lossy()
        .into_owned()
}

/// Vector index storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite index database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("tokendiet").join("index.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("index.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// How the judge turns an evaluator verdict into a quality score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JudgeMode {
    /// Evaluator replies with an integer 1-10.
    #[default]
    Score,
    /// Evaluator replies with a free-text verdict checked for a pass marker.
    PassFail,
}

/// Response judge configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct JudgeConfig {
    /// Verdict format requested from the evaluator.
    #[serde(default)]
    pub mode: JudgeMode,

    /// Model used for evaluation calls.
    #[serde(default = "default_economy_model")]
    pub model: String,

    /// Maximum tokens for the evaluator reply.
    #[serde(default = "default_judge_max_tokens")]
    pub max_tokens: u32,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            mode: JudgeMode::default(),
            model: default_economy_model(),
            max_tokens: default_judge_max_tokens(),
        }
    }
}

fn default_judge_max_tokens() -> u32 {
    16
}

/// Token counting and pricing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PricingConfig {
    /// Model whose BPE encoding is used for token counting.
    #[serde(default = "default_tokenizer_model")]
    pub tokenizer_model: String,

    /// Input price in USD per million tokens, keyed by model identifier.
    #[serde(default = "default_model_prices")]
    pub models: BTreeMap<String, f64>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            tokenizer_model: default_tokenizer_model(),
            models: default_model_prices(),
        }
    }
}

fn default_tokenizer_model() -> String {
    "gpt-4o".to_string()
}

fn default_model_prices() -> BTreeMap<String, f64> {
    BTreeMap::from([
        ("gpt-4o".to_string(), 2.50),
        ("gpt-4o-mini".to_string(), 0.15),
        (default_premium_model(), 2.50),
        (default_economy_model(), 0.15),
    ])
}

// SPDX-FileCopyrightText: 2026 Token-Diet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tokendiet doctor` command implementation.
//!
//! Probes each external service the pipeline depends on: the chunk index,
//! the embedding model, the token counter, and the completion provider.

use std::io::IsTerminal;
use std::time::{Duration, Instant};

use tokendiet_config::TokenDietConfig;
use tokendiet_core::{HealthStatus, PluginAdapter, TokenCounter, TokenDietError};
use tokendiet_openai::OpenAiProvider;
use tokendiet_retrieval::{ChunkStore, ModelManager};

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }

    /// Maps an adapter health report onto a check result.
    fn from_health(name: &str, health: Result<HealthStatus, TokenDietError>, start: Instant) -> Self {
        match health {
            Ok(HealthStatus::Healthy) => Self::new(name, CheckStatus::Pass, "healthy", start),
            Ok(HealthStatus::Degraded(msg)) => Self::new(name, CheckStatus::Warn, msg, start),
            Ok(HealthStatus::Unhealthy(msg)) => Self::new(name, CheckStatus::Fail, msg, start),
            Err(e) => Self::new(name, CheckStatus::Fail, e.to_string(), start),
        }
    }
}

/// Run the `tokendiet doctor` command.
///
/// With `deep`, also loads the embedding model (downloading it if needed)
/// and runs a test embedding. With `plain`, disables colored output.
pub async fn run_doctor(
    config: &TokenDietConfig,
    deep: bool,
    plain: bool,
) -> Result<(), TokenDietError> {
    let use_color = !plain && std::io::stdout().is_terminal();

    let results = vec![
        check_index(config).await,
        check_tokenizer(config),
        check_embedding_model(config, deep).await,
        check_provider(config).await,
    ];

    println!();
    println!("  tokendiet doctor");
    println!("  {}", "-".repeat(50));

    for result in &results {
        println!("{}", format_line(result, use_color));
    }
    println!();

    let issues = results
        .iter()
        .filter(|r| r.status != CheckStatus::Pass)
        .count();
    if issues > 0 {
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found.");
        if !deep {
            println!("  Run with --deep to load and test the embedding model.");
        }
    } else {
        println!("  All checks passed.");
    }
    println!();

    Ok(())
}

fn format_line(result: &CheckResult, use_color: bool) -> String {
    let duration_ms = result.duration.as_millis();
    if use_color {
        use colored::Colorize;
        let (symbol, message) = match result.status {
            CheckStatus::Pass => ("✓".green().to_string(), result.message.normal().to_string()),
            CheckStatus::Warn => ("!".yellow().to_string(), result.message.yellow().to_string()),
            CheckStatus::Fail => ("✗".red().to_string(), result.message.red().to_string()),
        };
        format!("    {symbol} {:<20} {message} ({duration_ms}ms)", result.name)
    } else {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        format!("    {tag} {:<20} {} ({duration_ms}ms)", result.name, result.message)
    }
}

/// Open the index, apply migrations, and count the configured collection.
async fn check_index(config: &TokenDietConfig) -> CheckResult {
    const NAME: &str = "Chunk index";
    let start = Instant::now();

    let store = match ChunkStore::from_config(&config.storage).await {
        Ok(store) => store,
        Err(e) => return CheckResult::new(NAME, CheckStatus::Fail, format!("open failed: {e}"), start),
    };

    match store.health_check().await {
        Ok(HealthStatus::Healthy) => {
            let collection = &config.retrieval.collection;
            match store.count(collection).await {
                Ok(0) => CheckResult::new(
                    NAME,
                    CheckStatus::Warn,
                    format!("collection `{collection}` is empty (run `tokendiet ingest`)"),
                    start,
                ),
                Ok(n) => CheckResult::new(
                    NAME,
                    CheckStatus::Pass,
                    format!("{n} chunk(s) in `{collection}`"),
                    start,
                ),
                Err(e) => CheckResult::new(NAME, CheckStatus::Fail, e.to_string(), start),
            }
        }
        other => CheckResult::from_health(NAME, other, start),
    }
}

fn check_tokenizer(config: &TokenDietConfig) -> CheckResult {
    let start = Instant::now();
    let counter = TokenCounter::for_model(&config.pricing.tokenizer_model);
    let status = if counter.encoding_name() == "bytes-estimate" {
        CheckStatus::Warn
    } else {
        CheckStatus::Pass
    };
    CheckResult::new(
        "Tokenizer",
        status,
        format!("{} ({})", config.pricing.tokenizer_model, counter.encoding_name()),
        start,
    )
}

async fn check_embedding_model(config: &TokenDietConfig, deep: bool) -> CheckResult {
    const NAME: &str = "Embedding model";
    let start = Instant::now();
    let manager = ModelManager::from_config(&config.retrieval);

    if !deep {
        return if manager.is_model_available() {
            CheckResult::new(NAME, CheckStatus::Pass, "downloaded", start)
        } else {
            CheckResult::new(
                NAME,
                CheckStatus::Warn,
                format!("not downloaded yet ({})", manager.model_dir().display()),
                start,
            )
        };
    }

    match manager.load_embedder().await {
        Ok(embedder) => CheckResult::from_health(NAME, embedder.health_check().await, start),
        Err(e) => CheckResult::new(NAME, CheckStatus::Fail, e.to_string(), start),
    }
}

async fn check_provider(config: &TokenDietConfig) -> CheckResult {
    const NAME: &str = "Provider";
    let start = Instant::now();

    match OpenAiProvider::new(&config.provider) {
        Ok(provider) => CheckResult::from_health(NAME, provider.health_check().await, start),
        Err(TokenDietError::Config(msg)) => CheckResult::new(NAME, CheckStatus::Warn, msg, start),
        Err(e) => CheckResult::new(NAME, CheckStatus::Fail, e.to_string(), start),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_maps_to_status() {
        let start = Instant::now();
        let pass = CheckResult::from_health("x", Ok(HealthStatus::Healthy), start);
        assert_eq!(pass.status, CheckStatus::Pass);
        let warn = CheckResult::from_health("x", Ok(HealthStatus::Degraded("slow".into())), start);
        assert_eq!(warn.status, CheckStatus::Warn);
        assert_eq!(warn.message, "slow");
        let fail = CheckResult::from_health("x", Err(TokenDietError::Internal("boom".into())), start);
        assert_eq!(fail.status, CheckStatus::Fail);
    }

    #[test]
    fn plain_lines_are_tagged() {
        let result = CheckResult {
            name: "Provider".into(),
            status: CheckStatus::Warn,
            message: "API key not found".into(),
            duration: Duration::from_millis(3),
        };
        let line = format_line(&result, false);
        assert!(line.contains("[WARN]"));
        assert!(line.contains("API key not found"));
        assert!(line.ends_with("(3ms)"));
    }

    #[tokio::test]
    async fn index_check_warns_on_empty_collection() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = TokenDietConfig::default();
        config.storage.database_path = dir.path().join("index.db").display().to_string();

        let result = check_index(&config).await;
        assert_eq!(result.status, CheckStatus::Warn, "{}", result.message);
        assert!(result.message.contains("empty"));
    }

    #[tokio::test]
    async fn embedding_check_without_deep_reports_missing_model() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = TokenDietConfig::default();
        config.retrieval.data_dir = dir.path().display().to_string();

        let result = check_embedding_model(&config, false).await;
        assert_eq!(result.status, CheckStatus::Warn);
    }
}

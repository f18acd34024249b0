// SPDX-FileCopyrightText: 2026 Token-Diet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plain-text and JSON rendering of run results and configuration.

use std::fmt::Write as _;

use tokendiet_agent::RunReport;
use tokendiet_config::TokenDietConfig;
use tokendiet_core::TokenDietError;
use tokendiet_retrieval::IngestReport;

const REDACTED: &str = "<redacted>";

pub fn render_run(report: &RunReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", report.response.trim_end());
    let _ = writeln!(out);
    let _ = writeln!(out, "  model:      {} ({})", report.chosen_model, report.routing_reason);
    match report.quality_score {
        Some(score) => {
            let _ = writeln!(out, "  score:      {score}/10 ({})", report.outcome);
        }
        None => {
            let _ = writeln!(out, "  score:      n/a ({})", report.outcome);
        }
    }
    let _ = writeln!(out, "  iterations: {}", report.iteration_count);
    let _ = writeln!(
        out,
        "  context:    {} -> {} tokens",
        report.original_token_count, report.final_token_count
    );
    let _ = writeln!(out, "  saved:      ${:.6}", report.money_saved);
    out
}

pub fn render_run_json(report: &RunReport) -> Result<String, TokenDietError> {
    serde_json::to_string_pretty(report)
        .map_err(|e| TokenDietError::Internal(format!("failed to serialize run report: {e}")))
}

pub fn render_ingest(report: &IngestReport) -> String {
    format!(
        "indexed {} chunk(s) from {} characters into `{}`",
        report.chunks, report.chars, report.collection
    )
}

/// Effective configuration as TOML, with the API key masked.
pub fn render_config(config: &TokenDietConfig) -> Result<String, TokenDietError> {
    let mut shown = config.clone();
    if shown.provider.api_key.is_some() {
        shown.provider.api_key = Some(REDACTED.to_string());
    }
    toml::to_string_pretty(&shown)
        .map_err(|e| TokenDietError::Internal(format!("failed to serialize config: {e}")))
}

// SPDX-FileCopyrightText: 2026 Token-Diet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Response quality scoring via an evaluator model.
//!
//! Two verdict formats are supported. In `score` mode the evaluator replies
//! with an integer 1-10; anything unparseable scores [`FAIL_SAFE_SCORE`]. In
//! `pass_fail` mode the first whole word [`PASS_MARKER`] or [`FAIL_MARKER`]
//! decides the verdict, which is mapped onto the numeric scale so the control
//! loop has a single gate.

use std::num::IntErrorKind;
use std::sync::Arc;
use std::time::Duration;

use tokendiet_config::model::{JudgeConfig, JudgeMode};
use tokendiet_core::types::ProviderRequest;
use tokendiet_core::{ProviderAdapter, TokenDietError};
use tracing::{info, warn};

use crate::executor::complete_within;
use crate::state::StateDelta;

pub const SCORE_INSTRUCTIONS: &str = "You are a strict QA evaluator.\n\
Score the AI answer from 1 to 10.\n\
Score 8–10 if the answer directly addresses the question.\n\
Score 1–4 if it avoids, deflects, or lacks information.\n\
Reply with ONLY the number.";

pub const PASS_FAIL_INSTRUCTIONS: &str = "You are a strict QA evaluator.\n\
Reply PASS if the AI answer directly addresses the question.\n\
Reply FAIL if it avoids, deflects, or lacks information.\n\
Reply with ONLY the word PASS or FAIL.";

/// Score used when a numeric verdict cannot be parsed.
pub const FAIL_SAFE_SCORE: u8 = 3;

pub const PASS_MARKER: &str = "PASS";
pub const FAIL_MARKER: &str = "FAIL";
pub const PASS_SCORE: u8 = 10;
pub const FAIL_SCORE: u8 = 1;

pub fn build_user_turn(query: &str, response: &str) -> String {
    format!("User Question:\n{query}\n\nAI Response:\n{response}")
}

/// Parses a bare integer verdict, clamped into 1..=10.
///
/// Integers too large for `i64` saturate to the nearest bound.
pub fn parse_score(raw: &str) -> Option<u8> {
    let value: i64 = match raw.trim().parse() {
        Ok(value) => value,
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => i64::MAX,
            IntErrorKind::NegOverflow => i64::MIN,
            _ => return None,
        },
    };
    // Clamped into 1..=10, so the cast cannot truncate.
    Some(value.clamp(1, 10) as u8)
}

/// Whether a pass/fail verdict passes (case-insensitive, whole words only).
///
/// The first `PASS` or `FAIL` word decides, so "FAIL: does not pass" fails
/// and words like "bypass" never count.
pub fn verdict_passes(raw: &str) -> bool {
    raw.split(|c: char| !c.is_ascii_alphabetic())
        .map(str::to_ascii_uppercase)
        .find(|word| word == PASS_MARKER || word == FAIL_MARKER)
        .is_some_and(|word| word == PASS_MARKER)
}

/// Maps an evaluator reply onto the 1-10 scale for the given mode.
pub fn score_verdict(raw: &str, mode: JudgeMode) -> u8 {
    match mode {
        JudgeMode::Score => parse_score(raw).unwrap_or_else(|| {
            warn!(
                verdict = raw,
                fallback = FAIL_SAFE_SCORE,
                "unparseable judge verdict, using fail-safe score"
            );
            FAIL_SAFE_SCORE
        }),
        JudgeMode::PassFail => {
            if verdict_passes(raw) {
                PASS_SCORE
            } else {
                FAIL_SCORE
            }
        }
    }
}

/// Scores executor responses with an evaluator model.
pub struct Judge {
    provider: Arc<dyn ProviderAdapter>,
    model: String,
    mode: JudgeMode,
    max_tokens: u32,
    timeout: Duration,
}

impl Judge {
    pub fn new(provider: Arc<dyn ProviderAdapter>, config: &JudgeConfig, timeout: Duration) -> Self {
        Self {
            provider,
            model: config.model.clone(),
            mode: config.mode,
            max_tokens: config.max_tokens,
            timeout,
        }
    }

    /// Scores `response` as an answer to `query` and returns the `Judged` delta.
    ///
    /// Parse failures are recovered locally; transport failures and
    /// timeouts propagate.
    pub async fn evaluate(&self, query: &str, response: &str) -> Result<StateDelta, TokenDietError> {
        let instructions = match self.mode {
            JudgeMode::Score => SCORE_INSTRUCTIONS,
            JudgeMode::PassFail => PASS_FAIL_INSTRUCTIONS,
        };
        let request = ProviderRequest::single_turn(
            self.model.as_str(),
            instructions,
            build_user_turn(query, response),
            self.max_tokens,
        );

        let verdict = complete_within(self.provider.as_ref(), request, self.timeout).await?;
        let score = score_verdict(&verdict.content, self.mode);
        info!(score, mode = ?self.mode, "judge scored response");

        Ok(StateDelta::Judged {
            score,
            usage: verdict.usage,
        })
    }
}

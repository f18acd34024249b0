// SPDX-FileCopyrightText: 2026 Token-Diet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-query run state, stage deltas, and the termination policy.
//!
//! A run moves through `Prune -> Route -> Execute -> Judge` and then either
//! ends or loops back to `Prune`. Each stage produces a [`StateDelta`] that is
//! merged into the [`RunState`]; the branch after judging is decided by the
//! pure function [`decide_next_step`].

use serde::Serialize;
use strum::Display;
use tokendiet_core::TokenUsage;

/// Upper bound on executor passes per run.
pub const MAX_ITERATIONS: u32 = 3;

/// Judge score at or above which a response is accepted.
pub const ACCEPT_SCORE: u8 = 7;

/// Stages of the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    Prune,
    Route,
    Execute,
    Judge,
}

/// Branch taken after the judge has scored a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum NextStep {
    /// Score below threshold with retries left: prune again with the same query.
    ContinuePruning,
    /// Score met the acceptance threshold.
    Accept,
    /// Retry budget spent; the last response is returned as-is.
    Exhausted,
}

/// How a run terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RunOutcome {
    Accepted,
    Exhausted,
}

/// Decides what follows a judge pass.
///
/// Acceptance is checked before the iteration bound, so a passing score on
/// the last allowed iteration is still reported as accepted. A missing score
/// never accepts.
pub fn decide_next_step(quality_score: Option<u8>, iteration_count: u32) -> NextStep {
    if quality_score.is_some_and(|score| score >= ACCEPT_SCORE) {
        NextStep::Accept
    } else if iteration_count >= MAX_ITERATIONS {
        NextStep::Exhausted
    } else {
        NextStep::ContinuePruning
    }
}

/// Partial update produced by one stage.
#[derive(Debug, Clone, PartialEq)]
pub enum StateDelta {
    Pruned {
        context: String,
        original_token_count: usize,
        final_token_count: usize,
        money_saved: f64,
    },
    Routed {
        model: String,
        reason: String,
    },
    /// One executor pass; bumps the iteration counter.
    Executed {
        response: String,
        usage: TokenUsage,
    },
    Judged {
        score: u8,
        usage: TokenUsage,
    },
}

impl StateDelta {
    /// The stage that emits this delta.
    pub fn stage(&self) -> Stage {
        match self {
            StateDelta::Pruned { .. } => Stage::Prune,
            StateDelta::Routed { .. } => Stage::Route,
            StateDelta::Executed { .. } => Stage::Execute,
            StateDelta::Judged { .. } => Stage::Judge,
        }
    }
}

/// Mutable record threaded through one query.
#[derive(Debug, Clone)]
pub struct RunState {
    /// The user question, fixed for the run.
    pub prompt: String,
    /// Caller-supplied context; every pruning step starts from this.
    pub source_context: String,
    /// Context sent to the executor on the current iteration.
    pub context: String,
    pub chosen_model: String,
    pub routing_reason: String,
    pub response: String,
    /// `None` until the first judge pass.
    pub quality_score: Option<u8>,
    pub iteration_count: u32,
    pub original_token_count: usize,
    pub final_token_count: usize,
    pub money_saved: f64,
    /// Provider usage summed over every executor and judge call.
    pub usage: TokenUsage,
}

impl RunState {
    pub fn new(prompt: impl Into<String>, initial_context: impl Into<String>) -> Self {
        let source_context = initial_context.into();
        Self {
            prompt: prompt.into(),
            context: source_context.clone(),
            source_context,
            chosen_model: String::new(),
            routing_reason: String::new(),
            response: String::new(),
            quality_score: None,
            iteration_count: 0,
            original_token_count: 0,
            final_token_count: 0,
            money_saved: 0.0,
            usage: TokenUsage::default(),
        }
    }

    /// Merges a stage delta into the state.
    pub fn apply(&mut self, delta: StateDelta) {
        match delta {
            StateDelta::Pruned {
                context,
                original_token_count,
                final_token_count,
                money_saved,
            } => {
                self.context = context;
                self.original_token_count = original_token_count;
                self.final_token_count = final_token_count;
                self.money_saved = money_saved;
            }
            StateDelta::Routed { model, reason } => {
                self.chosen_model = model;
                self.routing_reason = reason;
            }
            StateDelta::Executed { response, usage } => {
                self.response = response;
                self.iteration_count += 1;
                self.usage += usage;
            }
            StateDelta::Judged { score, usage } => {
                self.quality_score = Some(score);
                self.usage += usage;
            }
        }
    }

    /// Consumes the state into the caller-facing report.
    pub fn into_report(self, outcome: RunOutcome) -> RunReport {
        RunReport {
            prompt: self.prompt,
            response: self.response,
            chosen_model: self.chosen_model,
            routing_reason: self.routing_reason,
            quality_score: self.quality_score,
            iteration_count: self.iteration_count,
            original_token_count: self.original_token_count,
            final_token_count: self.final_token_count,
            money_saved: self.money_saved,
            usage: self.usage,
            outcome,
        }
    }
}

/// Final state of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub prompt: String,
    pub response: String,
    pub chosen_model: String,
    pub routing_reason: String,
    pub quality_score: Option<u8>,
    pub iteration_count: u32,
    pub original_token_count: usize,
    pub final_token_count: usize,
    pub money_saved: f64,
    pub usage: TokenUsage,
    pub outcome: RunOutcome,
}

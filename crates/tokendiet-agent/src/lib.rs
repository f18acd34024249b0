// SPDX-FileCopyrightText: 2026 Token-Diet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retrieve, route, generate, evaluate control loop for the Token-Diet pipeline.
//!
//! [`TokenDietAgent::run_query`] drives one query through
//! `Prune -> Route -> Execute -> Judge`, looping back to `Prune` while the
//! judge score is below [`ACCEPT_SCORE`] and fewer than [`MAX_ITERATIONS`]
//! executor passes have run. Every external service is injected, so the
//! agent can be shared across concurrent queries behind an `Arc`.

pub mod executor;
pub mod judge;
pub mod pruner;
pub mod state;

pub use executor::Executor;
pub use judge::Judge;
pub use pruner::{PruneOutcome, SemanticPruner};
pub use state::{
    ACCEPT_SCORE, MAX_ITERATIONS, NextStep, RunOutcome, RunReport, RunState, Stage, StateDelta,
    decide_next_step,
};

use std::sync::Arc;
use std::time::Duration;

use tokendiet_config::TokenDietConfig;
use tokendiet_core::{ChunkRetriever, ProviderAdapter, TokenCounter, TokenDietError};
use tokendiet_cost::{PriceTable, money_saved};
use tokendiet_router::ModelRouter;
use tracing::{debug, info};

/// Coordinates the pruner, router, executor, and judge for each query.
pub struct TokenDietAgent {
    pruner: SemanticPruner,
    router: ModelRouter,
    executor: Executor,
    judge: Judge,
    prices: PriceTable,
    top_k: usize,
    retry_k_step: usize,
}

impl TokenDietAgent {
    /// Builds an agent from configuration and injected services.
    ///
    /// `provider` serves both the executor and the judge.
    pub fn new(
        config: &TokenDietConfig,
        provider: Arc<dyn ProviderAdapter>,
        retriever: Arc<dyn ChunkRetriever>,
        counter: Arc<TokenCounter>,
    ) -> Self {
        let timeout = Duration::from_secs(config.provider.timeout_secs);
        info!(
            agent_name = config.agent.name.as_str(),
            top_k = config.retrieval.top_k,
            judge_mode = ?config.judge.mode,
            "agent initialized"
        );

        Self {
            pruner: SemanticPruner::new(retriever, counter.clone()),
            router: ModelRouter::new(config.routing.clone(), counter),
            executor: Executor::new(provider.clone(), &config.provider),
            judge: Judge::new(provider, &config.judge, timeout),
            prices: PriceTable::from_config(&config.pricing),
            top_k: config.retrieval.top_k,
            retry_k_step: config.retrieval.retry_k_step,
        }
    }

    /// Overrides the timeout applied to executor calls.
    pub fn with_executor_timeout(mut self, timeout: Duration) -> Self {
        self.executor = self.executor.with_timeout(timeout);
        self
    }

    /// Number of chunks to retrieve after `completed` executor passes.
    fn k_for_iteration(&self, completed: u32) -> usize {
        self.top_k
            .saturating_add(self.retry_k_step.saturating_mul(completed as usize))
    }

    /// Runs one query to a terminal decision.
    ///
    /// Errors from retrieval, the provider, or a timeout abort the run; no
    /// partial state is returned.
    pub async fn run_query(
        &self,
        prompt: &str,
        initial_context: &str,
    ) -> Result<RunReport, TokenDietError> {
        let mut state = RunState::new(prompt, initial_context);
        info!(prompt_chars = prompt.chars().count(), "run started");

        loop {
            let k = self.k_for_iteration(state.iteration_count);
            let pruned = self
                .pruner
                .prune(&state.prompt, &state.source_context, k)
                .await?;
            let saved = money_saved(
                &self.prices,
                pruned.original_tokens,
                pruned.final_tokens,
                self.router.premium_model(),
                self.router.economy_model(),
            );
            self.advance(
                &mut state,
                StateDelta::Pruned {
                    context: pruned.context,
                    original_token_count: pruned.original_tokens,
                    final_token_count: pruned.final_tokens,
                    money_saved: saved,
                },
            );

            let decision = self.router.select_model(&state.prompt);
            self.advance(
                &mut state,
                StateDelta::Routed {
                    model: decision.model,
                    reason: decision.reason,
                },
            );

            let executed = self
                .executor
                .execute(&state.chosen_model, &state.context, &state.prompt)
                .await?;
            self.advance(&mut state, executed);

            let judged = self.judge.evaluate(&state.prompt, &state.response).await?;
            self.advance(&mut state, judged);

            let next = decide_next_step(state.quality_score, state.iteration_count);
            info!(
                iteration = state.iteration_count,
                score = state.quality_score,
                next = %next,
                "judge decision"
            );

            match next {
                NextStep::ContinuePruning => continue,
                NextStep::Accept => return Ok(self.finish(state, RunOutcome::Accepted)),
                NextStep::Exhausted => return Ok(self.finish(state, RunOutcome::Exhausted)),
            }
        }
    }

    fn advance(&self, state: &mut RunState, delta: StateDelta) {
        debug!(stage = %delta.stage(), iteration = state.iteration_count, "stage complete");
        state.apply(delta);
    }

    fn finish(&self, state: RunState, outcome: RunOutcome) -> RunReport {
        info!(
            outcome = %outcome,
            iterations = state.iteration_count,
            model = state.chosen_model.as_str(),
            original_tokens = state.original_token_count,
            final_tokens = state.final_token_count,
            money_saved = state.money_saved,
            "run finished"
        );
        state.into_report(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokendiet_test_utils::{FixedRetriever, MockProvider};

    fn agent_with(
        config: &TokenDietConfig,
        provider: Arc<MockProvider>,
        retriever: Arc<FixedRetriever>,
    ) -> TokenDietAgent {
        TokenDietAgent::new(config, provider, retriever, Arc::new(TokenCounter::default()))
    }

    #[test]
    fn agent_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TokenDietAgent>();
    }

    #[tokio::test]
    async fn k_widens_only_when_step_configured() {
        let mut config = TokenDietConfig::default();
        config.retrieval.top_k = 2;
        let retriever = Arc::new(FixedRetriever::new(["chunk"]));
        let provider = Arc::new(MockProvider::with_responses(["a", "1", "b", "2", "c", "3"]));
        let agent = agent_with(&config, provider, retriever.clone());
        agent.run_query("q", "context").await.unwrap();
        let ks: Vec<usize> = retriever.calls().into_iter().map(|(_, k)| k).collect();
        assert_eq!(ks, vec![2, 2, 2]);

        config.retrieval.retry_k_step = 3;
        let retriever = Arc::new(FixedRetriever::new(["chunk"]));
        let provider = Arc::new(MockProvider::with_responses(["a", "1", "b", "2", "c", "3"]));
        let agent = agent_with(&config, provider, retriever.clone());
        agent.run_query("q", "context").await.unwrap();
        let ks: Vec<usize> = retriever.calls().into_iter().map(|(_, k)| k).collect();
        assert_eq!(ks, vec![2, 5, 8]);
    }

    #[tokio::test]
    async fn every_iteration_prunes_from_source_context() {
        let config = TokenDietConfig::default();
        let retriever = Arc::new(FixedRetriever::empty());
        let provider = Arc::new(MockProvider::with_responses(["a", "2", "b", "9"]));
        let agent = agent_with(&config, provider.clone(), retriever);

        let report = agent.run_query("q", "the original context").await.unwrap();
        assert_eq!(report.iteration_count, 2);
        let requests = provider.requests().await;
        assert!(requests[2].user().unwrap().contains("the original context"));
    }

    #[tokio::test]
    async fn retriever_failure_aborts_before_any_model_call() {
        let config = TokenDietConfig::default();
        let provider = Arc::new(MockProvider::new());
        let agent = agent_with(
            &config,
            provider.clone(),
            Arc::new(FixedRetriever::failing("index unavailable")),
        );
        assert!(agent.run_query("q", "c").await.is_err());
        assert_eq!(provider.call_count().await, 0);
    }
}

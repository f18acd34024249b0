// SPDX-FileCopyrightText: 2026 Token-Diet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end runs of the control loop against mock services.

use std::sync::Arc;
use std::time::Duration;

use tokendiet_agent::{MAX_ITERATIONS, RunOutcome, TokenDietAgent};
use tokendiet_config::TokenDietConfig;
use tokendiet_config::model::{default_economy_model, default_premium_model};
use tokendiet_core::{TokenCounter, TokenDietError};
use tokendiet_retrieval::{ChunkStore, ContextRetriever};
use tokendiet_test_utils::{FixedRetriever, MockEmbedder, MockProvider};

fn filler_context(counter: &TokenCounter, min_tokens: usize) -> String {
    let mut text = String::from("Paris is the capital of France. ");
    while counter.count_tokens(&text) < min_tokens {
        text.push_str("The quarterly logistics report lists shipping volumes for every regional depot. ");
    }
    text
}

#[tokio::test]
async fn low_scores_exhaust_after_three_iterations() {
    let provider = Arc::new(MockProvider::with_responses([
        "first answer",
        "4",
        "second answer",
        "5",
        "third answer",
        "6",
    ]));
    let agent = TokenDietAgent::new(
        &TokenDietConfig::default(),
        provider.clone(),
        Arc::new(FixedRetriever::new(["some chunk"])),
        Arc::new(TokenCounter::default()),
    );

    let report = agent
        .run_query("What is the capital of France?", "a context")
        .await
        .unwrap();

    assert_eq!(report.iteration_count, MAX_ITERATIONS);
    assert_eq!(report.quality_score, Some(6));
    assert_eq!(report.response, "third answer");
    assert_eq!(report.outcome, RunOutcome::Exhausted);
    assert_eq!(provider.call_count().await, 6);
}

#[tokio::test]
async fn high_first_score_accepts_after_one_iteration() {
    let provider = Arc::new(MockProvider::with_responses(["Paris.", "9"]));
    let agent = TokenDietAgent::new(
        &TokenDietConfig::default(),
        provider.clone(),
        Arc::new(FixedRetriever::new(["Paris is the capital of France."])),
        Arc::new(TokenCounter::default()),
    );

    let report = agent.run_query("Capital of France?", "ctx").await.unwrap();
    assert_eq!(report.iteration_count, 1);
    assert_eq!(report.outcome, RunOutcome::Accepted);
    assert_eq!(report.response, "Paris.");
    assert_eq!(provider.call_count().await, 2);
    assert!(report.usage.total() > 0);
}

#[tokio::test]
async fn unparseable_verdict_retries_with_fail_safe_score() {
    let provider = Arc::new(MockProvider::with_responses([
        "maybe", "I think 8", "better", "7",
    ]));
    let agent = TokenDietAgent::new(
        &TokenDietConfig::default(),
        provider,
        Arc::new(FixedRetriever::empty()),
        Arc::new(TokenCounter::default()),
    );

    let report = agent.run_query("q", "ctx").await.unwrap();
    assert_eq!(report.iteration_count, 2);
    assert_eq!(report.quality_score, Some(7));
    assert_eq!(report.response, "better");
}

#[tokio::test]
async fn paris_document_is_pruned_against_large_context() {
    let counter = Arc::new(TokenCounter::default());
    let store = Arc::new(ChunkStore::open_in_memory().await.unwrap());
    let retriever = Arc::new(ContextRetriever::new(
        store,
        Arc::new(MockEmbedder::new()),
        "token_diet_context",
    ));
    let ingested = retriever
        .ingest("Paris is the capital of France.", 500)
        .await
        .unwrap();
    assert_eq!(ingested.chunks, 1);

    let original = filler_context(&counter, 500);
    let mut config = TokenDietConfig::default();
    config.retrieval.top_k = 1;

    let provider = Arc::new(MockProvider::with_responses(["Paris.", "10"]));
    let agent = TokenDietAgent::new(&config, provider.clone(), retriever, counter.clone());

    let report = agent
        .run_query("What is the capital of France?", &original)
        .await
        .unwrap();

    assert!(report.original_token_count >= 500);
    assert!(report.final_token_count < report.original_token_count);
    assert_eq!(report.original_token_count, counter.count_tokens(&original));
    assert!(report.money_saved > 0.0);

    let requests = provider.requests().await;
    assert_eq!(
        requests[0].user(),
        Some("Context:\nParis is the capital of France.\n\nQuestion:\nWhat is the capital of France?")
    );
}

#[tokio::test]
async fn greeting_routes_to_economy_and_debug_to_premium() {
    let provider = Arc::new(MockProvider::with_responses(["fine", "8", "look at the heap", "8"]));
    let agent = TokenDietAgent::new(
        &TokenDietConfig::default(),
        provider,
        Arc::new(FixedRetriever::empty()),
        Arc::new(TokenCounter::default()),
    );

    let greeting = agent.run_query("Hi, how are you?", "ctx").await.unwrap();
    assert_eq!(greeting.chosen_model, default_economy_model());

    let debugging = agent.run_query("debug this memory leak", "ctx").await.unwrap();
    assert_eq!(debugging.chosen_model, default_premium_model());
}

#[tokio::test]
async fn force_model_pins_every_query() {
    let mut config = TokenDietConfig::default();
    config.routing.force_model = Some("pinned-model".into());
    let provider = Arc::new(MockProvider::with_responses(["ok", "9"]));
    let agent = TokenDietAgent::new(
        &config,
        provider.clone(),
        Arc::new(FixedRetriever::empty()),
        Arc::new(TokenCounter::default()),
    );

    let report = agent.run_query("why is the sky blue?", "ctx").await.unwrap();
    assert_eq!(report.chosen_model, "pinned-model");
    assert_eq!(provider.requests().await[0].model, "pinned-model");
    // The judge keeps its own model.
    assert_eq!(
        provider.requests().await[1].model,
        config.judge.model
    );
}

#[tokio::test]
async fn provider_failure_aborts_the_run() {
    let provider = Arc::new(MockProvider::with_responses(["answer", "2"]));
    provider.add_failure("upstream 500").await;
    let agent = TokenDietAgent::new(
        &TokenDietConfig::default(),
        provider,
        Arc::new(FixedRetriever::empty()),
        Arc::new(TokenCounter::default()),
    );

    let err = agent.run_query("q", "ctx").await.unwrap_err();
    assert!(matches!(err, TokenDietError::Provider { .. }));
}

#[tokio::test(start_paused = true)]
async fn executor_timeout_aborts_the_run() {
    let provider = Arc::new(
        MockProvider::with_responses(["slow"]).with_delay(Duration::from_secs(600)),
    );
    let agent = TokenDietAgent::new(
        &TokenDietConfig::default(),
        provider,
        Arc::new(FixedRetriever::empty()),
        Arc::new(TokenCounter::default()),
    )
    .with_executor_timeout(Duration::from_secs(1));

    let err = agent.run_query("q", "ctx").await.unwrap_err();
    assert!(matches!(err, TokenDietError::Timeout { .. }));
}

#[tokio::test]
async fn concurrent_queries_share_one_agent() {
    // Calls interleave across tasks, so every reply doubles as a passing verdict.
    let provider = Arc::new(MockProvider::with_responses(["8", "8", "8", "8"]));
    let agent = Arc::new(TokenDietAgent::new(
        &TokenDietConfig::default(),
        provider.clone(),
        Arc::new(FixedRetriever::empty()),
        Arc::new(TokenCounter::default()),
    ));

    let mut handles = Vec::new();
    for i in 0..2 {
        let agent = agent.clone();
        handles.push(tokio::spawn(async move {
            agent.run_query(&format!("question {i}"), "ctx").await
        }));
    }
    for handle in handles {
        let report = handle.await.unwrap().unwrap();
        assert_eq!(report.iteration_count, 1);
    }
}

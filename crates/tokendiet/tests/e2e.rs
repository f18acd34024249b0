// SPDX-FileCopyrightText: 2026 Token-Diet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the complete pipeline: file extraction, ingestion
//! into an on-disk index, and the control loop with a scripted provider.
//!
//! Each test uses its own temp directory and is order-insensitive.

use std::sync::Arc;

use tokendiet_agent::{RunOutcome, TokenDietAgent};
use tokendiet_config::TokenDietConfig;
use tokendiet_core::TokenCounter;
use tokendiet_retrieval::{ChunkStore, ContextRetriever, extract_text_from_file};
use tokendiet_test_utils::{MockEmbedder, MockProvider};

async fn disk_retriever(dir: &tempfile::TempDir, collection: &str) -> Arc<ContextRetriever> {
    let store = ChunkStore::open(dir.path().join("index.db"), true)
        .await
        .unwrap();
    Arc::new(ContextRetriever::new(
        Arc::new(store),
        Arc::new(MockEmbedder::new()),
        collection,
    ))
}

#[tokio::test]
async fn document_to_accepted_answer() {
    let dir = tempfile::tempdir().unwrap();
    let doc_path = dir.path().join("france.txt");
    let mut doc = String::from("Paris is the capital of France.");
    doc.push_str(&" Rainfall tables for agricultural regions follow.".repeat(80));
    std::fs::write(&doc_path, &doc).unwrap();

    let text = extract_text_from_file(&doc_path).await.unwrap();
    assert_eq!(text, doc);

    let retriever = disk_retriever(&dir, "token_diet_context").await;
    let ingested = retriever.ingest(&text, 31).await.unwrap();
    assert!(ingested.chunks > 1);

    let mut config = TokenDietConfig::default();
    config.retrieval.top_k = 1;
    let provider = Arc::new(MockProvider::with_responses(["Paris.", "10"]));
    let agent = TokenDietAgent::new(
        &config,
        provider.clone(),
        retriever,
        Arc::new(TokenCounter::default()),
    );

    let report = agent
        .run_query("What is the capital of France?", &text)
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::Accepted);
    assert_eq!(report.iteration_count, 1);
    assert!(report.final_token_count < report.original_token_count);
    assert_eq!(report.chosen_model, config.routing.economy_model);
    assert_eq!(provider.call_count().await, 2);
}

#[tokio::test]
async fn reingesting_is_idempotent_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let text = "abcdefghij".repeat(10);

    {
        let retriever = disk_retriever(&dir, "docs").await;
        retriever.ingest(&text, 25).await.unwrap();
    }
    let retriever = disk_retriever(&dir, "docs").await;
    retriever.ingest(&text, 25).await.unwrap();

    assert_eq!(retriever.store().count("docs").await.unwrap(), 4);
}

#[tokio::test]
async fn collections_are_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let a = disk_retriever(&dir, "a").await;
    let b = disk_retriever(&dir, "b").await;

    a.ingest("only in collection a", 500).await.unwrap();
    assert_eq!(a.store().count("a").await.unwrap(), 1);
    assert!(b.retrieve_scored("collection a", 3).await.unwrap().is_empty());
}

#[tokio::test]
async fn weak_answers_exhaust_and_return_last_response() {
    let dir = tempfile::tempdir().unwrap();
    let retriever = disk_retriever(&dir, "docs").await;
    retriever
        .ingest("The warranty covers parts for two years.", 500)
        .await
        .unwrap();

    let provider = Arc::new(MockProvider::with_responses([
        "Information not available.",
        "2",
        "Information not available.",
        "2",
        "Maybe two years?",
        "5",
    ]));
    let agent = TokenDietAgent::new(
        &TokenDietConfig::default(),
        provider,
        retriever,
        Arc::new(TokenCounter::default()),
    );

    let report = agent
        .run_query("How long is the warranty?", "The warranty covers parts for two years.")
        .await
        .unwrap();
    assert_eq!(report.outcome, RunOutcome::Exhausted);
    assert_eq!(report.iteration_count, 3);
    assert_eq!(report.response, "Maybe two years?");
    assert_eq!(report.quality_score, Some(5));
}

// SPDX-FileCopyrightText: 2026 Token-Diet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tokendiet ingest` and `tokendiet ask` command implementations.

use std::path::Path;
use std::sync::Arc;

use tokendiet_agent::{RunReport, TokenDietAgent};
use tokendiet_config::TokenDietConfig;
use tokendiet_core::{TokenCounter, TokenDietError};
use tokendiet_openai::OpenAiProvider;
use tokendiet_retrieval::{
    ChunkStore, ContextRetriever, IngestReport, ModelManager, extract_text_from_file,
};
use tracing::info;

use crate::report;

/// Opens the configured index with the local ONNX embedder.
///
/// Downloads the embedding model on first use.
async fn open_retriever(config: &TokenDietConfig) -> Result<Arc<ContextRetriever>, TokenDietError> {
    let store = Arc::new(ChunkStore::from_config(&config.storage).await?);
    let embedder = ModelManager::from_config(&config.retrieval)
        .load_embedder()
        .await?;
    Ok(Arc::new(ContextRetriever::new(
        store,
        Arc::new(embedder),
        config.retrieval.collection.clone(),
    )))
}

/// Extracts `path` and indexes its text. Returns the text with the report.
pub async fn ingest_document(
    retriever: &ContextRetriever,
    path: &Path,
    chunk_size: usize,
    fresh: bool,
) -> Result<(String, IngestReport), TokenDietError> {
    let text = extract_text_from_file(path).await?;
    if fresh {
        let removed = retriever.store().clear_collection(retriever.collection()).await?;
        info!(removed, collection = retriever.collection(), "collection cleared");
    }
    let report = retriever.ingest(&text, chunk_size).await?;
    Ok((text, report))
}

/// Indexes `path` and answers `question` with the document text as the
/// initial context.
///
/// Without `fresh`, retrieval spans every document already indexed in the
/// collection, not only `path`.
pub async fn answer_from_file(
    agent: &TokenDietAgent,
    retriever: &ContextRetriever,
    path: &Path,
    question: &str,
    chunk_size: usize,
    fresh: bool,
) -> Result<RunReport, TokenDietError> {
    let (text, ingested) = ingest_document(retriever, path, chunk_size, fresh).await?;
    info!(
        path = %path.display(),
        chunks = ingested.chunks,
        "document ready"
    );
    agent.run_query(question, &text).await
}

pub async fn run_ingest(
    config: &TokenDietConfig,
    file: &Path,
    fresh: bool,
) -> Result<(), TokenDietError> {
    let retriever = open_retriever(config).await?;
    let (_, ingested) =
        ingest_document(&retriever, file, config.retrieval.chunk_size, fresh).await?;
    println!("{}", report::render_ingest(&ingested));
    Ok(())
}

pub async fn run_ask(
    config: &TokenDietConfig,
    file: &Path,
    question: &str,
    json: bool,
    fresh: bool,
) -> Result<(), TokenDietError> {
    // Fail on a missing API key before downloading or loading anything.
    let provider = Arc::new(OpenAiProvider::new(&config.provider)?);
    let retriever = open_retriever(config).await?;
    let counter = Arc::new(TokenCounter::for_model(&config.pricing.tokenizer_model));
    let agent = TokenDietAgent::new(config, provider, retriever.clone(), counter);

    let run = answer_from_file(
        &agent,
        &retriever,
        file,
        question,
        config.retrieval.chunk_size,
        fresh,
    )
    .await?;

    if json {
        println!("{}", report::render_run_json(&run)?);
    } else {
        print!("{}", report::render_run(&run));
    }
    Ok(())
}

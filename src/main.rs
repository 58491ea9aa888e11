use std::env;
use std::path::Path;

use anyhow::Context;

use scanquery::config::AppConfig;
use scanquery::index::{QueryEngine, VectorIndex};
use scanquery::llm::{LlmProvider, OpenAiLikeProvider};
use scanquery::logging;
use scanquery::ocr::{OcrEngine, PaddleOcrClient};
use scanquery::reader::OcrDocumentReader;

/// Demonstration questions, one per demo image.
const DEMO_QUERIES: &[(&str, &str)] = &[
    (
        "What year was IPython born, and what working style does it encourage?",
        "scanned page",
    ),
    (
        "Which new capabilities does the 3.0 release announcement list?",
        "screenshot",
    ),
    ("How far is it to Changchun?", "road sign"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = env::args().nth(1).unwrap_or_else(|| "config.yml".to_string());
    let config =
        AppConfig::load(Path::new(&config_path)).context("failed to load configuration")?;
    logging::init(config.log_dir.as_deref().map(Path::new));

    let engine = PaddleOcrClient::new(&config.ocr).context("failed to construct OCR client")?;
    let reader = OcrDocumentReader::new(engine);
    {
        let info = reader.engine().info();
        tracing::info!(
            "using {} engine: {} ({}, {})",
            reader.engine().name(),
            info.model_version,
            info.lang,
            info.device
        );
    }

    let documents = reader.load_documents(&config.sources).await;
    if documents.is_empty() {
        tracing::warn!("no documents were produced; nothing to index");
        return Ok(());
    }
    for document in &documents {
        tracing::info!(
            "document from {}: {} blocks, avg confidence {}",
            document.metadata.source_path,
            document.metadata.num_text_blocks,
            document.metadata.avg_confidence
        );
    }

    let provider = OpenAiLikeProvider::new(config.llm.base_url.clone(), config.llm.api_key());
    if !provider.health_check().await.unwrap_or(false) {
        tracing::warn!("llm provider at {} is not reachable; queries may fail", config.llm.base_url);
    }
    let index = VectorIndex::build(documents, &provider, &config.embedding)
        .await
        .context("failed to build vector index")?;
    let query_engine = QueryEngine::new(index, provider, &config);

    for (question, description) in DEMO_QUERIES {
        run_query(&query_engine, question, description).await;
    }

    Ok(())
}

async fn run_query<P: LlmProvider>(engine: &QueryEngine<P>, question: &str, description: &str) {
    match engine.query(question).await {
        Ok(answer) => {
            println!("\n================= {} =================", description);
            println!("Query: {}", question);
            println!("Answer: {}\n", answer);
        }
        Err(err) => tracing::error!("query '{}' failed: {}", question, err),
    }
}

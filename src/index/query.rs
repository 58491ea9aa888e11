use crate::config::{AppConfig, EmbeddingConfig, LlmConfig, RetrievalConfig};
use crate::core::errors::PipelineError;
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};
use super::store::{clip_for_embedding, IndexedRecord, VectorIndex};

const ANSWER_INSTRUCTIONS: &str = "You are a research assistant. Answer the question using only \
the context below. Each context entry carries its source image path. If the context does not \
contain the answer, say so plainly.";

/// Answers natural-language questions from an indexed document set.
pub struct QueryEngine<P> {
    index: VectorIndex,
    provider: P,
    llm: LlmConfig,
    embedding: EmbeddingConfig,
    retrieval: RetrievalConfig,
}

impl<P: LlmProvider> QueryEngine<P> {
    pub fn new(index: VectorIndex, provider: P, config: &AppConfig) -> Self {
        Self {
            index,
            provider,
            llm: config.llm.clone(),
            embedding: config.embedding.clone(),
            retrieval: config.retrieval.clone(),
        }
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    /// Embed the question, gather the top-k similar records, and ask the
    /// chat model to answer from them.
    pub async fn query(&self, question: &str) -> Result<String, PipelineError> {
        if self.index.is_empty() {
            return Err(PipelineError::InvalidInput(
                "cannot query an empty index".to_string(),
            ));
        }

        let input = clip_for_embedding(question, self.embedding.max_input_length);
        let embeddings = self.provider.embed(&[input], &self.embedding.model).await?;
        let query_embedding = embeddings.first().ok_or_else(|| {
            PipelineError::Provider("provider returned no embedding for the query".to_string())
        })?;

        let hits = self.index.search(
            query_embedding,
            self.retrieval.top_k,
            self.retrieval.similarity_threshold,
        )?;
        if hits.is_empty() {
            tracing::warn!("no documents cleared the similarity threshold for '{}'", question);
        }

        let context = format_context(&hits);
        let system = format!("{}\n\nContext:\n{}", ANSWER_INSTRUCTIONS, context);
        let request = ChatRequest::new(vec![
            ChatMessage::system(system),
            ChatMessage::user(question),
        ]);

        self.provider.chat(request, &self.llm.model).await
    }
}

/// Format retrieved records into a numbered context block with source
/// citations.
fn format_context(hits: &[(&IndexedRecord, f32)]) -> String {
    if hits.is_empty() {
        return "(no matching documents)".to_string();
    }

    let mut context = String::new();
    for (i, (entry, score)) in hits.iter().enumerate() {
        context.push_str(&format!(
            "[{}] (Source: {}, relevance: {:.2})\n{}\n\n",
            i + 1,
            entry.record.metadata.source_path,
            score,
            entry.record.text
        ));
    }
    context.trim_end().to_string()
}

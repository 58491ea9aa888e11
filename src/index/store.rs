use crate::config::EmbeddingConfig;
use crate::core::errors::PipelineError;
use crate::document::DocumentRecord;
use crate::llm::LlmProvider;
use crate::vector_math;

/// A document record paired with its embedding vector.
#[derive(Debug, Clone)]
pub struct IndexedRecord {
    pub record: DocumentRecord,
    pub embedding: Vec<f32>,
}

/// In-memory vector index over document records.
///
/// Embeddings are computed once at build time; search is a full cosine
/// scan, which is plenty for a handful of research documents.
pub struct VectorIndex {
    records: Vec<IndexedRecord>,
}

impl VectorIndex {
    /// Embed the records in batches and build the index.
    ///
    /// Fails when the provider returns a vector count that does not
    /// match the batch it was sent.
    pub async fn build(
        records: Vec<DocumentRecord>,
        provider: &dyn LlmProvider,
        config: &EmbeddingConfig,
    ) -> Result<Self, PipelineError> {
        let batch_size = config.batch_size.max(1);
        let mut indexed = Vec::with_capacity(records.len());

        for batch in records.chunks(batch_size) {
            let inputs: Vec<String> = batch
                .iter()
                .map(|record| clip_for_embedding(&record.text, config.max_input_length))
                .collect();
            let vectors = provider.embed(&inputs, &config.model).await?;
            if vectors.len() != batch.len() {
                return Err(PipelineError::Provider(format!(
                    "embedding count mismatch: sent {} inputs, got {} vectors",
                    batch.len(),
                    vectors.len()
                )));
            }
            for (record, embedding) in batch.iter().cloned().zip(vectors) {
                indexed.push(IndexedRecord { record, embedding });
            }
        }

        tracing::info!("indexed {} documents", indexed.len());
        Ok(Self { records: indexed })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rank all records against the query embedding, keep those at or
    /// above the threshold, and return at most `top_k`, best first.
    pub fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        threshold: f32,
    ) -> Result<Vec<(&IndexedRecord, f32)>, PipelineError> {
        if self.records.is_empty() {
            return Ok(Vec::new());
        }

        let candidates: Vec<&[f32]> = self
            .records
            .iter()
            .map(|entry| entry.embedding.as_slice())
            .collect();
        let ranked = vector_math::rank_descending_by_cosine(query_embedding, &candidates)?;

        Ok(ranked
            .into_iter()
            .filter(|(_, score)| *score >= threshold)
            .take(top_k)
            .map(|(idx, score)| (&self.records[idx], score))
            .collect())
    }
}

/// Clip a text to at most `max_chars` characters before it goes to the
/// embedding model, which enforces its own input length limit.
pub(crate) fn clip_for_embedding(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

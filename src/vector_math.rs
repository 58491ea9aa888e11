use std::cmp::Ordering;

use crate::core::errors::PipelineError;

pub fn cosine_similarity(query: &[f32], candidate: &[f32]) -> Result<f32, PipelineError> {
    if query.is_empty() || candidate.is_empty() {
        return Err(PipelineError::InvalidInput(
            "vectors must not be empty".to_string(),
        ));
    }
    if query.len() != candidate.len() {
        return Err(PipelineError::InvalidInput(format!(
            "vector length mismatch: {} != {}",
            query.len(),
            candidate.len()
        )));
    }

    let mut dot = 0.0f64;
    let mut query_sq = 0.0f64;
    let mut candidate_sq = 0.0f64;
    for (left, right) in query.iter().zip(candidate.iter()) {
        dot += (*left as f64) * (*right as f64);
        query_sq += (*left as f64).powi(2);
        candidate_sq += (*right as f64).powi(2);
    }

    let denom = query_sq.sqrt() * candidate_sq.sqrt();
    if denom <= f64::EPSILON {
        return Ok(0.0);
    }

    Ok((dot / denom).clamp(-1.0, 1.0) as f32)
}

pub fn rank_descending_by_cosine(
    query: &[f32],
    candidates: &[&[f32]],
) -> Result<Vec<(usize, f32)>, PipelineError> {
    let mut scores = Vec::with_capacity(candidates.len());
    for (idx, candidate) in candidates.iter().enumerate() {
        let score = cosine_similarity(query, candidate)?;
        scores.push((idx, score));
    }

    scores.sort_by(|left, right| right.1.partial_cmp(&left.1).unwrap_or(Ordering::Equal));
    Ok(scores)
}

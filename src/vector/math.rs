use crate::core::errors::{RagError, RemoteService};

fn check_lengths(query: &[f32], candidate: &[f32]) -> Result<(), RagError> {
    if query.len() != candidate.len() {
        return Err(RagError::remote(
            RemoteService::VectorStore,
            format!(
                "vector dimension mismatch: {} != {}",
                query.len(),
                candidate.len()
            ),
        ));
    }
    Ok(())
}

pub fn dot_product(query: &[f32], candidate: &[f32]) -> Result<f32, RagError> {
    check_lengths(query, candidate)?;
    Ok(query.iter().zip(candidate).map(|(a, b)| a * b).sum())
}

/// Zero-norm vectors score 0 against everything.
pub fn cosine_similarity(query: &[f32], candidate: &[f32]) -> Result<f32, RagError> {
    let dot = dot_product(query, candidate)?;
    let denom = l2_norm(query) * l2_norm(candidate);
    if denom <= f32::EPSILON {
        return Ok(0.0);
    }
    Ok(dot / denom)
}

fn l2_norm(vector: &[f32]) -> f32 {
    vector.iter().map(|v| v * v).sum::<f32>().sqrt()
}

//! Query-time retrieval: embed the query, search, rank, join.

use std::cmp::Ordering;
use std::sync::Arc;

use serde::Serialize;

use super::payload::{payload_page, payload_text};
use crate::core::errors::RagError;
use crate::llm::EmbeddingModel;
use crate::vector::{PointId, ScoredPoint, VectorIndex};

/// A ranked hit with its payload normalized to text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedChunk {
    pub id: PointId,
    pub score: f32,
    pub page: Option<u32>,
    pub text: String,
}

pub struct Retriever {
    embedder: Arc<dyn EmbeddingModel>,
    index: Arc<dyn VectorIndex>,
    collection: String,
    top_k: usize,
}

impl Retriever {
    pub fn new(
        embedder: Arc<dyn EmbeddingModel>,
        index: Arc<dyn VectorIndex>,
        collection: impl Into<String>,
        top_k: usize,
    ) -> Self {
        Self {
            embedder,
            index,
            collection: collection.into(),
            top_k,
        }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Context text for `query`: the best matches joined by newlines, or an
    /// empty string when nothing relevant is stored.
    pub async fn retrieve(&self, query: &str) -> Result<String, RagError> {
        let hits = self.retrieve_hits(query).await?;
        Ok(join_context(&hits))
    }

    pub async fn retrieve_hits(&self, query: &str) -> Result<Vec<RetrievedChunk>, RagError> {
        let vector = self.embedder.embed(query).await?;
        tracing::debug!(dimension = vector.len(), "Query embedded");

        let hits = self
            .index
            .search(&self.collection, &vector, self.top_k)
            .await?;
        tracing::debug!(hits = hits.len(), collection = %self.collection, "Search complete");

        Ok(rank(hits))
    }
}

/// Stable sort by descending score. NaN scores sink to the end.
fn rank(mut hits: Vec<ScoredPoint>) -> Vec<RetrievedChunk> {
    hits.sort_by(|a, b| match (a.score.is_nan(), b.score.is_nan()) {
        (false, false) => b.score.total_cmp(&a.score),
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (true, true) => Ordering::Equal,
    });

    hits.into_iter()
        .filter_map(|hit| {
            let text = payload_text(&hit.payload);
            if text.is_empty() {
                return None;
            }
            Some(RetrievedChunk {
                page: payload_page(&hit.payload),
                id: hit.id,
                score: hit.score,
                text,
            })
        })
        .collect()
}

pub fn join_context(hits: &[RetrievedChunk]) -> String {
    hits.iter()
        .map(|hit| hit.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

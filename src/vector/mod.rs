//! Vector index abstraction.
//!
//! - `VectorIndex`: collection management, upsert and nearest-neighbor search
//! - `QdrantIndex`: REST client for a Qdrant service
//! - `InMemoryIndex`: process-local brute-force index

mod math;
mod memory;
mod qdrant;

pub use math::{cosine_similarity, dot_product};
pub use memory::InMemoryIndex;
pub use qdrant::QdrantIndex;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::errors::RagError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Distance {
    Cosine,
    Dot,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollectionSpec {
    pub name: String,
    pub dimension: usize,
    pub distance: Distance,
}

impl CollectionSpec {
    pub fn cosine(name: impl Into<String>, dimension: usize) -> Self {
        Self {
            name: name.into(),
            dimension,
            distance: Distance::Cosine,
        }
    }
}

/// Payload stored with every point: the chunk text and its source page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointPayload {
    pub text: String,
    pub page: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexPoint {
    pub id: u64,
    pub vector: Vec<f32>,
    pub payload: PointPayload,
}

/// Qdrant accepts unsigned integers and UUID strings as point ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointId {
    Num(u64),
    Uuid(String),
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointId::Num(id) => write!(f, "{}", id),
            PointId::Uuid(id) => f.write_str(id),
        }
    }
}

/// One search hit. The payload is kept raw because older points may carry a
/// different shape than `PointPayload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPoint {
    pub id: PointId,
    pub score: f32,
    #[serde(default)]
    pub payload: Value,
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn collection_exists(&self, name: &str) -> Result<bool, RagError>;

    /// Not safe to call for an existing collection; check first.
    async fn create_collection(&self, spec: &CollectionSpec) -> Result<(), RagError>;

    /// Insert or replace the point with `point.id`.
    async fn upsert(&self, collection: &str, point: IndexPoint) -> Result<(), RagError>;

    /// Up to `limit` nearest neighbors. Ordering is implementation-defined.
    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredPoint>, RagError>;
}

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::math::{cosine_similarity, dot_product};
use super::{CollectionSpec, Distance, IndexPoint, PointId, ScoredPoint, VectorIndex};
use crate::core::errors::{RagError, RemoteService};

struct Collection {
    spec: CollectionSpec,
    points: BTreeMap<u64, IndexPoint>,
}

/// Process-local index with brute-force scoring.
///
/// Error cases mirror a remote store: creating an existing collection,
/// touching a missing one and dimension mismatches all fail as vector-store
/// errors. Search results come back in id order, not score order.
#[derive(Default)]
pub struct InMemoryIndex {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn point_count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map(|c| c.points.len())
            .unwrap_or(0)
    }

    pub async fn points(&self, collection: &str) -> Vec<IndexPoint> {
        self.collections
            .read()
            .await
            .get(collection)
            .map(|c| c.points.values().cloned().collect())
            .unwrap_or_default()
    }
}

fn check_dimension(spec: &CollectionSpec, len: usize) -> Result<(), RagError> {
    if len == spec.dimension {
        return Ok(());
    }
    Err(RagError::remote(
        RemoteService::VectorStore,
        format!(
            "vector dimension error: expected dim: {}, got {}",
            spec.dimension, len
        ),
    ))
}

fn missing_collection(name: &str) -> RagError {
    RagError::remote(
        RemoteService::VectorStore,
        format!("collection '{}' not found", name),
    )
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn collection_exists(&self, name: &str) -> Result<bool, RagError> {
        Ok(self.collections.read().await.contains_key(name))
    }

    async fn create_collection(&self, spec: &CollectionSpec) -> Result<(), RagError> {
        let mut collections = self.collections.write().await;
        if collections.contains_key(&spec.name) {
            return Err(RagError::remote(
                RemoteService::VectorStore,
                format!("collection '{}' already exists", spec.name),
            ));
        }
        collections.insert(
            spec.name.clone(),
            Collection {
                spec: spec.clone(),
                points: BTreeMap::new(),
            },
        );
        Ok(())
    }

    async fn upsert(&self, collection: &str, point: IndexPoint) -> Result<(), RagError> {
        let mut collections = self.collections.write().await;
        let target = collections
            .get_mut(collection)
            .ok_or_else(|| missing_collection(collection))?;
        check_dimension(&target.spec, point.vector.len())?;
        target.points.insert(point.id, point);
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredPoint>, RagError> {
        let collections = self.collections.read().await;
        let target = collections
            .get(collection)
            .ok_or_else(|| missing_collection(collection))?;
        check_dimension(&target.spec, vector.len())?;

        let mut scored = Vec::with_capacity(target.points.len());
        for point in target.points.values() {
            let score = match target.spec.distance {
                Distance::Cosine => cosine_similarity(vector, &point.vector)?,
                Distance::Dot => dot_product(vector, &point.vector)?,
            };
            scored.push((point, score));
        }

        // keep the top `limit` but hand them back in id order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(limit);
        scored.sort_by_key(|(point, _)| point.id);

        Ok(scored
            .into_iter()
            .map(|(point, score)| ScoredPoint {
                id: PointId::Num(point.id),
                score,
                payload: serde_json::to_value(&point.payload).unwrap_or_default(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::PointPayload;

    fn point(id: u64, vector: Vec<f32>, text: &str) -> IndexPoint {
        IndexPoint {
            id,
            vector,
            payload: PointPayload {
                text: text.to_string(),
                page: id as u32 + 1,
            },
        }
    }

    #[tokio::test]
    async fn create_twice_fails() {
        let index = InMemoryIndex::new();
        let spec = CollectionSpec::cosine("docs", 2);

        index.create_collection(&spec).await.unwrap();
        assert!(index.collection_exists("docs").await.unwrap());
        assert!(index.create_collection(&spec).await.is_err());
    }

    #[tokio::test]
    async fn upsert_replaces_existing_id() {
        let index = InMemoryIndex::new();
        index
            .create_collection(&CollectionSpec::cosine("docs", 2))
            .await
            .unwrap();

        index.upsert("docs", point(0, vec![1.0, 0.0], "old")).await.unwrap();
        index.upsert("docs", point(0, vec![0.0, 1.0], "new")).await.unwrap();

        let points = index.points("docs").await;
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].payload.text, "new");
    }

    #[tokio::test]
    async fn dimension_mismatch_is_rejected() {
        let index = InMemoryIndex::new();
        index
            .create_collection(&CollectionSpec::cosine("docs", 3))
            .await
            .unwrap();

        let err = index
            .upsert("docs", point(0, vec![1.0, 0.0], "short"))
            .await
            .unwrap_err();
        assert!(err.is_remote());
        assert_eq!(index.point_count("docs").await, 0);
    }

    #[tokio::test]
    async fn query_dimension_is_checked_on_empty_collection() {
        let index = InMemoryIndex::new();
        index
            .create_collection(&CollectionSpec::cosine("docs", 1024))
            .await
            .unwrap();

        let err = index.search("docs", &[1.0, 0.0, 0.0], 5).await.unwrap_err();

        assert!(err.is_remote());
        assert!(err
            .to_string()
            .contains("vector dimension error: expected dim: 1024, got 3"));
    }

    #[tokio::test]
    async fn search_limits_but_does_not_sort_by_score() {
        let index = InMemoryIndex::new();
        index
            .create_collection(&CollectionSpec::cosine("docs", 2))
            .await
            .unwrap();
        index.upsert("docs", point(0, vec![0.0, 1.0], "far")).await.unwrap();
        index.upsert("docs", point(1, vec![1.0, 1.0], "middle")).await.unwrap();
        index.upsert("docs", point(2, vec![1.0, 0.1], "near")).await.unwrap();

        let hits = index.search("docs", &[1.0, 0.0], 2).await.unwrap();

        let ids: Vec<PointId> = hits.iter().map(|h| h.id.clone()).collect();
        assert_eq!(ids, vec![PointId::Num(1), PointId::Num(2)]);
        assert!(hits[0].score < hits[1].score);
        assert_eq!(hits[1].payload["text"], "near");
    }

    #[tokio::test]
    async fn missing_collection_is_an_error() {
        let index = InMemoryIndex::new();
        assert!(index.search("nope", &[1.0], 5).await.is_err());
        assert!(!index.collection_exists("nope").await.unwrap());
    }
}

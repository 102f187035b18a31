//! Document ingestion: parse → skip blank pages → embed → upsert.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use super::document::{load_chunks, Chunk};
use crate::core::errors::RagError;
use crate::llm::EmbeddingModel;
use crate::vector::{CollectionSpec, IndexPoint, PointPayload, VectorIndex};

/// Outcome of one ingestion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub document: String,
    pub pages: usize,
    pub points_stored: usize,
    pub pages_skipped: usize,
    /// First id not used by this run; pass it to `ingest_from` to append.
    pub next_id: u64,
}

pub struct Ingestor {
    embedder: Arc<dyn EmbeddingModel>,
    index: Arc<dyn VectorIndex>,
    collection: CollectionSpec,
}

impl Ingestor {
    pub fn new(
        embedder: Arc<dyn EmbeddingModel>,
        index: Arc<dyn VectorIndex>,
        collection: CollectionSpec,
    ) -> Self {
        Self {
            embedder,
            index,
            collection,
        }
    }

    pub fn collection(&self) -> &CollectionSpec {
        &self.collection
    }

    /// Ingests a document with point ids starting at 0.
    pub async fn ingest(&self, path: &Path) -> Result<IngestReport, RagError> {
        self.ingest_from(path, 0).await
    }

    pub async fn ingest_from(&self, path: &Path, first_id: u64) -> Result<IngestReport, RagError> {
        self.ensure_collection().await?;
        let chunks = load_chunks(path).await?;
        let mut report = self.ingest_chunks(chunks, first_id).await?;
        report.document = path.display().to_string();
        Ok(report)
    }

    /// Creates the collection only when the store reports it missing.
    pub async fn ensure_collection(&self) -> Result<(), RagError> {
        let name = &self.collection.name;
        if self.index.collection_exists(name).await? {
            tracing::info!("Using existing collection: {}", name);
            return Ok(());
        }

        tracing::info!(
            dimension = self.collection.dimension,
            "Creating collection: {}",
            name
        );
        self.index.create_collection(&self.collection).await
    }

    /// Embeds and stores every non-blank chunk in order. The first failure
    /// aborts the run; points already stored stay in the index. Ids that
    /// would not fit in `u64` are rejected before anything is stored.
    pub async fn ingest_chunks(
        &self,
        chunks: Vec<Chunk>,
        first_id: u64,
    ) -> Result<IngestReport, RagError> {
        let pages = chunks.len();
        let storable = chunks.iter().filter(|c| !c.is_blank()).count() as u64;
        if first_id.checked_add(storable).is_none() {
            return Err(RagError::BadRequest(format!(
                "first_id {} leaves no room for {} point ids",
                first_id, storable
            )));
        }
        let mut next_id = first_id;
        let mut skipped = 0;

        for chunk in chunks {
            if chunk.is_blank() {
                skipped += 1;
                tracing::debug!(page = chunk.page_number, "Skipping blank page");
                continue;
            }

            let vector = self.embedder.embed(&chunk.text).await?;
            let point = IndexPoint {
                id: next_id,
                vector,
                payload: PointPayload {
                    text: chunk.text,
                    page: chunk.page_number,
                },
            };
            self.index.upsert(&self.collection.name, point).await?;
            tracing::debug!(page = chunk.page_number, id = next_id, "Stored page");
            next_id += 1;
        }

        let stored = (next_id - first_id) as usize;
        tracing::info!(
            pages,
            stored,
            skipped,
            collection = %self.collection.name,
            "Document embedded and stored"
        );

        Ok(IngestReport {
            document: String::new(),
            pages,
            points_stored: stored,
            pages_skipped: skipped,
            next_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::document::pages_to_chunks;
    use crate::testing::{RecordingIndex, StubEmbedder};
    use std::sync::atomic::Ordering;

    fn ingestor(embedder: Arc<StubEmbedder>, index: Arc<RecordingIndex>) -> Ingestor {
        Ingestor::new(embedder, index, CollectionSpec::cosine("docs", 3))
    }

    fn pages(texts: &[&str]) -> Vec<Chunk> {
        pages_to_chunks(texts.iter().map(|t| t.to_string()).collect())
    }

    #[tokio::test]
    async fn ids_are_sequential_from_zero() {
        let embedder = Arc::new(StubEmbedder::new(vec![1.0, 0.0, 0.0]));
        let index = Arc::new(RecordingIndex::existing());

        let report = ingestor(embedder.clone(), index.clone())
            .ingest_chunks(pages(&["a", "b", "c", "d"]), 0)
            .await
            .unwrap();

        let ids: Vec<u64> = index.upserts.lock().unwrap().iter().map(|(_, p)| p.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
        assert_eq!(report.points_stored, 4);
        assert_eq!(report.next_id, 4);
        assert_eq!(embedder.call_count(), 4);
    }

    #[tokio::test]
    async fn blank_pages_are_skipped_without_embedding() {
        let embedder = Arc::new(StubEmbedder::new(vec![1.0, 0.0, 0.0]));
        let index = Arc::new(RecordingIndex::existing());

        let report = ingestor(embedder.clone(), index.clone())
            .ingest_chunks(pages(&["", "   ", "\n\t"]), 0)
            .await
            .unwrap();

        assert_eq!(report.points_stored, 0);
        assert_eq!(report.pages_skipped, 3);
        assert_eq!(embedder.call_count(), 0);
        assert!(index.upserts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn skipped_pages_do_not_consume_ids() {
        let embedder = Arc::new(StubEmbedder::new(vec![1.0, 0.0, 0.0]));
        let index = Arc::new(RecordingIndex::existing());

        ingestor(embedder, index.clone())
            .ingest_chunks(pages(&["first", "", "third"]), 0)
            .await
            .unwrap();

        let stored: Vec<(u64, u32)> = index
            .upserts
            .lock()
            .unwrap()
            .iter()
            .map(|(_, p)| (p.id, p.payload.page))
            .collect();
        assert_eq!(stored, vec![(0, 1), (1, 3)]);
    }

    #[tokio::test]
    async fn existing_collection_is_never_recreated() {
        let embedder = Arc::new(StubEmbedder::new(vec![1.0, 0.0, 0.0]));
        let index = Arc::new(RecordingIndex::existing());
        let ingestor = ingestor(embedder, index.clone());

        ingestor.ensure_collection().await.unwrap();
        ingestor.ensure_collection().await.unwrap();

        assert_eq!(index.exists_calls.load(Ordering::SeqCst), 2);
        assert!(index.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_collection_is_created_with_configured_spec() {
        let embedder = Arc::new(StubEmbedder::new(vec![1.0, 0.0, 0.0]));
        let index = Arc::new(RecordingIndex::default());

        ingestor(embedder, index.clone())
            .ensure_collection()
            .await
            .unwrap();

        assert_eq!(
            *index.created.lock().unwrap(),
            vec![CollectionSpec::cosine("docs", 3)]
        );
    }

    #[tokio::test]
    async fn embedding_failure_aborts_but_keeps_earlier_points() {
        let embedder = Arc::new(StubEmbedder::new(vec![1.0, 0.0, 0.0]).failing_on(2));
        let index = Arc::new(RecordingIndex::existing());

        let err = ingestor(embedder.clone(), index.clone())
            .ingest_chunks(pages(&["one", "two", "three"]), 0)
            .await
            .unwrap_err();

        assert!(err.is_remote());
        assert_eq!(embedder.call_count(), 2);
        let upserts = index.upserts.lock().unwrap();
        assert_eq!(upserts.len(), 1);
        assert_eq!(upserts[0].1.payload.text, "one");
    }

    #[tokio::test]
    async fn first_id_near_the_top_is_rejected_before_storing() {
        let embedder = Arc::new(StubEmbedder::new(vec![1.0, 0.0, 0.0]));
        let index = Arc::new(RecordingIndex::existing());

        let err = ingestor(embedder.clone(), index.clone())
            .ingest_chunks(pages(&["a"]), u64::MAX)
            .await
            .unwrap_err();

        assert!(matches!(err, RagError::BadRequest(_)));
        assert_eq!(embedder.call_count(), 0);
        assert!(index.upserts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn last_representable_ids_are_usable() {
        let embedder = Arc::new(StubEmbedder::new(vec![1.0, 0.0, 0.0]));
        let index = Arc::new(RecordingIndex::existing());

        let report = ingestor(embedder, index.clone())
            .ingest_chunks(pages(&["a", "", "b"]), u64::MAX - 2)
            .await
            .unwrap();

        assert_eq!(report.next_id, u64::MAX);
        assert_eq!(index.upserts.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn ingest_from_continues_numbering() {
        let embedder = Arc::new(StubEmbedder::new(vec![1.0, 0.0, 0.0]));
        let index = Arc::new(RecordingIndex::existing());

        let report = ingestor(embedder, index.clone())
            .ingest_chunks(pages(&["x", "y"]), 10)
            .await
            .unwrap();

        let ids: Vec<u64> = index.upserts.lock().unwrap().iter().map(|(_, p)| p.id).collect();
        assert_eq!(ids, vec![10, 11]);
        assert_eq!(report.next_id, 12);
    }
}

//! Shared helpers for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use axum::Router;
use tokio::net::TcpListener;

use crate::core::errors::{RagError, RemoteService};
use crate::llm::{EmbeddingModel, GenerationModel, GenerationRequest};
use crate::vector::{CollectionSpec, IndexPoint, ScoredPoint, VectorIndex};

/// Serves `app` on an ephemeral localhost port and returns its base URL.
pub async fn spawn_fake_service(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake service");
    let addr = listener.local_addr().expect("fake service address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake service");
    });
    format!("http://{}", addr)
}

/// Embeds every text as a fixed vector and counts calls; can be told to fail
/// on the n-th call (1-based).
pub struct StubEmbedder {
    pub vector: Vec<f32>,
    pub calls: AtomicUsize,
    pub fail_on_call: Option<usize>,
    pub texts: Mutex<Vec<String>>,
}

impl StubEmbedder {
    pub fn new(vector: Vec<f32>) -> Self {
        Self {
            vector,
            calls: AtomicUsize::new(0),
            fail_on_call: None,
            texts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_on(mut self, call: usize) -> Self {
        self.fail_on_call = Some(call);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingModel for StubEmbedder {
    fn name(&self) -> &str {
        "stub-embed"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_call == Some(call) {
            return Err(RagError::remote(RemoteService::Embedding, "rate limited"));
        }
        self.texts.lock().unwrap().push(text.to_string());
        Ok(self.vector.clone())
    }
}

/// Vector store double that records every call and replays canned search
/// results in the order given.
#[derive(Default)]
pub struct RecordingIndex {
    pub exists: bool,
    pub exists_calls: AtomicUsize,
    pub created: Mutex<Vec<CollectionSpec>>,
    pub upserts: Mutex<Vec<(String, IndexPoint)>>,
    pub searches: Mutex<Vec<(String, usize)>>,
    pub hits: Mutex<VecDeque<Vec<ScoredPoint>>>,
}

impl RecordingIndex {
    pub fn existing() -> Self {
        Self {
            exists: true,
            ..Default::default()
        }
    }

    pub fn with_hits(hits: Vec<ScoredPoint>) -> Self {
        let index = Self::existing();
        index.hits.lock().unwrap().push_back(hits);
        index
    }
}

#[async_trait]
impl VectorIndex for RecordingIndex {
    async fn collection_exists(&self, _name: &str) -> Result<bool, RagError> {
        self.exists_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.exists)
    }

    async fn create_collection(&self, spec: &CollectionSpec) -> Result<(), RagError> {
        self.created.lock().unwrap().push(spec.clone());
        Ok(())
    }

    async fn upsert(&self, collection: &str, point: IndexPoint) -> Result<(), RagError> {
        self.upserts
            .lock()
            .unwrap()
            .push((collection.to_string(), point));
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        _vector: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredPoint>, RagError> {
        self.searches
            .lock()
            .unwrap()
            .push((collection.to_string(), limit));
        Ok(self.hits.lock().unwrap().pop_front().unwrap_or_default())
    }
}

/// Generation double that captures requests and answers with a fixed text.
pub struct CapturingModel {
    pub reply: String,
    pub requests: Mutex<Vec<GenerationRequest>>,
}

impl CapturingModel {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn last_request(&self) -> GenerationRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no generation request captured")
    }
}

#[async_trait]
impl GenerationModel for CapturingModel {
    fn name(&self) -> &str {
        "capturing-model"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<String, RagError> {
        self.requests.lock().unwrap().push(request);
        Ok(self.reply.clone())
    }
}

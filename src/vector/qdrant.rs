//! Qdrant REST integration.
//!
//! Talks to the service over HTTP with `reqwest`; the API key, when set, is
//! sent in the `api-key` header on every request.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{CollectionSpec, Distance, IndexPoint, ScoredPoint, VectorIndex};
use crate::core::config::VectorStoreConfig;
use crate::core::errors::{RagError, RemoteService};
use crate::core::http::{build_client, ensure_success, trim_base_url};

#[derive(Clone)]
pub struct QdrantIndex {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

#[derive(Deserialize)]
struct QdrantResponse<T> {
    result: T,
}

#[derive(Deserialize)]
struct CollectionsResult {
    collections: Vec<CollectionDescription>,
}

#[derive(Deserialize)]
struct CollectionDescription {
    name: String,
}

impl QdrantIndex {
    pub fn new(config: &VectorStoreConfig) -> Result<Self, RagError> {
        Ok(Self {
            base_url: trim_base_url(&config.url),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            client: build_client(config.request_timeout_secs)?,
        })
    }

    fn with_key(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("api-key", key),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value, RagError> {
        let response = self
            .with_key(request)
            .send()
            .await
            .map_err(|e| RagError::remote(RemoteService::VectorStore, e))?;
        let response = ensure_success(RemoteService::VectorStore, response).await?;
        response
            .json()
            .await
            .map_err(|e| RagError::remote(RemoteService::VectorStore, e))
    }

    fn collection_url(&self, name: &str) -> String {
        format!(
            "{}/collections/{}",
            self.base_url,
            urlencoding::encode(name)
        )
    }
}

fn decode<T: for<'de> Deserialize<'de>>(payload: Value) -> Result<T, RagError> {
    serde_json::from_value::<QdrantResponse<T>>(payload)
        .map(|r| r.result)
        .map_err(|e| {
            RagError::remote(
                RemoteService::VectorStore,
                format!("malformed response: {}", e),
            )
        })
}

fn distance_name(distance: Distance) -> &'static str {
    match distance {
        Distance::Cosine => "Cosine",
        Distance::Dot => "Dot",
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn collection_exists(&self, name: &str) -> Result<bool, RagError> {
        let url = format!("{}/collections", self.base_url);
        let payload = self.send(self.client.get(url)).await?;
        let result: CollectionsResult = decode(payload)?;
        Ok(result.collections.iter().any(|c| c.name == name))
    }

    async fn create_collection(&self, spec: &CollectionSpec) -> Result<(), RagError> {
        let body = json!({
            "vectors": {
                "size": spec.dimension,
                "distance": distance_name(spec.distance),
            }
        });
        self.send(self.client.put(self.collection_url(&spec.name)).json(&body))
            .await?;
        Ok(())
    }

    async fn upsert(&self, collection: &str, point: IndexPoint) -> Result<(), RagError> {
        let url = format!("{}/points?wait=true", self.collection_url(collection));
        let body = json!({ "points": [point] });
        self.send(self.client.put(url).json(&body)).await?;
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredPoint>, RagError> {
        let url = format!("{}/points/search", self.collection_url(collection));
        let body = json!({
            "vector": vector,
            "limit": limit,
            "with_payload": true,
        });
        let payload = self.send(self.client.post(url).json(&body)).await?;
        decode(payload)
    }
}

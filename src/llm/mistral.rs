use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::EmbeddingModel;
use crate::core::config::EmbeddingConfig;
use crate::core::errors::{RagError, RemoteService};
use crate::core::http::{build_client, ensure_success, trim_base_url};

/// Embedding client for Mistral's `/v1/embeddings` endpoint.
///
/// The request and response follow the OpenAI embeddings schema, so any
/// compatible server works when `base_url` points at it.
#[derive(Clone)]
pub struct MistralEmbedder {
    base_url: String,
    model: String,
    api_key: Option<String>,
    client: Client,
}

impl MistralEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self, RagError> {
        Ok(Self {
            base_url: trim_base_url(&config.base_url),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            client: build_client(config.request_timeout_secs)?,
        })
    }
}

#[async_trait]
impl EmbeddingModel for MistralEmbedder {
    fn name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let url = format!("{}/v1/embeddings", self.base_url);
        let body = json!({
            "model": self.model,
            "input": [text],
        });

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let res = request
            .send()
            .await
            .map_err(|e| RagError::remote(RemoteService::Embedding, e))?;
        let res = ensure_success(RemoteService::Embedding, res).await?;

        let payload: Value = res
            .json()
            .await
            .map_err(|e| RagError::remote(RemoteService::Embedding, e))?;
        let embedding = parse_embedding(&payload)?;
        tracing::debug!(model = %self.model, dimension = embedding.len(), "Embedded text");
        Ok(embedding)
    }
}

fn parse_embedding(payload: &Value) -> Result<Vec<f32>, RagError> {
    let values = payload["data"][0]["embedding"].as_array().ok_or_else(|| {
        RagError::remote(
            RemoteService::Embedding,
            "malformed response: missing data[0].embedding",
        )
    })?;

    values
        .iter()
        .map(|v| {
            v.as_f64().map(|f| f as f32).ok_or_else(|| {
                RagError::remote(
                    RemoteService::Embedding,
                    "malformed response: non-numeric embedding value",
                )
            })
        })
        .collect()
}

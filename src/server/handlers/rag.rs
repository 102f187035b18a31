use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use super::utils::{require_text, resolve_document_path};
use crate::core::errors::RagError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub path: Option<String>,
    pub first_id: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct RetrieveRequest {
    pub query: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub prompt: Option<String>,
}

pub async fn ingest(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<IngestRequest>,
) -> Result<impl IntoResponse, RagError> {
    let path = require_text(payload.path.as_deref(), state.config.server.max_input_length)?;
    let path = resolve_document_path(&state.documents_dir, path).await?;
    let first_id = payload.first_id.unwrap_or(0);

    tracing::info!(first_id, "Ingesting {}", path.display());
    let report = state.ingestor.ingest_from(&path, first_id).await?;
    Ok(Json(report))
}

pub async fn retrieve(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RetrieveRequest>,
) -> Result<impl IntoResponse, RagError> {
    let query = require_text(payload.query.as_deref(), state.config.server.max_input_length)?;

    let hits = state.pipeline.retriever().retrieve_hits(query).await?;
    let context = crate::rag::retriever::join_context(&hits);
    Ok(Json(json!({ "context": context, "hits": hits })))
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatRequest>,
) -> Result<impl IntoResponse, RagError> {
    let prompt = require_text(payload.prompt.as_deref(), state.config.server.max_input_length)?;

    let answer = state.pipeline.ask(prompt).await.map_err(|e| {
        tracing::error!("Chat request failed: {}", e);
        e
    })?;
    Ok(Json(answer))
}

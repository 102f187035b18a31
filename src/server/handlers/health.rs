use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "collection": state.config.vector_store.collection,
        "embedding_model": state.embedding_model,
        "generation_model": state.pipeline.generator().model_name(),
    }))
}

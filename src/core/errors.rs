use std::fmt;

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

/// Remote collaborator a failed call was addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteService {
    Embedding,
    VectorStore,
    Generation,
    WebSearch,
}

impl fmt::Display for RemoteService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RemoteService::Embedding => "embedding service",
            RemoteService::VectorStore => "vector store",
            RemoteService::Generation => "generation service",
            RemoteService::WebSearch => "web search",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum RagError {
    #[error("{service} call failed: {message}")]
    Remote {
        service: RemoteService,
        message: String,
    },
    #[error("document error: {0}")]
    Document(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl RagError {
    pub fn remote<E: fmt::Display>(service: RemoteService, err: E) -> Self {
        RagError::Remote {
            service,
            message: err.to_string(),
        }
    }

    pub fn internal<E: fmt::Display>(err: E) -> Self {
        RagError::Internal(err.to_string())
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, RagError::Remote { .. })
    }
}

impl IntoResponse for RagError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            RagError::Remote { .. } => StatusCode::BAD_GATEWAY,
            RagError::Document(_) => StatusCode::UNPROCESSABLE_ENTITY,
            RagError::BadRequest(_) => StatusCode::BAD_REQUEST,
            RagError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = match self {
            RagError::BadRequest(msg) => msg,
            other => other.to_string(),
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}

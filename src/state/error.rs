use thiserror::Error;

use crate::core::errors::RagError;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Failed to load configuration: {0}")]
    Config(#[source] RagError),

    #[error("Failed to initialize vector store: {0}")]
    VectorStore(#[source] RagError),

    #[error("Failed to initialize embedding client: {0}")]
    Embedding(#[source] RagError),

    #[error("Failed to initialize generation client: {0}")]
    Generation(#[source] RagError),

    #[error("Failed to initialize web search tool: {0}")]
    WebSearch(#[source] RagError),
}

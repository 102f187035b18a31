use async_trait::async_trait;

use super::types::GenerationRequest;
use crate::core::errors::RagError;

#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    /// model identifier, used for logging and health output
    fn name(&self) -> &str;

    /// embed one text into a vector of the provider's fixed dimension
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError>;
}

#[async_trait]
pub trait GenerationModel: Send + Sync {
    fn name(&self) -> &str;

    /// run one generation, including any tool calls the model decides to make,
    /// and return the final answer text
    async fn generate(&self, request: GenerationRequest) -> Result<String, RagError>;
}

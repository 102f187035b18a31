use std::sync::Arc;

use super::prompt::build_prompt;
use crate::core::errors::RagError;
use crate::llm::{GenerationModel, GenerationRequest, ToolSpec};

pub const DEFAULT_TEMPERATURE: f64 = 0.2;

/// Produces the final answer from a query and its retrieved context. The
/// web search tool is offered on every call; whether it is used is up to the
/// model.
pub struct AnswerGenerator {
    model: Arc<dyn GenerationModel>,
    temperature: f64,
}

impl AnswerGenerator {
    pub fn new(model: Arc<dyn GenerationModel>, temperature: f64) -> Self {
        Self { model, temperature }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub async fn answer(&self, query: &str, context: &str) -> Result<String, RagError> {
        let request = GenerationRequest::new(build_prompt(context, query))
            .with_temperature(self.temperature)
            .with_tool(ToolSpec::web_search());

        tracing::debug!(
            model = self.model.name(),
            context_chars = context.len(),
            "Generating answer"
        );
        self.model.generate(request).await
    }
}

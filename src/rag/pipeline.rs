use serde::Serialize;
use tracing::Instrument;

use super::generator::AnswerGenerator;
use super::retriever::{join_context, Retriever};
use crate::core::errors::RagError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryAnswer {
    pub answer: String,
    pub context: String,
}

/// Full query path: retrieve, then generate. Each call is independent.
pub struct RagPipeline {
    retriever: Retriever,
    generator: AnswerGenerator,
}

impl RagPipeline {
    pub fn new(retriever: Retriever, generator: AnswerGenerator) -> Self {
        Self {
            retriever,
            generator,
        }
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub fn generator(&self) -> &AnswerGenerator {
        &self.generator
    }

    pub async fn ask(&self, query: &str) -> Result<QueryAnswer, RagError> {
        let span = tracing::info_span!("rag_query", query_chars = query.len());
        async move {
            tracing::debug!(stage = "embedding", "Embedding query and searching");
            let hits = self.retriever.retrieve_hits(query).await?;

            tracing::debug!(stage = "ranking", hits = hits.len(), "Context ranked");
            let context = join_context(&hits);

            tracing::debug!(
                stage = "prompt_assembly",
                context_chars = context.len(),
                "Context assembled"
            );
            let answer = self.generator.answer(query, &context).await?;

            tracing::info!(stage = "done", answer_chars = answer.len(), "Query answered");
            Ok(QueryAnswer { answer, context })
        }
        .instrument(span)
        .await
    }
}

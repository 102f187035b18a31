use std::path::PathBuf;
use std::sync::Arc;

use crate::core::config::{AppPaths, ConfigService, RagConfig, ToolMode, VectorBackend};
use crate::llm::{
    ChatToolsModel, EmbeddingModel, GenerationModel, MistralEmbedder, OpenAiResponsesModel,
};
use crate::rag::{AnswerGenerator, Ingestor, RagPipeline, Retriever};
use crate::tools::{HttpWebSearch, WebSearch};
use crate::vector::{CollectionSpec, InMemoryIndex, QdrantIndex, VectorIndex};

pub mod error;

use error::InitializationError;

/// Application state shared across all routes.
///
/// Holds the effective configuration and the two entry points into the RAG
/// core: the ingestor and the query pipeline. Both share the same embedding
/// client and vector index.
pub struct AppState {
    pub config: RagConfig,
    pub ingestor: Ingestor,
    pub pipeline: RagPipeline,
    pub embedding_model: String,
    /// Ingestion requests may only name files under this directory.
    pub documents_dir: PathBuf,
}

impl AppState {
    /// Loads configuration from the standard locations and builds the
    /// remote clients it names.
    pub fn initialize(paths: Arc<AppPaths>) -> Result<Arc<Self>, InitializationError> {
        let mut config = ConfigService::new(paths.clone())
            .load()
            .map_err(InitializationError::Config)?;
        let documents_dir = config
            .server
            .documents_dir
            .get_or_insert_with(|| paths.user_data_dir.join("documents"));
        if let Err(e) = std::fs::create_dir_all(&*documents_dir) {
            tracing::warn!(
                "Failed to create documents directory {}: {}",
                documents_dir.display(),
                e
            );
        }
        Self::from_config(config).map(Arc::new)
    }

    pub fn from_config(config: RagConfig) -> Result<Self, InitializationError> {
        let index: Arc<dyn VectorIndex> = match config.vector_store.backend {
            VectorBackend::Qdrant => Arc::new(
                QdrantIndex::new(&config.vector_store).map_err(InitializationError::VectorStore)?,
            ),
            VectorBackend::Memory => {
                tracing::warn!("Using in-memory vector store; points are lost on exit");
                Arc::new(InMemoryIndex::new())
            }
        };

        let embedder: Arc<dyn EmbeddingModel> = Arc::new(
            MistralEmbedder::new(&config.embedding).map_err(InitializationError::Embedding)?,
        );

        let model: Arc<dyn GenerationModel> = match config.generation.tool_mode {
            ToolMode::Hosted => Arc::new(
                OpenAiResponsesModel::new(&config.generation)
                    .map_err(InitializationError::Generation)?,
            ),
            ToolMode::Local => {
                let search: Arc<dyn WebSearch> = Arc::new(
                    HttpWebSearch::new(&config.tools).map_err(InitializationError::WebSearch)?,
                );
                Arc::new(
                    ChatToolsModel::new(&config.generation, search)
                        .map_err(InitializationError::Generation)?,
                )
            }
        };

        tracing::info!(
            collection = %config.vector_store.collection,
            embedding_model = embedder.name(),
            generation_model = model.name(),
            tool_mode = ?config.generation.tool_mode,
            "RAG services configured"
        );

        Ok(Self::with_components(config, embedder, index, model))
    }

    /// Wires already-built clients together.
    pub fn with_components(
        config: RagConfig,
        embedder: Arc<dyn EmbeddingModel>,
        index: Arc<dyn VectorIndex>,
        model: Arc<dyn GenerationModel>,
    ) -> Self {
        let collection = CollectionSpec::cosine(
            config.vector_store.collection.clone(),
            config.vector_store.dimension,
        );
        let ingestor = Ingestor::new(embedder.clone(), index.clone(), collection);
        let retriever = Retriever::new(
            embedder.clone(),
            index,
            config.vector_store.collection.clone(),
            config.retrieval.top_k,
        );
        let generator = AnswerGenerator::new(model, config.generation.temperature);
        let documents_dir = config
            .server
            .documents_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("documents"));

        Self {
            documents_dir,
            embedding_model: embedder.name().to_string(),
            config,
            ingestor,
            pipeline: RagPipeline::new(retriever, generator),
        }
    }
}

pub mod paths;
pub mod service;
pub mod settings;
pub mod validation;

pub use paths::AppPaths;
pub use service::ConfigService;
pub use settings::{
    EmbeddingConfig, GenerationConfig, RagConfig, RetrievalConfig, ServerConfig, ToolMode,
    ToolsConfig, VectorBackend, VectorStoreConfig,
};

pub mod chat_tools;
pub mod mistral;
pub mod openai;
pub mod provider;
pub mod types;

pub use chat_tools::ChatToolsModel;
pub use mistral::MistralEmbedder;
pub use openai::OpenAiResponsesModel;
pub use provider::{EmbeddingModel, GenerationModel};
pub use types::{GenerationRequest, ToolSpec, WEB_SEARCH_TOOL};

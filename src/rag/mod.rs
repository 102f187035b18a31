//! Retrieval-augmented generation over troubleshooting documents.
//!
//! - `Ingestor`: splits a document into pages, embeds them and stores points
//! - `Retriever`: turns a query into ranked context text
//! - `AnswerGenerator`: prompts the generation model with that context
//! - `RagPipeline`: retrieval followed by generation

pub mod document;
pub mod generator;
pub mod ingest;
pub mod payload;
pub mod pipeline;
pub mod prompt;
pub mod retriever;

pub use document::{load_chunks, Chunk};
pub use generator::{AnswerGenerator, DEFAULT_TEMPERATURE};
pub use ingest::{IngestReport, Ingestor};
pub use pipeline::{QueryAnswer, RagPipeline};
pub use retriever::{RetrievedChunk, Retriever};

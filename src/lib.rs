//! Retrieval-augmented troubleshooting assistant.
//!
//! Documents are split into pages, embedded and stored in a vector index;
//! questions are answered by a generation model prompted with the closest
//! pages and allowed to search the web when they fall short.

pub mod core;
pub mod llm;
pub mod rag;
pub mod server;
pub mod state;
pub mod tools;
pub mod vector;

#[cfg(test)]
mod testing;

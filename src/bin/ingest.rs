//! Batch ingestion: `rag-ingest <path>...`
//!
//! Point ids continue across the files given in one invocation, starting at
//! zero.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};

use troubleshoot_rag::core::config::AppPaths;
use troubleshoot_rag::core::logging;
use troubleshoot_rag::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let files: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();
    if files.is_empty() {
        bail!("usage: rag-ingest <path>...");
    }

    let paths = Arc::new(AppPaths::new());
    logging::init(&paths, "rag-ingest.log");

    let state = AppState::initialize(paths).context("Failed to initialize application state")?;

    let mut next_id = 0;
    for file in &files {
        let report = state
            .ingestor
            .ingest_from(file, next_id)
            .await
            .with_context(|| format!("Failed to ingest {}", file.display()))?;
        tracing::info!(
            stored = report.points_stored,
            skipped = report.pages_skipped,
            "Ingested {}",
            report.document
        );
        next_id = report.next_id;
    }

    tracing::info!(points = next_id, files = files.len(), "Ingestion finished");
    Ok(())
}

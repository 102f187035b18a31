use std::path::{Component, Path, PathBuf};

use crate::core::errors::RagError;

/// Returns the trimmed field, rejecting blank or oversized input.
pub fn require_text(value: Option<&str>, max_len: usize) -> Result<&str, RagError> {
    let text = value.map(str::trim).unwrap_or_default();
    if text.is_empty() {
        return Err(RagError::BadRequest("Missing required fields".to_string()));
    }
    if text.chars().count() > max_len {
        return Err(RagError::BadRequest(format!(
            "Input too long (max {} characters)",
            max_len
        )));
    }
    Ok(text)
}

/// Resolves a client-supplied document path against `root`. Relative paths
/// are taken from `root`; the result must stay inside it after symlinks are
/// followed.
pub async fn resolve_document_path(root: &Path, requested: &str) -> Result<PathBuf, RagError> {
    let root = tokio::fs::canonicalize(root).await.map_err(|e| {
        RagError::Document(format!(
            "documents directory {} is not available: {}",
            root.display(),
            e
        ))
    })?;

    let candidate = root.join(requested);
    let escapes = candidate
        .components()
        .any(|c| matches!(c, Component::ParentDir));
    if escapes || !candidate.starts_with(&root) {
        return Err(outside_documents_dir(requested));
    }

    let resolved = tokio::fs::canonicalize(&candidate)
        .await
        .map_err(|e| RagError::Document(format!("Failed to read {}: {}", requested, e)))?;
    if !resolved.starts_with(&root) {
        return Err(outside_documents_dir(requested));
    }
    Ok(resolved)
}

fn outside_documents_dir(requested: &str) -> RagError {
    RagError::BadRequest(format!(
        "Path '{}' is outside the documents directory",
        requested
    ))
}

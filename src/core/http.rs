use std::time::Duration;

use reqwest::{Client, Response};

use crate::core::errors::{RagError, RemoteService};

pub fn build_client(timeout_secs: Option<u64>) -> Result<Client, RagError> {
    let mut builder = Client::builder();
    if let Some(secs) = timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder.build().map_err(RagError::internal)
}

/// Turns a non-2xx response into a remote failure carrying the body text.
pub async fn ensure_success(
    service: RemoteService,
    response: Response,
) -> Result<Response, RagError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    Err(RagError::remote(
        service,
        format!("HTTP {}: {}", status, text.trim()),
    ))
}

pub fn trim_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

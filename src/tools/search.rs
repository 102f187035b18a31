use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::config::ToolsConfig;
use crate::core::errors::{RagError, RemoteService};
use crate::core::http::{build_client, ensure_success};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// External lookup the generation model can fall back to.
#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, RagError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchProvider {
    DuckDuckGo,
    Google { api_key: String, engine_id: String },
    Brave { api_key: String },
    Bing { api_key: String },
}

impl SearchProvider {
    /// Picks the configured provider; one without credentials falls back to
    /// DuckDuckGo, which needs none.
    pub fn from_config(config: &ToolsConfig) -> Self {
        let key = |value: &Option<String>| value.clone().filter(|v| !v.trim().is_empty());

        let selected = match config.search_provider.as_str() {
            "google" => match (
                key(&config.google_search_api_key),
                key(&config.google_search_engine_id),
            ) {
                (Some(api_key), Some(engine_id)) => Some(SearchProvider::Google { api_key, engine_id }),
                _ => None,
            },
            "brave" => key(&config.brave_search_api_key).map(|api_key| SearchProvider::Brave { api_key }),
            "bing" => key(&config.bing_search_api_key).map(|api_key| SearchProvider::Bing { api_key }),
            _ => None,
        };

        selected.unwrap_or_else(|| {
            if config.search_provider != "duckduckgo" {
                tracing::warn!(
                    "Search provider '{}' has no credentials; using DuckDuckGo",
                    config.search_provider
                );
            }
            SearchProvider::DuckDuckGo
        })
    }

    fn name(&self) -> &'static str {
        match self {
            SearchProvider::DuckDuckGo => "duckduckgo",
            SearchProvider::Google { .. } => "google",
            SearchProvider::Brave { .. } => "brave",
            SearchProvider::Bing { .. } => "bing",
        }
    }
}

pub struct HttpWebSearch {
    provider: SearchProvider,
    max_results: usize,
    client: Client,
}

impl HttpWebSearch {
    pub fn new(config: &ToolsConfig) -> Result<Self, RagError> {
        Ok(Self {
            provider: SearchProvider::from_config(config),
            max_results: config.max_results,
            client: build_client(Some(30))?,
        })
    }

    async fn fetch(&self, request: reqwest::RequestBuilder) -> Result<Value, RagError> {
        let response = request
            .send()
            .await
            .map_err(|e| RagError::remote(RemoteService::WebSearch, e))?;
        let response = ensure_success(RemoteService::WebSearch, response).await?;
        response
            .json()
            .await
            .map_err(|e| RagError::remote(RemoteService::WebSearch, e))
    }
}

#[async_trait]
impl WebSearch for HttpWebSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, RagError> {
        let encoded = urlencoding::encode(query);
        let mut results = match &self.provider {
            SearchProvider::DuckDuckGo => {
                let url = format!(
                    "https://api.duckduckgo.com/?q={}&format=json&no_redirect=1&no_html=1",
                    encoded
                );
                parse_duckduckgo(&self.fetch(self.client.get(url)).await?)
            }
            SearchProvider::Google { api_key, engine_id } => {
                let url = format!(
                    "https://www.googleapis.com/customsearch/v1?key={}&cx={}&q={}",
                    api_key, engine_id, encoded
                );
                parse_google(&self.fetch(self.client.get(url)).await?)
            }
            SearchProvider::Brave { api_key } => {
                let url = format!("https://api.search.brave.com/res/v1/web/search?q={}", encoded);
                let request = self
                    .client
                    .get(url)
                    .header("X-Subscription-Token", api_key)
                    .header("Accept", "application/json");
                parse_brave(&self.fetch(request).await?)
            }
            SearchProvider::Bing { api_key } => {
                let url = format!("https://api.bing.microsoft.com/v7.0/search?q={}", encoded);
                let request = self
                    .client
                    .get(url)
                    .header("Ocp-Apim-Subscription-Key", api_key);
                parse_bing(&self.fetch(request).await?)
            }
        };

        results.truncate(self.max_results);
        tracing::debug!(
            provider = self.provider.name(),
            results = results.len(),
            "Web search finished"
        );
        Ok(results)
    }
}

fn str_field<'a>(item: &'a Value, key: &str) -> &'a str {
    item.get(key).and_then(|v| v.as_str()).unwrap_or("")
}

fn push_result(results: &mut Vec<SearchResult>, title: &str, url: &str, snippet: &str) {
    if title.is_empty() || url.is_empty() {
        return;
    }
    results.push(SearchResult {
        title: title.to_string(),
        url: url.to_string(),
        snippet: snippet.to_string(),
    });
}

fn items_at<'a>(payload: &'a Value, path: &[&str]) -> &'a [Value] {
    let mut cursor = payload;
    for key in path {
        match cursor.get(key) {
            Some(next) => cursor = next,
            None => return &[],
        }
    }
    cursor.as_array().map(Vec::as_slice).unwrap_or(&[])
}

pub fn parse_google(payload: &Value) -> Vec<SearchResult> {
    let mut results = Vec::new();
    for item in items_at(payload, &["items"]) {
        push_result(
            &mut results,
            str_field(item, "title"),
            str_field(item, "link"),
            str_field(item, "snippet"),
        );
    }
    results
}

pub fn parse_brave(payload: &Value) -> Vec<SearchResult> {
    let mut results = Vec::new();
    for item in items_at(payload, &["web", "results"]) {
        push_result(
            &mut results,
            str_field(item, "title"),
            str_field(item, "url"),
            str_field(item, "description"),
        );
    }
    results
}

pub fn parse_bing(payload: &Value) -> Vec<SearchResult> {
    let mut results = Vec::new();
    for item in items_at(payload, &["webPages", "value"]) {
        push_result(
            &mut results,
            str_field(item, "name"),
            str_field(item, "url"),
            str_field(item, "snippet"),
        );
    }
    results
}

/// DuckDuckGo's instant-answer API: the abstract first, then flat and nested
/// related topics.
pub fn parse_duckduckgo(payload: &Value) -> Vec<SearchResult> {
    let mut results = Vec::new();

    let abstract_text = str_field(payload, "AbstractText");
    let title = abstract_text.split(" - ").next().unwrap_or(abstract_text);
    push_result(
        &mut results,
        title,
        str_field(payload, "AbstractURL"),
        abstract_text,
    );

    extract_ddg_topics(items_at(payload, &["Results"]), &mut results);
    extract_ddg_topics(items_at(payload, &["RelatedTopics"]), &mut results);
    results
}

fn extract_ddg_topics(items: &[Value], results: &mut Vec<SearchResult>) {
    for item in items {
        if let Some(topics) = item.get("Topics").and_then(|v| v.as_array()) {
            extract_ddg_topics(topics, results);
            continue;
        }
        let text = str_field(item, "Text");
        let title = text.split(" - ").next().unwrap_or(text);
        push_result(results, title, str_field(item, "FirstURL"), text);
    }
}

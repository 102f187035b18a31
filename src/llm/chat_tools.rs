use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::GenerationModel;
use super::types::{GenerationRequest, ToolSpec, WEB_SEARCH_TOOL};
use crate::core::config::GenerationConfig;
use crate::core::errors::{RagError, RemoteService};
use crate::core::http::{build_client, ensure_success, trim_base_url};
use crate::tools::search::WebSearch;

/// Generation through an OpenAI-compatible `/v1/chat/completions` endpoint
/// with function calling; `web_search` calls are executed in-process.
///
/// After `max_tool_rounds` rounds of tool calls the tools stay declared but
/// `tool_choice` is set to `none`, so the next reply is the final answer.
pub struct ChatToolsModel {
    base_url: String,
    model: String,
    api_key: Option<String>,
    max_tool_rounds: usize,
    client: Client,
    search: Arc<dyn WebSearch>,
}

impl ChatToolsModel {
    pub fn new(config: &GenerationConfig, search: Arc<dyn WebSearch>) -> Result<Self, RagError> {
        Ok(Self {
            base_url: trim_base_url(&config.base_url),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            max_tool_rounds: config.max_tool_rounds,
            client: build_client(config.request_timeout_secs)?,
            search,
        })
    }

    async fn complete(&self, body: &Value) -> Result<Value, RagError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let mut req = self.client.post(&url).json(body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let res = req
            .send()
            .await
            .map_err(|e| RagError::remote(RemoteService::Generation, e))?;
        let res = ensure_success(RemoteService::Generation, res).await?;
        let mut payload: Value = res
            .json()
            .await
            .map_err(|e| RagError::remote(RemoteService::Generation, e))?;

        let message = payload["choices"][0]["message"].take();
        if !message.is_object() {
            return Err(RagError::remote(
                RemoteService::Generation,
                "malformed response: missing choices[0].message",
            ));
        }
        Ok(message)
    }

    async fn run_tool(&self, name: &str, arguments: &str) -> Result<String, RagError> {
        if name != WEB_SEARCH_TOOL {
            return Ok(format!("Error: unknown tool '{}'", name));
        }
        let query = serde_json::from_str::<Value>(arguments)
            .ok()
            .and_then(|args| args.get("query").and_then(|q| q.as_str()).map(str::to_string))
            .filter(|q| !q.trim().is_empty());
        let Some(query) = query else {
            return Ok("Error: web_search requires a non-empty 'query' argument".to_string());
        };

        tracing::info!(query = %query, "Model requested web search");
        let results = self.search.search(&query).await?;
        serde_json::to_string(&results).map_err(RagError::internal)
    }
}

fn function_tool(tool: &ToolSpec) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": tool.name,
            "description": tool.description,
            "parameters": tool.parameters,
        }
    })
}

fn request_body(
    model: &str,
    messages: &[Value],
    temperature: f64,
    tools: &[Value],
    allow_tools: bool,
) -> Value {
    let mut body = json!({
        "model": model,
        "messages": messages,
        "temperature": temperature,
        "stream": false,
    });
    if !tools.is_empty() {
        body["tools"] = Value::Array(tools.to_vec());
        body["tool_choice"] = json!(if allow_tools { "auto" } else { "none" });
    }
    body
}

#[async_trait]
impl GenerationModel for ChatToolsModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: GenerationRequest) -> Result<String, RagError> {
        let tools: Vec<Value> = request.tools.iter().map(function_tool).collect();
        let mut messages = vec![json!({ "role": "user", "content": request.prompt })];

        for round in 0..=self.max_tool_rounds {
            let allow_tools = !tools.is_empty() && round < self.max_tool_rounds;
            let body = request_body(
                &self.model,
                &messages,
                request.temperature,
                &tools,
                allow_tools,
            );
            let message = self.complete(&body).await?;

            let calls = message
                .get("tool_calls")
                .and_then(|v| v.as_array())
                .cloned()
                .unwrap_or_default();

            if calls.is_empty() || !allow_tools {
                return message
                    .get("content")
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
                    .ok_or_else(|| {
                        RagError::remote(
                            RemoteService::Generation,
                            "malformed response: final message has no content",
                        )
                    });
            }

            tracing::debug!(round, calls = calls.len(), "Executing tool calls");
            messages.push(message);
            for call in calls {
                let id = call["id"].as_str().unwrap_or_default().to_string();
                let name = call["function"]["name"].as_str().unwrap_or_default();
                let arguments = call["function"]["arguments"].as_str().unwrap_or("{}");
                let output = self.run_tool(name, arguments).await?;
                messages.push(json!({
                    "role": "tool",
                    "tool_call_id": id,
                    "content": output,
                }));
            }
        }

        Err(RagError::internal("tool loop ended without a final answer"))
    }
}

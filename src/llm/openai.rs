use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::GenerationModel;
use super::types::{GenerationRequest, ToolSpec, WEB_SEARCH_TOOL};
use crate::core::config::GenerationConfig;
use crate::core::errors::{RagError, RemoteService};
use crate::core::http::{build_client, ensure_success, trim_base_url};

/// Generation through the OpenAI Responses API.
///
/// `web_search` is mapped onto the provider-hosted search tool, so the model's
/// search calls never reach this process; one request yields the final text.
#[derive(Clone)]
pub struct OpenAiResponsesModel {
    base_url: String,
    model: String,
    api_key: Option<String>,
    client: Client,
}

impl OpenAiResponsesModel {
    pub fn new(config: &GenerationConfig) -> Result<Self, RagError> {
        Ok(Self {
            base_url: trim_base_url(&config.base_url),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            client: build_client(config.request_timeout_secs)?,
        })
    }

    fn request_body(&self, request: &GenerationRequest) -> Value {
        let mut body = json!({
            "model": self.model,
            "input": request.prompt,
            "temperature": request.temperature,
        });
        if !request.tools.is_empty() {
            let tools: Vec<Value> = request.tools.iter().map(hosted_tool).collect();
            body["tools"] = Value::Array(tools);
        }
        body
    }
}

fn hosted_tool(tool: &ToolSpec) -> Value {
    if tool.name == WEB_SEARCH_TOOL {
        return json!({ "type": "web_search" });
    }
    json!({
        "type": "function",
        "name": tool.name,
        "description": tool.description,
        "parameters": tool.parameters,
    })
}

#[async_trait]
impl GenerationModel for OpenAiResponsesModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: GenerationRequest) -> Result<String, RagError> {
        let url = format!("{}/v1/responses", self.base_url);
        let body = self.request_body(&request);

        let mut req = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let res = req
            .send()
            .await
            .map_err(|e| RagError::remote(RemoteService::Generation, e))?;
        let res = ensure_success(RemoteService::Generation, res).await?;
        let payload: Value = res
            .json()
            .await
            .map_err(|e| RagError::remote(RemoteService::Generation, e))?;

        let searches = count_hosted_searches(&payload);
        if searches > 0 {
            tracing::info!(searches, "Model used hosted web search");
        }
        extract_output_text(&payload)
    }
}

/// Concatenates the `output_text` parts of every `message` output item.
fn extract_output_text(payload: &Value) -> Result<String, RagError> {
    if let Some(text) = payload.get("output_text").and_then(|v| v.as_str()) {
        return Ok(text.to_string());
    }

    let items = payload
        .get("output")
        .and_then(|v| v.as_array())
        .ok_or_else(|| {
            RagError::remote(RemoteService::Generation, "malformed response: missing output")
        })?;

    let mut parts = Vec::new();
    for item in items {
        if item.get("type").and_then(|v| v.as_str()) != Some("message") {
            continue;
        }
        let Some(content) = item.get("content").and_then(|v| v.as_array()) else {
            continue;
        };
        for part in content {
            if part.get("type").and_then(|v| v.as_str()) == Some("output_text") {
                if let Some(text) = part.get("text").and_then(|v| v.as_str()) {
                    parts.push(text);
                }
            }
        }
    }

    if parts.is_empty() {
        return Err(RagError::remote(
            RemoteService::Generation,
            "malformed response: no output_text in message items",
        ));
    }
    Ok(parts.concat())
}

fn count_hosted_searches(payload: &Value) -> usize {
    payload
        .get("output")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter(|item| {
                    item.get("type").and_then(|v| v.as_str()) == Some("web_search_call")
                })
                .count()
        })
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::spawn_fake_service;
    use axum::routing::post;
    use axum::{Json, Router};
    use std::sync::{Arc, Mutex};

    fn model(base_url: String) -> OpenAiResponsesModel {
        OpenAiResponsesModel::new(&GenerationConfig {
            base_url,
            api_key: Some("sk-test".into()),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn web_search_maps_to_hosted_tool() {
        let request = GenerationRequest::new("prompt".into()).with_tool(ToolSpec::web_search());
        let body = model("http://unused".into()).request_body(&request);

        assert_eq!(body["tools"], json!([{ "type": "web_search" }]));
        assert_eq!(body["input"], "prompt");
        assert_eq!(body["model"], "gpt-4o-mini");
    }

    #[test]
    fn output_text_skips_tool_call_items() {
        let payload = json!({
            "output": [
                { "type": "web_search_call", "id": "ws_1", "status": "completed" },
                {
                    "type": "message",
                    "role": "assistant",
                    "content": [
                        { "type": "output_text", "text": "Unplug the router, ", "annotations": [] },
                        { "type": "output_text", "text": "wait 30 seconds.", "annotations": [] }
                    ]
                }
            ]
        });

        assert_eq!(
            extract_output_text(&payload).unwrap(),
            "Unplug the router, wait 30 seconds."
        );
        assert_eq!(count_hosted_searches(&payload), 1);
    }

    #[test]
    fn missing_output_is_malformed() {
        let err = extract_output_text(&json!({ "id": "resp_1" })).unwrap_err();
        assert!(err.to_string().contains("malformed"));
    }

    #[tokio::test]
    async fn generate_posts_prompt_temperature_and_tools() {
        let seen: Arc<Mutex<Option<Value>>> = Arc::new(Mutex::new(None));
        let captured = seen.clone();
        let app = Router::new().route(
            "/v1/responses",
            post(move |Json(body): Json<Value>| {
                let captured = captured.clone();
                async move {
                    *captured.lock().unwrap() = Some(body);
                    Json(json!({
                        "output": [{
                            "type": "message",
                            "content": [{ "type": "output_text", "text": "Check the power cable." }]
                        }]
                    }))
                }
            }),
        );
        let base_url = spawn_fake_service(app).await;

        let request = GenerationRequest::new("Context: \n\nquestion: q".into())
            .with_temperature(0.2)
            .with_tool(ToolSpec::web_search());
        let answer = model(base_url).generate(request).await.unwrap();

        assert_eq!(answer, "Check the power cable.");
        let body = seen.lock().unwrap().clone().expect("request captured");
        assert_eq!(body["temperature"], 0.2);
        assert_eq!(body["tools"][0]["type"], "web_search");
    }
}

//! OpenAI-compatible chat-completions client
//!
//! Implements [`ModelService`] against any endpoint that speaks the Chat
//! Completions protocol. Tool calls requested by the model are executed
//! locally through the [`ToolRegistry`] and fed back until the model answers
//! with a final message.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use super::{GenerateRequest, Generation, ModelError, ModelService};
use crate::config::ModelConfig;
use crate::tools::ToolRegistry;

/// Chat-completions client with a local tool-calling loop
pub struct OpenAiCompatibleService {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    tools: Arc<ToolRegistry>,
    max_tool_rounds: usize,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
    tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    kind: String,
    function: FunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

fn function_type() -> String {
    "function".to_string()
}

impl OpenAiCompatibleService {
    pub fn new(config: &ModelConfig, tools: Arc<ToolRegistry>) -> Result<Self, ModelError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(concat!("Packwise/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            tools,
            max_tool_rounds: config.max_tool_rounds as usize,
        })
    }

    /// Function definitions for the tools named in the request
    fn tool_definitions(&self, names: &[String]) -> Result<Vec<Value>, ModelError> {
        names
            .iter()
            .map(|name| {
                self.tools
                    .definition(name)
                    .ok_or_else(|| ModelError::UnknownTool(name.clone()))
            })
            .collect()
    }

    fn build_request_body(&self, request: &GenerateRequest, messages: &[Value], tools: &[Value]) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": messages,
        });

        let sampling = &request.sampling;
        if let Some(temperature) = sampling.temperature {
            body["temperature"] = json!(temperature);
        }
        if let Some(top_p) = sampling.top_p {
            body["top_p"] = json!(top_p);
        }
        // Not part of the OpenAI API, but honoured by most compatible servers
        if let Some(top_k) = sampling.top_k {
            body["top_k"] = json!(top_k);
        }
        if let Some(max_tokens) = sampling.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        if !sampling.stop.is_empty() {
            body["stop"] = json!(sampling.stop);
        }

        if !tools.is_empty() {
            body["tools"] = json!(tools);
            body["tool_choice"] = json!("auto");
        }

        if let Some(output) = &request.output {
            body["response_format"] = json!({
                "type": "json_schema",
                "json_schema": {
                    "name": output.name,
                    "schema": output.shape.to_json_schema(),
                },
            });
        }

        body
    }

    fn initial_messages(request: &GenerateRequest) -> Vec<Value> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(json!({ "role": "system", "content": system }));
        }
        messages.push(json!({ "role": "user", "content": request.prompt }));
        messages
    }

    async fn send(&self, body: &Value) -> Result<ChatResponse, ModelError> {
        let url = format!("{}/chat/completions", self.base_url);
        let mut builder = self.http.post(url).json(body);
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();

        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(ModelError::RateLimited {
                retry_after: Duration::from_secs(retry_after),
            });
        }

        if !response.status().is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ModelError::Api { status, message });
        }

        Ok(response.json().await?)
    }

    async fn run_tool(&self, call: &ToolCall) -> Result<Value, ModelError> {
        let name = &call.function.name;
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ModelError::UnknownTool(name.clone()))?;

        let args: Value = if call.function.arguments.trim().is_empty() {
            json!({})
        } else {
            serde_json::from_str(&call.function.arguments).map_err(|e| ModelError::Tool {
                name: name.clone(),
                message: format!("malformed arguments: {e}"),
            })?
        };

        let started = Instant::now();
        let result = tool.call(args).await.map_err(|e| ModelError::Tool {
            name: name.clone(),
            message: e.to_string(),
        })?;
        debug!(tool = %name, elapsed_ms = started.elapsed().as_millis() as u64, "tool call finished");
        Ok(result)
    }
}

#[async_trait]
impl ModelService for OpenAiCompatibleService {
    async fn generate(&self, request: GenerateRequest) -> Result<Generation, ModelError> {
        debug!(model = %self.model, tools = ?request.tools, "generate: called");
        let tool_defs = self.tool_definitions(&request.tools)?;
        let mut messages = Self::initial_messages(&request);
        let mut tool_calls_made = 0;

        for round in 0..=self.max_tool_rounds {
            let body = self.build_request_body(&request, &messages, &tool_defs);
            let response = self.send(&body).await?;

            if let Some(usage) = &response.usage {
                debug!(
                    round,
                    prompt_tokens = usage.prompt_tokens,
                    completion_tokens = usage.completion_tokens,
                    "generate: usage"
                );
            }

            let choice = response
                .choices
                .into_iter()
                .next()
                .ok_or_else(|| ModelError::InvalidResponse("response contained no choices".to_string()))?;

            let calls = choice.message.tool_calls.unwrap_or_default();
            if calls.is_empty() {
                if choice.finish_reason.as_deref() == Some("length") {
                    warn!("generate: output truncated by max_tokens");
                }
                let text = choice.message.content.unwrap_or_default();
                let data = match &request.output {
                    Some(_) => Some(extract_json(&text)?),
                    None => None,
                };
                info!(round, tool_calls = tool_calls_made, "generate: completed");
                return Ok(Generation {
                    text,
                    data,
                    tool_calls: tool_calls_made,
                });
            }

            messages.push(json!({
                "role": "assistant",
                "content": choice.message.content,
                "tool_calls": calls,
            }));
            for call in &calls {
                debug!(round, tool = %call.function.name, "generate: executing tool call");
                let result = self.run_tool(call).await?;
                tool_calls_made += 1;
                messages.push(json!({
                    "role": "tool",
                    "tool_call_id": call.id,
                    "content": result.to_string(),
                }));
            }
        }

        Err(ModelError::ToolRoundsExceeded(self.max_tool_rounds))
    }
}

/// Parse a JSON payload out of model text, tolerating Markdown code fences
/// and leading or trailing prose
pub fn extract_json(text: &str) -> Result<Value, ModelError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ModelError::InvalidResponse("empty response".to_string()));
    }
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }

    let fenced = trimmed
        .split("```")
        .nth(1)
        .map(|block| block.trim_start_matches("json").trim());
    if let Some(value) = fenced.and_then(|block| serde_json::from_str(block).ok()) {
        return Ok(value);
    }

    let start = trimmed.find(['{', '[']);
    let end = trimmed.rfind(['}', ']']);
    if let (Some(start), Some(end)) = (start, end) {
        if start < end {
            return Ok(serde_json::from_str(&trimmed[start..=end])?);
        }
    }

    Err(ModelError::InvalidResponse(format!(
        "no JSON found in response: {}",
        trimmed.chars().take(80).collect::<String>()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::SamplingConfig;
    use crate::schema::{Field, OutputSchema, Shape};

    fn service() -> OpenAiCompatibleService {
        let config = ModelConfig {
            base_url: "http://localhost:11434/v1/".to_string(),
            model: "test-model".to_string(),
            ..ModelConfig::default()
        };
        OpenAiCompatibleService::new(&config, Arc::new(ToolRegistry::new())).unwrap()
    }

    #[test]
    fn test_base_url_is_normalized() {
        assert_eq!(service().base_url, "http://localhost:11434/v1");
    }

    #[test]
    fn test_request_body_includes_sampling_and_schema() {
        let svc = service();
        let request = GenerateRequest::new("Plan outfits")
            .with_system("You are a stylist.")
            .with_output(OutputSchema::new(
                "outfit_plan",
                Shape::object([Field::required("outfits", Shape::array_of(Shape::String))]),
            ))
            .with_sampling(SamplingConfig {
                temperature: Some(0.9),
                top_p: Some(0.95),
                top_k: Some(40),
                max_tokens: Some(2048),
                stop: vec!["<END_OF_PLAN>".to_string()],
            });

        let messages = OpenAiCompatibleService::initial_messages(&request);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");

        let body = svc.build_request_body(&request, &messages, &[]);
        assert_eq!(body["model"], "test-model");
        assert_eq!(body["top_k"], 40);
        assert_eq!(body["max_tokens"], 2048);
        assert_eq!(body["stop"], json!(["<END_OF_PLAN>"]));
        assert_eq!(body["response_format"]["json_schema"]["name"], "outfit_plan");
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn test_unknown_tool_is_rejected() {
        let err = service()
            .tool_definitions(&["teleport".to_string()])
            .unwrap_err();
        assert!(matches!(err, ModelError::UnknownTool(name) if name == "teleport"));
    }

    #[test]
    fn test_response_parsing_with_tool_calls() {
        let body = r#"{
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "geocode_location", "arguments": "{\"location\":\"Paris\"}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 7, "total_tokens": 19}
        }"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        let calls = parsed.choices[0].message.tool_calls.clone().unwrap();
        assert_eq!(calls[0].function.name, "geocode_location");
        assert_eq!(calls[0].kind, "function");

        let echoed = serde_json::to_value(&calls[0]).unwrap();
        assert_eq!(echoed["type"], "function");
    }

    #[test]
    fn test_extract_plain_json() {
        let value = extract_json(r#" {"city": "Paris"} "#).unwrap();
        assert_eq!(value["city"], "Paris");
    }

    #[test]
    fn test_extract_fenced_json() {
        let text = "Here you go:\n```json\n{\"items\": []}\n```\nEnjoy!";
        let value = extract_json(text).unwrap();
        assert_eq!(value, json!({ "items": [] }));
    }

    #[test]
    fn test_extract_embedded_json() {
        let value = extract_json("Result: {\"ok\": true} done").unwrap();
        assert_eq!(value["ok"], true);
    }

    #[test]
    fn test_extract_rejects_prose() {
        assert!(matches!(
            extract_json("I could not find that place."),
            Err(ModelError::InvalidResponse(_))
        ));
        assert!(extract_json("   ").is_err());
    }
}

//! Gemini (Vertex AI) adapter
//!
//! Talks to the `generateContent` endpoint with function declarations and,
//! when requested, Google Search grounding. Strict mode: when the runtime
//! requires the grounded backend, a missing project binding fails
//! construction with a configuration error — there is no fallback path.

use std::sync::Arc;

use legalmind_core::{Citation, RuntimeConfig};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::client::{ModelClient, ModelError, ModelResult};
use crate::types::{
    ContentPart, FinishReason, GenerateRequest, ModelContent, ModelResponse, ToolRequest, Usage,
};

/// Bearer-token seam. Production binds a managed-identity flow; tests and
/// local runs use `StaticToken`.
#[async_trait::async_trait]
pub trait TokenProvider: Send + Sync {
    async fn bearer_token(&self) -> ModelResult<String>;
}

pub struct StaticToken(pub String);

#[async_trait::async_trait]
impl TokenProvider for StaticToken {
    async fn bearer_token(&self) -> ModelResult<String> {
        Ok(self.0.clone())
    }
}

pub struct GeminiClient {
    http: Client,
    endpoint: String,
    model: String,
    tokens: Arc<dyn TokenProvider>,
    context_window: usize,
}

impl GeminiClient {
    /// Build the adapter from runtime config. Fails fast when grounded
    /// access is required but the project binding is absent.
    pub fn new(config: &RuntimeConfig, tokens: Arc<dyn TokenProvider>) -> ModelResult<Self> {
        if config.vertex_project.is_empty() {
            if config.use_grounded_backend {
                return Err(ModelError::Configuration(
                    "grounded backend required but vertex_project is not set".into(),
                ));
            }
            return Err(ModelError::Configuration(
                "vertex_project is not set".into(),
            ));
        }

        let endpoint = format!(
            "https://{loc}-aiplatform.googleapis.com/v1/projects/{proj}/locations/{loc}/publishers/google/models/{model}:generateContent",
            loc = config.vertex_location,
            proj = config.vertex_project,
            model = config.vertex_model,
        );

        Ok(Self {
            http: Client::new(),
            endpoint,
            model: config.vertex_model.clone(),
            tokens,
            context_window: config.model_context_window,
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn build_body(&self, request: &GenerateRequest) -> Value {
        let contents: Vec<Value> = request.messages.iter().map(to_gemini_content).collect();

        let mut generation_config = json!({
            "temperature": request.options.temperature,
            "maxOutputTokens": request.options.max_output_tokens,
        });
        if let Some(top_p) = request.options.top_p {
            generation_config["topP"] = json!(top_p);
        }
        if let Some(top_k) = request.options.top_k {
            generation_config["topK"] = json!(top_k);
        }
        if let Some(ref mime) = request.options.response_mime {
            generation_config["responseMimeType"] = json!(mime);
        }

        let mut tools = Vec::new();
        if !request.tools.is_empty() {
            let declarations: Vec<Value> = request
                .tools
                .iter()
                .map(|t| {
                    json!({
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.parameter_schema,
                    })
                })
                .collect();
            tools.push(json!({ "functionDeclarations": declarations }));
        }
        if request.options.grounded_search {
            tools.push(json!({ "googleSearch": {} }));
        }

        let mut body = json!({
            "contents": contents,
            "generationConfig": generation_config,
        });
        if let Some(ref system) = request.system {
            body["systemInstruction"] = json!({ "parts": [{ "text": system }] });
        }
        if !tools.is_empty() {
            body["tools"] = json!(tools);
        }
        body
    }
}

#[async_trait::async_trait]
impl ModelClient for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    fn context_window(&self) -> usize {
        self.context_window
    }

    async fn generate(
        &self,
        request: &GenerateRequest,
        cancel: Option<CancellationToken>,
    ) -> ModelResult<ModelResponse> {
        let body = self.build_body(request);
        let token = self.tokens.bearer_token().await?;

        debug!(model = %self.model, messages = request.messages.len(), "Gemini request");

        let send = self
            .http
            .post(&self.endpoint)
            .bearer_auth(token)
            .header("content-type", "application/json")
            .json(&body)
            .send();

        let response = match cancel {
            Some(cancel) => tokio::select! {
                r = send => r?,
                _ = cancel.cancelled() => return Err(ModelError::Cancelled),
            },
            None => send.await?,
        };

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Gemini error {}: {}", status, error_text);

            return Err(match status.as_u16() {
                401 | 403 => ModelError::AuthFailed(error_text),
                429 => ModelError::RateLimited { retry_after_ms: 60_000 },
                _ => ModelError::RequestFailed(format!("{}: {}", status, error_text)),
            });
        }

        let raw: GeminiResponse = response.json().await?;
        parse_response(raw)
    }
}

/// Map a transcript message to a Gemini `contents` entry. Assistant turns
/// become `model` role; tool results travel as `functionResponse` parts in
/// a user turn.
fn to_gemini_content(message: &crate::types::ModelMessage) -> Value {
    let role = if message.role == "assistant" { "model" } else { "user" };
    let parts: Vec<Value> = match &message.content {
        ModelContent::Text(text) => vec![json!({ "text": text })],
        ModelContent::Parts(parts) => parts
            .iter()
            .map(|p| match p {
                ContentPart::Text { text } => json!({ "text": text }),
                ContentPart::ToolUse { name, input, .. } => json!({
                    "functionCall": { "name": name, "args": input }
                }),
                ContentPart::ToolResult { name, content, is_error, .. } => {
                    let response = if is_error.unwrap_or(false) {
                        json!({ "error": content })
                    } else {
                        json!({ "result": content })
                    };
                    json!({ "functionResponse": { "name": name, "response": response } })
                }
            })
            .collect(),
    };
    json!({ "role": role, "parts": parts })
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(rename = "usageMetadata", default)]
    usage_metadata: Option<GeminiUsage>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
    #[serde(rename = "finishReason", default)]
    finish_reason: Option<String>,
    #[serde(rename = "groundingMetadata", default)]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
    #[serde(rename = "functionCall", default)]
    function_call: Option<GeminiFunctionCall>,
}

#[derive(Debug, Deserialize)]
struct GeminiFunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Deserialize)]
struct GroundingMetadata {
    #[serde(rename = "groundingChunks", default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    #[serde(default)]
    web: Option<WebSource>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WebSource {
    #[serde(default)]
    uri: String,
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
struct GeminiUsage {
    #[serde(rename = "promptTokenCount", default)]
    prompt_token_count: u32,
    #[serde(rename = "candidatesTokenCount", default)]
    candidates_token_count: u32,
}

fn parse_response(raw: GeminiResponse) -> ModelResult<ModelResponse> {
    let candidate = raw
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| ModelError::InvalidResponse("no candidates returned".into()))?;

    let mut content_parts = Vec::new();
    let mut tool_requests = Vec::new();

    if let Some(content) = candidate.content {
        for part in content.parts {
            if let Some(text) = part.text {
                content_parts.push(text);
            }
            if let Some(call) = part.function_call {
                // Gemini carries no call ids; mint locally so results
                // can be paired with their requests.
                let id = format!("call_{}", uuid::Uuid::new_v4().simple());
                tool_requests.push(ToolRequest {
                    id,
                    name: call.name,
                    arguments: call.args,
                });
            }
        }
    }

    let citations = candidate
        .grounding_metadata
        .map(|g| {
            g.grounding_chunks
                .into_iter()
                .filter_map(|c| c.web)
                .filter(|w| !w.uri.is_empty())
                .map(|w| Citation { title: w.title, uri: w.uri, start: None, end: None })
                .collect()
        })
        .unwrap_or_default();

    let finish_reason = if !tool_requests.is_empty() {
        FinishReason::ToolUse
    } else {
        match candidate.finish_reason.as_deref() {
            Some("STOP") | None => FinishReason::Stop,
            Some("MAX_TOKENS") => FinishReason::MaxTokens,
            Some(other) => FinishReason::Other(other.to_string()),
        }
    };

    let usage = raw
        .usage_metadata
        .map(|u| Usage {
            input_tokens: u.prompt_token_count,
            output_tokens: u.candidates_token_count,
        })
        .unwrap_or_default();

    Ok(ModelResponse { content_parts, tool_requests, citations, finish_reason, usage })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_mode_fails_without_project() {
        let mut config = RuntimeConfig::default();
        config.use_grounded_backend = true;
        config.vertex_project = String::new();

        let result = GeminiClient::new(&config, Arc::new(StaticToken("t".into())));
        assert!(matches!(result, Err(ModelError::Configuration(_))));
    }

    #[test]
    fn parses_grounded_response() {
        let raw: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Force majeure excuses performance." }] },
                "finishReason": "STOP",
                "groundingMetadata": {
                    "groundingChunks": [
                        { "web": { "uri": "https://law.example/fm", "title": "Force majeure" } }
                    ]
                }
            }],
            "usageMetadata": { "promptTokenCount": 12, "candidatesTokenCount": 34 }
        }))
        .unwrap();

        let resp = parse_response(raw).unwrap();
        assert_eq!(resp.finish_reason, FinishReason::Stop);
        assert_eq!(resp.citations.len(), 1);
        assert_eq!(resp.citations[0].uri, "https://law.example/fm");
        assert_eq!(resp.usage.input_tokens, 12);
    }

    #[test]
    fn parses_function_call() {
        let raw: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "parts": [
                    { "functionCall": { "name": "get_contract_by_id", "args": { "contract_id": "C1" } } }
                ]},
                "finishReason": "STOP"
            }]
        }))
        .unwrap();

        let resp = parse_response(raw).unwrap();
        assert_eq!(resp.finish_reason, FinishReason::ToolUse);
        assert_eq!(resp.tool_requests.len(), 1);
        assert_eq!(resp.tool_requests[0].name, "get_contract_by_id");
        assert!(resp.tool_requests[0].id.starts_with("call_"));
    }
}

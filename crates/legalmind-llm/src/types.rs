//! Model request and response types

use legalmind_core::Citation;
use serde::{Deserialize, Serialize};

/// A message in the model transcript
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelMessage {
    pub role: String,
    pub content: ModelContent,
}

impl ModelMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: ModelContent::Text(text.into()) }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self { role: "assistant".to_string(), content: ModelContent::Text(text.into()) }
    }
}

/// Message content - plain text or structured parts
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// Structured content parts
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentPart {
    #[serde(rename = "text")]
    Text { text: String },

    #[serde(rename = "tool_use")]
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },

    #[serde(rename = "tool_result")]
    ToolResult {
        tool_use_id: String,
        name: String,
        content: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
}

/// Tool menu entry passed verbatim to the model
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    pub parameter_schema: serde_json::Value,
}

/// Per-call generation options
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerateOptions {
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    pub max_output_tokens: u32,
    pub grounded_search: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime: Option<String>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            temperature: 0.5,
            top_p: None,
            top_k: None,
            max_output_tokens: 8192,
            grounded_search: false,
            response_mime: None,
        }
    }
}

/// One full model request: system block, transcript, tool menu, options.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GenerateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub messages: Vec<ModelMessage>,
    #[serde(default)]
    pub tools: Vec<ToolDeclaration>,
    #[serde(default)]
    pub options: GenerateOptions,
}

/// A function call the model requests
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ToolRequest {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// Outcome of one dispatched tool call, fed back to the model.
#[derive(Clone, Debug)]
pub struct ToolResultPart {
    pub tool_use_id: String,
    pub name: String,
    pub content: String,
    pub is_error: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    ToolUse,
    MaxTokens,
    Other(String),
}

/// Token accounting (advisory).
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Normalized model output
#[derive(Clone, Debug)]
pub struct ModelResponse {
    pub content_parts: Vec<String>,
    pub tool_requests: Vec<ToolRequest>,
    pub citations: Vec<Citation>,
    pub finish_reason: FinishReason,
    pub usage: Usage,
}

impl ModelResponse {
    /// Concatenated text content.
    pub fn text(&self) -> String {
        self.content_parts.join("")
    }
}

/// Grow a transcript with the assistant turn and its tool results,
/// producing the request for the next model call. Adapters that cannot
/// natively continue replay this transcript in full.
pub fn extend_with_tool_results(
    mut prior: GenerateRequest,
    response: &ModelResponse,
    results: Vec<ToolResultPart>,
) -> GenerateRequest {
    let mut assistant_parts = Vec::new();
    let text = response.text();
    if !text.is_empty() {
        assistant_parts.push(ContentPart::Text { text });
    }
    for tr in &response.tool_requests {
        assistant_parts.push(ContentPart::ToolUse {
            id: tr.id.clone(),
            name: tr.name.clone(),
            input: tr.arguments.clone(),
        });
    }
    prior.messages.push(ModelMessage {
        role: "assistant".to_string(),
        content: ModelContent::Parts(assistant_parts),
    });

    // All tool results for a turn travel in a single user message.
    let result_parts: Vec<ContentPart> = results
        .into_iter()
        .map(|r| ContentPart::ToolResult {
            tool_use_id: r.tool_use_id,
            name: r.name,
            content: r.content,
            is_error: if r.is_error { Some(true) } else { None },
        })
        .collect();
    prior.messages.push(ModelMessage {
        role: "user".to_string(),
        content: ModelContent::Parts(result_parts),
    });
    prior
}

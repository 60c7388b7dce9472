//! Shared test fixtures: a deterministic scripted ModelClient
//!
//! Each generate call pops the next behavior; an exhausted script falls
//! back to a default text reply. Behaviors exercise specific tool-call
//! and failure paths in the runner and orchestrator.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use legalmind_core::Citation;
use legalmind_llm::{
    FinishReason, GenerateRequest, ModelClient, ModelError, ModelResponse, ModelResult,
    ToolRequest, Usage,
};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

#[derive(Clone, Debug)]
pub enum Behavior {
    /// Text-only response.
    Text(String),
    /// Text with grounding citations.
    Grounded(String, Vec<Citation>),
    /// One or more tool calls, in order.
    ToolCalls(Vec<(String, Value)>),
    /// Never responds (until cancelled or the caller times out).
    Hang,
    /// A model-level error.
    Error(String),
}

pub struct ScriptedModel {
    behaviors: Mutex<Vec<Behavior>>,
    default_behavior: Behavior,
    calls: AtomicUsize,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedModel {
    pub fn sequence(behaviors: Vec<Behavior>) -> Self {
        Self {
            behaviors: Mutex::new(behaviors),
            default_behavior: Behavior::Text("(script exhausted)".into()),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn constant(behavior: Behavior) -> Self {
        Self {
            behaviors: Mutex::new(Vec::new()),
            default_behavior: behavior,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every request this model received, in call order.
    pub fn recorded_requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next_behavior(&self) -> Behavior {
        let mut behaviors = self.behaviors.lock().unwrap();
        if behaviors.is_empty() {
            self.default_behavior.clone()
        } else {
            behaviors.remove(0)
        }
    }
}

#[async_trait::async_trait]
impl ModelClient for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(
        &self,
        request: &GenerateRequest,
        cancel: Option<CancellationToken>,
    ) -> ModelResult<ModelResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        match self.next_behavior() {
            Behavior::Text(text) => Ok(text_response(text, vec![])),
            Behavior::Grounded(text, citations) => Ok(text_response(text, citations)),
            Behavior::ToolCalls(calls) => {
                let tool_requests = calls
                    .into_iter()
                    .enumerate()
                    .map(|(i, (name, arguments))| ToolRequest {
                        id: format!("call_{}_{}", self.call_count(), i),
                        name,
                        arguments,
                    })
                    .collect();
                Ok(ModelResponse {
                    content_parts: vec![],
                    tool_requests,
                    citations: vec![],
                    finish_reason: FinishReason::ToolUse,
                    usage: Usage::default(),
                })
            }
            Behavior::Hang => {
                let cancel = cancel.unwrap_or_default();
                cancel.cancelled().await;
                Err(ModelError::Cancelled)
            }
            Behavior::Error(message) => Err(ModelError::RequestFailed(message)),
        }
    }
}

fn text_response(text: String, citations: Vec<Citation>) -> ModelResponse {
    ModelResponse {
        content_parts: vec![text],
        tool_requests: vec![],
        citations,
        finish_reason: FinishReason::Stop,
        usage: Usage { input_tokens: 10, output_tokens: 10 },
    }
}

pub fn citation(uri: &str, title: &str) -> Citation {
    Citation { title: title.to_string(), uri: uri.to_string(), start: None, end: None }
}

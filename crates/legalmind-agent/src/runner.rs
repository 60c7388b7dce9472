//! Agent runner — one agent driven to a terminal state
//!
//! The loop: build the request, call the model, dispatch any requested
//! tools in the order the model asked for them, feed results back,
//! repeat. Bounded by the agent's iteration cap and a wall-clock budget.
//! Terminal states are complete and failed; a failed agent never panics
//! the pipeline.

use std::sync::Arc;
use std::time::Duration;

use legalmind_core::{Citation, ErrorKind, LogStage};
use legalmind_llm::{
    GenerateOptions, GenerateRequest, ModelClient, ToolResultPart,
};
use legalmind_tools::{ToolContext, ToolRegistry};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::catalog::AgentDefinition;
use crate::context::AssembledContext;

/// Why an agent turn failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnFailure {
    ToolLoopExceeded,
    Timeout,
    Model(String),
}

impl TurnFailure {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ToolLoopExceeded => ErrorKind::ToolLoopExceeded,
            Self::Timeout => ErrorKind::AgentTimeout,
            Self::Model(_) => ErrorKind::Internal,
        }
    }
}

/// Terminal result of one agent turn.
#[derive(Clone, Debug)]
pub struct AgentOutcome {
    pub agent: String,
    pub content: String,
    pub citations: Vec<Citation>,
    pub tools_used: Vec<String>,
    pub failure: Option<TurnFailure>,
}

impl AgentOutcome {
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }
}

pub struct AgentRunner {
    model: Arc<dyn ModelClient>,
    registry: Arc<ToolRegistry>,
    turn_timeout: Duration,
}

impl AgentRunner {
    pub fn new(model: Arc<dyn ModelClient>, registry: Arc<ToolRegistry>, turn_timeout: Duration) -> Self {
        Self { model, registry, turn_timeout }
    }

    /// Drive one agent to completion within the wall-clock budget. On
    /// timeout, in-flight model calls and tool handlers are cancelled and
    /// the user sees a polite retry prompt.
    pub async fn run(
        &self,
        agent: &AgentDefinition,
        context: AssembledContext,
        tool_ctx: &ToolContext,
        cancel: CancellationToken,
    ) -> AgentOutcome {
        tool_ctx.logger.event(
            agent.name,
            LogStage::AgentStart,
            json!({ "tools": agent.tools, "grounded_search": agent.grounded_search }),
        );

        let turn = self.drive(agent, context, tool_ctx, cancel.clone());
        let outcome = match tokio::time::timeout(self.turn_timeout, turn).await {
            Ok(outcome) => outcome,
            Err(_) => {
                cancel.cancel();
                warn!(agent = agent.name, timeout_s = self.turn_timeout.as_secs(), "agent turn timed out");
                AgentOutcome {
                    agent: agent.name.to_string(),
                    content: ErrorKind::AgentTimeout.user_message().to_string(),
                    citations: Vec::new(),
                    tools_used: Vec::new(),
                    failure: Some(TurnFailure::Timeout),
                }
            }
        };

        match &outcome.failure {
            None => {
                tool_ctx.logger.event(
                    agent.name,
                    LogStage::AgentOutput,
                    json!({
                        "content_chars": outcome.content.len(),
                        "citations": outcome.citations.len(),
                        "tools_used": outcome.tools_used,
                    }),
                );
            }
            Some(failure) => {
                tool_ctx.logger.event(
                    agent.name,
                    LogStage::Error,
                    json!({ "kind": failure.kind().as_str(), "detail": format!("{:?}", failure) }),
                );
            }
        }
        outcome
    }

    async fn drive(
        &self,
        agent: &AgentDefinition,
        context: AssembledContext,
        tool_ctx: &ToolContext,
        cancel: CancellationToken,
    ) -> AgentOutcome {
        let mut request = GenerateRequest {
            system: Some(context.system),
            messages: context.messages,
            tools: self.registry.declarations_for(&agent.tools),
            options: GenerateOptions {
                temperature: agent.temperature,
                max_output_tokens: agent.max_output_tokens,
                grounded_search: agent.grounded_search,
                ..Default::default()
            },
        };

        let mut citations: Vec<Citation> = Vec::new();
        let mut tools_used: Vec<String> = Vec::new();
        let mut partial_content = String::new();

        let mut response = match self.model.generate(&request, Some(cancel.clone())).await {
            Ok(r) => r,
            Err(e) => return self.model_failure(agent, e.to_string()),
        };
        let mut model_calls = 1usize;

        loop {
            citations.extend(response.citations.iter().cloned());
            let text = response.text();
            if !text.is_empty() {
                partial_content = text;
            }

            if response.tool_requests.is_empty() {
                info!(agent = agent.name, model_calls, "agent complete");
                return AgentOutcome {
                    agent: agent.name.to_string(),
                    content: partial_content,
                    citations,
                    tools_used,
                    failure: None,
                };
            }

            // Iteration cap: an agent that keeps requesting tools stops
            // after max_tool_iterations continuations.
            if model_calls > agent.max_tool_iterations {
                warn!(agent = agent.name, model_calls, "tool loop exceeded");
                let mut content = partial_content;
                if content.is_empty() {
                    content = ErrorKind::ToolLoopExceeded.user_message().to_string();
                } else {
                    content.push_str("\n\n(The analysis stopped before finishing every step.)");
                }
                return AgentOutcome {
                    agent: agent.name.to_string(),
                    content,
                    citations,
                    tools_used,
                    failure: Some(TurnFailure::ToolLoopExceeded),
                };
            }

            // Dispatch in the order the model requested; the model's own
            // ordering carries its data dependencies.
            let mut results = Vec::with_capacity(response.tool_requests.len());
            for tr in &response.tool_requests {
                let outcome = self
                    .registry
                    .dispatch(&tr.name, tr.arguments.clone(), tool_ctx, cancel.clone())
                    .await;
                tools_used.push(tr.name.clone());

                // Events are paired atomically after dispatch so a
                // mid-dispatch cancellation never leaves an orphan call.
                tool_ctx.logger.event(
                    agent.name,
                    LogStage::ToolCall,
                    json!({ "id": tr.id, "name": tr.name, "arguments": tr.arguments }),
                );
                tool_ctx.logger.event(
                    agent.name,
                    LogStage::ToolResult,
                    json!({
                        "id": tr.id,
                        "name": tr.name,
                        "is_error": outcome.is_error(),
                        "payload": outcome.to_model_payload(),
                    }),
                );

                results.push(ToolResultPart {
                    tool_use_id: tr.id.clone(),
                    name: tr.name.clone(),
                    content: outcome.to_model_payload(),
                    is_error: outcome.is_error(),
                });
            }

            match self
                .model
                .continue_with_tool_results(request, &response, results, Some(cancel.clone()))
                .await
            {
                Ok((next_request, next_response)) => {
                    request = next_request;
                    response = next_response;
                    model_calls += 1;
                }
                Err(e) => return self.model_failure(agent, e.to_string()),
            }
        }
    }

    fn model_failure(&self, agent: &AgentDefinition, detail: String) -> AgentOutcome {
        warn!(agent = agent.name, error = %detail, "model call failed");
        AgentOutcome {
            agent: agent.name.to_string(),
            content: String::new(),
            citations: Vec::new(),
            tools_used: Vec::new(),
            failure: Some(TurnFailure::Model(detail)),
        }
    }
}

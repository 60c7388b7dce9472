//! Tool registry and trait definitions
//!
//! The single source of truth for every callable tool. Dispatch validates
//! arguments against the declared schema before any handler runs, bounds
//! handler time, and maps every failure into a payload the model can
//! recover from. The orchestrator never raises on handler failure.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use legalmind_llm::ToolDeclaration;
use legalmind_store::{BlobStore, DocumentCodec, Store, ThinkingLogger};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::schema::validate_args;

/// Per-turn context handed to every handler.
#[derive(Clone)]
pub struct ToolContext {
    pub session_id: String,
    pub turn_id: String,
    pub active_contract_id: Option<String>,
    pub store: Arc<dyn Store>,
    pub blobs: Arc<dyn BlobStore>,
    pub codec: Arc<dyn DocumentCodec>,
    pub logger: Arc<ThinkingLogger>,
}

/// Failure kinds a dispatch can produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    UnknownTool,
    BadArguments,
    HandlerError,
    HandlerTimeout,
    UpstreamUnavailable,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownTool => "unknown_tool",
            Self::BadArguments => "bad_arguments",
            Self::HandlerError => "handler_error",
            Self::HandlerTimeout => "handler_timeout",
            Self::UpstreamUnavailable => "upstream_unavailable",
        }
    }
}

#[derive(Clone, Debug)]
pub struct DispatchFailure {
    pub kind: FailureKind,
    pub message: String,
    /// Field-level validation errors (bad_arguments only).
    pub fields: Vec<String>,
}

/// Handler-level error. The registry maps these onto failure kinds.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("{0}")]
    Failed(String),

    #[error("upstream unavailable: {0}")]
    Upstream(String),
}

impl From<legalmind_store::StoreError> for HandlerError {
    fn from(e: legalmind_store::StoreError) -> Self {
        match e {
            legalmind_store::StoreError::NotFound { .. } => Self::Failed(e.to_string()),
            legalmind_store::StoreError::Backend(msg) => Self::Upstream(msg),
        }
    }
}

pub type HandlerResult = Result<Value, HandlerError>;

/// Outcome of one dispatch. Failures are serialized back to the model as
/// `{"error": "...", "kind": "..."}` so it can correct itself.
#[derive(Clone, Debug)]
pub enum ToolOutcome {
    Ok(Value),
    Failed(DispatchFailure),
}

impl ToolOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Payload fed back to the model.
    pub fn to_model_payload(&self) -> String {
        match self {
            Self::Ok(value) => value.to_string(),
            Self::Failed(failure) => json!({
                "error": failure.message,
                "kind": failure.kind.as_str(),
            })
            .to_string(),
        }
    }
}

/// The Tool trait. Each group of handlers lives in its own file under
/// tools/ and registers in create_default_registry().
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Unique tool name (e.g. "extract_clauses").
    fn name(&self) -> &str;

    /// Human-readable description sent to the model.
    fn description(&self) -> &str;

    /// JSON-schema-like object with typed fields and required markers.
    fn parameter_schema(&self) -> Value;

    /// Whether this tool mutates state.
    fn side_effecting(&self) -> bool {
        false
    }

    /// Execute with validated arguments and the per-turn context.
    async fn execute(&self, args: Value, ctx: &ToolContext) -> HandlerResult;
}

pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    handler_timeout: Duration,
}

impl ToolRegistry {
    pub fn new(handler_timeout: Duration) -> Self {
        Self { tools: HashMap::new(), handler_timeout }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: impl Tool + 'static) {
        let name = tool.name().to_string();
        self.tools.insert(name, Arc::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn list(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    /// The full tool menu.
    pub fn declarations(&self) -> Vec<ToolDeclaration> {
        self.tools.values().map(|t| to_declaration(t.as_ref())).collect()
    }

    /// The curated subset an agent sees. Unknown names are skipped with a
    /// warning rather than failing the turn.
    pub fn declarations_for(&self, names: &[&str]) -> Vec<ToolDeclaration> {
        names
            .iter()
            .filter_map(|name| match self.tools.get(*name) {
                Some(tool) => Some(to_declaration(tool.as_ref())),
                None => {
                    warn!(tool = name, "agent references unregistered tool");
                    None
                }
            })
            .collect()
    }

    /// Validate and run one tool call.
    pub async fn dispatch(
        &self,
        name: &str,
        raw_args: Value,
        ctx: &ToolContext,
        cancel: CancellationToken,
    ) -> ToolOutcome {
        let Some(tool) = self.tools.get(name) else {
            return ToolOutcome::Failed(DispatchFailure {
                kind: FailureKind::UnknownTool,
                message: format!("tool not found: {}", name),
                fields: Vec::new(),
            });
        };

        if let Err(fields) = validate_args(&tool.parameter_schema(), &raw_args) {
            return ToolOutcome::Failed(DispatchFailure {
                kind: FailureKind::BadArguments,
                message: format!("invalid arguments for {}: {}", name, fields.join("; ")),
                fields,
            });
        }

        let started = std::time::Instant::now();
        let run = tool.execute(raw_args, ctx);

        let result = tokio::select! {
            r = tokio::time::timeout(self.handler_timeout, run) => r,
            _ = cancel.cancelled() => {
                warn!(tool = name, "tool handler cancelled");
                return ToolOutcome::Failed(DispatchFailure {
                    kind: FailureKind::HandlerError,
                    message: format!("{} was cancelled", name),
                    fields: Vec::new(),
                });
            }
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match result {
            Ok(Ok(value)) => {
                info!(tool = name, duration_ms = elapsed_ms, "tool completed");
                ToolOutcome::Ok(value)
            }
            Ok(Err(HandlerError::Failed(message))) => {
                warn!(tool = name, duration_ms = elapsed_ms, error = %message, "tool failed");
                ToolOutcome::Failed(DispatchFailure {
                    kind: FailureKind::HandlerError,
                    message,
                    fields: Vec::new(),
                })
            }
            Ok(Err(HandlerError::Upstream(message))) => {
                warn!(tool = name, duration_ms = elapsed_ms, error = %message, "upstream unavailable");
                ToolOutcome::Failed(DispatchFailure {
                    kind: FailureKind::UpstreamUnavailable,
                    message,
                    fields: Vec::new(),
                })
            }
            Err(_) => {
                warn!(tool = name, timeout_ms = self.handler_timeout.as_millis() as u64, "tool timed out");
                ToolOutcome::Failed(DispatchFailure {
                    kind: FailureKind::HandlerTimeout,
                    message: format!(
                        "{} did not complete within {} seconds",
                        name,
                        self.handler_timeout.as_secs()
                    ),
                    fields: Vec::new(),
                })
            }
        }
    }
}

fn to_declaration(tool: &dyn Tool) -> ToolDeclaration {
    ToolDeclaration {
        name: tool.name().to_string(),
        description: tool.description().to_string(),
        parameter_schema: tool.parameter_schema(),
    }
}

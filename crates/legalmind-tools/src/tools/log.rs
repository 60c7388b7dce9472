//! Logging tool — the agent's direct path into the thinking trace

use serde_json::{json, Value};

use crate::registry::{HandlerResult, Tool, ToolContext};
use crate::tools::contract::require_str;

pub struct LogThoughtTool;

#[async_trait::async_trait]
impl Tool for LogThoughtTool {
    fn name(&self) -> &str {
        "log_thought"
    }

    fn description(&self) -> &str {
        "Record an internal reasoning note in the thinking trace. Use for intermediate conclusions worth auditing."
    }

    fn parameter_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "agent_name": { "type": "string" },
                "stage": { "type": "string", "description": "Your label for this reasoning step" },
                "payload": { "type": "object", "description": "Structured note content" }
            },
            "required": ["agent_name", "stage"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> HandlerResult {
        let agent_name = require_str(&args, "agent_name")?;
        let stage = require_str(&args, "stage")?;
        let payload = args.get("payload").cloned().unwrap_or(json!({}));

        ctx.logger.thought(agent_name, stage, payload);
        Ok(json!({ "logged": true }))
    }
}

//! Wire contract for the chat surface
//!
//! The user-facing text field is named `message`, not `response`; clients
//! still reading `response` must migrate. Transports render these types
//! verbatim.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::types::Citation;

pub const MAX_MESSAGE_CHARS: usize = 8_000;

#[derive(Clone, Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub contract_id: Option<String>,
}

impl ChatRequest {
    /// Empty/whitespace-only or over-length messages are invalid_request.
    pub fn validate(&self) -> Result<()> {
        if self.message.trim().is_empty() {
            return Err(CoreError::InvalidRequest("message must not be empty".into()));
        }
        if self.message.chars().count() > MAX_MESSAGE_CHARS {
            return Err(CoreError::InvalidRequest(format!(
                "message exceeds {} characters",
                MAX_MESSAGE_CHARS
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub success: bool,
    pub message: String,
    pub agent: String,
    pub agent_id: String,
    pub citations: Vec<Citation>,
    pub tools_used: Vec<String>,
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Error body for requests that never reached a turn.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, details: Option<String>) -> Self {
        Self { success: false, error: error.into(), details }
    }
}

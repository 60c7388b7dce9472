//! Error taxonomy surfaced by the orchestration core
//!
//! The orchestrator never raises to the transport: every failure is mapped
//! through `ErrorKind` into a structured response plus a server-side log.
//! User-visible text comes from the table here; technical detail stays in
//! the tracing output.

use thiserror::Error;

/// Failure kinds surfaced by the core.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidRequest,
    ConfigurationError,
    ToolBadArguments,
    ToolHandlerError,
    ToolHandlerTimeout,
    UpstreamUnavailable,
    ToolLoopExceeded,
    AgentTimeout,
    PipelineAborted,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::ConfigurationError => "configuration_error",
            Self::ToolBadArguments => "tool_bad_arguments",
            Self::ToolHandlerError => "tool_handler_error",
            Self::ToolHandlerTimeout => "tool_handler_timeout",
            Self::UpstreamUnavailable => "upstream_unavailable",
            Self::ToolLoopExceeded => "tool_loop_exceeded",
            Self::AgentTimeout => "agent_timeout",
            Self::PipelineAborted => "pipeline_aborted",
            Self::Internal => "internal",
        }
    }

    /// User-facing text for each kind. Technical strings never reach users.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "That request could not be understood. Please check the message and try again.",
            Self::ConfigurationError => "The service is not fully configured. Please contact the administrator.",
            Self::ToolBadArguments | Self::ToolHandlerError | Self::UpstreamUnavailable => {
                "One of the analysis steps could not be completed."
            }
            Self::ToolHandlerTimeout => "One of the analysis steps took too long and was skipped.",
            Self::ToolLoopExceeded => {
                "The analysis could not be fully completed within the allowed number of steps. Here is what was found so far."
            }
            Self::AgentTimeout => {
                "This is taking longer than expected. Please try again in a moment."
            }
            Self::PipelineAborted => "A required analysis step failed, so the request could not be completed.",
            Self::Internal => "Something went wrong on our side. Please try again.",
        }
    }

    /// HTTP status the transport should use when the turn did not
    /// produce a graceful assistant message.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidRequest => 400,
            Self::AgentTimeout => 504,
            _ => 500,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Core-level error carrying its taxonomy kind.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Self::Configuration(_) => ErrorKind::ConfigurationError,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_serializes_snake_case() {
        let s = serde_json::to_string(&ErrorKind::ToolLoopExceeded).unwrap();
        assert_eq!(s, "\"tool_loop_exceeded\"");
    }

    #[test]
    fn every_kind_has_user_text() {
        for kind in [
            ErrorKind::InvalidRequest,
            ErrorKind::ConfigurationError,
            ErrorKind::ToolBadArguments,
            ErrorKind::ToolHandlerError,
            ErrorKind::ToolHandlerTimeout,
            ErrorKind::UpstreamUnavailable,
            ErrorKind::ToolLoopExceeded,
            ErrorKind::AgentTimeout,
            ErrorKind::PipelineAborted,
            ErrorKind::Internal,
        ] {
            assert!(!kind.user_message().is_empty());
        }
    }
}

//! ModelClient trait

use tokio_util::sync::CancellationToken;

use crate::types::{
    extend_with_tool_results, GenerateRequest, ModelResponse, ToolResultPart,
};

/// Result type for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Model error types
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("rate limited: retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("cancelled")]
    Cancelled,

    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

/// ModelClient trait — the seam between the runtime and any LLM provider.
///
/// `continue_with_tool_results` has a provided implementation that replays
/// the full transcript; adapters with native continuation may override it.
#[async_trait::async_trait]
pub trait ModelClient: Send + Sync {
    fn name(&self) -> &str;

    /// Maximum input context the bound model accepts, in tokens.
    fn context_window(&self) -> usize {
        128_000
    }

    /// One model call. If `cancel` is triggered the underlying HTTP
    /// request is dropped and the call yields `ModelError::Cancelled`.
    async fn generate(
        &self,
        request: &GenerateRequest,
        cancel: Option<CancellationToken>,
    ) -> ModelResult<ModelResponse>;

    /// Feed tool outcomes back and obtain the next response. Returns the
    /// grown transcript alongside the response so callers can continue
    /// the loop without rebuilding state.
    async fn continue_with_tool_results(
        &self,
        prior: GenerateRequest,
        response: &ModelResponse,
        results: Vec<ToolResultPart>,
        cancel: Option<CancellationToken>,
    ) -> ModelResult<(GenerateRequest, ModelResponse)> {
        let next = extend_with_tool_results(prior, response, results);
        let resp = self.generate(&next, cancel).await?;
        Ok((next, resp))
    }
}

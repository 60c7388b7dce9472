//! LegalMind model layer
//!
//! The `ModelClient` trait normalizes LLM access (content generation, tool
//! declarations, grounded search, citation extraction); `GeminiClient` is
//! the Vertex AI implementation.

pub mod client;
pub mod gemini;
pub mod types;

pub use client::{ModelClient, ModelError, ModelResult};
pub use gemini::{GeminiClient, StaticToken, TokenProvider};
pub use types::{
    extend_with_tool_results, ContentPart, FinishReason, GenerateOptions, GenerateRequest,
    ModelContent, ModelMessage, ModelResponse, ToolDeclaration, ToolRequest, ToolResultPart,
    Usage,
};

//! Container-level integration: the assembled App serves a full turn.

use std::sync::Arc;

use legalmind::App;
use legalmind_core::{ChatRequest, RuntimeConfig};
use legalmind_llm::{
    FinishReason, GenerateRequest, ModelClient, ModelResponse, ModelResult, Usage,
};
use tokio_util::sync::CancellationToken;

struct EchoModel;

#[async_trait::async_trait]
impl ModelClient for EchoModel {
    fn name(&self) -> &str {
        "echo"
    }

    async fn generate(
        &self,
        _request: &GenerateRequest,
        _cancel: Option<CancellationToken>,
    ) -> ModelResult<ModelResponse> {
        Ok(ModelResponse {
            content_parts: vec!["Welcome to LegalMind.".into()],
            tool_requests: vec![],
            citations: vec![],
            finish_reason: FinishReason::Stop,
            usage: Usage::default(),
        })
    }
}

#[tokio::test]
async fn assembled_app_handles_a_turn() {
    let app = App::with_model(RuntimeConfig::default(), Arc::new(EchoModel));

    let response = app
        .orchestrator
        .handle(ChatRequest {
            message: "Hello".into(),
            session_id: None,
            contract_id: None,
        })
        .await
        .unwrap();

    assert!(response.success);
    assert_eq!(response.agent, "ASSISTANT");
    assert!(!response.session_id.is_empty());

    // the turn is durably persisted
    use legalmind_core::Role;
    let messages = app.store.list_messages(&response.session_id, 10, None).await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].role, Role::Assistant);
}

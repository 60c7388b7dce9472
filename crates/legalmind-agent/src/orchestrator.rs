//! Session orchestrator — one request, one turn
//!
//! Resolves the session, classifies the message into an agent pipeline,
//! drives the agents sequentially, merges citations, and persists the
//! results in crash-recoverable order: user message first, thinking logs
//! as they accumulate, assistant message last. Never raises to the
//! transport; every outcome is a structured response.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use legalmind_core::{
    ChatRequest, ChatResponse, Citation, CoreError, ErrorKind, LogStage, Message, RuntimeConfig,
    Session,
};
use legalmind_llm::ModelClient;
use legalmind_store::{BlobStore, DocumentCodec, Store, ThinkingLogger};
use legalmind_tools::{ToolContext, ToolRegistry};
use serde_json::json;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::catalog::{AgentCatalog, AgentDefinition, ASSISTANT, CONTRACT_PARSER};
use crate::classify::{QueryClassifier, SessionSnapshot};
use crate::context::ContextBuilder;
use crate::runner::{AgentOutcome, AgentRunner, TurnFailure};

const ORCHESTRATOR: &str = "ORCHESTRATOR";

pub struct SessionOrchestrator {
    store: Arc<dyn Store>,
    blobs: Arc<dyn BlobStore>,
    codec: Arc<dyn DocumentCodec>,
    catalog: AgentCatalog,
    classifier: QueryClassifier,
    context_builder: ContextBuilder,
    runner: AgentRunner,
    request_timeout: Duration,
    model_context_window: usize,
    /// Per-session advisory locks: overlapping turns on one session queue.
    session_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl SessionOrchestrator {
    pub fn new(
        config: &RuntimeConfig,
        store: Arc<dyn Store>,
        blobs: Arc<dyn BlobStore>,
        codec: Arc<dyn DocumentCodec>,
        model: Arc<dyn ModelClient>,
        registry: Arc<ToolRegistry>,
    ) -> Self {
        let context_window = model.context_window();
        Self {
            catalog: AgentCatalog::new(config.max_tool_iterations_default),
            classifier: QueryClassifier::new(Some(model.clone())),
            context_builder: ContextBuilder::new(
                store.clone(),
                config.history_window_pairs,
                config.context_token_budget_fraction,
            ),
            runner: AgentRunner::new(
                model,
                registry,
                Duration::from_secs(config.agent_turn_timeout_seconds),
            ),
            request_timeout: Duration::from_secs(config.request_timeout_seconds),
            model_context_window: context_window,
            session_locks: DashMap::new(),
            store,
            blobs,
            codec,
        }
    }

    pub fn catalog(&self) -> &AgentCatalog {
        &self.catalog
    }

    /// Handle one chat request end to end. `Err` is returned only for
    /// requests rejected before a turn begins (validation); everything
    /// after that surfaces as a structured `ChatResponse`.
    pub async fn handle(&self, request: ChatRequest) -> Result<ChatResponse, CoreError> {
        request.validate()?;

        let session = self.resolve_session(&request).await?;
        let session_id = session.id.clone();

        // Serialize turns per session so message ordering never interleaves.
        let lock = self
            .session_locks
            .entry(session_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        let turn_id = legalmind_core::new_id("turn");
        let logger = Arc::new(ThinkingLogger::new(self.store.clone(), &session_id, &turn_id));

        let turn = self.run_turn(&request, session, &turn_id, logger.clone());
        let response = match tokio::time::timeout(self.request_timeout, turn).await {
            Ok(response) => response,
            Err(_) => {
                warn!(session = %session_id, turn = %turn_id, "request hit the hard ceiling");
                logger.event(
                    ORCHESTRATOR,
                    LogStage::Error,
                    json!({ "kind": ErrorKind::AgentTimeout.as_str(), "detail": "request timeout ceiling" }),
                );
                ChatResponse {
                    success: true,
                    message: ErrorKind::AgentTimeout.user_message().to_string(),
                    agent: ASSISTANT.to_string(),
                    agent_id: "agent.assistant".to_string(),
                    citations: Vec::new(),
                    tools_used: Vec::new(),
                    session_id: session_id.clone(),
                    error: None,
                }
            }
        };

        if let Err(e) = logger.flush().await {
            warn!(session = %session_id, error = %e, "thinking log flush failed");
        }
        Ok(response)
    }

    async fn resolve_session(&self, request: &ChatRequest) -> Result<Session, CoreError> {
        let mut session = match &request.session_id {
            Some(id) => match self.store.get_session(id).await {
                Ok(session) => session,
                // Unknown session ids start a fresh session rather than
                // failing the turn; the response carries the new id.
                Err(_) => Session::new(&request.message, request.contract_id.clone()),
            },
            None => Session::new(&request.message, request.contract_id.clone()),
        };

        if let Some(contract_id) = &request.contract_id {
            session.active_contract_id = Some(contract_id.clone());
        }

        if self.store.get_session(&session.id).await.is_ok() {
            self.store
                .update_session(session.clone())
                .await
                .map_err(|e| CoreError::Internal(e.to_string()))?;
        } else {
            self.store
                .create_session(session.clone())
                .await
                .map_err(|e| CoreError::Internal(e.to_string()))?;
        }
        Ok(session)
    }

    async fn run_turn(
        &self,
        request: &ChatRequest,
        mut session: Session,
        turn_id: &str,
        logger: Arc<ThinkingLogger>,
    ) -> ChatResponse {
        let session_id = session.id.clone();

        // User message is durable before any agent runs.
        let user_message = Message::user(&session_id, &request.message);
        let user_message_id = user_message.id.clone();
        if let Err(e) = self.store.add_message(user_message).await {
            return self.internal_failure(&session_id, &logger, e.to_string());
        }
        session.message_count += 1;

        // Classify into a pipeline.
        let snapshot = self.snapshot(&session).await;
        let classification = self.classifier.classify(&request.message, &snapshot).await;
        logger.event(
            ORCHESTRATOR,
            LogStage::Classify,
            json!({
                "query_type": classification.query_type.as_str(),
                "pipeline": classification.pipeline,
            }),
        );
        info!(
            session = %session_id,
            turn = %turn_id,
            query_type = classification.query_type.as_str(),
            pipeline = ?classification.pipeline,
            "turn classified"
        );

        // Drive the pipeline sequentially.
        let mut outcomes: Vec<(AgentDefinition, AgentOutcome)> = Vec::new();
        let mut prior_outputs: Vec<(String, String)> = Vec::new();
        let total = classification.pipeline.len();

        for (position, agent_name) in classification.pipeline.iter().enumerate() {
            let Some(agent) = self.catalog.get(agent_name) else {
                warn!(agent = agent_name, "classifier produced unknown agent");
                continue;
            };

            let context = match self
                .context_builder
                .build(
                    agent,
                    &session,
                    &request.message,
                    Some(&user_message_id),
                    &prior_outputs,
                    self.model_context_window,
                )
                .await
            {
                Ok(context) => context,
                Err(e) => return self.internal_failure(&session_id, &logger, e.to_string()),
            };

            let tool_ctx = ToolContext {
                session_id: session_id.clone(),
                turn_id: turn_id.to_string(),
                active_contract_id: session.active_contract_id.clone(),
                store: self.store.clone(),
                blobs: self.blobs.clone(),
                codec: self.codec.clone(),
                logger: logger.clone(),
            };

            let cancel = CancellationToken::new();
            let outcome = self.runner.run(agent, context, &tool_ctx, cancel).await;

            // Flush what accumulated; a crash later keeps this prefix.
            if let Err(e) = logger.flush().await {
                warn!(error = %e, "mid-turn log flush failed");
            }

            if outcome.failure.is_some() {
                let only_agent = total == 1;
                let is_last = position + 1 == total;
                let prerequisite = agent.name == CONTRACT_PARSER && !is_last;

                if only_agent {
                    return self.finish(&session_id, vec![(agent.clone(), outcome)], &logger).await;
                }
                if prerequisite {
                    // The rest of the pipeline needs the parser's output.
                    logger.event(
                        ORCHESTRATOR,
                        LogStage::Error,
                        json!({ "kind": ErrorKind::PipelineAborted.as_str(), "failed_agent": agent.name }),
                    );
                    let mut aborted = outcome;
                    if aborted.content.is_empty() {
                        aborted.content = ErrorKind::PipelineAborted.user_message().to_string();
                    }
                    return self
                        .finish_aborted(&session_id, agent.clone(), aborted, &logger)
                        .await;
                }
                // Otherwise record and continue with the next agent.
                outcomes.push((agent.clone(), outcome));
                continue;
            }

            prior_outputs.push((agent.name.to_string(), outcome.content.clone()));
            outcomes.push((agent.clone(), outcome));
        }

        self.finish(&session_id, outcomes, &logger).await
    }

    async fn snapshot(&self, session: &Session) -> SessionSnapshot {
        let clauses_exist = match &session.active_contract_id {
            Some(contract_id) => self
                .store
                .list_clauses(contract_id)
                .await
                .map(|c| !c.is_empty())
                .unwrap_or(false),
            None => false,
        };
        let last_agent = self
            .store
            .list_messages(&session.id, 4, None)
            .await
            .ok()
            .and_then(|messages| {
                messages.iter().rev().find_map(|m| m.agent_name.clone())
            });
        SessionSnapshot {
            has_contract: session.active_contract_id.is_some(),
            clauses_exist,
            message_count: session.message_count,
            last_agent,
        }
    }

    /// Select the final output, merge citations, persist the assistant
    /// message, and shape the response.
    async fn finish(
        &self,
        session_id: &str,
        outcomes: Vec<(AgentDefinition, AgentOutcome)>,
        logger: &Arc<ThinkingLogger>,
    ) -> ChatResponse {
        let Some((final_agent, final_outcome)) = select_final(&outcomes) else {
            return self.internal_failure(session_id, logger, "pipeline produced no outcome".into());
        };

        let citations = merge_citations(outcomes.iter().map(|(_, o)| o));
        let tools_used = merge_tools(outcomes.iter().map(|(_, o)| o));

        let (success, error, message) = match &final_outcome.failure {
            None => (true, None, final_outcome.content.clone()),
            // Graceful degradations keep success=true with a polite message.
            Some(TurnFailure::Timeout) => (true, None, final_outcome.content.clone()),
            // A partial answer is still an answer; the kind is reported.
            Some(TurnFailure::ToolLoopExceeded) => (
                true,
                Some(ErrorKind::ToolLoopExceeded.as_str().to_string()),
                final_outcome.content.clone(),
            ),
            Some(failure) => {
                let kind = failure.kind();
                let message = if final_outcome.content.is_empty() {
                    kind.user_message().to_string()
                } else {
                    final_outcome.content.clone()
                };
                (false, Some(kind.as_str().to_string()), message)
            }
        };

        let assistant = Message::assistant(
            session_id,
            &message,
            final_agent.name,
            citations.clone(),
            tools_used.clone(),
        );
        if let Err(e) = self.store.add_message(assistant).await {
            return self.internal_failure(session_id, logger, e.to_string());
        }

        ChatResponse {
            success,
            message,
            agent: final_agent.name.to_string(),
            agent_id: final_agent.id.to_string(),
            citations,
            tools_used,
            session_id: session_id.to_string(),
            error,
        }
    }

    /// A prerequisite agent failed: surface the underlying failure.
    async fn finish_aborted(
        &self,
        session_id: &str,
        agent: AgentDefinition,
        outcome: AgentOutcome,
        logger: &Arc<ThinkingLogger>,
    ) -> ChatResponse {
        let message = outcome.content.clone();
        let assistant =
            Message::assistant(session_id, &message, agent.name, vec![], outcome.tools_used.clone());
        if let Err(e) = self.store.add_message(assistant).await {
            return self.internal_failure(session_id, logger, e.to_string());
        }
        ChatResponse {
            success: false,
            message,
            agent: agent.name.to_string(),
            agent_id: agent.id.to_string(),
            citations: Vec::new(),
            tools_used: outcome.tools_used,
            session_id: session_id.to_string(),
            error: Some(ErrorKind::PipelineAborted.as_str().to_string()),
        }
    }

    fn internal_failure(
        &self,
        session_id: &str,
        logger: &Arc<ThinkingLogger>,
        detail: String,
    ) -> ChatResponse {
        warn!(session = session_id, detail = %detail, "internal turn failure");
        logger.event(
            ORCHESTRATOR,
            LogStage::Error,
            json!({ "kind": ErrorKind::Internal.as_str(), "detail": detail }),
        );
        ChatResponse {
            success: false,
            message: ErrorKind::Internal.user_message().to_string(),
            agent: ASSISTANT.to_string(),
            agent_id: "agent.assistant".to_string(),
            citations: Vec::new(),
            tools_used: Vec::new(),
            session_id: session_id.to_string(),
            error: Some(ErrorKind::Internal.as_str().to_string()),
        }
    }
}

/// The last agent's output wins, unless a designated synthesizer
/// succeeded earlier in the pipeline.
fn select_final(
    outcomes: &[(AgentDefinition, AgentOutcome)],
) -> Option<(&AgentDefinition, &AgentOutcome)> {
    if let Some((agent, outcome)) = outcomes
        .iter()
        .rev()
        .find(|(agent, outcome)| agent.synthesizer && outcome.succeeded())
    {
        return Some((agent, outcome));
    }
    if let Some((agent, outcome)) =
        outcomes.iter().rev().find(|(_, outcome)| outcome.succeeded())
    {
        return Some((agent, outcome));
    }
    outcomes.last().map(|(agent, outcome)| (agent, outcome))
}

/// Dedup by URI, stable order of first appearance.
fn merge_citations<'a>(outcomes: impl Iterator<Item = &'a AgentOutcome>) -> Vec<Citation> {
    let mut seen = std::collections::HashSet::new();
    let mut merged = Vec::new();
    for outcome in outcomes {
        for citation in &outcome.citations {
            if seen.insert(citation.uri.clone()) {
                merged.push(citation.clone());
            }
        }
    }
    merged
}

fn merge_tools<'a>(outcomes: impl Iterator<Item = &'a AgentOutcome>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut merged = Vec::new();
    for outcome in outcomes {
        for tool in &outcome.tools_used {
            if seen.insert(tool.clone()) {
                merged.push(tool.clone());
            }
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(agent: &AgentDefinition, content: &str, failure: Option<TurnFailure>) -> (AgentDefinition, AgentOutcome) {
        (
            agent.clone(),
            AgentOutcome {
                agent: agent.name.to_string(),
                content: content.to_string(),
                citations: vec![],
                tools_used: vec![],
                failure,
            },
        )
    }

    #[test]
    fn synthesizer_wins_over_last() {
        let catalog = AgentCatalog::new(6);
        let memo = catalog.get(crate::catalog::LEGAL_MEMO).unwrap();
        let risk = catalog.get(crate::catalog::RISK_ASSESSOR).unwrap();

        let outcomes = vec![outcome(memo, "memo text", None), outcome(risk, "risk text", None)];
        let (agent, selected) = select_final(&outcomes).unwrap();
        assert_eq!(agent.name, crate::catalog::LEGAL_MEMO);
        assert_eq!(selected.content, "memo text");
    }

    #[test]
    fn failed_synthesizer_falls_back_to_last_success() {
        let catalog = AgentCatalog::new(6);
        let memo = catalog.get(crate::catalog::LEGAL_MEMO).unwrap();
        let risk = catalog.get(crate::catalog::RISK_ASSESSOR).unwrap();

        let outcomes = vec![
            outcome(risk, "risk text", None),
            outcome(memo, "", Some(TurnFailure::Model("boom".into()))),
        ];
        let (agent, _) = select_final(&outcomes).unwrap();
        assert_eq!(agent.name, crate::catalog::RISK_ASSESSOR);
    }

    #[test]
    fn citations_dedup_by_uri_stable() {
        let catalog = AgentCatalog::new(6);
        let research = catalog.get(crate::catalog::LEGAL_RESEARCH).unwrap();
        let cite = |uri: &str| Citation { title: uri.to_string(), uri: uri.to_string(), start: None, end: None };

        let mut a = outcome(research, "a", None).1;
        a.citations = vec![cite("https://a"), cite("https://b")];
        let mut b = outcome(research, "b", None).1;
        b.citations = vec![cite("https://b"), cite("https://c")];

        let merged = merge_citations([&a, &b].into_iter());
        let uris: Vec<_> = merged.iter().map(|c| c.uri.as_str()).collect();
        assert_eq!(uris, vec!["https://a", "https://b", "https://c"]);
    }
}

//! End-to-end orchestrator scenarios over a scripted model and the
//! in-memory store.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{citation, Behavior, ScriptedModel};
use legalmind_agent::*;
use legalmind_core::*;
use legalmind_llm::ModelContent;
use legalmind_store::{
    BlobStore, DocumentCodec, MemoryBlobStore, MemoryStore, PlainTextCodec, Store,
};
use legalmind_tools::{create_default_registry, HandlerResult, Tool, ToolContext};
use serde_json::{json, Value};

struct Fixture {
    store: Arc<MemoryStore>,
    blobs: Arc<MemoryBlobStore>,
    model: Arc<ScriptedModel>,
    orchestrator: SessionOrchestrator,
}

fn fixture(model: ScriptedModel) -> Fixture {
    fixture_with(model, RuntimeConfig::default(), false)
}

fn fixture_with(model: ScriptedModel, config: RuntimeConfig, with_sleep_tool: bool) -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let blobs = Arc::new(MemoryBlobStore::new());
    let codec: Arc<dyn DocumentCodec> = Arc::new(PlainTextCodec);
    let model = Arc::new(model);

    let mut registry = create_default_registry(Duration::from_secs(config.tool_timeout_seconds));
    if with_sleep_tool {
        registry.register(SleepTool);
    }

    let orchestrator = SessionOrchestrator::new(
        &config,
        store.clone(),
        blobs.clone(),
        codec,
        model.clone(),
        Arc::new(registry),
    );
    Fixture { store, blobs, model, orchestrator }
}

struct SleepTool;

#[async_trait::async_trait]
impl Tool for SleepTool {
    fn name(&self) -> &str {
        "lookup_filings"
    }
    fn description(&self) -> &str {
        "slow external lookup"
    }
    fn parameter_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }
    async fn execute(&self, _args: Value, _ctx: &ToolContext) -> HandlerResult {
        tokio::time::sleep(Duration::from_secs(25)).await;
        Ok(json!({}))
    }
}

fn chat(message: &str) -> ChatRequest {
    ChatRequest { message: message.to_string(), session_id: None, contract_id: None }
}

fn chat_with_contract(message: &str, contract_id: &str) -> ChatRequest {
    ChatRequest {
        message: message.to_string(),
        session_id: None,
        contract_id: Some(contract_id.to_string()),
    }
}

async fn seed_contract(f: &Fixture, id: &str, text: &str, parties: Vec<Party>) {
    let uri = f
        .blobs
        .put("contracts", "contract.txt", text.as_bytes().to_vec())
        .await
        .unwrap();
    let mut contract = Contract::new("Service Agreement", &uri);
    contract.id = id.to_string();
    contract.parties = parties;
    f.store.create_contract(contract).await.unwrap();
}

async fn turn_logs(f: &Fixture, session_id: &str) -> Vec<ThinkingLog> {
    f.store.list_thinking_logs(session_id, None).await.unwrap()
}

fn assert_contiguous(logs: &[ThinkingLog]) {
    let sequences: Vec<u64> = logs.iter().map(|l| l.sequence).collect();
    let expected: Vec<u64> = (1..=logs.len() as u64).collect();
    assert_eq!(sequences, expected, "sequence not contiguous: {:?}", sequences);
}

fn assert_balanced_pairs(logs: &[ThinkingLog]) {
    let calls = logs.iter().filter(|l| l.stage == LogStage::ToolCall).count();
    let results = logs.iter().filter(|l| l.stage == LogStage::ToolResult).count();
    assert_eq!(calls, results, "tool_call/tool_result mismatch");
}

// ===========================================================================
// Greeting
// ===========================================================================

#[tokio::test]
async fn greeting_single_model_call() {
    let f = fixture(ScriptedModel::sequence(vec![Behavior::Text(
        "Hello! How can I help with your contracts today?".into(),
    )]));

    let response = f.orchestrator.handle(chat("Hello")).await.unwrap();
    assert!(response.success);
    assert_eq!(response.agent, "ASSISTANT");
    assert!(response.citations.is_empty());
    assert!(response.tools_used.is_empty());
    assert!(response.message.contains("Hello"));

    // exactly one model call for a zero-tool agent
    assert_eq!(f.model.call_count(), 1);

    let logs = turn_logs(&f, &response.session_id).await;
    assert_eq!(logs.len(), 3);
    assert_eq!(logs[0].stage, LogStage::Classify);
    assert_eq!(logs[1].stage, LogStage::AgentStart);
    assert_eq!(logs[2].stage, LogStage::AgentOutput);
    assert_contiguous(&logs);
}

// ===========================================================================
// Party listing uses extracted names, never raw records
// ===========================================================================

#[tokio::test]
async fn party_digest_contains_names_not_records() {
    let f = fixture(ScriptedModel::sequence(vec![Behavior::Text(
        "The parties are Acme (vendor) and Globex (client).".into(),
    )]));
    seed_contract(
        &f,
        "C1",
        "1. Parties. This agreement is between Acme and Globex.",
        vec![Party::with_role("Acme", "vendor"), Party::with_role("Globex", "client")],
    )
    .await;

    let response = f
        .orchestrator
        .handle(chat_with_contract("Who are the parties in this contract?", "C1"))
        .await
        .unwrap();
    assert!(response.success);
    assert!(response.message.contains("Acme"));
    assert!(response.message.contains("Globex"));

    // Inspect what the model actually saw: the digest joins names and
    // carries no serialized party record.
    let requests = f.model.recorded_requests();
    let digest_text: String = requests
        .iter()
        .flat_map(|r| r.messages.iter())
        .filter_map(|m| match &m.content {
            ModelContent::Text(t) => Some(t.clone()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n");
    assert!(digest_text.contains("Parties: Acme, Globex"), "digest: {}", digest_text);
    assert!(!digest_text.contains("\"name\""), "raw party record leaked: {}", digest_text);

    let logs = turn_logs(&f, &response.session_id).await;
    assert!(!logs.iter().any(|l| {
        l.stage == LogStage::Error && l.payload["kind"] == "internal"
    }));
}

// ===========================================================================
// GDPR compliance when clauses are absent
// ===========================================================================

#[tokio::test]
async fn compliance_pipeline_parses_then_checks() {
    const CONTRACT_TEXT: &str = "\
1. Data Processing. Personal data is processed lawfully with security measures and breach notification within 72 hours.

2. Term. This agreement lasts one year.
";
    let clauses = json!([
        { "index": 0, "type": "data_protection",
          "text": "Personal data is processed lawfully with security measures and breach notification within 72 hours." },
        { "index": 1, "type": "general", "text": "This agreement lasts one year." }
    ]);

    let f = fixture(ScriptedModel::sequence(vec![
        // CONTRACT_PARSER
        Behavior::ToolCalls(vec![("extract_clauses".into(), json!({ "contract_id": "C2" }))]),
        Behavior::ToolCalls(vec![(
            "save_clauses".into(),
            json!({ "contract_id": "C2", "clauses": clauses }),
        )]),
        Behavior::Text("Parsed the contract into 2 clauses.".into()),
        // COMPLIANCE_CHECKER
        Behavior::ToolCalls(vec![("get_compliance_rules".into(), json!({ "regulation": "GDPR" }))]),
        Behavior::ToolCalls(vec![(
            "check_compliance".into(),
            json!({ "regulation": "GDPR", "contract_id": "C2" }),
        )]),
        Behavior::Text("GDPR verdict, rule by rule: processing compliant; erasure partial.".into()),
    ]));
    seed_contract(&f, "C2", CONTRACT_TEXT, vec![Party::new("Acme")]).await;

    let response = f
        .orchestrator
        .handle(chat_with_contract("Is this GDPR compliant?", "C2"))
        .await
        .unwrap();

    assert!(response.success, "failed: {:?}", response.error);
    assert_eq!(response.agent, "COMPLIANCE_CHECKER");
    assert!(response.message.contains("rule by rule"));
    assert!(response.tools_used.contains(&"extract_clauses".to_string()));
    assert!(response.tools_used.contains(&"check_compliance".to_string()));

    // clauses now exist in the store
    let saved = f.store.list_clauses("C2").await.unwrap();
    assert_eq!(saved.len(), 2);

    let logs = turn_logs(&f, &response.session_id).await;
    assert_contiguous(&logs);
    assert_balanced_pairs(&logs);
    // one agent_start per executed agent, each with a terminal stage
    let starts = logs.iter().filter(|l| l.stage == LogStage::AgentStart).count();
    let terminals = logs
        .iter()
        .filter(|l| matches!(l.stage, LogStage::AgentOutput | LogStage::Error))
        .count();
    assert_eq!(starts, 2);
    assert_eq!(terminals, 2);
}

// ===========================================================================
// Grounded legal research with citations
// ===========================================================================

#[tokio::test]
async fn research_is_grounded_and_cited() {
    let f = fixture(ScriptedModel::sequence(vec![Behavior::Grounded(
        "A force majeure clause excuses performance during extraordinary events.".into(),
        vec![
            citation("https://law.example/fm", "Force majeure overview"),
            citation("https://courts.example/cases", "Case law digest"),
        ],
    )]));

    let response = f
        .orchestrator
        .handle(chat("What is a force majeure clause?"))
        .await
        .unwrap();

    assert!(response.success);
    assert_eq!(response.agent, "LEGAL_RESEARCH");
    assert!(!response.citations.is_empty());
    assert!(response.citations.iter().all(|c| !c.uri.is_empty()));
    assert!(response.tools_used.is_empty());

    // the model was invoked with grounded search enabled
    let requests = f.model.recorded_requests();
    assert!(requests.iter().any(|r| r.options.grounded_search));
}

// ===========================================================================
// Tool handler timeout is recoverable
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn slow_tool_times_out_and_agent_recovers() {
    let f = fixture_with(
        ScriptedModel::sequence(vec![
            Behavior::ToolCalls(vec![("lookup_filings".into(), json!({}))]),
            Behavior::Text(
                "I could not complete the filings lookup subtask, but here is the rest.".into(),
            ),
        ]),
        RuntimeConfig::default(),
        true,
    );

    let response = f
        .orchestrator
        .handle(chat("What is the legal meaning of estoppel?"))
        .await
        .unwrap();

    assert!(response.success);
    assert!(response.message.contains("could not complete"));

    let logs = turn_logs(&f, &response.session_id).await;
    let error_results: Vec<_> = logs
        .iter()
        .filter(|l| l.stage == LogStage::ToolResult && l.payload["is_error"] == true)
        .collect();
    assert_eq!(error_results.len(), 1);
    assert!(error_results[0].payload["payload"]
        .as_str()
        .unwrap()
        .contains("handler_timeout"));
}

// ===========================================================================
// Agent turn timeout is graceful
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn hung_model_times_out_gracefully() {
    let f = fixture(ScriptedModel::sequence(vec![Behavior::Hang]));

    let started = tokio::time::Instant::now();
    let response = f
        .orchestrator
        .handle(chat("What is promissory estoppel?"))
        .await
        .unwrap();
    let elapsed = started.elapsed();

    assert!(response.success, "timeout should be graceful");
    assert!(response.message.contains("longer than expected"));
    assert!(elapsed < Duration::from_secs(35), "took {:?}", elapsed);

    let logs = turn_logs(&f, &response.session_id).await;
    assert!(logs
        .iter()
        .any(|l| l.stage == LogStage::Error && l.payload["kind"] == "agent_timeout"));
    assert_contiguous(&logs);
}

// ===========================================================================
// Boundaries and invariants
// ===========================================================================

#[tokio::test]
async fn message_length_boundary_is_exact() {
    let f = fixture(ScriptedModel::constant(Behavior::Text("ok".into())));

    let at_limit = "a".repeat(MAX_MESSAGE_CHARS);
    assert!(f.orchestrator.handle(chat(&at_limit)).await.is_ok());

    let over = "a".repeat(MAX_MESSAGE_CHARS + 1);
    let err = f.orchestrator.handle(chat(&over)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRequest);

    let blank = f.orchestrator.handle(chat("   ")).await.unwrap_err();
    assert_eq!(blank.kind(), ErrorKind::InvalidRequest);
}

#[tokio::test]
async fn endless_tool_loop_is_bounded() {
    let mut config = RuntimeConfig::default();
    config.max_tool_iterations_default = 2;

    let f = fixture_with(
        ScriptedModel::constant(Behavior::ToolCalls(vec![(
            "log_thought".into(),
            json!({ "agent_name": "ASSISTANT", "stage": "looping" }),
        )])),
        config,
        false,
    );

    // a greeting classifies in the rule layer, so every model call below
    // belongs to the agent loop
    let response = f.orchestrator.handle(chat("Hello")).await.unwrap();

    // max_tool_iterations + 1 model calls, then a partial answer
    assert_eq!(f.model.call_count(), 3);
    assert_eq!(response.error.as_deref(), Some("tool_loop_exceeded"));
    assert!(!response.message.is_empty());
}

#[tokio::test]
async fn assistant_message_follows_user_message() {
    let f = fixture(ScriptedModel::constant(Behavior::Text("reply".into())));
    let response = f.orchestrator.handle(chat("Hello")).await.unwrap();

    let messages = f.store.list_messages(&response.session_id, 100, None).await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[1].role, Role::Assistant);
    assert!(messages[0].created_at <= messages[1].created_at);
    assert_eq!(messages[1].agent_name.as_deref(), Some("ASSISTANT"));
}

#[tokio::test]
async fn known_agent_names_only() {
    let f = fixture(ScriptedModel::constant(Behavior::Text("reply".into())));
    for message in ["Hello", "What is consideration?", "Assess the risks here"] {
        let response = f.orchestrator.handle(chat(message)).await.unwrap();
        assert!(
            AGENT_NAMES.contains(&response.agent.as_str()),
            "unexpected agent {}",
            response.agent
        );
    }
}

#[tokio::test]
async fn session_continuity_across_turns() {
    let f = fixture(ScriptedModel::constant(Behavior::Text("reply".into())));

    let first = f.orchestrator.handle(chat("Hello")).await.unwrap();
    let second = f
        .orchestrator
        .handle(ChatRequest {
            message: "Hello again".into(),
            session_id: Some(first.session_id.clone()),
            contract_id: None,
        })
        .await
        .unwrap();

    assert_eq!(first.session_id, second.session_id);
    let session = f.store.get_session(&first.session_id).await.unwrap();
    let messages = f.store.list_messages(&first.session_id, 100, None).await.unwrap();
    assert_eq!(session.message_count as usize, messages.len());
    assert_eq!(messages.len(), 4);

    // title derives from the first user message
    assert_eq!(session.title.as_deref(), Some("Hello"));
}

#[tokio::test]
async fn concurrent_turns_on_one_session_queue() {
    let f = Arc::new(fixture(ScriptedModel::constant(Behavior::Text("reply".into()))));

    let first = f.orchestrator.handle(chat("Hello")).await.unwrap();
    let session_id = first.session_id.clone();

    let a = {
        let f = f.clone();
        let sid = session_id.clone();
        tokio::spawn(async move {
            f.orchestrator
                .handle(ChatRequest {
                    message: "Hi once more".into(),
                    session_id: Some(sid),
                    contract_id: None,
                })
                .await
        })
    };
    let b = {
        let f = f.clone();
        let sid = session_id.clone();
        tokio::spawn(async move {
            f.orchestrator
                .handle(ChatRequest {
                    message: "Hi yet again".into(),
                    session_id: Some(sid),
                    contract_id: None,
                })
                .await
        })
    };
    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    // 3 turns, strictly alternating user/assistant
    let messages = f.store.list_messages(&session_id, 100, None).await.unwrap();
    assert_eq!(messages.len(), 6);
    for (i, message) in messages.iter().enumerate() {
        let expected = if i % 2 == 0 { Role::User } else { Role::Assistant };
        assert_eq!(message.role, expected, "message {} out of order", i);
    }
}

#[tokio::test]
async fn model_error_surfaces_as_internal_not_panic() {
    let f = fixture(ScriptedModel::sequence(vec![Behavior::Error("upstream 500".into())]));

    let response = f.orchestrator.handle(chat("Hello")).await.unwrap();
    assert!(!response.success);
    assert_eq!(response.error.as_deref(), Some("internal"));
    // technical detail stays out of the user-facing text
    assert!(!response.message.contains("upstream 500"));
}

//! Core entities for LegalMind
//!
//! Everything persisted by the Store or carried on the wire lives here.
//! Store field names mirror the wire field names exactly, so entities
//! round-trip through serde without mapping layers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Generate a sortable opaque ID: `{prefix}_{millis-hex}{uuid-fragment}`.
///
/// The leading hex timestamp makes IDs lexicographically sortable by
/// creation time; the uuid fragment breaks ties within a millisecond.
pub fn new_id(prefix: &str) -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    let frag = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{:012x}{}", prefix, millis, &frag[..10])
}

/// Message role
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A source citation extracted from grounded model output
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Citation {
    pub title: String,
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<usize>,
}

/// A chat session. Owns its messages and thinking logs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_contract_id: Option<String>,
    pub message_count: u64,
}

impl Session {
    /// New session, title derived from the first user message.
    pub fn new(first_message: &str, active_contract_id: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_id("sess"),
            created_at: now,
            updated_at: now,
            title: derive_title(first_message),
            active_contract_id,
            message_count: 0,
        }
    }
}

/// First 80 chars of the first user message, or None for blank input.
fn derive_title(message: &str) -> Option<String> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(80).collect())
}

/// One persisted conversation message. Immutable once written.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub session_id: String,
    pub role: Role,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
    #[serde(default)]
    pub citations: Vec<Citation>,
    #[serde(default)]
    pub tool_calls_summary: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn user(session_id: &str, content: &str) -> Self {
        Self {
            id: new_id("msg"),
            session_id: session_id.to_string(),
            role: Role::User,
            content: content.to_string(),
            agent_name: None,
            citations: Vec::new(),
            tool_calls_summary: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn assistant(
        session_id: &str,
        content: &str,
        agent_name: &str,
        citations: Vec<Citation>,
        tool_calls_summary: Vec<String>,
    ) -> Self {
        Self {
            id: new_id("msg"),
            session_id: session_id.to_string(),
            role: Role::Assistant,
            content: content.to_string(),
            agent_name: Some(agent_name.to_string()),
            citations,
            tool_calls_summary,
            created_at: Utc::now(),
        }
    }
}

/// A contract party. Always a record, never a bare string — joins for
/// LLM context must read `.name`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Party {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl Party {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), role: None }
    }

    pub fn with_role(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self { name: name.into(), role: Some(role.into()) }
    }

    /// The single place party names are joined into prose.
    pub fn join_names(parties: &[Party]) -> String {
        parties
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    Uploaded,
    Parsing,
    Ready,
    Failed,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    #[default]
    Unknown,
    Compliant,
    Partial,
    NonCompliant,
}

/// A labeled date extracted from a contract (effective date, termination...).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct KeyDate {
    pub label: String,
    pub date: String,
}

/// An uploaded contract. Owns its clauses.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Contract {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_type: Option<String>,
    #[serde(default)]
    pub parties: Vec<Party>,
    #[serde(default)]
    pub key_dates: Vec<KeyDate>,
    pub uploaded_at: DateTime<Utc>,
    pub file_uri: String,
    pub status: ContractStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_risk_score: Option<f64>,
    #[serde(default)]
    pub compliance_status: ComplianceStatus,
}

impl Contract {
    pub fn new(title: &str, file_uri: &str) -> Self {
        Self {
            id: new_id("ctr"),
            title: title.to_string(),
            contract_type: None,
            parties: Vec::new(),
            key_dates: Vec::new(),
            uploaded_at: Utc::now(),
            file_uri: file_uri.to_string(),
            status: ContractStatus::Uploaded,
            overall_risk_score: None,
            compliance_status: ComplianceStatus::Unknown,
        }
    }
}

/// One clause of a contract. Deleted with its contract.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Clause {
    pub id: String,
    pub contract_id: String,
    pub index: usize,
    #[serde(rename = "type")]
    pub clause_type: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Risk bands used across scoring and reporting.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s > 75.0 => Self::Critical,
            s if s > 50.0 => Self::High,
            s if s > 25.0 => Self::Medium,
            _ => Self::Low,
        }
    }
}

/// Stage markers for the thinking trace.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogStage {
    Classify,
    AgentStart,
    ToolCall,
    ToolResult,
    AgentOutput,
    Error,
}

/// One structured trace record inside a turn. Append-only;
/// `sequence` is strictly increasing within a turn.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ThinkingLog {
    pub id: String,
    pub session_id: String,
    pub turn_id: String,
    pub sequence: u64,
    pub agent_name: String,
    pub stage: LogStage,
    pub payload: serde_json::Value,
    pub duration_ms: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Memo,
    Summary,
    ComplianceReport,
}

/// A generated output document (memo, summary, report).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeneratedDocument {
    pub id: String,
    pub session_id: String,
    pub kind: DocumentKind,
    pub file_uri: String,
    pub created_at: DateTime<Utc>,
}

/// Regulatory frameworks with rule data.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Regulation {
    Gdpr,
    Hipaa,
    Ccpa,
    Sox,
    #[serde(untagged)]
    Other(String),
}

impl Regulation {
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "GDPR" => Self::Gdpr,
            "HIPAA" => Self::Hipaa,
            "CCPA" => Self::Ccpa,
            "SOX" => Self::Sox,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Gdpr => "GDPR",
            Self::Hipaa => "HIPAA",
            Self::Ccpa => "CCPA",
            Self::Sox => "SOX",
            Self::Other(s) => s,
        }
    }
}

impl std::fmt::Display for Regulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuleSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// Read-mostly reference data: one requirement of a regulation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ComplianceRule {
    pub regulation: Regulation,
    pub rule_id: String,
    pub text: String,
    pub category: String,
    pub severity: RuleSeverity,
}

//! LegalMind agent runtime
//!
//! The orchestration core: agent catalog, query classification, context
//! assembly, the bounded agent loop, and the per-turn session
//! orchestrator.

pub mod catalog;
pub mod classify;
pub mod context;
pub mod orchestrator;
pub mod runner;

pub use catalog::{
    AgentCatalog, AgentDefinition, AGENT_NAMES, ASSISTANT, COMPLIANCE_CHECKER, CONTRACT_PARSER,
    LEGAL_MEMO, LEGAL_RESEARCH, RISK_ASSESSOR,
};
pub use classify::{Classification, QueryClassifier, QueryType, SessionSnapshot};
pub use context::{contract_digest, AssembledContext, ContextBuilder};
pub use orchestrator::SessionOrchestrator;
pub use runner::{AgentOutcome, AgentRunner, TurnFailure};

//! LegalMind tools — the callable surface the agents see
//!
//! Each tool group is a self-contained file in src/tools/. To add a tool:
//! create it there, implement the Tool trait, register it in
//! create_default_registry().

pub mod registry;
pub mod schema;
pub mod tools;

use std::time::Duration;

pub use registry::{
    DispatchFailure, FailureKind, HandlerError, HandlerResult, Tool, ToolContext, ToolOutcome,
    ToolRegistry,
};

/// Tool names by group, for the agent catalog's curated subsets.
pub mod groups {
    pub const CONTRACT: &[&str] = &["get_contract_by_id", "search_contracts", "save_contract"];
    pub const CLAUSE: &[&str] = &["extract_clauses", "get_clauses_by_type", "save_clauses"];
    pub const COMPLIANCE: &[&str] =
        &["check_compliance", "get_compliance_rules", "get_applicable_regulations"];
    pub const RISK: &[&str] =
        &["calculate_clause_risk", "calculate_overall_risk", "get_risk_benchmarks"];
    pub const DOCUMENT: &[&str] = &["generate_document", "list_documents"];
    pub const LOGGING: &[&str] = &["log_thought"];
}

/// The full registry with every builtin tool.
pub fn create_default_registry(handler_timeout: Duration) -> ToolRegistry {
    let mut registry = ToolRegistry::new(handler_timeout);

    registry.register(tools::contract::GetContractTool);
    registry.register(tools::contract::SearchContractsTool);
    registry.register(tools::contract::SaveContractTool);

    registry.register(tools::clause::ExtractClausesTool);
    registry.register(tools::clause::GetClausesByTypeTool);
    registry.register(tools::clause::SaveClausesTool);

    registry.register(tools::compliance::CheckComplianceTool);
    registry.register(tools::compliance::GetComplianceRulesTool);
    registry.register(tools::compliance::GetApplicableRegulationsTool);

    registry.register(tools::risk::CalculateClauseRiskTool);
    registry.register(tools::risk::CalculateOverallRiskTool);
    registry.register(tools::risk::GetRiskBenchmarksTool);

    registry.register(tools::document::GenerateDocumentTool);
    registry.register(tools::document::ListDocumentsTool);

    registry.register(tools::log::LogThoughtTool);

    registry
}

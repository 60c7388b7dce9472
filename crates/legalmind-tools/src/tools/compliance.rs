//! Compliance tools — regulation rules and contract checks
//!
//! Rule matching is deterministic set logic over saved clauses: re-running
//! a check on an unchanged contract yields the same rule hits. Nuanced
//! legal interpretation of the results belongs to the model.

use legalmind_core::{Clause, ComplianceRule, ComplianceStatus, Regulation, RuleSeverity};
use serde_json::{json, Value};

use crate::registry::{HandlerError, HandlerResult, Tool, ToolContext};
use crate::tools::contract::require_str;

pub struct GetComplianceRulesTool;

#[async_trait::async_trait]
impl Tool for GetComplianceRulesTool {
    fn name(&self) -> &str {
        "get_compliance_rules"
    }

    fn description(&self) -> &str {
        "List the requirements of a regulatory framework (GDPR, HIPAA, CCPA, SOX)."
    }

    fn parameter_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "regulation": { "type": "string", "description": "GDPR | HIPAA | CCPA | SOX" }
            },
            "required": ["regulation"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> HandlerResult {
        let regulation = Regulation::parse(require_str(&args, "regulation")?);
        let rules = ctx.store.list_compliance_rules(&regulation).await?;
        if rules.is_empty() {
            return Err(HandlerError::Failed(format!(
                "no rule data for regulation: {}",
                regulation
            )));
        }
        Ok(json!({ "regulation": regulation.as_str(), "count": rules.len(), "rules": rules }))
    }
}

pub struct CheckComplianceTool;

#[async_trait::async_trait]
impl Tool for CheckComplianceTool {
    fn name(&self) -> &str {
        "check_compliance"
    }

    fn description(&self) -> &str {
        "Check a contract's saved clauses against a regulation, rule by rule. Requires clauses to have been extracted and saved first."
    }

    fn parameter_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "regulation": { "type": "string", "description": "GDPR | HIPAA | CCPA | SOX" },
                "contract_id": { "type": "string" }
            },
            "required": ["regulation", "contract_id"]
        })
    }

    fn side_effecting(&self) -> bool {
        true
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> HandlerResult {
        let regulation = Regulation::parse(require_str(&args, "regulation")?);
        let contract_id = require_str(&args, "contract_id")?;

        let rules = ctx.store.list_compliance_rules(&regulation).await?;
        if rules.is_empty() {
            return Err(HandlerError::Failed(format!(
                "no rule data for regulation: {}",
                regulation
            )));
        }
        let clauses = ctx.store.list_clauses(contract_id).await?;
        if clauses.is_empty() {
            return Err(HandlerError::Failed(format!(
                "contract {} has no extracted clauses; run extract_clauses and save_clauses first",
                contract_id
            )));
        }

        let verdicts: Vec<Value> = rules.iter().map(|rule| rule_verdict(rule, &clauses)).collect();
        let status = aggregate_status(&verdicts);

        let mut contract = ctx.store.get_contract(contract_id).await?;
        contract.compliance_status = status;
        ctx.store.update_contract(contract).await?;

        Ok(json!({
            "regulation": regulation.as_str(),
            "contract_id": contract_id,
            "overall_status": status,
            "verdicts": verdicts,
        }))
    }
}

pub struct GetApplicableRegulationsTool;

#[async_trait::async_trait]
impl Tool for GetApplicableRegulationsTool {
    fn name(&self) -> &str {
        "get_applicable_regulations"
    }

    fn description(&self) -> &str {
        "Suggest which regulatory frameworks likely apply to a contract, based on its clauses."
    }

    fn parameter_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "contract_id": { "type": "string" }
            },
            "required": ["contract_id"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> HandlerResult {
        let contract_id = require_str(&args, "contract_id")?;
        let clauses = ctx.store.list_clauses(contract_id).await?;
        let text = clauses
            .iter()
            .map(|c| c.text.to_lowercase())
            .collect::<Vec<_>>()
            .join(" ");

        let mut applicable = Vec::new();
        if text.contains("personal data") || text.contains("privacy") || text.contains("data protection") {
            applicable.push(json!({ "regulation": "GDPR", "reason": "handles personal data" }));
            applicable.push(json!({ "regulation": "CCPA", "reason": "handles personal information" }));
        }
        if text.contains("health") || text.contains("medical") || text.contains("patient") {
            applicable.push(json!({ "regulation": "HIPAA", "reason": "touches health information" }));
        }
        if text.contains("financial report") || text.contains("audit") || text.contains("internal control") {
            applicable.push(json!({ "regulation": "SOX", "reason": "touches financial reporting" }));
        }

        Ok(json!({ "contract_id": contract_id, "applicable": applicable }))
    }
}

/// One rule against the clause set. A rule hits when any clause mentions
/// one of its category terms (in type or text).
fn rule_verdict(rule: &ComplianceRule, clauses: &[Clause]) -> Value {
    let matched: Vec<&Clause> = clauses.iter().filter(|c| clause_matches(rule, c)).collect();

    let verdict = if !matched.is_empty() {
        "compliant"
    } else if matches!(rule.severity, RuleSeverity::High | RuleSeverity::Critical) {
        "non_compliant"
    } else {
        "partial"
    };

    json!({
        "rule_id": rule.rule_id,
        "text": rule.text,
        "severity": rule.severity,
        "verdict": verdict,
        "matched_clauses": matched.iter().map(|c| json!({
            "index": c.index,
            "type": c.clause_type,
        })).collect::<Vec<_>>(),
    })
}

fn clause_matches(rule: &ComplianceRule, clause: &Clause) -> bool {
    let text = clause.text.to_lowercase();
    let clause_type = clause.clause_type.replace('_', " ");
    rule.category
        .split_whitespace()
        .filter(|term| term.len() >= 4)
        .any(|term| text.contains(term) || clause_type.contains(term))
}

fn aggregate_status(verdicts: &[Value]) -> ComplianceStatus {
    let mut any_non_compliant = false;
    let mut all_compliant = true;
    for v in verdicts {
        match v["verdict"].as_str() {
            Some("compliant") => {}
            Some("non_compliant") => {
                any_non_compliant = true;
                all_compliant = false;
            }
            _ => all_compliant = false,
        }
    }
    if all_compliant {
        ComplianceStatus::Compliant
    } else if any_non_compliant {
        ComplianceStatus::NonCompliant
    } else {
        ComplianceStatus::Partial
    }
}

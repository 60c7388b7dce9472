//! Risk tools — clause scoring and contract aggregation
//!
//! Scores are 0-100 heuristics: a base per clause type, adjusted by
//! one-sidedness markers in the text. Bands: low 0-25, medium 26-50,
//! high 51-75, critical 76-100.

use legalmind_core::RiskLevel;
use serde_json::{json, Value};

use crate::registry::{HandlerError, HandlerResult, Tool, ToolContext};
use crate::tools::contract::require_str;

pub struct CalculateClauseRiskTool;

#[async_trait::async_trait]
impl Tool for CalculateClauseRiskTool {
    fn name(&self) -> &str {
        "calculate_clause_risk"
    }

    fn description(&self) -> &str {
        "Score a single clause's risk (0-100) with the factors that drove the score."
    }

    fn parameter_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "text": { "type": "string", "description": "Clause text" },
                "type": { "type": "string", "description": "Clause type if known" }
            },
            "required": ["text"]
        })
    }

    async fn execute(&self, args: Value, _ctx: &ToolContext) -> HandlerResult {
        let text = require_str(&args, "text")?;
        let clause_type = args
            .get("type")
            .and_then(|v| v.as_str())
            .map(|t| t.to_lowercase())
            .unwrap_or_else(|| crate::tools::clause::classify_clause(text).to_string());

        let (score, factors) = score_clause(&clause_type, text);
        Ok(json!({
            "type": clause_type,
            "risk_score": score,
            "risk_level": RiskLevel::from_score(score),
            "factors": factors,
        }))
    }
}

pub struct CalculateOverallRiskTool;

#[async_trait::async_trait]
impl Tool for CalculateOverallRiskTool {
    fn name(&self) -> &str {
        "calculate_overall_risk"
    }

    fn description(&self) -> &str {
        "Score every saved clause of a contract and aggregate into an overall risk score, persisted on the contract."
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

    fn side_effecting(&self) -> bool {
        true
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> HandlerResult {
        let contract_id = require_str(&args, "contract_id")?;
        let mut clauses = ctx.store.list_clauses(contract_id).await?;
        if clauses.is_empty() {
            return Err(HandlerError::Failed(format!(
                "contract {} has no extracted clauses; run extract_clauses and save_clauses first",
                contract_id
            )));
        }

        for clause in &mut clauses {
            if clause.risk_score.is_none() {
                let (score, _) = score_clause(&clause.clause_type, &clause.text);
                clause.risk_score = Some(score);
            }
        }

        let scores: Vec<f64> = clauses.iter().filter_map(|c| c.risk_score).collect();
        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
        let max = scores.iter().cloned().fold(0.0, f64::max);
        // Overall leans on the mean but a single severe clause pulls it up.
        let overall = (0.7 * mean + 0.3 * max).round();

        let breakdown: Vec<Value> = clauses
            .iter()
            .map(|c| {
                json!({
                    "index": c.index,
                    "type": c.clause_type,
                    "risk_score": c.risk_score,
                })
            })
            .collect();

        ctx.store.save_clauses(contract_id, clauses).await?;
        let mut contract = ctx.store.get_contract(contract_id).await?;
        contract.overall_risk_score = Some(overall);
        ctx.store.update_contract(contract).await?;

        Ok(json!({
            "contract_id": contract_id,
            "overall_risk_score": overall,
            "risk_level": RiskLevel::from_score(overall),
            "clauses": breakdown,
        }))
    }
}

pub struct GetRiskBenchmarksTool;

#[async_trait::async_trait]
impl Tool for GetRiskBenchmarksTool {
    fn name(&self) -> &str {
        "get_risk_benchmarks"
    }

    fn description(&self) -> &str {
        "Typical risk score ranges by contract type, for calibrating an assessment."
    }

    fn parameter_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "contract_type": { "type": "string", "description": "e.g. NDA, MSA; omit for all" }
            }
        })
    }

    async fn execute(&self, args: Value, _ctx: &ToolContext) -> HandlerResult {
        let benchmarks = benchmarks();
        if let Some(requested) = args.get("contract_type").and_then(|v| v.as_str()) {
            let key = requested.to_uppercase();
            let Some(entry) = benchmarks.iter().find(|b| b["contract_type"] == key) else {
                return Err(HandlerError::Failed(format!(
                    "no benchmark for contract type: {}",
                    requested
                )));
            };
            return Ok(entry.clone());
        }
        Ok(json!({ "benchmarks": benchmarks }))
    }
}

fn benchmarks() -> Vec<Value> {
    vec![
        json!({ "contract_type": "NDA", "typical_range": [10, 35], "note": "usually low risk unless obligations are perpetual" }),
        json!({ "contract_type": "MSA", "typical_range": [30, 60], "note": "liability and indemnification terms dominate" }),
        json!({ "contract_type": "EMPLOYMENT", "typical_range": [25, 55], "note": "non-compete and IP assignment drive risk" }),
        json!({ "contract_type": "LEASE", "typical_range": [20, 50], "note": "termination and escalation terms drive risk" }),
        json!({ "contract_type": "SAAS", "typical_range": [30, 65], "note": "data handling and uptime commitments drive risk" }),
    ]
}

const TYPE_BASE: &[(&str, f64)] = &[
    ("indemnification", 65.0),
    ("liability", 60.0),
    ("intellectual_property", 55.0),
    ("data_protection", 55.0),
    ("non_compete", 50.0),
    ("termination", 45.0),
    ("payment", 40.0),
    ("warranty", 40.0),
    ("confidentiality", 35.0),
    ("dispute_resolution", 35.0),
    ("governing_law", 25.0),
    ("force_majeure", 25.0),
];

const AGGRAVATORS: &[(&str, f64, &str)] = &[
    ("unlimited", 20.0, "unlimited exposure"),
    ("sole discretion", 15.0, "unilateral discretion"),
    ("perpetual", 10.0, "perpetual obligation"),
    ("irrevocable", 10.0, "irrevocable grant"),
    ("waive", 10.0, "waiver of rights"),
    ("without notice", 10.0, "no notice required"),
];

const MITIGATORS: &[(&str, f64, &str)] = &[
    ("mutual", 10.0, "mutual obligation"),
    ("capped", 15.0, "capped exposure"),
    ("limited to", 15.0, "limited exposure"),
    ("reasonable", 5.0, "reasonableness qualifier"),
];

/// Deterministic clause score with explanation factors.
pub fn score_clause(clause_type: &str, text: &str) -> (f64, Vec<String>) {
    let lower = text.to_lowercase();
    let base = TYPE_BASE
        .iter()
        .find(|(t, _)| *t == clause_type)
        .map(|(_, score)| *score)
        .unwrap_or(20.0);

    let mut score = base;
    let mut factors = vec![format!("base {} for {}", base, clause_type)];

    for &(marker, delta, label) in AGGRAVATORS {
        if lower.contains(marker) {
            score += delta;
            factors.push(format!("+{} {}", delta, label));
        }
    }
    for &(marker, delta, label) in MITIGATORS {
        if lower.contains(marker) {
            score -= delta;
            factors.push(format!("-{} {}", delta, label));
        }
    }

    (score.clamp(0.0, 100.0), factors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlimited_liability_scores_high() {
        let (score, factors) =
            score_clause("liability", "Customer's liability is unlimited and at vendor's sole discretion.");
        assert!(score > 75.0, "expected critical, got {}", score);
        assert!(factors.iter().any(|f| f.contains("unlimited")));
    }

    #[test]
    fn mutual_capped_clause_scores_lower() {
        let (capped, _) =
            score_clause("liability", "Liability is mutual and capped at fees paid.");
        let (bare, _) = score_clause("liability", "Liability for damages.");
        assert!(capped < bare);
    }

    #[test]
    fn unknown_type_uses_floor() {
        let (score, _) = score_clause("general", "The parties agree to cooperate.");
        assert!((20.0..=25.0).contains(&score));
    }

    #[test]
    fn scores_are_deterministic_and_bounded() {
        let text = "unlimited perpetual irrevocable waiver without notice at sole discretion";
        let (a, _) = score_clause("indemnification", text);
        let (b, _) = score_clause("indemnification", text);
        assert_eq!(a, b);
        assert!(a <= 100.0);
    }
}

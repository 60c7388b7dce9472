//! Clause tools — extraction, lookup, save
//!
//! Extraction is deterministic: the same bytes always yield the same
//! clause sequence. Section boundaries come from heading patterns; types
//! come from a keyword table. Legal judgment about clause content is the
//! model's job, not this module's.

use legalmind_core::{new_id, Clause, ContractStatus};
use serde_json::{json, Value};
use tracing::debug;

use crate::registry::{HandlerError, HandlerResult, Tool, ToolContext};
use crate::tools::contract::require_str;

pub struct ExtractClausesTool;

#[async_trait::async_trait]
impl Tool for ExtractClausesTool {
    fn name(&self) -> &str {
        "extract_clauses"
    }

    fn description(&self) -> &str {
        "Parse the contract document into categorized clauses. Returns the clause list; use save_clauses to persist it."
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
        let contract = ctx.store.get_contract(contract_id).await?;
        let bytes = ctx.blobs.get(&contract.file_uri).await?;
        let text = ctx.codec.extract_text(&bytes)?;

        let clauses = split_into_clauses(&text);
        debug!(contract = contract_id, clauses = clauses.len(), "extracted clauses");

        Ok(json!({
            "contract_id": contract_id,
            "count": clauses.len(),
            "clauses": clauses
                .iter()
                .enumerate()
                .map(|(index, (clause_type, text))| json!({
                    "index": index,
                    "type": clause_type,
                    "text": text,
                }))
                .collect::<Vec<_>>(),
        }))
    }
}

pub struct GetClausesByTypeTool;

#[async_trait::async_trait]
impl Tool for GetClausesByTypeTool {
    fn name(&self) -> &str {
        "get_clauses_by_type"
    }

    fn description(&self) -> &str {
        "List a contract's saved clauses, optionally filtered by clause type (e.g. liability, confidentiality)."
    }

    fn parameter_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "contract_id": { "type": "string" },
                "type": { "type": "string", "description": "Clause type filter; omit for all" }
            },
            "required": ["contract_id"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> HandlerResult {
        let contract_id = require_str(&args, "contract_id")?;
        let mut clauses = ctx.store.list_clauses(contract_id).await?;
        if let Some(filter) = args.get("type").and_then(|v| v.as_str()) {
            let filter = filter.to_lowercase();
            clauses.retain(|c| c.clause_type == filter);
        }
        Ok(json!({ "count": clauses.len(), "clauses": clauses }))
    }
}

pub struct SaveClausesTool;

#[async_trait::async_trait]
impl Tool for SaveClausesTool {
    fn name(&self) -> &str {
        "save_clauses"
    }

    fn description(&self) -> &str {
        "Persist extracted clauses for a contract, replacing any earlier extraction, and mark the contract ready."
    }

    fn parameter_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "contract_id": { "type": "string" },
                "clauses": {
                    "type": "array",
                    "description": "Clause records: [{\"index\": ..., \"type\": ..., \"text\": ..., \"risk_score\": ..., \"notes\": ...}]"
                }
            },
            "required": ["contract_id", "clauses"]
        })
    }

    fn side_effecting(&self) -> bool {
        true
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> HandlerResult {
        let contract_id = require_str(&args, "contract_id")?;
        let entries = args
            .get("clauses")
            .and_then(|v| v.as_array())
            .ok_or_else(|| HandlerError::Failed("clauses must be an array".into()))?;

        let clauses: Vec<Clause> = entries
            .iter()
            .enumerate()
            .map(|(position, entry)| {
                let text = entry
                    .get("text")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| {
                        HandlerError::Failed(format!("clause {} is missing text", position))
                    })?;
                Ok(Clause {
                    id: new_id("cls"),
                    contract_id: contract_id.to_string(),
                    index: entry
                        .get("index")
                        .and_then(|v| v.as_u64())
                        .map(|i| i as usize)
                        .unwrap_or(position),
                    clause_type: entry
                        .get("type")
                        .and_then(|v| v.as_str())
                        .unwrap_or("general")
                        .to_lowercase(),
                    text: text.to_string(),
                    risk_score: entry.get("risk_score").and_then(|v| v.as_f64()),
                    notes: entry.get("notes").and_then(|v| v.as_str()).map(String::from),
                })
            })
            .collect::<Result<_, HandlerError>>()?;

        let count = clauses.len();
        ctx.store.save_clauses(contract_id, clauses).await?;

        let mut contract = ctx.store.get_contract(contract_id).await?;
        contract.status = ContractStatus::Ready;
        ctx.store.update_contract(contract).await?;

        Ok(json!({ "saved": count, "contract_id": contract_id }))
    }
}

/// Deterministic clause segmentation: split on section headings, classify
/// each section by keyword.
pub fn split_into_clauses(text: &str) -> Vec<(String, String)> {
    let mut sections: Vec<String> = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        if is_heading(line) && !current.trim().is_empty() {
            sections.push(std::mem::take(&mut current));
        }
        current.push_str(line);
        current.push('\n');
    }
    if !current.trim().is_empty() {
        sections.push(current);
    }

    sections
        .into_iter()
        .map(|section| {
            let body = section.trim().to_string();
            (classify_clause(&body).to_string(), body)
        })
        .collect()
}

/// A heading starts a new clause: "1.", "Section 3", "ARTICLE IV", "3.2".
fn is_heading(line: &str) -> bool {
    let trimmed = line.trim_start();
    if trimmed.is_empty() {
        return false;
    }
    let lower = trimmed.to_lowercase();
    if lower.starts_with("section ") || lower.starts_with("article ") || lower.starts_with("clause ")
    {
        return true;
    }
    // Numbered headings: leading digits followed by '.' or ')'
    let digits: String = trimmed.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return false;
    }
    matches!(trimmed.as_bytes().get(digits.len()), Some(&b'.') | Some(&b')'))
}

const CLAUSE_TYPES: &[(&str, &[&str])] = &[
    ("confidentiality", &["confidential", "non-disclosure", "nondisclosure", "proprietary information"]),
    ("indemnification", &["indemnif", "hold harmless"]),
    ("liability", &["liability", "liable", "damages"]),
    ("termination", &["terminat", "expiration", "expiry"]),
    ("payment", &["payment", "fee", "invoice", "compensation"]),
    ("intellectual_property", &["intellectual property", "copyright", "patent", "trademark", "work product"]),
    ("data_protection", &["personal data", "data protection", "privacy", "data processing", "personal information"]),
    ("governing_law", &["governing law", "jurisdiction", "venue"]),
    ("dispute_resolution", &["arbitration", "dispute", "mediation"]),
    ("force_majeure", &["force majeure", "act of god", "beyond the reasonable control"]),
    ("warranty", &["warrant", "representation"]),
    ("non_compete", &["non-compete", "noncompete", "non-solicitation"]),
];

/// First matching type wins; unmatched sections are "general".
pub fn classify_clause(text: &str) -> &'static str {
    let lower = text.to_lowercase();
    for &(clause_type, keywords) in CLAUSE_TYPES {
        if keywords.iter().any(|kw| lower.contains(kw)) {
            return clause_type;
        }
    }
    "general"
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
1. Confidentiality. Each party shall keep the other party's proprietary information confidential.

2. Limitation of Liability. Neither party shall be liable for indirect damages.

3. Termination. Either party may terminate this agreement with 30 days notice.
";

    #[test]
    fn splits_on_numbered_headings() {
        let clauses = split_into_clauses(SAMPLE);
        assert_eq!(clauses.len(), 3);
        assert_eq!(clauses[0].0, "confidentiality");
        assert_eq!(clauses[1].0, "liability");
        assert_eq!(clauses[2].0, "termination");
    }

    #[test]
    fn extraction_is_deterministic() {
        assert_eq!(split_into_clauses(SAMPLE), split_into_clauses(SAMPLE));
    }

    #[test]
    fn section_headings_recognized() {
        assert!(is_heading("Section 4. Payment"));
        assert!(is_heading("ARTICLE IX"));
        assert!(is_heading("3.2 Subsection"));
        assert!(is_heading("12) Notices"));
        assert!(!is_heading("the parties agree"));
        assert!(!is_heading(""));
    }

    #[test]
    fn unmatched_text_is_general() {
        assert_eq!(classify_clause("The sky is blue."), "general");
        assert_eq!(classify_clause("Force majeure events excuse delay."), "force_majeure");
    }

    #[test]
    fn headingless_text_is_single_clause() {
        let clauses = split_into_clauses("just one paragraph of text");
        assert_eq!(clauses.len(), 1);
    }
}

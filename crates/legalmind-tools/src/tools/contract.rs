//! Contract tools — lookup, search, metadata save

use legalmind_core::{ContractStatus, KeyDate, Party};
use serde_json::{json, Value};

use crate::registry::{HandlerError, HandlerResult, Tool, ToolContext};

pub struct GetContractTool;

#[async_trait::async_trait]
impl Tool for GetContractTool {
    fn name(&self) -> &str {
        "get_contract_by_id"
    }

    fn description(&self) -> &str {
        "Retrieve a contract record (title, type, parties, key dates, status, risk and compliance summary) by its ID."
    }

    fn parameter_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "contract_id": { "type": "string", "description": "Contract ID to look up" }
            },
            "required": ["contract_id"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> HandlerResult {
        let contract_id = require_str(&args, "contract_id")?;
        let contract = ctx.store.get_contract(contract_id).await?;
        Ok(serde_json::to_value(&contract).map_err(|e| HandlerError::Failed(e.to_string()))?)
    }
}

pub struct SearchContractsTool;

#[async_trait::async_trait]
impl Tool for SearchContractsTool {
    fn name(&self) -> &str {
        "search_contracts"
    }

    fn description(&self) -> &str {
        "Search stored contracts by title, contract type, or party name."
    }

    fn parameter_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "Search text" }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> HandlerResult {
        let query = require_str(&args, "query")?;
        let hits = ctx.store.search_contracts(query).await?;
        Ok(json!({
            "count": hits.len(),
            "contracts": hits,
        }))
    }
}

pub struct SaveContractTool;

#[async_trait::async_trait]
impl Tool for SaveContractTool {
    fn name(&self) -> &str {
        "save_contract"
    }

    fn description(&self) -> &str {
        "Save extracted contract metadata: type, parties (records with name and role), key dates, status."
    }

    fn parameter_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "contract_id": { "type": "string" },
                "title": { "type": "string" },
                "contract_type": { "type": "string", "description": "e.g. NDA, MSA, Employment Agreement, Lease" },
                "parties": {
                    "type": "array",
                    "description": "Party records: [{\"name\": ..., \"role\": ...}]"
                },
                "key_dates": {
                    "type": "array",
                    "description": "Labeled dates: [{\"label\": ..., \"date\": ...}]"
                },
                "status": { "type": "string", "description": "uploaded | parsing | ready | failed" }
            },
            "required": ["contract_id"]
        })
    }

    fn side_effecting(&self) -> bool {
        true
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> HandlerResult {
        let contract_id = require_str(&args, "contract_id")?;
        let mut contract = ctx.store.get_contract(contract_id).await?;

        if let Some(title) = args.get("title").and_then(|v| v.as_str()) {
            contract.title = title.to_string();
        }
        if let Some(contract_type) = args.get("contract_type").and_then(|v| v.as_str()) {
            contract.contract_type = Some(contract_type.to_string());
        }
        if let Some(parties) = args.get("parties") {
            // Parties are normalized to records at this boundary; bare
            // strings become {name} so joins downstream always read .name.
            contract.parties = parse_parties(parties)?;
        }
        if let Some(dates) = args.get("key_dates") {
            contract.key_dates = serde_json::from_value::<Vec<KeyDate>>(dates.clone())
                .map_err(|e| HandlerError::Failed(format!("invalid key_dates: {}", e)))?;
        }
        if let Some(status) = args.get("status").and_then(|v| v.as_str()) {
            contract.status = parse_status(status)?;
        }

        ctx.store.update_contract(contract.clone()).await?;
        Ok(json!({ "saved": true, "contract_id": contract.id }))
    }
}

fn parse_parties(value: &Value) -> Result<Vec<Party>, HandlerError> {
    let Some(entries) = value.as_array() else {
        return Err(HandlerError::Failed("parties must be an array".into()));
    };
    entries
        .iter()
        .map(|entry| match entry {
            Value::String(name) => Ok(Party::new(name.clone())),
            Value::Object(_) => serde_json::from_value::<Party>(entry.clone())
                .map_err(|e| HandlerError::Failed(format!("invalid party record: {}", e))),
            other => Err(HandlerError::Failed(format!(
                "party entries must be records or names, got {}",
                other
            ))),
        })
        .collect()
}

fn parse_status(s: &str) -> Result<ContractStatus, HandlerError> {
    match s {
        "uploaded" => Ok(ContractStatus::Uploaded),
        "parsing" => Ok(ContractStatus::Parsing),
        "ready" => Ok(ContractStatus::Ready),
        "failed" => Ok(ContractStatus::Failed),
        other => Err(HandlerError::Failed(format!("unknown status: {}", other))),
    }
}

pub(crate) fn require_str<'a>(args: &'a Value, field: &str) -> Result<&'a str, HandlerError> {
    args.get(field)
        .and_then(|v| v.as_str())
        .ok_or_else(|| HandlerError::Failed(format!("missing required parameter: {}", field)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_parties_normalizes_strings_and_records() {
        let parties = parse_parties(&json!([
            { "name": "Acme", "role": "vendor" },
            "Globex"
        ]))
        .unwrap();
        assert_eq!(parties.len(), 2);
        assert_eq!(parties[0].name, "Acme");
        assert_eq!(parties[0].role.as_deref(), Some("vendor"));
        assert_eq!(parties[1].name, "Globex");
        assert!(parties[1].role.is_none());
    }

    #[test]
    fn parse_parties_rejects_numbers() {
        assert!(parse_parties(&json!([42])).is_err());
    }
}

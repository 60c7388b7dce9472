//! Document tools — generation and listing

use legalmind_core::{new_id, DocumentKind, GeneratedDocument};
use serde_json::{json, Value};

use crate::registry::{HandlerError, HandlerResult, Tool, ToolContext};
use crate::tools::contract::require_str;

pub struct GenerateDocumentTool;

#[async_trait::async_trait]
impl Tool for GenerateDocumentTool {
    fn name(&self) -> &str {
        "generate_document"
    }

    fn description(&self) -> &str {
        "Render content into a downloadable document (memo, summary, or compliance_report) and store it for this session."
    }

    fn parameter_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "kind": { "type": "string", "description": "memo | summary | compliance_report" },
                "title": { "type": "string" },
                "content": { "type": "string", "description": "Full document body" }
            },
            "required": ["kind", "content"]
        })
    }

    fn side_effecting(&self) -> bool {
        true
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> HandlerResult {
        let kind = parse_kind(require_str(&args, "kind")?)?;
        let content = require_str(&args, "content")?;
        let title = args
            .get("title")
            .and_then(|v| v.as_str())
            .unwrap_or(default_title(kind));

        let bytes = ctx.codec.render(title, content);
        let filename = format!("{}.md", new_id(kind_slug(kind)));
        let file_uri = ctx.blobs.put("generated-documents", &filename, bytes).await?;

        let doc = GeneratedDocument {
            id: new_id("doc"),
            session_id: ctx.session_id.clone(),
            kind,
            file_uri: file_uri.clone(),
            created_at: chrono::Utc::now(),
        };
        let doc_id = doc.id.clone();
        ctx.store.add_generated_document(doc).await?;

        Ok(json!({ "document_id": doc_id, "kind": kind, "file_uri": file_uri }))
    }
}

pub struct ListDocumentsTool;

#[async_trait::async_trait]
impl Tool for ListDocumentsTool {
    fn name(&self) -> &str {
        "list_documents"
    }

    fn description(&self) -> &str {
        "List documents generated in this session."
    }

    fn parameter_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _args: Value, ctx: &ToolContext) -> HandlerResult {
        let docs = ctx.store.list_generated_documents(&ctx.session_id).await?;
        Ok(json!({ "count": docs.len(), "documents": docs }))
    }
}

fn parse_kind(s: &str) -> Result<DocumentKind, HandlerError> {
    match s {
        "memo" => Ok(DocumentKind::Memo),
        "summary" => Ok(DocumentKind::Summary),
        "compliance_report" => Ok(DocumentKind::ComplianceReport),
        other => Err(HandlerError::Failed(format!("unknown document kind: {}", other))),
    }
}

fn kind_slug(kind: DocumentKind) -> &'static str {
    match kind {
        DocumentKind::Memo => "memo",
        DocumentKind::Summary => "summary",
        DocumentKind::ComplianceReport => "report",
    }
}

fn default_title(kind: DocumentKind) -> &'static str {
    match kind {
        DocumentKind::Memo => "Legal Memorandum",
        DocumentKind::Summary => "Contract Summary",
        DocumentKind::ComplianceReport => "Compliance Report",
    }
}

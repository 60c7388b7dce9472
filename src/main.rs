//! LegalMind gateway — the HTTP surface over the orchestration core
//!
//! Thin transport only: request validation and status mapping live here,
//! everything else is the orchestrator's structured responses.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Parser;
use legalmind::App;
use legalmind_core::{
    ChatRequest, ContractStatus, CoreError, ErrorKind, ErrorResponse, Party, RuntimeConfig,
};
use legalmind_store::StoreResult;
use legalmind_tools::tools::clause::split_into_clauses;
use serde_json::json;
use tracing::{error, info, warn};

const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

#[derive(Parser, Debug)]
#[command(name = "legalmind", about = "LegalMind legal analysis gateway")]
struct Args {
    /// Port to listen on
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Bind address
    #[arg(long, default_value = "0.0.0.0")]
    bind: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "legalmind=info,tower_http=warn".into()),
        )
        .init();

    let args = Args::parse();
    let config = RuntimeConfig::from_env();

    // Configuration errors halt the process here; nothing degrades silently.
    let app = Arc::new(App::build(config).map_err(|e| anyhow::anyhow!(e.to_string()))?);

    let router = Router::new()
        .route("/api/chat", post(chat))
        .route("/api/contracts", post(upload_contract))
        .route("/api/sessions/:id/messages", get(session_messages))
        .route("/api/sessions/:id/thinking-logs", get(session_thinking_logs))
        .route("/healthz", get(|| async { "ok" }))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(app);

    let addr: SocketAddr = format!("{}:{}", args.bind, args.port).parse()?;
    info!(%addr, "legalmind gateway listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

async fn chat(State(app): State<Arc<App>>, Json(request): Json<ChatRequest>) -> Response {
    match app.orchestrator.handle(request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response(e),
    }
}

fn error_response(e: CoreError) -> Response {
    let kind = e.kind();
    let status = StatusCode::from_u16(kind.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if kind == ErrorKind::Internal {
        error!(error = %e, "request failed");
    } else {
        warn!(error = %e, kind = kind.as_str(), "request rejected");
    }
    let body = ErrorResponse::new(kind.as_str(), Some(kind.user_message().to_string()));
    (status, Json(body)).into_response()
}

async fn upload_contract(State(app): State<Arc<App>>, mut multipart: Multipart) -> Response {
    let mut file: Option<Vec<u8>> = None;
    let mut title: Option<String> = None;
    let mut contract_type: Option<String> = None;
    let mut parties: Vec<Party> = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return error_response(CoreError::InvalidRequest(format!("bad multipart: {}", e)))
            }
        };
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => match field.bytes().await {
                Ok(bytes) => file = Some(bytes.to_vec()),
                Err(e) => {
                    return error_response(CoreError::InvalidRequest(format!(
                        "failed to read file: {}",
                        e
                    )))
                }
            },
            "title" => title = field.text().await.ok(),
            "contract_type" => contract_type = field.text().await.ok(),
            "parties" => {
                let raw = field.text().await.unwrap_or_default();
                match serde_json::from_str::<Vec<Party>>(&raw) {
                    Ok(parsed) => parties = parsed,
                    Err(e) => {
                        return error_response(CoreError::InvalidRequest(format!(
                            "parties must be a JSON array of {{name, role}}: {}",
                            e
                        )))
                    }
                }
            }
            _ => {}
        }
    }

    let Some(bytes) = file else {
        return error_response(CoreError::InvalidRequest("missing file field".into()));
    };
    if bytes.len() > MAX_UPLOAD_BYTES {
        return error_response(CoreError::InvalidRequest("file exceeds 50 MB".into()));
    }

    let title = title.unwrap_or_else(|| "Untitled contract".to_string());
    let uri = match app.blobs.put("contracts", "upload.pdf", bytes.clone()).await {
        Ok(uri) => uri,
        Err(e) => return error_response(CoreError::Internal(e.to_string())),
    };

    let mut contract = legalmind_core::Contract::new(&title, &uri);
    contract.contract_type = contract_type;
    contract.parties = parties;
    contract.status = ContractStatus::Parsing;
    let contract_id = contract.id.clone();

    if let Err(e) = app.store.create_contract(contract).await {
        return error_response(CoreError::Internal(e.to_string()));
    }

    // Parsing is offloaded; the response returns immediately.
    tokio::spawn(parse_uploaded(app.clone(), contract_id.clone(), bytes));

    (StatusCode::ACCEPTED, Json(json!({ "contract_id": contract_id, "status": "parsing" })))
        .into_response()
}

/// Extract text and clauses off the request path. CPU-bound extraction
/// runs on the blocking pool.
async fn parse_uploaded(app: Arc<App>, contract_id: String, bytes: Vec<u8>) {
    let codec = app.codec.clone();
    let parsed: StoreResult<Vec<(String, String)>> =
        match tokio::task::spawn_blocking(move || {
            codec.extract_text(&bytes).map(|text| split_into_clauses(&text))
        })
        .await
        {
            Ok(result) => result,
            Err(e) => {
                error!(contract = %contract_id, error = %e, "parse task panicked");
                mark_status(&app, &contract_id, ContractStatus::Failed).await;
                return;
            }
        };

    match parsed {
        Ok(sections) => {
            let clauses: Vec<legalmind_core::Clause> = sections
                .into_iter()
                .enumerate()
                .map(|(index, (clause_type, text))| legalmind_core::Clause {
                    id: legalmind_core::new_id("cls"),
                    contract_id: contract_id.clone(),
                    index,
                    clause_type,
                    text,
                    risk_score: None,
                    notes: None,
                })
                .collect();
            let count = clauses.len();
            if let Err(e) = app.store.save_clauses(&contract_id, clauses).await {
                warn!(contract = %contract_id, error = %e, "clause save failed");
                mark_status(&app, &contract_id, ContractStatus::Failed).await;
                return;
            }
            info!(contract = %contract_id, clauses = count, "contract parsed");
            mark_status(&app, &contract_id, ContractStatus::Ready).await;
        }
        Err(e) => {
            warn!(contract = %contract_id, error = %e, "text extraction failed");
            mark_status(&app, &contract_id, ContractStatus::Failed).await;
        }
    }
}

async fn mark_status(app: &App, contract_id: &str, status: ContractStatus) {
    match app.store.get_contract(contract_id).await {
        Ok(mut contract) => {
            contract.status = status;
            if let Err(e) = app.store.update_contract(contract).await {
                warn!(contract = contract_id, error = %e, "status update failed");
            }
        }
        Err(e) => warn!(contract = contract_id, error = %e, "contract vanished during parse"),
    }
}

async fn session_messages(State(app): State<Arc<App>>, Path(id): Path<String>) -> Response {
    match app.store.list_messages(&id, 200, None).await {
        Ok(messages) => (StatusCode::OK, Json(json!({ "session_id": id, "messages": messages })))
            .into_response(),
        Err(e) => error_response(CoreError::Internal(e.to_string())),
    }
}

async fn session_thinking_logs(State(app): State<Arc<App>>, Path(id): Path<String>) -> Response {
    match app.store.list_thinking_logs(&id, None).await {
        Ok(logs) => {
            (StatusCode::OK, Json(json!({ "session_id": id, "thinking_logs": logs })))
                .into_response()
        }
        Err(e) => error_response(CoreError::Internal(e.to_string())),
    }
}

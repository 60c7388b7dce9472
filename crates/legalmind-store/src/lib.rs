//! Storage abstractions for LegalMind
//!
//! `Store` is the typed document database seam, `BlobStore` holds uploaded
//! PDFs and generated documents, `DocumentCodec` converts between raw bytes
//! and text. All three are trait objects so transports and tests can swap
//! implementations; the in-memory versions here are the in-repo defaults.

pub mod codec;
pub mod memory;
pub mod rules;
pub mod trace;

use legalmind_core::{
    Clause, ComplianceRule, Contract, GeneratedDocument, Message, Regulation, Session,
    ThinkingLog,
};

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not found: {entity} {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound { entity, id: id.into() }
    }
}

/// Typed accessors over the document database. No business logic; reads
/// are consistent within a turn, writes are individually durable.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    // Sessions
    async fn create_session(&self, session: Session) -> StoreResult<()>;
    async fn get_session(&self, id: &str) -> StoreResult<Session>;
    async fn update_session(&self, session: Session) -> StoreResult<()>;
    async fn delete_session(&self, id: &str) -> StoreResult<()>;

    // Messages
    async fn add_message(&self, message: Message) -> StoreResult<()>;
    /// Messages ordered by (created_at, id); `before` excludes that message
    /// id and everything after it.
    async fn list_messages(
        &self,
        session_id: &str,
        limit: usize,
        before: Option<&str>,
    ) -> StoreResult<Vec<Message>>;

    // Contracts
    async fn create_contract(&self, contract: Contract) -> StoreResult<()>;
    async fn get_contract(&self, id: &str) -> StoreResult<Contract>;
    async fn update_contract(&self, contract: Contract) -> StoreResult<()>;
    async fn delete_contract(&self, id: &str) -> StoreResult<()>;
    async fn search_contracts(&self, query: &str) -> StoreResult<Vec<Contract>>;

    // Clauses
    /// Replaces any previously saved clauses for the same contract.
    async fn save_clauses(&self, contract_id: &str, clauses: Vec<Clause>) -> StoreResult<()>;
    async fn list_clauses(&self, contract_id: &str) -> StoreResult<Vec<Clause>>;

    // Thinking logs
    async fn append_thinking_logs(&self, logs: Vec<ThinkingLog>) -> StoreResult<()>;
    async fn list_thinking_logs(
        &self,
        session_id: &str,
        turn_id: Option<&str>,
    ) -> StoreResult<Vec<ThinkingLog>>;

    // Generated documents
    async fn add_generated_document(&self, doc: GeneratedDocument) -> StoreResult<()>;
    async fn list_generated_documents(&self, session_id: &str)
        -> StoreResult<Vec<GeneratedDocument>>;

    // Compliance reference data
    async fn list_compliance_rules(&self, regulation: &Regulation)
        -> StoreResult<Vec<ComplianceRule>>;
}

/// Object storage for uploaded PDFs and generated documents.
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes under a folder, returning the blob URI.
    async fn put(&self, folder: &str, filename: &str, bytes: Vec<u8>) -> StoreResult<String>;
    async fn get(&self, uri: &str) -> StoreResult<Vec<u8>>;
    async fn delete(&self, uri: &str) -> StoreResult<()>;
}

/// Conversion between document bytes and text.
pub trait DocumentCodec: Send + Sync {
    /// Extract plain text from uploaded bytes (PDF parsing lives behind
    /// this seam).
    fn extract_text(&self, bytes: &[u8]) -> StoreResult<String>;
    /// Render generated content into a downloadable document.
    fn render(&self, title: &str, content: &str) -> Vec<u8>;
}

pub use codec::PlainTextCodec;
pub use memory::{MemoryBlobStore, MemoryStore};
pub use trace::ThinkingLogger;

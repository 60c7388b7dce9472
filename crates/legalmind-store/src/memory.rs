//! In-memory Store and BlobStore on DashMap
//!
//! Collections are keyed the way the ownership tree reads: messages and
//! thinking logs by session, clauses by contract. Cascade deletes follow
//! ownership.

use dashmap::DashMap;

use legalmind_core::{
    Clause, ComplianceRule, Contract, GeneratedDocument, Message, Regulation, Session,
    ThinkingLog,
};

use crate::rules::seed_rules;
use crate::{BlobStore, Store, StoreError, StoreResult};

pub struct MemoryStore {
    sessions: DashMap<String, Session>,
    messages: DashMap<String, Vec<Message>>,
    contracts: DashMap<String, Contract>,
    clauses: DashMap<String, Vec<Clause>>,
    logs: DashMap<String, Vec<ThinkingLog>>,
    documents: DashMap<String, Vec<GeneratedDocument>>,
    rules: Vec<ComplianceRule>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            messages: DashMap::new(),
            contracts: DashMap::new(),
            clauses: DashMap::new(),
            logs: DashMap::new(),
            documents: DashMap::new(),
            rules: seed_rules(),
        }
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn create_session(&self, session: Session) -> StoreResult<()> {
        self.sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn get_session(&self, id: &str) -> StoreResult<Session> {
        self.sessions
            .get(id)
            .map(|s| s.clone())
            .ok_or_else(|| StoreError::not_found("session", id))
    }

    async fn update_session(&self, session: Session) -> StoreResult<()> {
        if !self.sessions.contains_key(&session.id) {
            return Err(StoreError::not_found("session", &session.id));
        }
        self.sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn delete_session(&self, id: &str) -> StoreResult<()> {
        self.sessions.remove(id);
        self.messages.remove(id);
        self.logs.remove(id);
        self.documents.remove(id);
        Ok(())
    }

    async fn add_message(&self, message: Message) -> StoreResult<()> {
        let session_id = message.session_id.clone();
        self.messages.entry(session_id.clone()).or_default().push(message);

        // Keep the session's message_count equal to the stored messages.
        if let Some(mut session) = self.sessions.get_mut(&session_id) {
            session.message_count += 1;
            session.updated_at = chrono::Utc::now();
        }
        Ok(())
    }

    async fn list_messages(
        &self,
        session_id: &str,
        limit: usize,
        before: Option<&str>,
    ) -> StoreResult<Vec<Message>> {
        let mut messages = self
            .messages
            .get(session_id)
            .map(|m| m.clone())
            .unwrap_or_default();
        messages.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
        if let Some(before_id) = before {
            if let Some(pos) = messages.iter().position(|m| m.id == before_id) {
                messages.truncate(pos);
            }
        }
        if messages.len() > limit {
            messages.drain(..messages.len() - limit);
        }
        Ok(messages)
    }

    async fn create_contract(&self, contract: Contract) -> StoreResult<()> {
        self.contracts.insert(contract.id.clone(), contract);
        Ok(())
    }

    async fn get_contract(&self, id: &str) -> StoreResult<Contract> {
        self.contracts
            .get(id)
            .map(|c| c.clone())
            .ok_or_else(|| StoreError::not_found("contract", id))
    }

    async fn update_contract(&self, contract: Contract) -> StoreResult<()> {
        if !self.contracts.contains_key(&contract.id) {
            return Err(StoreError::not_found("contract", &contract.id));
        }
        self.contracts.insert(contract.id.clone(), contract);
        Ok(())
    }

    async fn delete_contract(&self, id: &str) -> StoreResult<()> {
        self.contracts.remove(id);
        self.clauses.remove(id);
        Ok(())
    }

    async fn search_contracts(&self, query: &str) -> StoreResult<Vec<Contract>> {
        let needle = query.to_lowercase();
        let mut hits: Vec<Contract> = self
            .contracts
            .iter()
            .filter(|c| {
                c.title.to_lowercase().contains(&needle)
                    || c.contract_type
                        .as_deref()
                        .map(|t| t.to_lowercase().contains(&needle))
                        .unwrap_or(false)
                    || c.parties.iter().any(|p| p.name.to_lowercase().contains(&needle))
            })
            .map(|c| c.clone())
            .collect();
        hits.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(hits)
    }

    async fn save_clauses(&self, contract_id: &str, mut clauses: Vec<Clause>) -> StoreResult<()> {
        clauses.sort_by_key(|c| c.index);
        self.clauses.insert(contract_id.to_string(), clauses);
        Ok(())
    }

    async fn list_clauses(&self, contract_id: &str) -> StoreResult<Vec<Clause>> {
        Ok(self.clauses.get(contract_id).map(|c| c.clone()).unwrap_or_default())
    }

    async fn append_thinking_logs(&self, logs: Vec<ThinkingLog>) -> StoreResult<()> {
        for log in logs {
            self.logs.entry(log.session_id.clone()).or_default().push(log);
        }
        Ok(())
    }

    async fn list_thinking_logs(
        &self,
        session_id: &str,
        turn_id: Option<&str>,
    ) -> StoreResult<Vec<ThinkingLog>> {
        let mut logs = self.logs.get(session_id).map(|l| l.clone()).unwrap_or_default();
        if let Some(turn) = turn_id {
            logs.retain(|l| l.turn_id == turn);
        }
        logs.sort_by_key(|l| l.sequence);
        Ok(logs)
    }

    async fn add_generated_document(&self, doc: GeneratedDocument) -> StoreResult<()> {
        self.documents.entry(doc.session_id.clone()).or_default().push(doc);
        Ok(())
    }

    async fn list_generated_documents(
        &self,
        session_id: &str,
    ) -> StoreResult<Vec<GeneratedDocument>> {
        Ok(self.documents.get(session_id).map(|d| d.clone()).unwrap_or_default())
    }

    async fn list_compliance_rules(
        &self,
        regulation: &Regulation,
    ) -> StoreResult<Vec<ComplianceRule>> {
        Ok(self
            .rules
            .iter()
            .filter(|r| &r.regulation == regulation)
            .cloned()
            .collect())
    }
}

/// In-memory blob storage. URIs use a `mem://` scheme.
pub struct MemoryBlobStore {
    blobs: DashMap<String, Vec<u8>>,
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self { blobs: DashMap::new() }
    }
}

#[async_trait::async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, folder: &str, filename: &str, bytes: Vec<u8>) -> StoreResult<String> {
        let uri = format!("mem://{}/{}/{}", folder, legalmind_core::new_id("blob"), filename);
        self.blobs.insert(uri.clone(), bytes);
        Ok(uri)
    }

    async fn get(&self, uri: &str) -> StoreResult<Vec<u8>> {
        self.blobs
            .get(uri)
            .map(|b| b.clone())
            .ok_or_else(|| StoreError::not_found("blob", uri))
    }

    async fn delete(&self, uri: &str) -> StoreResult<()> {
        self.blobs.remove(uri);
        Ok(())
    }
}

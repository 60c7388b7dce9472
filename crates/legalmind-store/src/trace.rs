//! ThinkingLogger — append-only structured trace for one turn
//!
//! Events accumulate in memory with a monotonic per-turn sequence and are
//! flushed to the Store in batches. On crash the flushed prefix is what
//! remains visible; logs are advisory.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use serde_json::{json, Value};
use tracing::debug;

use legalmind_core::{new_id, LogStage, ThinkingLog};

use crate::{Store, StoreResult};

pub struct ThinkingLogger {
    store: Arc<dyn Store>,
    session_id: String,
    turn_id: String,
    started: Instant,
    sequence: AtomicU64,
    buffer: Mutex<Vec<ThinkingLog>>,
}

impl ThinkingLogger {
    pub fn new(store: Arc<dyn Store>, session_id: &str, turn_id: &str) -> Self {
        Self {
            store,
            session_id: session_id.to_string(),
            turn_id: turn_id.to_string(),
            started: Instant::now(),
            sequence: AtomicU64::new(0),
            buffer: Mutex::new(Vec::new()),
        }
    }

    pub fn turn_id(&self) -> &str {
        &self.turn_id
    }

    /// Append one event. Returns its sequence number (1-based, strictly
    /// increasing within the turn).
    pub fn event(&self, agent_name: &str, stage: LogStage, payload: Value) -> u64 {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let log = ThinkingLog {
            id: new_id("log"),
            session_id: self.session_id.clone(),
            turn_id: self.turn_id.clone(),
            sequence,
            agent_name: agent_name.to_string(),
            stage,
            payload,
            duration_ms: self.started.elapsed().as_millis() as u64,
            created_at: chrono::Utc::now(),
        };
        self.buffer.lock().unwrap_or_else(|e| e.into_inner()).push(log);
        sequence
    }

    /// Direct path for an agent's own reasoning note (the `log_thought`
    /// tool). Recorded as a balanced tool_call/tool_result pair so the
    /// per-turn sequence invariants hold.
    pub fn thought(&self, agent_name: &str, label: &str, payload: Value) {
        self.event(
            agent_name,
            LogStage::ToolCall,
            json!({ "name": "log_thought", "stage": label, "payload": payload }),
        );
        self.event(
            agent_name,
            LogStage::ToolResult,
            json!({ "name": "log_thought", "ok": true }),
        );
    }

    /// Number of events appended so far.
    pub fn len(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flush buffered events to the store. Safe to call repeatedly; each
    /// call drains only what accumulated since the previous flush.
    pub async fn flush(&self) -> StoreResult<()> {
        let batch: Vec<ThinkingLog> = {
            let mut buffer = self.buffer.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::take(&mut *buffer)
        };
        if batch.is_empty() {
            return Ok(());
        }
        debug!(turn = %self.turn_id, events = batch.len(), "flushing thinking logs");
        self.store.append_thinking_logs(batch).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    #[tokio::test]
    async fn sequences_are_contiguous_and_flushed() {
        let store = Arc::new(MemoryStore::new());
        let logger = ThinkingLogger::new(store.clone(), "sess_1", "turn_1");

        assert_eq!(logger.event("ASSISTANT", LogStage::Classify, json!({})), 1);
        assert_eq!(logger.event("ASSISTANT", LogStage::AgentStart, json!({})), 2);
        assert_eq!(logger.event("ASSISTANT", LogStage::AgentOutput, json!({})), 3);

        logger.flush().await.unwrap();
        // second flush drains nothing
        logger.flush().await.unwrap();

        let logs = store.list_thinking_logs("sess_1", Some("turn_1")).await.unwrap();
        assert_eq!(logs.len(), 3);
        let sequences: Vec<u64> = logs.iter().map(|l| l.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn thought_emits_balanced_pair() {
        let store = Arc::new(MemoryStore::new());
        let logger = ThinkingLogger::new(store.clone(), "sess_1", "turn_1");

        logger.thought("RISK_ASSESSOR", "analysis", json!({"note": "high exposure"}));
        logger.flush().await.unwrap();

        let logs = store.list_thinking_logs("sess_1", None).await.unwrap();
        let calls = logs.iter().filter(|l| l.stage == LogStage::ToolCall).count();
        let results = logs.iter().filter(|l| l.stage == LogStage::ToolResult).count();
        assert_eq!(calls, results);
        assert_eq!(logs.len(), 2);
    }
}

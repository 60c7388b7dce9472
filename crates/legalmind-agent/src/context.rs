//! Context assembly — what each model call sees
//!
//! System block, a bounded history window, a contract digest, prior agent
//! findings from this turn, and the current user message, trimmed to the
//! token budget. Token counts are estimated at 4 chars per token.

use std::sync::Arc;

use chrono::Utc;
use legalmind_core::{Clause, Contract, Party, Session};
use legalmind_llm::{ContentPart, ModelContent, ModelMessage};
use legalmind_store::{Store, StoreResult};
use tracing::debug;

use crate::catalog::AgentDefinition;

const CHARS_PER_TOKEN: f32 = 4.0;
const DIGEST_MAX_CHARS: usize = 2_000;
const TOP_RISK_CLAUSES: usize = 5;

pub fn estimate_tokens(text: &str) -> usize {
    (text.len() as f32 / CHARS_PER_TOKEN).ceil() as usize
}

fn message_tokens(message: &ModelMessage) -> usize {
    let content = match &message.content {
        ModelContent::Text(s) => estimate_tokens(s),
        ModelContent::Parts(parts) => parts
            .iter()
            .map(|p| match p {
                ContentPart::Text { text } => estimate_tokens(text),
                ContentPart::ToolUse { name, input, .. } => {
                    estimate_tokens(name) + estimate_tokens(&input.to_string())
                }
                ContentPart::ToolResult { content, .. } => estimate_tokens(content),
            })
            .sum(),
    };
    content + 10
}

pub struct ContextBuilder {
    store: Arc<dyn Store>,
    history_pairs: usize,
    budget_fraction: f64,
}

/// The assembled per-call input.
#[derive(Clone, Debug)]
pub struct AssembledContext {
    pub system: String,
    pub messages: Vec<ModelMessage>,
}

impl ContextBuilder {
    pub fn new(store: Arc<dyn Store>, history_pairs: usize, budget_fraction: f64) -> Self {
        Self { store, history_pairs, budget_fraction }
    }

    pub async fn build(
        &self,
        agent: &AgentDefinition,
        session: &Session,
        current_user_message: &str,
        current_message_id: Option<&str>,
        prior_outputs: &[(String, String)],
        context_window: usize,
    ) -> StoreResult<AssembledContext> {
        // 1. System block: agent instructions plus a short runtime preamble.
        let mut system = format!(
            "{}\n\nYou are the {} agent of LegalMind. Current date (UTC): {}.",
            agent.instructions,
            agent.name,
            Utc::now().format("%Y-%m-%d"),
        );

        // 2. History window: last K pairs before the current message,
        // oldest history noted in one line.
        let window = self.history_pairs * 2;
        let history = self
            .store
            .list_messages(&session.id, window, current_message_id)
            .await?;
        let prior_count = if current_message_id.is_some() {
            session.message_count.saturating_sub(1)
        } else {
            session.message_count
        };
        let omitted = prior_count.saturating_sub(history.len() as u64);
        if omitted > 0 {
            system.push_str(&format!(
                "\n\nEarlier conversation: {} older messages are omitted from this context.",
                omitted
            ));
        }
        let mut history: Vec<ModelMessage> = history
            .iter()
            .map(|m| ModelMessage {
                role: match m.role {
                    legalmind_core::Role::User => "user".to_string(),
                    legalmind_core::Role::Assistant => "assistant".to_string(),
                },
                content: ModelContent::Text(m.content.clone()),
            })
            .collect();

        // 3. Contract digest, only when a contract is active.
        let mut digest = match &session.active_contract_id {
            Some(contract_id) => {
                let contract = self.store.get_contract(contract_id).await?;
                let clauses = self.store.list_clauses(contract_id).await?;
                Some(contract_digest(&contract, &clauses))
            }
            None => None,
        };

        // 4. Findings from agents that already ran this turn.
        let prior = if prior_outputs.is_empty() {
            None
        } else {
            let mut text = String::from("Findings so far this turn:\n");
            for (agent_name, content) in prior_outputs {
                text.push_str(&format!("[{}]\n{}\n\n", agent_name, content));
            }
            Some(text.trim_end().to_string())
        };

        // 5. Trim to the token budget: history pairs oldest-first, then the
        // digest; the current user message is never dropped.
        let budget = (context_window as f64 * self.budget_fraction) as usize;
        let total = |history: &[ModelMessage], digest: &Option<String>, prior: &Option<String>| {
            estimate_tokens(&system)
                + history.iter().map(message_tokens).sum::<usize>()
                + digest.as_deref().map(estimate_tokens).unwrap_or(0)
                + prior.as_deref().map(estimate_tokens).unwrap_or(0)
                + estimate_tokens(current_user_message)
        };

        while total(&history, &digest, &prior) > budget && history.len() >= 2 {
            history.drain(..2);
        }
        let overshoot = total(&history, &digest, &prior).saturating_sub(budget);
        if overshoot > 0 {
            if let Some(d) = digest.as_mut() {
                let keep = d
                    .len()
                    .saturating_sub(overshoot * CHARS_PER_TOKEN as usize)
                    .max(200);
                truncate_in_place(d, keep);
            }
        }
        debug!(
            agent = agent.name,
            history = history.len(),
            tokens = total(&history, &digest, &prior),
            "context assembled"
        );

        let mut messages = history;
        if let Some(digest) = digest {
            messages.push(ModelMessage::user(digest));
        }
        if let Some(prior) = prior {
            messages.push(ModelMessage::user(prior));
        }
        messages.push(ModelMessage::user(current_user_message));

        Ok(AssembledContext { system, messages })
    }
}

fn truncate_in_place(s: &mut String, keep: usize) {
    if s.len() > keep {
        let mut end = keep;
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        s.truncate(end);
        s.push('…');
    }
}

/// One synthesized paragraph describing the active contract: title, type,
/// party names, key dates, and the highest-risk clauses. Capped at 2,000
/// characters.
pub fn contract_digest(contract: &Contract, clauses: &[Clause]) -> String {
    let mut digest = format!("Active contract: {}", contract.title);
    if let Some(ref contract_type) = contract.contract_type {
        digest.push_str(&format!(" ({})", contract_type));
    }
    digest.push('.');

    if !contract.parties.is_empty() {
        // Party names only; never a serialized party record.
        digest.push_str(&format!(" Parties: {}.", Party::join_names(&contract.parties)));
    }
    if !contract.key_dates.is_empty() {
        let dates: Vec<String> = contract
            .key_dates
            .iter()
            .map(|d| format!("{} {}", d.label, d.date))
            .collect();
        digest.push_str(&format!(" Key dates: {}.", dates.join(", ")));
    }
    if let Some(score) = contract.overall_risk_score {
        digest.push_str(&format!(" Overall risk score: {:.0}.", score));
    }

    let mut scored: Vec<&Clause> = clauses.iter().filter(|c| c.risk_score.is_some()).collect();
    scored.sort_by(|a, b| {
        b.risk_score
            .partial_cmp(&a.risk_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.index.cmp(&b.index))
    });
    if !scored.is_empty() {
        digest.push_str(" Highest-risk clauses:");
        for clause in scored.iter().take(TOP_RISK_CLAUSES) {
            let excerpt: String = clause.text.chars().take(120).collect();
            digest.push_str(&format!(
                "\n- {} (risk {:.0}): {}",
                clause.clause_type,
                clause.risk_score.unwrap_or(0.0),
                excerpt
            ));
        }
    } else if !clauses.is_empty() {
        digest.push_str(&format!(" {} clauses extracted.", clauses.len()));
    }

    truncate_in_place(&mut digest, DIGEST_MAX_CHARS);
    digest
}

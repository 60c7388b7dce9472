//! Core types for LegalMind
//!
//! Entities, sortable IDs, the error taxonomy, runtime configuration, and
//! the chat wire contract. No I/O here; everything downstream depends on
//! this crate.

pub mod config;
pub mod error;
pub mod types;
pub mod wire;

pub use config::RuntimeConfig;
pub use error::{CoreError, ErrorKind, Result};
pub use types::{
    new_id, Citation, Clause, ComplianceRule, ComplianceStatus, Contract, ContractStatus,
    DocumentKind, GeneratedDocument, KeyDate, LogStage, Message, Party, Regulation, RiskLevel,
    Role, RuleSeverity, Session, ThinkingLog,
};
pub use wire::{ChatRequest, ChatResponse, ErrorResponse, MAX_MESSAGE_CHARS};

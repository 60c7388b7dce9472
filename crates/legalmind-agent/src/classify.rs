//! Query classification — user message to agent pipeline
//!
//! A deterministic rule layer runs first: greeting detection, then intent
//! keywords. Only when the rules are ambiguous does a one-shot model call
//! decide, with a tightly constrained JSON output. The pipeline is always
//! non-empty.

use std::sync::Arc;

use legalmind_llm::{GenerateOptions, GenerateRequest, ModelClient, ModelMessage};
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::catalog::{
    ASSISTANT, COMPLIANCE_CHECKER, CONTRACT_PARSER, LEGAL_MEMO, LEGAL_RESEARCH, RISK_ASSESSOR,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    Greeting,
    ContractAnalysis,
    LegalResearch,
    ComplianceCheck,
    RiskAssessment,
    FullAnalysis,
    GeneralQuestion,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::ContractAnalysis => "contract_analysis",
            Self::LegalResearch => "legal_research",
            Self::ComplianceCheck => "compliance_check",
            Self::RiskAssessment => "risk_assessment",
            Self::FullAnalysis => "full_analysis",
            Self::GeneralQuestion => "general_question",
        }
    }
}

/// Light snapshot of session state the classifier may consult.
#[derive(Clone, Debug, Default)]
pub struct SessionSnapshot {
    pub has_contract: bool,
    pub clauses_exist: bool,
    pub message_count: u64,
    pub last_agent: Option<String>,
}

#[derive(Clone, Debug)]
pub struct Classification {
    pub query_type: QueryType,
    pub pipeline: Vec<&'static str>,
}

pub struct QueryClassifier {
    /// Fallback for messages the rule layer cannot place.
    model: Option<Arc<dyn ModelClient>>,
    greeting: Regex,
}

const INTENT_KEYWORDS: &[(QueryType, &[&str])] = &[
    (QueryType::ContractAnalysis, &[
        "analyze contract", "parse", "extract", "what does the contract say",
        "contract terms", "parties", "effective date", "clauses", "obligations",
        "review contract", "contract details", "summarize the contract",
    ]),
    (QueryType::LegalResearch, &[
        "research", "case law", "precedent", "what is", "what are", "explain",
        "jurisdiction", "statute", "court ruling", "legal definition", "is it legal",
        "legal implications", "define",
    ]),
    (QueryType::ComplianceCheck, &[
        "compliance", "compliant", "gdpr", "hipaa", "ccpa", "sox", "regulation",
        "privacy", "data protection", "audit",
    ]),
    (QueryType::RiskAssessment, &[
        "risk", "risks", "risky", "liability", "exposure", "concern", "problematic",
        "unfavorable", "one-sided", "red flags", "dangerous",
    ]),
    (QueryType::FullAnalysis, &[
        "full analysis", "comprehensive", "complete review", "analyze everything",
        "memo", "report", "full review",
    ]),
];

impl QueryClassifier {
    pub fn new(model: Option<Arc<dyn ModelClient>>) -> Self {
        Self {
            model,
            greeting: Regex::new(
                r"(?i)^\s*(hi|hello|hey|howdy|good\s+(morning|afternoon|evening)|thanks|thank you)\b[\s!.,]*$",
            )
            .expect("greeting pattern is static"),
        }
    }

    pub async fn classify(&self, message: &str, snapshot: &SessionSnapshot) -> Classification {
        if let Some(classification) = self.rule_layer(message, snapshot) {
            debug!(query_type = classification.query_type.as_str(), "rule-layer classification");
            return classification;
        }

        let query_type = match &self.model {
            Some(model) => self.classify_with_model(model.as_ref(), message).await,
            None => QueryType::GeneralQuestion,
        };
        debug!(query_type = query_type.as_str(), "fallback classification");
        Classification { pipeline: self.pipeline_for(query_type, snapshot), query_type }
    }

    fn rule_layer(&self, message: &str, snapshot: &SessionSnapshot) -> Option<Classification> {
        if self.greeting.is_match(message) {
            return Some(Classification {
                query_type: QueryType::Greeting,
                pipeline: vec![ASSISTANT],
            });
        }

        let lower = message.to_lowercase();
        let mut scores: Vec<(QueryType, usize)> = INTENT_KEYWORDS
            .iter()
            .map(|(query_type, keywords)| {
                (*query_type, keywords.iter().filter(|kw| lower.contains(*kw)).count())
            })
            .collect();
        scores.sort_by(|a, b| b.1.cmp(&a.1));

        let (best, best_score) = scores[0];
        if best_score == 0 {
            return None; // ambiguous, defer to the model layer
        }

        // Compliance and risk intent together escalate to the full pipeline.
        let compliance_hits = scores
            .iter()
            .find(|(t, _)| *t == QueryType::ComplianceCheck)
            .map(|(_, n)| *n)
            .unwrap_or(0);
        let risk_hits = scores
            .iter()
            .find(|(t, _)| *t == QueryType::RiskAssessment)
            .map(|(_, n)| *n)
            .unwrap_or(0);
        let query_type = if compliance_hits > 0 && risk_hits > 0 {
            QueryType::FullAnalysis
        } else {
            best
        };

        Some(Classification { pipeline: self.pipeline_for(query_type, snapshot), query_type })
    }

    /// Default pipelines, with the parser prepended when a clause-dependent
    /// pipeline runs against a contract that has no extracted clauses yet.
    fn pipeline_for(&self, query_type: QueryType, snapshot: &SessionSnapshot) -> Vec<&'static str> {
        let needs_parser = snapshot.has_contract && !snapshot.clauses_exist;
        let with_parser = |mut rest: Vec<&'static str>| {
            if needs_parser {
                rest.insert(0, CONTRACT_PARSER);
            }
            rest
        };

        match query_type {
            QueryType::Greeting | QueryType::GeneralQuestion => vec![ASSISTANT],
            QueryType::ContractAnalysis => {
                if snapshot.has_contract {
                    vec![CONTRACT_PARSER]
                } else {
                    vec![ASSISTANT]
                }
            }
            QueryType::LegalResearch => {
                if snapshot.has_contract {
                    // A legal question about the attached contract still
                    // reads better with the contract parsed first.
                    with_parser(vec![LEGAL_RESEARCH])
                } else {
                    vec![LEGAL_RESEARCH]
                }
            }
            QueryType::ComplianceCheck => with_parser(vec![COMPLIANCE_CHECKER]),
            QueryType::RiskAssessment => with_parser(vec![RISK_ASSESSOR]),
            QueryType::FullAnalysis => {
                with_parser(vec![COMPLIANCE_CHECKER, RISK_ASSESSOR, LEGAL_MEMO])
            }
        }
    }

    /// One-shot model classification with a constrained JSON schema.
    async fn classify_with_model(&self, model: &dyn ModelClient, message: &str) -> QueryType {
        let system = "\
Classify the user message into exactly one category. Respond with JSON only: \
{\"query_type\": \"<category>\"}. Categories: greeting, contract_analysis, \
legal_research, compliance_check, risk_assessment, full_analysis, \
general_question.";

        let request = GenerateRequest {
            system: Some(system.to_string()),
            messages: vec![ModelMessage::user(message)],
            tools: vec![],
            options: GenerateOptions {
                temperature: 0.0,
                max_output_tokens: 64,
                response_mime: Some("application/json".to_string()),
                ..Default::default()
            },
        };

        match model.generate(&request, None).await {
            Ok(response) => parse_query_type(&response.text()),
            Err(e) => {
                warn!(error = %e, "model classification failed, defaulting to general");
                QueryType::GeneralQuestion
            }
        }
    }
}

fn parse_query_type(text: &str) -> QueryType {
    let parsed: Option<Value> = serde_json::from_str(text.trim()).ok();
    let label = parsed
        .as_ref()
        .and_then(|v| v.get("query_type"))
        .and_then(|v| v.as_str())
        .unwrap_or("general_question");
    match label {
        "greeting" => QueryType::Greeting,
        "contract_analysis" => QueryType::ContractAnalysis,
        "legal_research" => QueryType::LegalResearch,
        "compliance_check" => QueryType::ComplianceCheck,
        "risk_assessment" => QueryType::RiskAssessment,
        "full_analysis" => QueryType::FullAnalysis,
        _ => QueryType::GeneralQuestion,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> QueryClassifier {
        QueryClassifier::new(None)
    }

    fn snapshot(has_contract: bool, clauses_exist: bool) -> SessionSnapshot {
        SessionSnapshot { has_contract, clauses_exist, ..Default::default() }
    }

    #[tokio::test]
    async fn greeting_routes_to_assistant() {
        let c = classifier().classify("Hello!", &snapshot(false, false)).await;
        assert_eq!(c.query_type, QueryType::Greeting);
        assert_eq!(c.pipeline, vec![ASSISTANT]);
    }

    #[tokio::test]
    async fn legal_question_without_contract_routes_to_research() {
        let c = classifier()
            .classify("What is a force majeure clause?", &snapshot(false, false))
            .await;
        assert_eq!(c.query_type, QueryType::LegalResearch);
        assert_eq!(c.pipeline, vec![LEGAL_RESEARCH]);
    }

    #[tokio::test]
    async fn compliance_prepends_parser_when_clauses_missing() {
        let c = classifier()
            .classify("Is this GDPR compliant?", &snapshot(true, false))
            .await;
        assert_eq!(c.query_type, QueryType::ComplianceCheck);
        assert_eq!(c.pipeline, vec![CONTRACT_PARSER, COMPLIANCE_CHECKER]);
    }

    #[tokio::test]
    async fn compliance_skips_parser_when_clauses_exist() {
        let c = classifier()
            .classify("Is this GDPR compliant?", &snapshot(true, true))
            .await;
        assert_eq!(c.pipeline, vec![COMPLIANCE_CHECKER]);
    }

    #[tokio::test]
    async fn full_analysis_builds_long_pipeline() {
        let c = classifier()
            .classify("Run a full analysis of this contract", &snapshot(true, false))
            .await;
        assert_eq!(c.query_type, QueryType::FullAnalysis);
        assert_eq!(
            c.pipeline,
            vec![CONTRACT_PARSER, COMPLIANCE_CHECKER, RISK_ASSESSOR, LEGAL_MEMO]
        );
    }

    #[tokio::test]
    async fn compliance_and_risk_escalate_to_full() {
        let c = classifier()
            .classify("Check GDPR compliance and the liability risks", &snapshot(true, true))
            .await;
        assert_eq!(c.query_type, QueryType::FullAnalysis);
        assert_eq!(c.pipeline, vec![COMPLIANCE_CHECKER, RISK_ASSESSOR, LEGAL_MEMO]);
    }

    #[tokio::test]
    async fn ambiguous_without_model_is_general() {
        let c = classifier().classify("xyzzy frobnicate", &snapshot(false, false)).await;
        assert_eq!(c.query_type, QueryType::GeneralQuestion);
        assert_eq!(c.pipeline, vec![ASSISTANT]);
    }

    #[tokio::test]
    async fn pipeline_is_never_empty() {
        for message in ["hi", "risk?", "compliance", "parse this", "??", "memo please"] {
            for has_contract in [false, true] {
                let c = classifier().classify(message, &snapshot(has_contract, false)).await;
                assert!(!c.pipeline.is_empty(), "empty pipeline for {:?}", message);
            }
        }
    }

    #[test]
    fn parse_query_type_tolerates_garbage() {
        assert_eq!(parse_query_type("not json"), QueryType::GeneralQuestion);
        assert_eq!(parse_query_type("{\"query_type\": \"risk_assessment\"}"), QueryType::RiskAssessment);
        assert_eq!(parse_query_type("{\"query_type\": \"unknown\"}"), QueryType::GeneralQuestion);
    }
}

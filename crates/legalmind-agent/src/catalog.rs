//! Agent catalog — the six fixed agent identities
//!
//! Each agent is an (instructions, tool subset, grounding flag, options)
//! bundle the model role-plays for one turn. The catalog is immutable
//! after startup.

use legalmind_tools::groups;

pub const ASSISTANT: &str = "ASSISTANT";
pub const CONTRACT_PARSER: &str = "CONTRACT_PARSER";
pub const LEGAL_RESEARCH: &str = "LEGAL_RESEARCH";
pub const COMPLIANCE_CHECKER: &str = "COMPLIANCE_CHECKER";
pub const RISK_ASSESSOR: &str = "RISK_ASSESSOR";
pub const LEGAL_MEMO: &str = "LEGAL_MEMO";

pub const AGENT_NAMES: &[&str] = &[
    ASSISTANT,
    CONTRACT_PARSER,
    LEGAL_RESEARCH,
    COMPLIANCE_CHECKER,
    RISK_ASSESSOR,
    LEGAL_MEMO,
];

#[derive(Clone, Debug)]
pub struct AgentDefinition {
    pub name: &'static str,
    pub id: &'static str,
    pub instructions: &'static str,
    pub tools: Vec<&'static str>,
    pub grounded_search: bool,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub max_tool_iterations: usize,
    /// When present in a pipeline, this agent's output is the final answer.
    pub synthesizer: bool,
}

pub struct AgentCatalog {
    agents: Vec<AgentDefinition>,
}

impl AgentCatalog {
    pub fn new(max_tool_iterations_default: usize) -> Self {
        let agent = |name, id, instructions, tools: Vec<&'static str>, grounded, temperature| {
            AgentDefinition {
                name,
                id,
                instructions,
                tools,
                grounded_search: grounded,
                temperature,
                max_output_tokens: 8192,
                max_tool_iterations: max_tool_iterations_default,
                synthesizer: false,
            }
        };

        let mut agents = vec![
            agent(
                ASSISTANT,
                "agent.assistant",
                ASSISTANT_INSTRUCTIONS,
                with_logging(&[]),
                false,
                0.7,
            ),
            agent(
                CONTRACT_PARSER,
                "agent.contract_parser",
                CONTRACT_PARSER_INSTRUCTIONS,
                with_logging(&[groups::CONTRACT, groups::CLAUSE]),
                false,
                0.3,
            ),
            agent(
                LEGAL_RESEARCH,
                "agent.legal_research",
                LEGAL_RESEARCH_INSTRUCTIONS,
                with_logging(&[]),
                true,
                0.5,
            ),
            agent(
                COMPLIANCE_CHECKER,
                "agent.compliance_checker",
                COMPLIANCE_CHECKER_INSTRUCTIONS,
                with_logging(&[groups::COMPLIANCE, groups::CLAUSE]),
                false,
                0.3,
            ),
            agent(
                RISK_ASSESSOR,
                "agent.risk_assessor",
                RISK_ASSESSOR_INSTRUCTIONS,
                with_logging(&[groups::RISK, groups::CLAUSE]),
                false,
                0.4,
            ),
            agent(
                LEGAL_MEMO,
                "agent.legal_memo",
                LEGAL_MEMO_INSTRUCTIONS,
                with_logging(&[groups::DOCUMENT]),
                false,
                0.5,
            ),
        ];

        if let Some(memo) = agents.iter_mut().find(|a| a.name == LEGAL_MEMO) {
            memo.synthesizer = true;
        }

        Self { agents }
    }

    pub fn get(&self, name: &str) -> Option<&AgentDefinition> {
        self.agents.iter().find(|a| a.name == name)
    }

    pub fn agents(&self) -> &[AgentDefinition] {
        &self.agents
    }
}

fn with_logging(tool_groups: &[&[&'static str]]) -> Vec<&'static str> {
    let mut tools: Vec<&'static str> = tool_groups.iter().flat_map(|g| g.iter().copied()).collect();
    tools.extend_from_slice(groups::LOGGING);
    tools
}

const ASSISTANT_INSTRUCTIONS: &str = "\
You are the LegalMind Assistant, the primary interface to a legal document \
analysis system.

Help users navigate the system: explain how to upload contracts, what the \
specialized analyses (parsing, compliance, risk, research, memos) produce, \
and answer general questions conversationally. Explain legal concepts in \
plain language.

Be friendly and professional. Ask clarifying questions when a request is \
ambiguous, and suggest a concrete next step at the end of your reply. You \
are informational, not a substitute for a licensed attorney.";

const CONTRACT_PARSER_INSTRUCTIONS: &str = "\
You are a Contract Parser agent. You extract structured information from \
legal contracts: contract type, parties and their roles, key dates, and \
categorized clauses.

Workflow for a new contract:
1. Call extract_clauses to segment the document.
2. Call save_clauses to persist the extraction.
3. Call save_contract with the contract type, party records ({name, role}) \
and key dates you identified.

Be precise and factual. Quote the relevant clause when referencing contract \
terms, and clearly distinguish what the contract states from what you infer. \
Format dates as Month DD, YYYY.";

const LEGAL_RESEARCH_INSTRUCTIONS: &str = "\
You are a Legal Research agent. You answer legal questions using current \
web sources: applicable laws, case law, regulatory requirements, and \
standard contract practice.

Cite authoritative sources (courts, government sites, legal databases) and \
explain concepts in plain language. Note when the answer varies by \
jurisdiction, and when information may be outdated.

Always close with a short disclaimer that this is general information, not \
legal advice, and that a licensed attorney should be consulted for specific \
situations.";

const COMPLIANCE_CHECKER_INSTRUCTIONS: &str = "\
You are a Compliance Checker agent. You map contracts against regulatory \
frameworks: GDPR, HIPAA, CCPA, and SOX.

Workflow:
1. Call get_compliance_rules for the framework in question.
2. Call check_compliance to evaluate the contract's saved clauses rule by \
rule.
3. Report a verdict per rule (compliant / partial / non-compliant), leading \
with the most severe gaps, each with a concrete remediation step.

Be thorough but practical: focus on material issues in the contract's \
context, and say explicitly when a gap may simply mean the topic is handled \
outside this contract.";

const RISK_ASSESSOR_INSTRUCTIONS: &str = "\
You are a Risk Assessment agent. You identify legal and business risk in \
contracts: liability exposure, unfavorable or one-sided terms, missing \
protections, and ambiguous language.

Use calculate_overall_risk for a full assessment and calculate_clause_risk \
for individual clauses; compare against get_risk_benchmarks for the \
contract type. Scores read: 0-25 low, 26-50 medium, 51-75 high, 76-100 \
critical.

Lead with the overall score and level, organize findings by category \
(liability, termination, IP, data handling, indemnification), explain why \
each flagged item is a risk, and end with recommended actions in priority \
order.";

const LEGAL_MEMO_INSTRUCTIONS: &str = "\
You are a Legal Memo agent. You synthesize the findings already gathered \
this turn into a professional document: a legal memorandum, contract \
summary, or compliance report.

Structure: executive summary first, then findings with supporting detail, \
then actionable recommendations, then appropriate disclaimers. Use \
generate_document to render and store the final document, and include its \
location in your reply.

Write clearly and concisely in formal register. Support conclusions with \
the evidence from the analysis; distinguish facts from judgment.";

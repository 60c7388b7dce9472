//! Seeded compliance rule data
//!
//! Read-mostly reference rules for the regulations the checker knows.
//! `keywords` inside `category` drive the deterministic clause matching in
//! the compliance tools: a rule hits when a clause's type or text mentions
//! one of its category terms.

use legalmind_core::{ComplianceRule, Regulation, RuleSeverity};

fn rule(
    regulation: Regulation,
    rule_id: &str,
    text: &str,
    category: &str,
    severity: RuleSeverity,
) -> ComplianceRule {
    ComplianceRule {
        regulation,
        rule_id: rule_id.to_string(),
        text: text.to_string(),
        category: category.to_string(),
        severity,
    }
}

pub fn seed_rules() -> Vec<ComplianceRule> {
    use Regulation::*;
    use RuleSeverity::*;

    vec![
        // GDPR
        rule(Gdpr, "GDPR-5", "Personal data must be processed lawfully, fairly and transparently for specified purposes.", "data processing", High),
        rule(Gdpr, "GDPR-17", "Data subjects have the right to erasure of personal data without undue delay.", "data subject rights", Medium),
        rule(Gdpr, "GDPR-28", "Processing by a processor must be governed by a contract with documented instructions.", "data processing agreement", High),
        rule(Gdpr, "GDPR-32", "Appropriate technical and organisational security measures must protect personal data.", "security", Critical),
        rule(Gdpr, "GDPR-33", "Personal data breaches must be notified to the supervisory authority within 72 hours.", "breach notification", Critical),
        rule(Gdpr, "GDPR-44", "Transfers of personal data outside the EEA require adequate safeguards.", "data transfer", High),
        // HIPAA
        rule(Hipaa, "HIPAA-164.308", "Administrative safeguards must manage the selection and execution of security measures.", "security", High),
        rule(Hipaa, "HIPAA-164.312", "Technical safeguards must control access to electronic protected health information.", "access control", Critical),
        rule(Hipaa, "HIPAA-164.314", "Business associate contracts must require compliance with the security rule.", "business associate", High),
        rule(Hipaa, "HIPAA-164.404", "Individuals must be notified of breaches of unsecured protected health information.", "breach notification", Critical),
        // CCPA
        rule(Ccpa, "CCPA-1798.100", "Consumers have the right to know what personal information is collected.", "disclosure", Medium),
        rule(Ccpa, "CCPA-1798.105", "Consumers have the right to deletion of personal information.", "data subject rights", Medium),
        rule(Ccpa, "CCPA-1798.120", "Consumers have the right to opt out of the sale of personal information.", "opt out", High),
        rule(Ccpa, "CCPA-1798.150", "Businesses must implement reasonable security procedures for personal information.", "security", High),
        // SOX
        rule(Sox, "SOX-302", "Principal officers must certify the accuracy of financial reports.", "financial reporting", Critical),
        rule(Sox, "SOX-404", "Management must assess the effectiveness of internal control over financial reporting.", "internal controls", High),
        rule(Sox, "SOX-802", "Records relevant to audits must be retained and protected from destruction.", "record retention", High),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_regulation_has_rules() {
        let rules = seed_rules();
        for regulation in [
            Regulation::Gdpr,
            Regulation::Hipaa,
            Regulation::Ccpa,
            Regulation::Sox,
        ] {
            assert!(
                rules.iter().any(|r| r.regulation == regulation),
                "no rules for {}",
                regulation
            );
        }
    }

    #[test]
    fn rule_ids_are_unique() {
        let rules = seed_rules();
        let mut ids: Vec<_> = rules.iter().map(|r| r.rule_id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), rules.len());
    }
}

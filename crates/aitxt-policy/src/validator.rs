//! Semantic checks on a parsed document.
//!
//! Parsing only rejects what it cannot represent. This pass looks at the
//! document as a whole and reports problems a publisher should fix, split
//! into errors (the document is wrong) and warnings (it is probably not what
//! was intended). It never modifies the document.

use crate::verdict::{Finding, Severity};
use aitxt::ast::{
    is_valid_spec_version, normalize_agent_name, Document, PolicyField, PolicyValue,
    RequirementLevel, WILDCARD_AGENT,
};
use aitxt::limits::MAX_PATTERN_LENGTH;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref HTTP_URL: Regex = Regex::new(r"(?i)^https?://\S+$").unwrap();
}

/// Result of [`validate`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<Finding>,
    pub warnings: Vec<Finding>,
}

impl ValidationReport {
    fn from_findings(findings: Vec<Finding>) -> Self {
        let (errors, warnings): (Vec<_>, Vec<_>) = findings
            .into_iter()
            .partition(|f| f.severity == Severity::Error);
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Valid, and with no warnings either
    pub fn is_clean(&self) -> bool {
        self.valid && self.warnings.is_empty()
    }
}

/// Run every check against `doc`
pub fn validate(doc: &Document) -> ValidationReport {
    let mut findings = Vec::new();

    check_site(doc, &mut findings);
    check_spec_version(doc, &mut findings);
    check_policies(doc, &mut findings);
    check_agents(doc, &mut findings);
    check_training(doc, &mut findings);
    check_licensing(doc, &mut findings);
    check_compliance(doc, &mut findings);

    ValidationReport::from_findings(findings)
}

fn is_http_url(url: &str) -> bool {
    HTTP_URL.is_match(url.trim())
}

fn check_site(doc: &Document, findings: &mut Vec<Finding>) {
    let site = &doc.site;
    if site.name.trim().is_empty() {
        findings.push(Finding::error(
            "site.name.empty",
            "site.name",
            "site name must not be empty",
        ));
    }

    if !is_http_url(&site.url) {
        findings.push(Finding::error(
            "site.url.scheme",
            "site.url",
            format!("site URL '{}' must start with http:// or https://", site.url),
        ));
    } else if site.url.trim().to_lowercase().starts_with("http://") {
        findings.push(Finding::warning(
            "site.url.insecure",
            "site.url",
            "site URL uses http://; prefer https://",
        ));
    }

    if let Some(url) = &site.policy_url {
        if !is_http_url(url) {
            findings.push(Finding::warning(
                "url.scheme",
                "site.policyUrl",
                format!("policy URL '{}' is not an http(s) URL", url),
            ));
        }
    }
}

fn check_spec_version(doc: &Document, findings: &mut Vec<Finding>) {
    if !is_valid_spec_version(&doc.spec_version) {
        findings.push(Finding::error(
            "specVersion.format",
            "specVersion",
            format!(
                "spec version '{}' must have the form major.minor",
                doc.spec_version
            ),
        ));
    }
}

fn conditional_outside_training(field: PolicyField, value: Option<PolicyValue>) -> bool {
    field != PolicyField::Training && value == Some(PolicyValue::Conditional)
}

fn conditional_finding(path: String, field: PolicyField) -> Finding {
    Finding::error(
        "policy.conditional.unsupported",
        path,
        format!(
            "{} cannot be conditional; path rules only apply to training",
            field
        ),
    )
}

fn check_policies(doc: &Document, findings: &mut Vec<Finding>) {
    for field in PolicyField::ALL {
        if conditional_outside_training(field, Some(doc.policies.get(field))) {
            findings.push(conditional_finding(format!("policies.{}", field), field));
        }
    }
}

fn check_agents(doc: &Document, findings: &mut Vec<Finding>) {
    for (name, agent) in &doc.agents {
        let path = format!("agents.{}", name);

        if name.trim().is_empty() {
            findings.push(Finding::error(
                "agent.name.empty",
                path.clone(),
                "agent name must not be empty",
            ));
        } else if name != WILDCARD_AGENT && *name != normalize_agent_name(name) {
            findings.push(Finding::error(
                "agent.name.normalized",
                path.clone(),
                format!(
                    "agent key '{}' must be lowercase and trimmed ('{}')",
                    name,
                    normalize_agent_name(name)
                ),
            ));
        }

        for field in PolicyField::ALL {
            if conditional_outside_training(field, agent.get(field)) {
                findings.push(conditional_finding(format!("{}.{}", path, field), field));
            }
        }

        if let Some(limit) = &agent.rate_limit {
            if limit.requests == 0 {
                findings.push(Finding::error(
                    "rateLimit.zero",
                    format!("{}.rateLimit.requests", path),
                    "rate limit must allow at least one request",
                ));
            }
        }
    }
}

/// Training values across every tier
fn training_values(doc: &Document) -> impl Iterator<Item = PolicyValue> + '_ {
    std::iter::once(doc.policies.training).chain(doc.agents.values().filter_map(|a| a.training))
}

fn check_training(doc: &Document, findings: &mut Vec<Finding>) {
    let any_conditional = training_values(doc).any(|v| v == PolicyValue::Conditional);
    let has_patterns = doc
        .training_paths
        .as_ref()
        .map_or(false, |paths| !paths.is_empty());

    if any_conditional && !has_patterns {
        findings.push(Finding::warning(
            "trainingPaths.missing",
            "trainingPaths",
            "training is conditional but no training paths are declared, so every path is denied",
        ));
    }
    if has_patterns && !any_conditional {
        findings.push(Finding::warning(
            "trainingPaths.unused",
            "trainingPaths",
            "training paths are declared but training is not conditional for any agent",
        ));
    }

    if let Some(paths) = &doc.training_paths {
        let lists = [("allow", &paths.allow), ("deny", &paths.deny)];
        for (list, patterns) in lists {
            for (idx, pattern) in patterns.iter().enumerate() {
                let len = pattern.chars().count();
                if len > MAX_PATTERN_LENGTH {
                    findings.push(Finding::warning(
                        "trainingPaths.pattern.length",
                        format!("trainingPaths.{}[{}]", list, idx),
                        format!(
                            "pattern of {} characters exceeds the limit of {} and will never match",
                            len, MAX_PATTERN_LENGTH
                        ),
                    ));
                }
            }
        }
    }
}

fn check_licensing(doc: &Document, findings: &mut Vec<Finding>) {
    let license = doc
        .licensing
        .as_ref()
        .and_then(|l| l.license.as_deref())
        .filter(|l| !l.trim().is_empty());

    if license.is_none() && training_values(doc).any(|v| v == PolicyValue::Allow) {
        findings.push(Finding::warning(
            "licensing.missing",
            "licensing.license",
            "training is allowed but no license is declared",
        ));
    }

    if let Some(fee_url) = doc.licensing.as_ref().and_then(|l| l.fee_url.as_deref()) {
        if !is_http_url(fee_url) {
            findings.push(Finding::warning(
                "url.scheme",
                "licensing.feeUrl",
                format!("fee URL '{}' is not an http(s) URL", fee_url),
            ));
        }
    }
}

fn check_compliance(doc: &Document, findings: &mut Vec<Finding>) {
    let Some(compliance) = &doc.compliance else {
        return;
    };

    if compliance.audit == Some(RequirementLevel::Recommended) {
        findings.push(Finding::warning(
            "compliance.audit.recommended",
            "compliance.audit",
            "audit is normally required, optional or none; 'recommended' is advisory only",
        ));
    }
    if compliance.audit.is_none() && compliance.audit_format.is_some() {
        findings.push(Finding::warning(
            "compliance.auditFormat.orphan",
            "compliance.auditFormat",
            "audit format is set but no audit requirement is declared",
        ));
    }
}

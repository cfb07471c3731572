//! Text and JSON generators, the inverse of the two parsers.

use crate::ast::{Document, PolicyField, PolicyValue};
use crate::error::FormatError;
use crate::limits::MAX_PATTERN_LENGTH;
use crate::sanitize::{sanitize_value, sanitize_with_limit};
use crate::schema::validate_value;

/// Keys the text parser interprets itself; metadata may not reuse them
const RESERVED_KEYS: &[&str] = &[
    "spec-version",
    "generated-at",
    "site-name",
    "site-url",
    "description",
    "site-description",
    "contact",
    "site-contact",
    "policy-url",
    "training",
    "scraping",
    "indexing",
    "caching",
    "training-allow",
    "training-deny",
    "training-license",
    "training-fee",
    "attribution",
    "ai-disclosure",
    "audit",
    "audit-format",
    "agent",
];

/// Render a document in the text format
///
/// Sections that are unset are omitted; the four policy lines are always
/// present. The result ends with exactly one newline.
pub fn generate_text(doc: &Document) -> String {
    let mut sections: Vec<Vec<String>> = Vec::new();

    let mut header = vec![
        "# ai.txt - AI usage policy".to_string(),
        field("Spec-Version", &doc.spec_version),
    ];
    if let Some(at) = &doc.generated_at {
        header.push(field("Generated-At", at));
    }
    sections.push(header);

    let site = &doc.site;
    let mut site_lines = vec![field("Site-Name", &site.name), field("Site-URL", &site.url)];
    push_opt(&mut site_lines, "Description", site.description.as_deref());
    push_opt(&mut site_lines, "Contact", site.contact.as_deref());
    push_opt(&mut site_lines, "Policy-URL", site.policy_url.as_deref());
    sections.push(site_lines);

    let mut policy_lines: Vec<String> = PolicyField::ALL
        .iter()
        .map(|f| policy_line(f.text_key(), doc.policies.get(*f)))
        .collect();
    if let Some(paths) = &doc.training_paths {
        for pattern in &paths.allow {
            policy_lines.push(pattern_line("Training-Allow", pattern));
        }
        for pattern in &paths.deny {
            policy_lines.push(pattern_line("Training-Deny", pattern));
        }
    }
    sections.push(policy_lines);

    if let Some(licensing) = doc.licensing.as_ref().filter(|l| !l.is_empty()) {
        let mut lines = Vec::new();
        push_opt(&mut lines, "Training-License", licensing.license.as_deref());
        push_opt(&mut lines, "Training-Fee", licensing.fee_url.as_deref());
        sections.push(lines);
    }

    for (name, agent) in &doc.agents {
        let name = sanitize_value(name);
        if name.is_empty() {
            continue;
        }
        let mut lines = vec![format!("Agent: {}", name)];
        for f in PolicyField::ALL {
            if let Some(value) = agent.get(f) {
                lines.push(format!("  {}", policy_line(f.text_key(), value)));
            }
        }
        if let Some(limit) = &agent.rate_limit {
            lines.push(format!("  Rate-Limit: {}", limit));
        }
        sections.push(lines);
    }

    let mut requirement_lines = Vec::new();
    if let Some(content) = &doc.content {
        if let Some(level) = content.attribution {
            requirement_lines.push(format!("Attribution: {}", level));
        }
        if let Some(level) = content.ai_disclosure {
            requirement_lines.push(format!("AI-Disclosure: {}", level));
        }
    }
    if let Some(compliance) = &doc.compliance {
        if let Some(level) = compliance.audit {
            requirement_lines.push(format!("Audit: {}", level));
        }
        push_opt(&mut requirement_lines, "Audit-Format", compliance.audit_format.as_deref());
    }
    if !requirement_lines.is_empty() {
        sections.push(requirement_lines);
    }

    let metadata_lines: Vec<String> = doc
        .metadata
        .iter()
        .filter_map(|(key, value)| {
            let key = sanitize_value(key);
            let value = sanitize_value(value);
            metadata_key_allowed(&key).then(|| format!("{}: {}", key, value).trim_end().to_string())
        })
        .collect();
    if !metadata_lines.is_empty() {
        sections.push(metadata_lines);
    }

    let mut out = String::new();
    for (idx, section) in sections.iter().filter(|s| !s.is_empty()).enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        for line in section {
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

/// Render a document in the JSON format
///
/// The document is checked against the same schema the JSON parser uses; a
/// document that fails it is a caller bug and is returned as
/// [`FormatError::InvalidDocument`].
pub fn generate_json(doc: &Document) -> Result<String, FormatError> {
    let value = serde_json::to_value(doc)?;
    let report = validate_value(&value);
    if !report.is_valid() {
        return Err(FormatError::InvalidDocument {
            violations: report.errors.iter().map(ToString::to_string).collect(),
        });
    }
    Ok(serde_json::to_string_pretty(doc)?)
}

fn field(key: &str, value: &str) -> String {
    format!("{}: {}", key, sanitize_value(value))
}

fn policy_line(key: &str, value: PolicyValue) -> String {
    format!("{}: {}", key, value)
}

fn pattern_line(key: &str, pattern: &str) -> String {
    format!("{}: {}", key, sanitize_with_limit(pattern, MAX_PATTERN_LENGTH))
}

fn push_opt(lines: &mut Vec<String>, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        lines.push(field(key, value));
    }
}

fn metadata_key_allowed(key: &str) -> bool {
    !key.is_empty()
        && !key.contains(':')
        && !key.starts_with('#')
        && !RESERVED_KEYS.contains(&key.to_lowercase().as_str())
}

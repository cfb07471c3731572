//! Text format parser.
//!
//! Single pass over the logical lines of an `ai.txt` document. Top-level
//! `Key: value` lines fill the document; indented lines belong to the most
//! recently opened `Agent:` block. Problems with individual values are
//! reported as warnings and the value is dropped; only a missing site
//! identity (or oversized input) fails the parse.
//!
//! Keys, values and agent names go through the same sanitizing as the text
//! generator, so generating and re-parsing a parsed document reproduces it.

use crate::ast::{
    is_valid_spec_version, normalize_agent_name, AgentPolicy, Compliance, ContentRequirements,
    Document, Licensing, Policies, PolicyField, PolicyValue, RateLimit, RequirementLevel, SiteInfo,
    TrainingPaths, DEFAULT_SPEC_VERSION,
};
use crate::diagnostics::{Diagnostic, ParseResult};
use crate::error::FormatError;
use crate::limits::{MAX_INPUT_BYTES, MAX_PATTERN_LENGTH, MAX_VALUE_LENGTH};
use crate::sanitize::{sanitize_value, sanitize_with_limit};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

lazy_static! {
    static ref LINE_BREAK: Regex = Regex::new(r"\r\n|\r|\n").unwrap();

    /// `# Spec-Version: X` written as a comment by older generators
    static ref LEGACY_SPEC_VERSION: Regex =
        Regex::new(r"(?i)^#\s*spec-version\s*:\s*(.*?)\s*$").unwrap();

    /// `# Generated: X` / `# Generated-At: X`
    static ref LEGACY_GENERATED: Regex =
        Regex::new(r"(?i)^#\s*generated(?:-at)?\s*:\s*(.*?)\s*$").unwrap();
}

/// Parse an `ai.txt` document
pub fn parse_text(input: &str) -> ParseResult {
    if input.len() > MAX_INPUT_BYTES {
        let err = FormatError::InputTooLarge {
            size: input.len(),
            limit: MAX_INPUT_BYTES,
        };
        return ParseResult::failed(vec![Diagnostic::new(err.to_string())], Vec::new());
    }

    let input = input.strip_prefix('\u{FEFF}').unwrap_or(input);
    let mut parser = TextParser::default();
    let mut line_count = 0;

    for (idx, line) in LINE_BREAK.split(input).enumerate() {
        parser.feed(idx + 1, line);
        line_count += 1;
    }

    let result = parser.finish();
    debug!(
        lines = line_count,
        success = result.success,
        errors = result.errors.len(),
        warnings = result.warnings.len(),
        "parsed ai.txt document"
    );
    result
}

/// An `Agent:` block that has not been flushed into the map yet
struct OpenBlock {
    name: String,
    policy: AgentPolicy,
}

#[derive(Default)]
struct TextParser {
    spec_version: Option<String>,
    generated_at: Option<String>,
    site_name: Option<String>,
    site_url: Option<String>,
    description: Option<String>,
    contact: Option<String>,
    policy_url: Option<String>,
    policies: Policies,
    training_allow: Vec<String>,
    training_deny: Vec<String>,
    licensing: Licensing,
    content: ContentRequirements,
    compliance: Compliance,
    agents: BTreeMap<String, AgentPolicy>,
    metadata: BTreeMap<String, String>,

    block: Option<OpenBlock>,
    seen_fields: HashSet<String>,
    warnings: Vec<Diagnostic>,
}

impl TextParser {
    fn warn(&mut self, line: usize, message: impl Into<String>) {
        self.warnings.push(Diagnostic::new(message).at_line(line));
    }

    fn feed(&mut self, line_no: usize, raw: &str) {
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return;
        }

        if trimmed.starts_with('#') {
            self.legacy_comment(line_no, trimmed);
            return;
        }

        if raw.starts_with("  ") || raw.starts_with('\t') {
            self.indented(line_no, trimmed);
            return;
        }

        let Some((key, value)) = trimmed.split_once(':') else {
            self.warn(
                line_no,
                format!("Unparseable line (expected 'Key: value'): '{}'", trimmed),
            );
            return;
        };

        self.close_block();
        self.top_level(line_no, key.trim(), value.trim());
    }

    fn legacy_comment(&mut self, line_no: usize, comment: &str) {
        if let Some(caps) = LEGACY_SPEC_VERSION.captures(comment) {
            let raw = caps[1].to_string();
            if !raw.is_empty() {
                self.warn(
                    line_no,
                    "Spec-Version in a comment is deprecated; use a 'Spec-Version:' line",
                );
                if let Some(value) = self.clean(line_no, "Spec-Version", &raw, MAX_VALUE_LENGTH) {
                    self.set_spec_version(line_no, &value);
                }
            }
        } else if let Some(caps) = LEGACY_GENERATED.captures(comment) {
            let raw = caps[1].to_string();
            if !raw.is_empty() {
                self.warn(
                    line_no,
                    "Generated timestamp in a comment is deprecated; use a 'Generated-At:' line",
                );
                if let Some(value) = self.clean(line_no, "Generated-At", &raw, MAX_VALUE_LENGTH) {
                    self.set_scalar(line_no, "Generated-At", value, |p| &mut p.generated_at);
                }
            }
        }
    }

    fn indented(&mut self, line_no: usize, content: &str) {
        if self.block.is_none() {
            self.warn(
                line_no,
                format!("Indented line outside of an Agent block ignored: '{}'", content),
            );
            return;
        }

        let Some((key, value)) = content.split_once(':') else {
            self.warn(
                line_no,
                format!("Unparseable line in Agent block (expected 'Key: value'): '{}'", content),
            );
            return;
        };
        let (key, value) = (key.trim(), value.trim());

        let agent = self.block.as_ref().map(|b| b.name.clone()).unwrap_or_default();
        match key.to_lowercase().as_str() {
            "training" => self.agent_policy(line_no, &agent, PolicyField::Training, value),
            "scraping" => self.agent_policy(line_no, &agent, PolicyField::Scraping, value),
            "indexing" => self.agent_policy(line_no, &agent, PolicyField::Indexing, value),
            "caching" => self.agent_policy(line_no, &agent, PolicyField::Caching, value),
            "rate-limit" => match value.parse::<RateLimit>() {
                Ok(limit) => {
                    if let Some(block) = self.block.as_mut() {
                        block.policy.rate_limit = Some(limit);
                    }
                }
                Err(e) => self.warn(line_no, format!("Agent '{}': {}", agent, e)),
            },
            _ => self.warn(
                line_no,
                format!("Unknown field '{}' in Agent block '{}' ignored", key, agent),
            ),
        }
    }

    fn agent_policy(&mut self, line_no: usize, agent: &str, field: PolicyField, value: &str) {
        let Some(parsed) = self.policy_value(line_no, field, value, Some(agent)) else {
            return;
        };
        if let Some(block) = self.block.as_mut() {
            block.policy.set(field, parsed);
        }
    }

    /// Validate a policy value, warning on invalid or misplaced values
    fn policy_value(
        &mut self,
        line_no: usize,
        field: PolicyField,
        value: &str,
        agent: Option<&str>,
    ) -> Option<PolicyValue> {
        let scope = match agent {
            Some(name) => format!("Agent '{}': ", name),
            None => String::new(),
        };

        match value.parse::<PolicyValue>() {
            Ok(PolicyValue::Conditional) if field != PolicyField::Training => {
                self.warn(
                    line_no,
                    format!(
                        "{}'conditional' is only meaningful for Training; access checks treat conditional {} as denied",
                        scope,
                        field.text_key()
                    ),
                );
                Some(PolicyValue::Conditional)
            }
            Ok(parsed) => Some(parsed),
            Err(e) => {
                self.warn(line_no, format!("{}{}: {}", scope, field.text_key(), e));
                None
            }
        }
    }

    /// Sanitize a raw value the way the generator will write it
    ///
    /// Warns when the value changes; a value that sanitizes to nothing is
    /// dropped with an "Empty value" warning.
    fn clean(&mut self, line_no: usize, key: &str, raw: &str, max_chars: usize) -> Option<String> {
        let value = sanitize_with_limit(raw, max_chars);
        if value.is_empty() {
            self.warn(line_no, format!("Empty value for '{}' ignored", key));
            return None;
        }
        if value != raw {
            self.warn(
                line_no,
                format!(
                    "Value for '{}' had control or invisible characters removed or was truncated",
                    key
                ),
            );
        }
        Some(value)
    }

    fn top_level(&mut self, line_no: usize, raw_key: &str, raw_value: &str) {
        let key = sanitize_value(raw_key);
        if key.is_empty() || key.starts_with('#') {
            self.warn(line_no, format!("Line without a usable key ignored: '{}'", key));
            return;
        }
        if key != raw_key {
            self.warn(
                line_no,
                format!("Key '{}' had control or invisible characters removed", key),
            );
        }
        let lower = key.to_lowercase();

        if lower == "agent" {
            self.open_block(line_no, raw_value);
            return;
        }

        let max_chars = match lower.as_str() {
            "training-allow" | "training-deny" => MAX_PATTERN_LENGTH,
            _ => MAX_VALUE_LENGTH,
        };
        let Some(value) = self.clean(line_no, &key, raw_value, max_chars) else {
            return;
        };

        match lower.as_str() {
            "spec-version" => self.set_spec_version(line_no, &value),
            "generated-at" => self.set_scalar(line_no, "Generated-At", value, |p| &mut p.generated_at),
            "site-name" => self.set_scalar(line_no, "Site-Name", value, |p| &mut p.site_name),
            "site-url" => self.set_scalar(line_no, "Site-URL", value, |p| &mut p.site_url),
            "description" | "site-description" => {
                self.set_scalar(line_no, "Description", value, |p| &mut p.description)
            }
            "contact" | "site-contact" => {
                self.set_scalar(line_no, "Contact", value, |p| &mut p.contact)
            }
            "policy-url" => self.set_scalar(line_no, "Policy-URL", value, |p| &mut p.policy_url),
            "training" => self.site_policy(line_no, PolicyField::Training, &value),
            "scraping" => self.site_policy(line_no, PolicyField::Scraping, &value),
            "indexing" => self.site_policy(line_no, PolicyField::Indexing, &value),
            "caching" => self.site_policy(line_no, PolicyField::Caching, &value),
            "training-allow" => self.training_allow.push(value),
            "training-deny" => self.training_deny.push(value),
            "training-license" => {
                self.set_scalar(line_no, "Training-License", value, |p| &mut p.licensing.license)
            }
            "training-fee" => {
                self.set_scalar(line_no, "Training-Fee", value, |p| &mut p.licensing.fee_url)
            }
            "attribution" => {
                if let Some(level) = self.requirement(line_no, "Attribution", &value) {
                    self.note_duplicate(line_no, "Attribution");
                    self.content.attribution = Some(level);
                }
            }
            "ai-disclosure" => {
                if let Some(level) = self.requirement(line_no, "AI-Disclosure", &value) {
                    self.note_duplicate(line_no, "AI-Disclosure");
                    self.content.ai_disclosure = Some(level);
                }
            }
            "audit" => {
                if let Some(level) = self.requirement(line_no, "Audit", &value) {
                    self.note_duplicate(line_no, "Audit");
                    self.compliance.audit = Some(level);
                }
            }
            "audit-format" => {
                self.set_scalar(line_no, "Audit-Format", value, |p| &mut p.compliance.audit_format)
            }
            "ai-json" => self.set_metadata(line_no, "AI-JSON", value),
            "agents-txt" => self.set_metadata(line_no, "Agents-TXT", value),
            _ => self.set_metadata(line_no, &key, value),
        }
    }

    fn note_duplicate(&mut self, line_no: usize, field: &str) {
        if !self.seen_fields.insert(field.to_string()) {
            self.warn(
                line_no,
                format!("Duplicate field '{}'; the last value wins", field),
            );
        }
    }

    fn set_scalar(
        &mut self,
        line_no: usize,
        field: &str,
        value: String,
        slot: impl FnOnce(&mut Self) -> &mut Option<String>,
    ) {
        self.note_duplicate(line_no, field);
        *slot(self) = Some(value);
    }

    fn set_spec_version(&mut self, line_no: usize, value: &str) {
        if is_valid_spec_version(value) {
            self.set_scalar(line_no, "Spec-Version", value.to_string(), |p| &mut p.spec_version);
        } else {
            self.warn(
                line_no,
                format!(
                    "Invalid Spec-Version '{}' (expected major.minor); using {}",
                    value, DEFAULT_SPEC_VERSION
                ),
            );
        }
    }

    fn site_policy(&mut self, line_no: usize, field: PolicyField, value: &str) {
        if let Some(parsed) = self.policy_value(line_no, field, value, None) {
            self.note_duplicate(line_no, field.text_key());
            self.policies.set(field, parsed);
        }
    }

    fn requirement(&mut self, line_no: usize, field: &str, value: &str) -> Option<RequirementLevel> {
        match value.parse::<RequirementLevel>() {
            Ok(level) => Some(level),
            Err(e) => {
                self.warn(line_no, format!("{}: {}", field, e));
                None
            }
        }
    }

    fn set_metadata(&mut self, line_no: usize, key: &str, value: String) {
        if self.metadata.contains_key(key) {
            self.warn(
                line_no,
                format!("Duplicate field '{}'; the last value wins", key),
            );
        }
        self.metadata.insert(key.to_string(), value);
    }

    fn open_block(&mut self, line_no: usize, name: &str) {
        self.close_block();

        let lowered = normalize_agent_name(name);
        let normalized = sanitize_value(&lowered);
        if normalized.is_empty() {
            self.warn(line_no, "Agent line without a name ignored");
            return;
        }
        if normalized != lowered {
            self.warn(
                line_no,
                format!(
                    "Agent name '{}' had control or invisible characters removed or was truncated",
                    normalized
                ),
            );
        }

        if self.agents.contains_key(&normalized) {
            self.warn(
                line_no,
                format!(
                    "Duplicate Agent block for '{}'; the later block replaces the earlier one",
                    normalized
                ),
            );
        }

        self.block = Some(OpenBlock {
            name: normalized,
            policy: AgentPolicy::default(),
        });
    }

    fn close_block(&mut self) {
        if let Some(block) = self.block.take() {
            self.agents.insert(block.name, block.policy);
        }
    }

    fn finish(mut self) -> ParseResult {
        self.close_block();

        let mut errors = Vec::new();
        if self.site_name.is_none() {
            errors.push(Diagnostic::new("Missing required field: Site-Name").at_path("Site-Name"));
        }
        if self.site_url.is_none() {
            errors.push(Diagnostic::new("Missing required field: Site-URL").at_path("Site-URL"));
        }

        let (Some(name), Some(url)) = (self.site_name, self.site_url) else {
            return ParseResult::failed(errors, self.warnings);
        };

        let training_paths = if self.training_allow.is_empty() && self.training_deny.is_empty() {
            None
        } else {
            Some(TrainingPaths {
                allow: self.training_allow,
                deny: self.training_deny,
            })
        };

        let mut document = Document {
            spec_version: self
                .spec_version
                .unwrap_or_else(|| DEFAULT_SPEC_VERSION.to_string()),
            generated_at: self.generated_at,
            site: SiteInfo {
                name,
                url,
                description: self.description,
                contact: self.contact,
                policy_url: self.policy_url,
            },
            policies: self.policies,
            training_paths,
            licensing: Some(self.licensing).filter(|l| !l.is_empty()),
            agents: self.agents,
            content: Some(self.content).filter(|c| !c.is_empty()),
            compliance: Some(self.compliance).filter(|c| !c.is_empty()),
            metadata: self.metadata,
        };
        document.ensure_wildcard();

        ParseResult::ok(document, self.warnings)
    }
}

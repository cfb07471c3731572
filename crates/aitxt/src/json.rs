//! JSON format parser.

use crate::ast::{normalize_agent_name, Document, WILDCARD_AGENT};
use crate::diagnostics::{Diagnostic, ParseResult};
use crate::error::FormatError;
use crate::limits::MAX_INPUT_BYTES;
use crate::schema::validate_value;
use serde_json::{Map, Value};
use tracing::debug;

/// Parse an `ai.json` document
///
/// Any schema violation fails the whole parse. On success agent keys are
/// lowercased (later case variants overwrite earlier ones) and the wildcard
/// entry is ensured.
pub fn parse_json(input: &str) -> ParseResult {
    if input.len() > MAX_INPUT_BYTES {
        let err = FormatError::InputTooLarge {
            size: input.len(),
            limit: MAX_INPUT_BYTES,
        };
        return ParseResult::failed(vec![Diagnostic::new(err.to_string())], Vec::new());
    }

    let input = input.strip_prefix('\u{FEFF}').unwrap_or(input);
    let mut value: Value = match serde_json::from_str(input) {
        Ok(v) => v,
        Err(e) => {
            return ParseResult::failed(
                vec![Diagnostic::new(format!("Invalid JSON: {}", e))],
                Vec::new(),
            );
        }
    };

    let report = validate_value(&value);
    let mut warnings = report.warnings;
    if !report.errors.is_empty() {
        debug!(errors = report.errors.len(), "ai.json failed schema validation");
        return ParseResult::failed(report.errors, warnings);
    }

    strip_nulls(&mut value);
    if let Some(Value::Object(agents)) = value.get_mut("agents") {
        normalize_agents(agents, &mut warnings);
    }

    let mut document: Document = match serde_json::from_value(value) {
        Ok(doc) => doc,
        Err(e) => {
            return ParseResult::failed(
                vec![Diagnostic::new(format!("Invalid document: {}", e))],
                warnings,
            );
        }
    };
    document.ensure_wildcard();

    debug!(
        agents = document.agents.len(),
        warnings = warnings.len(),
        "parsed ai.json document"
    );
    ParseResult::ok(document, warnings)
}

/// Drop `null` members so serde falls back to defaults
fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            for v in map.values_mut() {
                strip_nulls(v);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {}
    }
}

fn normalize_agents(agents: &mut Map<String, Value>, warnings: &mut Vec<Diagnostic>) {
    let original = std::mem::take(agents);
    for (name, policy) in original {
        let key = if name == WILDCARD_AGENT {
            name
        } else {
            normalize_agent_name(&name)
        };
        if agents.contains_key(&key) {
            warnings.push(
                Diagnostic::new(format!(
                    "Duplicate agent '{}' after case normalization; the later entry wins",
                    key
                ))
                .at_path(format!("agents.{}", key)),
            );
        }
        agents.insert(key, policy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::PolicyValue;

    #[test]
    fn test_minimal_json() {
        let result = parse_json(
            r#"{"site":{"name":"My Blog","url":"https://myblog.com"},"policies":{}}"#,
        );
        assert!(result.success, "{:?}", result.errors);
        let doc = result.document.unwrap();
        assert_eq!(doc.spec_version, "1.0");
        assert_eq!(doc.policies.training, PolicyValue::Deny);
        assert!(doc.agents.contains_key("*"));
    }

    #[test]
    fn test_syntax_error_is_single_error() {
        let result = parse_json(r#"{"site": {"name": "A",}"#);
        assert!(!result.success);
        assert!(result.document.is_none());
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].message.starts_with("Invalid JSON"));
    }

    #[test]
    fn test_agent_keys_normalized_last_wins() {
        let result = parse_json(
            r#"{
                "site": {"name": "A", "url": "https://a.example"},
                "policies": {"training": "allow"},
                "agents": {
                    "ClaudeBot": {"training": "deny"},
                    "CLAUDEBOT": {"training": "conditional"}
                }
            }"#,
        );
        assert!(result.success, "{:?}", result.errors);
        let doc = result.document.unwrap();
        assert_eq!(doc.agents.len(), 2);
        assert_eq!(doc.agents["claudebot"].training, Some(PolicyValue::Conditional));
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_schema_violation_fails() {
        let result = parse_json(
            r#"{"site":{"name":"A","url":"https://a.example"},"policies":{"caching":"never"}}"#,
        );
        assert!(!result.success);
        assert_eq!(result.errors[0].path.as_deref(), Some("policies.caching"));
    }

    #[test]
    fn test_size_ceiling() {
        let input = format!("\"{}\"", "a".repeat(1_100_000));
        let result = parse_json(&input);
        assert!(!result.success);
        assert!(result.errors[0].message.contains("exceeds"));
    }
}

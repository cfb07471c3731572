//! Integration tests for the aitxt parsers using the shared fixtures.

use aitxt::{
    parse_json, parse_text, PolicyValue, RateWindow, RequirementLevel, WILDCARD_AGENT,
};

/// Get the absolute path to a fixture file
fn fixture(name: &str) -> String {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap();
    let workspace_root = std::path::Path::new(&manifest_dir).parent().unwrap().parent().unwrap();
    let path = workspace_root.join("testing/fixtures/policies").join(name);
    std::fs::read_to_string(path).unwrap()
}

// =============================================================================
// Fixture Documents
// =============================================================================

#[test]
fn test_full_text_fixture() {
    let result = parse_text(&fixture("full.ai.txt"));
    assert!(result.success, "{:?}", result.errors);
    assert!(result.warnings.is_empty(), "{:?}", result.warnings);

    let doc = result.document.unwrap();
    assert_eq!(doc.generated_at.as_deref(), Some("2025-03-01T12:00:00Z"));
    assert_eq!(doc.site.contact.as_deref(), Some("ai-policy@news.example.com"));
    assert_eq!(doc.policies.training, PolicyValue::Conditional);
    assert_eq!(doc.policies.caching, PolicyValue::Deny);

    let paths = doc.training_paths.as_ref().unwrap();
    assert_eq!(paths.allow, vec!["/blog/**", "/press/*"]);
    assert_eq!(paths.deny, vec!["/blog/premium/**", "/**/drafts/**"]);

    assert_eq!(doc.agents.len(), 3);
    let claude = &doc.agents["claudebot"];
    assert_eq!(claude.training, Some(PolicyValue::Allow));
    assert_eq!(claude.rate_limit.unwrap().requests, 30);
    assert_eq!(doc.agents[WILDCARD_AGENT].rate_limit.unwrap().window, RateWindow::Minute);

    let content = doc.content.as_ref().unwrap();
    assert_eq!(content.attribution, Some(RequirementLevel::Required));
    assert_eq!(content.ai_disclosure, Some(RequirementLevel::Recommended));
    assert_eq!(doc.compliance.as_ref().unwrap().audit_format.as_deref(), Some("json"));
    assert_eq!(doc.metadata.len(), 2);
}

#[test]
fn test_text_and_json_fixtures_agree() {
    let text = parse_text(&fixture("full.ai.txt"));
    let json = parse_json(&fixture("full.ai.json"));
    assert!(json.success, "{:?}", json.errors);
    assert_eq!(text.document, json.document);
}

// =============================================================================
// Case Handling
// =============================================================================

#[test]
fn test_key_case_insensitivity() {
    let mixed = "\
Spec-Version: 1.0
Site-Name: A
Site-URL: https://a.example
Training: conditional
Training-Allow: /docs/**
Agent: ClaudeBot
  Training: allow
  Rate-Limit: 5/second
Attribution: required
AI-JSON: https://a.example/ai.json
";
    let upper = "\
SPEC-VERSION: 1.0
SITE-NAME: A
SITE-URL: https://a.example
TRAINING: CONDITIONAL
TRAINING-ALLOW: /docs/**
AGENT: ClaudeBot
  TRAINING: ALLOW
  RATE-LIMIT: 5/SECOND
ATTRIBUTION: REQUIRED
AI-JSON: https://a.example/ai.json
";
    let lower = "\
spec-version: 1.0
site-name: A
site-url: https://a.example
training: conditional
training-allow: /docs/**
agent: ClaudeBot
  training: allow
  rate-limit: 5/second
attribution: required
ai-json: https://a.example/ai.json
";

    let docs: Vec<_> = [mixed, upper, lower]
        .iter()
        .map(|input| parse_text(input).document.unwrap())
        .collect();

    assert_eq!(docs[0], docs[1]);
    assert_eq!(docs[0], docs[2]);
}

#[test]
fn test_agent_normalization() {
    let input = "\
Site-Name: A
Site-URL: https://a.example
Agent: ClaudeBot
  Training: deny
Agent: CLAUDEBOT
  Training: allow
";
    let result = parse_text(input);
    let doc = result.document.unwrap();
    assert!(doc.agents.get("ClaudeBot").is_none());
    assert!(doc.agents.get("CLAUDEBOT").is_none());
    assert_eq!(doc.agents["claudebot"].training, Some(PolicyValue::Allow));
    assert_eq!(doc.agent("ClaudeBot").unwrap().training, Some(PolicyValue::Allow));
    assert_eq!(result.warnings.len(), 1);
}

// =============================================================================
// Failure Modes
// =============================================================================

#[test]
fn test_required_fields_named_in_errors() {
    let result = parse_text("Site-Name: A\nTraining: allow\n");
    assert!(!result.success);
    assert!(result.document.is_none());
    assert!(result.errors.iter().any(|e| e.message.contains("Site-URL")));

    let result = parse_text("Site-URL: https://a.example\n");
    assert!(result.errors.iter().any(|e| e.message.contains("Site-Name")));
}

#[test]
fn test_both_parsers_enforce_size_ceiling() {
    let big = "x".repeat(1_100_000);
    for result in [parse_text(&big), parse_json(&big)] {
        assert!(!result.success);
        assert_eq!(result.errors.len(), 1);
        assert!(result.warnings.is_empty());
    }
}

#[test]
fn test_warnings_never_abort() {
    let input = "\
  orphan: line
Site-Name: A
nonsense
Site-URL: https://a.example
Indexing: sometimes
Agent:
  Training: allow
";
    let result = parse_text(input);
    assert!(result.success);
    assert_eq!(result.warnings.len(), 5);
    let doc = result.document.unwrap();
    assert_eq!(doc.policies.indexing, PolicyValue::Allow);
    assert_eq!(doc.agents.len(), 1);
}

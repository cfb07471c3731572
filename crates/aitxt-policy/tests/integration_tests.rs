//! Integration tests for resolution, access checks and validation.

use aitxt::{parse_json, parse_text, Document, PolicyField, PolicyValue, RateWindow};
use aitxt_policy::{can_access, resolve_policy, validate};

/// Get the absolute path to a fixture file
fn fixture(name: &str) -> String {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap();
    let workspace_root = std::path::Path::new(&manifest_dir).parent().unwrap().parent().unwrap();
    let path = workspace_root.join("testing/fixtures/policies").join(name);
    std::fs::read_to_string(path).unwrap()
}

fn parse(input: &str) -> Document {
    let result = parse_text(input);
    assert!(result.success, "{:?}", result.errors);
    result.document.unwrap()
}

// =============================================================================
// Resolution
// =============================================================================

#[test]
fn test_wildcard_beats_site_wide() {
    let doc = parse(
        "Site-Name: A\n\
         Site-URL: https://a.example\n\
         Training: deny\n\
         \n\
         Agent: *\n\
         \x20 Training: allow\n\
         \n\
         Agent: ClaudeBot\n\
         \x20 Scraping: deny\n",
    );

    let policy = resolve_policy(&doc, "ClaudeBot");
    assert_eq!(policy.training, PolicyValue::Allow);
    assert_eq!(policy.scraping, PolicyValue::Deny);
    assert_eq!(policy.indexing, PolicyValue::Allow);
}

#[test]
fn test_agent_lookup_ignores_case() {
    let doc = parse(
        "Site-Name: A\n\
         Site-URL: https://a.example\n\
         Agent: GPTBot\n\
         \x20 Indexing: deny\n",
    );

    for name in ["gptbot", "GPTBOT", "GptBot", " GPTBot "] {
        assert_eq!(resolve_policy(&doc, name).indexing, PolicyValue::Deny, "{}", name);
    }
    assert_eq!(resolve_policy(&doc, "otherbot").indexing, PolicyValue::Allow);
}

// =============================================================================
// Access Checks
// =============================================================================

#[test]
fn test_deny_precedence() {
    let doc = parse_json(
        r#"{
            "site": {"name": "A", "url": "https://a.example"},
            "policies": {"training": "conditional"},
            "trainingPaths": {"allow": ["/a/**"], "deny": ["/a/b/**"]}
        }"#,
    )
    .document
    .unwrap();

    assert!(!can_access(&doc, "bot", PolicyField::Training, Some("/a/b/x")).allowed);
    assert!(can_access(&doc, "bot", PolicyField::Training, Some("/a/c")).allowed);
}

#[test]
fn test_conditional_scenario() {
    let doc = parse(
        "Site-Name: Blog\n\
         Site-URL: https://blog.example\n\
         Training: conditional\n\
         Training-Allow: /blog/*\n\
         Training-Deny: /blog/premium/*\n",
    );

    let check = |path| can_access(&doc, "anybot", PolicyField::Training, Some(path));
    assert!(check("/blog/post-1").allowed);

    let premium = check("/blog/premium/x");
    assert!(!premium.allowed);
    assert!(premium.reason.contains("/blog/premium/*"));

    let other = check("/other");
    assert!(!other.allowed);
    assert!(other.reason.contains("no training path rule"));
}

#[test]
fn test_minimal_document_defaults() {
    let doc = parse("Site-Name: My Blog\nSite-URL: https://myblog.com\n");

    assert!(!can_access(&doc, "AnyBot", PolicyField::Training, None).allowed);
    assert!(can_access(&doc, "AnyBot", PolicyField::Scraping, None).allowed);
    assert!(can_access(&doc, "AnyBot", PolicyField::Indexing, None).allowed);
    assert!(can_access(&doc, "AnyBot", PolicyField::Caching, None).allowed);
}

#[test]
fn test_conditional_scraping_from_text_fails_closed() {
    let result = parse_text(
        "Site-Name: A\n\
         Site-URL: https://a.example\n\
         Scraping: conditional\n",
    );
    assert!(result.success);
    assert_eq!(result.warnings.len(), 1);

    let doc = result.document.unwrap();
    assert!(!can_access(&doc, "bot", PolicyField::Scraping, Some("/")).allowed);

    let report = validate(&doc);
    assert!(!report.valid);
    assert_eq!(report.errors[0].path, "policies.scraping");
}

// =============================================================================
// Fixture Documents
// =============================================================================

#[test]
fn test_full_fixture_access() {
    let doc = parse(&fixture("full.ai.txt"));

    // Named agent override
    assert!(can_access(&doc, "ClaudeBot", PolicyField::Training, None).allowed);
    assert!(!can_access(&doc, "GPTBot", PolicyField::Training, Some("/blog/a")).allowed);
    assert!(!can_access(&doc, "GPTBot", PolicyField::Scraping, None).allowed);

    // Unnamed agents fall through to conditional training
    let check = |path| can_access(&doc, "somebot", PolicyField::Training, Some(path));
    assert!(check("/blog/2025/launch").allowed);
    assert!(check("/press/release").allowed);
    assert!(!check("/press/2025/release").allowed);
    assert!(!check("/blog/premium/report").allowed);
    assert!(!check("/blog/2025/drafts/next").allowed);
    assert!(!check("/about").allowed);

    assert!(!can_access(&doc, "somebot", PolicyField::Caching, None).allowed);

    let policy = resolve_policy(&doc, "somebot");
    assert_eq!(policy.rate_limit.unwrap().requests, 120);
    assert_eq!(policy.rate_limit.unwrap().window, RateWindow::Minute);
    assert!(policy.content.is_some());
}

#[test]
fn test_fixtures_agree() {
    let text = parse(&fixture("full.ai.txt"));
    let json = parse_json(&fixture("full.ai.json")).document.unwrap();

    for agent in ["ClaudeBot", "GPTBot", "somebot", "*"] {
        assert_eq!(resolve_policy(&text, agent), resolve_policy(&json, agent), "{}", agent);
    }
}

#[test]
fn test_full_fixture_is_clean() {
    let report = validate(&parse(&fixture("full.ai.txt")));
    assert!(report.valid, "{:?}", report.errors);
    assert!(report.is_clean(), "{:?}", report.warnings);
}

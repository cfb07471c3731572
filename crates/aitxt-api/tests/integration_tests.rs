//! Integration tests for the ai.txt server, driven through the router.

use aitxt::{parse_json, parse_text};
use aitxt_api::{create_app, AppState, ServerError};
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use std::io::Write;
use std::path::PathBuf;
use tower::ServiceExt;

/// Get the absolute path to a fixture file
fn fixture_path(name: &str) -> PathBuf {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap();
    let workspace_root = std::path::Path::new(&manifest_dir).parent().unwrap().parent().unwrap();
    workspace_root.join("testing/fixtures/policies").join(name)
}

fn fixture_app() -> Router {
    create_app(AppState::load(&fixture_path("full.ai.txt"), 3600).unwrap())
}

async fn get(app: Router, uri: &str, if_none_match: Option<&str>) -> axum::response::Response {
    let mut request = Request::get(uri).header(header::ORIGIN, "https://crawler.example");
    if let Some(etag) = if_none_match {
        request = request.header(header::IF_NONE_MATCH, etag);
    }
    app.oneshot(request.body(Body::empty()).unwrap()).await.unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// =============================================================================
// Published Bodies
// =============================================================================

#[tokio::test]
async fn test_text_body_round_trips() {
    let response = get(fixture_app(), "/ai.txt", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let served = parse_text(&body_string(response).await).document.unwrap();
    let original = parse_text(&std::fs::read_to_string(fixture_path("full.ai.txt")).unwrap())
        .document
        .unwrap();
    assert_eq!(served, original);
}

#[tokio::test]
async fn test_json_body_matches_json_fixture() {
    let response = get(fixture_app(), "/.well-known/ai.json", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let served = parse_json(&body_string(response).await).document.unwrap();
    let fixture = parse_json(&std::fs::read_to_string(fixture_path("full.ai.json")).unwrap())
        .document
        .unwrap();
    assert_eq!(served, fixture);
}

#[tokio::test]
async fn test_json_policy_file() {
    let state = AppState::load(&fixture_path("full.ai.json"), 60).unwrap();
    assert_eq!(state.site_name, "Example News");
    assert!(state.text.body.contains("Training-Deny: /blog/premium/**\n"));
}

// =============================================================================
// Headers & Revalidation
// =============================================================================

#[tokio::test]
async fn test_policy_headers() {
    let response = get(fixture_app(), "/ai.txt", None).await;
    let headers = response.headers();

    assert_eq!(headers[header::CACHE_CONTROL], "public, max-age=3600");
    assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");

    let etag = headers[header::ETAG].to_str().unwrap();
    assert!(etag.starts_with('"') && etag.ends_with('"'));
    assert_eq!(etag.len(), 18);
}

#[tokio::test]
async fn test_if_none_match_returns_304() {
    let first = get(fixture_app(), "/ai.json", None).await;
    let etag = first.headers()[header::ETAG].to_str().unwrap().to_string();

    let second = get(fixture_app(), "/ai.json", Some(&etag)).await;
    assert_eq!(second.status(), StatusCode::NOT_MODIFIED);
    assert_eq!(second.headers()[header::ETAG].to_str().unwrap(), etag);
    assert!(body_string(second).await.is_empty());

    let stale = get(fixture_app(), "/ai.json", Some("\"0000000000000000\"")).await;
    assert_eq!(stale.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_text_and_json_etags_differ() {
    let text = get(fixture_app(), "/ai.txt", None).await;
    let json = get(fixture_app(), "/ai.json", None).await;
    assert_ne!(text.headers()[header::ETAG], json.headers()[header::ETAG]);
}

#[tokio::test]
async fn test_health() {
    let response = get(fixture_app(), "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["site"], "Example News");
}

// =============================================================================
// Loading Failures
// =============================================================================

#[test]
fn test_missing_policy_file() {
    let err = AppState::load(&fixture_path("does-not-exist.txt"), 60).unwrap_err();
    assert!(matches!(err, ServerError::Read { .. }));
}

#[test]
fn test_unparseable_policy_file() {
    let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
    writeln!(file, "Site-Name: Only A Name").unwrap();

    let err = AppState::load(file.path(), 60).unwrap_err();
    match err {
        ServerError::Policy { errors, .. } => {
            assert!(errors.iter().any(|e| e.contains("Site-URL")));
        }
        other => panic!("unexpected error: {}", other),
    }
}

//! ai.txt publishing server
//!
//! Serves one policy document in both formats, at the site root and under
//! `/.well-known/`. Bodies are rendered once at startup; responses carry
//! cache headers and a content hash ETag so crawlers can revalidate cheaply.
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod state;

pub use config::ServerConfig;
pub use error::ServerError;
pub use state::AppState;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/ai.txt", get(handlers::ai_txt))
        .route("/ai.json", get(handlers::ai_json))
        .route("/.well-known/ai.txt", get(handlers::ai_txt))
        .route("/.well-known/ai.json", get(handlers::ai_json))
        .route("/health", get(handlers::health))
        .layer(axum::middleware::from_fn(middleware::security_headers))
        .layer(middleware::cors())
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Load the configured policy and serve it until the process stops
pub async fn run(config: ServerConfig) -> Result<(), ServerError> {
    let state = AppState::load(&config.policy_path, config.max_age)?;
    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(config.addr).await?;

    tracing::info!(
        addr = %config.addr,
        policy = %config.policy_path.display(),
        "ai.txt server listening"
    );
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aitxt::Document;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use tower::ServiceExt;

    fn app() -> Router {
        let doc = Document::new("Test Site", "https://test.example");
        create_app(AppState::from_document(&doc, 300).unwrap())
    }

    #[tokio::test]
    async fn test_serves_text() {
        let response = app()
            .oneshot(Request::get("/ai.txt").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        assert_eq!(response.headers()[header::CACHE_CONTROL], "public, max-age=300");
        assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&body).contains("Site-Name: Test Site"));
    }

    #[tokio::test]
    async fn test_well_known_alias() {
        let root = app()
            .oneshot(Request::get("/ai.json").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let alias = app()
            .oneshot(Request::get("/.well-known/ai.json").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(alias.status(), StatusCode::OK);
        assert_eq!(root.headers()[header::ETAG], alias.headers()[header::ETAG]);
        assert_eq!(alias.headers()[header::CONTENT_TYPE], "application/json");
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let response = app()
            .oneshot(Request::get("/robots.txt").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

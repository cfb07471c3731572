//! API Handlers
use crate::state::{AppState, Rendered};
use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";
const JSON_CONTENT_TYPE: &str = "application/json";

pub async fn ai_txt(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    serve(&state.text, TEXT_CONTENT_TYPE, state.max_age, &headers)
}

pub async fn ai_json(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    serve(&state.json, JSON_CONTENT_TYPE, state.max_age, &headers)
}

pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
            "site": state.site_name,
        })),
    )
}

fn serve(rendered: &Rendered, content_type: &'static str, max_age: u64, request: &HeaderMap) -> Response {
    let cache_control = format!("public, max-age={}", max_age);

    let mut response = if etag_matches(request, &rendered.etag) {
        StatusCode::NOT_MODIFIED.into_response()
    } else {
        (
            [(header::CONTENT_TYPE, HeaderValue::from_static(content_type))],
            rendered.body.clone(),
        )
            .into_response()
    };

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&cache_control) {
        headers.insert(header::CACHE_CONTROL, value);
    }
    if let Ok(value) = HeaderValue::from_str(&rendered.etag) {
        headers.insert(header::ETAG, value);
    }
    response
}

/// `If-None-Match` check using weak comparison
fn etag_matches(request: &HeaderMap, etag: &str) -> bool {
    request
        .get_all(header::IF_NONE_MATCH)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .any(|candidate| candidate == "*" || candidate.trim_start_matches("W/") == etag)
}

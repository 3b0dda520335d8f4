// Helpers for route tests: in-memory state and throwaway upstream servers

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use interview_common::config::Config;
use interview_common::context::{ContextStore, MemoryContextStore};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceExt;

use crate::{routes, AppState};

pub fn config(overrides: &[(&str, &str)]) -> Config {
    let vars: HashMap<String, String> = overrides
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_lookup(|name| vars.get(name).cloned()).unwrap()
}

pub fn state(overrides: &[(&str, &str)]) -> Arc<AppState> {
    let config = config(overrides);
    let contexts = ContextStore::Memory(MemoryContextStore::new(
        config.context.capacity,
        config.context.ttl_secs,
    ));
    Arc::new(AppState::new(config, contexts).unwrap())
}

pub fn app(overrides: &[(&str, &str)]) -> Router {
    app_with_state(state(overrides))
}

pub fn app_with_state(state: Arc<AppState>) -> Router {
    routes::routes().with_state(state)
}

/// Serve a router on an ephemeral local port, returning its base URL
pub async fn spawn(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn send_raw(app: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8_lossy(&bytes).into_owned())
}

pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, text) = send_raw(app, request).await;
    let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
    (status, body)
}

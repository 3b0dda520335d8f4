// HTTP route handlers for code runs, submissions and service endpoints

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use interview_common::languages::DEFAULT_LANGUAGE;
use interview_grader::{GradingError, GradingRequest, TestSource};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::{metrics, speech, AppState};

/// `{"error": message}` with the given status
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

#[derive(Debug, Deserialize)]
pub struct RunCodeRequest {
    #[serde(default)]
    pub code: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub function: Option<String>,
    /// Inline test cases
    #[serde(default)]
    pub tests: Option<Value>,
    /// URL of a test-case list, preferred over `tests`
    #[serde(default)]
    pub test_cases: Option<String>,
    #[serde(default = "default_checker")]
    pub checker: String,
    #[serde(default)]
    pub stop_on_fail: bool,
    /// Milliseconds
    #[serde(default)]
    pub timeout: Option<u64>,
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn default_checker() -> String {
    "deep_equal".to_string()
}

impl RunCodeRequest {
    fn into_grading(self, default_timeout_ms: u64) -> GradingRequest {
        let tests = match self.test_cases {
            Some(url) if !url.trim().is_empty() => TestSource::Remote(url),
            _ => TestSource::Inline(self.tests.unwrap_or_else(|| Value::Array(Vec::new()))),
        };
        GradingRequest {
            code: self.code,
            language: self.language,
            function_name: self.function,
            tests,
            default_checker: self.checker,
            stop_on_fail: self.stop_on_fail,
            timeout_ms: self.timeout.unwrap_or(default_timeout_ms),
        }
    }
}

/// POST /api/code/run - Grade a submission against its test cases
pub async fn run_code(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RunCodeRequest>,
) -> Response {
    let request = payload.into_grading(state.config.sandbox.default_run_timeout_ms);
    let start = Instant::now();

    match state.grader.run_grading(request).await {
        Ok(report) => {
            metrics::record_report(&report, start.elapsed().as_secs_f64());
            (StatusCode::OK, Json(report)).into_response()
        }
        Err(e @ GradingError::Validation(_)) => {
            metrics::record_rejected();
            info!(error = %e, "Rejected grading request");
            error_response(StatusCode::BAD_REQUEST, e.to_string())
        }
        Err(e) => {
            metrics::record_failed();
            error!(error = %e, "Grading run failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SubmitCodeRequest {
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmitCodeResponse {
    pub received: bool,
    pub lines: usize,
    pub chars: usize,
    pub message: String,
}

/// POST /api/submit_code - Acknowledge a final submission
pub async fn submit_code(Json(payload): Json<SubmitCodeRequest>) -> impl IntoResponse {
    let code = payload.code.unwrap_or_default();
    let lines = code.lines().count();
    let chars = code.chars().count();
    info!(lines, chars, "Code submitted");

    (
        StatusCode::OK,
        Json(SubmitCodeResponse {
            received: true,
            lines,
            chars,
            message: format!("Code received: {} line(s), {} character(s).", lines, chars),
        }),
    )
}

/// GET /api/azure_token - Short-lived speech token for the browser
pub async fn azure_token(State(state): State<Arc<AppState>>) -> Response {
    let azure = &state.config.azure;
    if !azure.is_configured() {
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Missing Azure config. Set AZURE_SPEECH_KEY and AZURE_SPEECH_REGION or AZURE_SPEECH_ENDPOINT.",
        );
    }

    match speech::issue_token(&state.http, azure).await {
        Ok(token) => (
            StatusCode::OK,
            Json(json!({
                "token": token,
                "region": azure.region.as_deref().unwrap_or(speech::FALLBACK_REGION),
                "endpoint": azure.endpoint,
            })),
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to issue speech token");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to issue token: {:#}", e),
            )
        }
    }
}

/// GET /status - Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /metrics - Prometheus text exposition
pub async fn metrics() -> Response {
    match metrics::render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

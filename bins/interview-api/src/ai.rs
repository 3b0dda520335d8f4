/// AI Interviewer Routes
///
/// **Flow:**
/// 1. The editor pushes its code and the current question to
///    `/api/ai/update_context`, keyed by the `X-Client-Id` header
/// 2. `/api/ai/analyze` relays the chat to Gemini, primed with that context
/// 3. `/api/ai/analyze_context` asks for feedback on the stored code alone
///
/// The context cache is advisory: a failing or empty cache never blocks a
/// chat turn.
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use interview_common::context::{ClientContext, ContextUpdate, UpdateOutcome};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::gemini::ChatMessage;
use crate::handlers::error_response;
use crate::{prompts, AppState};

pub const CLIENT_ID_HEADER: &str = "X-Client-Id";

const MISSING_KEY: &str = "Missing GEMINI_API_KEY on server";

fn client_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CLIENT_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// Conversation sent to the model: the cached code first, then the chat
fn conversation(context: Option<&ClientContext>, messages: Vec<ChatMessage>) -> Vec<ChatMessage> {
    let code = context.map(|ctx| ctx.code.trim()).unwrap_or("");
    if code.is_empty() {
        return messages;
    }
    let mut turns = Vec::with_capacity(messages.len() + 1);
    turns.push(ChatMessage::user(code));
    turns.extend(messages);
    turns
}

async fn reply(state: &AppState, context: Option<&ClientContext>, messages: &[ChatMessage]) -> Response {
    let question = context.and_then(|ctx| ctx.question.as_ref());
    let system_prompt = prompts::system_prompt(state.gemini.base_system_prompt(), question);

    match state.gemini.generate(&system_prompt, messages).await {
        Ok(text) => (StatusCode::OK, Json(json!({ "text": text }))).into_response(),
        Err(e) => {
            error!(error = %e, "Gemini call failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Gemini analyze failed: {:#}", e),
            )
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

/// POST /api/ai/analyze - Next interviewer turn
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<AnalyzeRequest>,
) -> Response {
    if !state.gemini.is_configured() {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, MISSING_KEY);
    }

    let context = match client_id(&headers) {
        Some(id) => match state.contexts.get(&id).await {
            Ok(context) => context,
            Err(e) => {
                warn!(client_id = %id, error = %e, "Context lookup failed; continuing without it");
                None
            }
        },
        None => None,
    };

    debug!(
        turns = payload.messages.len(),
        has_context = context.is_some(),
        "Analyze request"
    );
    let messages = conversation(context.as_ref(), payload.messages);
    reply(&state, context.as_ref(), &messages).await
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateContextRequest {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub question: Option<Value>,
}

/// POST /api/ai/update_context - Remember the client's editor state
pub async fn update_context(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<UpdateContextRequest>,
) -> Response {
    let Some(id) = client_id(&headers) else {
        return error_response(StatusCode::BAD_REQUEST, "Missing X-Client-Id header");
    };

    let code = payload.code.unwrap_or_default();
    let language = payload
        .language
        .filter(|language| !language.is_empty())
        .unwrap_or_else(|| "unknown".to_string());
    let has_question = payload.question.is_some();
    let bytes = code.chars().count();

    let update = ContextUpdate {
        code,
        language,
        question: payload.question,
    };

    match state.contexts.update(&id, update).await {
        Ok(UpdateOutcome::Skipped) => (
            StatusCode::OK,
            Json(json!({
                "ok": true,
                "skipped": true,
                "reason": "dedupe_1s",
                "bytes": bytes,
                "has_question": has_question,
            })),
        )
            .into_response(),
        Ok(UpdateOutcome::Stored { hash }) => {
            debug!(client_id = %id, bytes, has_question, hash = %hash, "Context stored");
            (
                StatusCode::OK,
                Json(json!({
                    "ok": true,
                    "bytes": bytes,
                    "has_question": has_question,
                    "debug_hash": hash,
                })),
            )
                .into_response()
        }
        Err(e) => {
            error!(client_id = %id, error = %e, "Failed to store context");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to store context: {}", e),
            )
        }
    }
}

/// POST /api/ai/analyze_context - Feedback on the stored code only
pub async fn analyze_context(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let Some(id) = client_id(&headers) else {
        return error_response(StatusCode::BAD_REQUEST, "Missing X-Client-Id header");
    };

    let context = match state.contexts.get(&id).await {
        Ok(Some(context)) => context,
        Ok(None) => return error_response(StatusCode::BAD_REQUEST, "No context for client"),
        Err(e) => {
            error!(client_id = %id, error = %e, "Context lookup failed");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to load context: {}", e),
            );
        }
    };

    if !state.gemini.is_configured() {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, MISSING_KEY);
    }

    info!(client_id = %id, language = %context.language, "Analyzing stored context");
    let messages = conversation(Some(&context), Vec::new());
    reply(&state, Some(&context), &messages).await
}

/// Gemini Client - Interviewer Model Calls
///
/// Talks to the `generateContent` REST endpoint. Chat turns use the
/// frontend's roles (`user` / `ai`); anything that is not `user` is sent as
/// the `model` role. The system prompt travels as a leading user turn.
use anyhow::{bail, Context, Result};
use interview_common::config::GeminiConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// One chat turn as sent by the frontend
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: Some(content.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "GenerationConfig::is_empty")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

impl GenerationConfig {
    fn is_empty(&self) -> bool {
        self.temperature.is_none()
            && self.top_p.is_none()
            && self.top_k.is_none()
            && self.max_output_tokens.is_none()
    }
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

/// Convert chat turns to Gemini contents, dropping empty ones
pub fn to_contents(system_prompt: &str, messages: &[ChatMessage]) -> Vec<Content> {
    let mut contents = Vec::with_capacity(messages.len() + 1);
    if !system_prompt.is_empty() {
        contents.push(Content {
            role: "user".to_string(),
            parts: vec![Part {
                text: system_prompt.to_string(),
            }],
        });
    }

    for message in messages {
        let text = message.content.as_deref().unwrap_or("").trim();
        if text.is_empty() {
            continue;
        }
        let role = if message.role == "user" { "user" } else { "model" };
        contents.push(Content {
            role: role.to_string(),
            parts: vec![Part {
                text: text.to_string(),
            }],
        });
    }
    contents
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// Prompt configured for the server, before any question is appended
    pub fn base_system_prompt(&self) -> &str {
        &self.config.system_prompt
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.api_base.trim_end_matches('/'),
            self.config.model
        )
    }

    /// Ask the model for the next interviewer reply
    pub async fn generate(&self, system_prompt: &str, messages: &[ChatMessage]) -> Result<String> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            bail!("Missing GEMINI_API_KEY");
        };

        let request = GenerateRequest {
            contents: to_contents(system_prompt, messages),
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                top_p: self.config.top_p,
                top_k: self.config.top_k,
                max_output_tokens: self.config.max_tokens,
            },
        };
        debug!(
            model = %self.config.model,
            turns = request.contents.len(),
            "Calling Gemini"
        );

        let response = self
            .http
            .post(self.endpoint())
            .query(&[("key", api_key)])
            .timeout(REQUEST_TIMEOUT)
            .json(&request)
            .send()
            .await
            .context("request to Gemini failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Gemini returned HTTP {}: {}", status.as_u16(), body);
        }

        let body: GenerateResponse = response
            .json()
            .await
            .context("invalid Gemini response")?;
        Ok(reply_text(&body))
    }
}

/// Text parts of the first candidate, joined and trimmed
fn reply_text(response: &GenerateResponse) -> String {
    response
        .candidates
        .first()
        .and_then(|candidate| candidate.content.as_ref())
        .map(|content| {
            content
                .parts
                .iter()
                .map(|part| part.text.as_str())
                .collect::<String>()
        })
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Execution Engine - Abstraction Over the Remote Sandbox
///
/// **Core Responsibility:**
/// Send one program plus its stdin to the sandbox and hand back the raw
/// process output.
///
/// **Critical Architectural Boundary:**
/// - Engine knows HOW to reach the sandbox (HTTP, timeouts)
/// - Engine does NOT interpret stdout
/// - Engine does NOT know about test cases or checkers
///
/// Production uses [`PistonEngine`]; tests substitute an in-process fake.
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Margin added on top of the run timeout, the sandbox also compiles
const READ_TIMEOUT_MARGIN_MS: u64 = 5_000;

/// Request body of the sandbox execute API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteRequest {
    pub language: String,
    pub version: String,
    pub files: Vec<SandboxFile>,
    pub stdin: String,
    /// Milliseconds
    pub run_timeout: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SandboxFile {
    pub name: String,
    pub content: String,
}

/// Response body of the sandbox execute API; only the run stage is consumed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecuteResponse {
    #[serde(default)]
    pub run: Option<RunStage>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStage {
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
    #[serde(default)]
    pub signal: Option<String>,
    #[serde(default)]
    pub code: Option<i64>,
}

impl ExecuteResponse {
    /// Run stage, empty when the sandbox sent none
    pub fn run_stage(&self) -> RunStage {
        self.run.clone().unwrap_or_default()
    }
}

/// Transport-level failures talking to the sandbox
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("sandbox returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid sandbox response: {0}")]
    Decode(String),
    #[error("{0}")]
    Request(String),
}

impl EngineError {
    /// True when the transport gave up waiting
    pub fn is_timeout(&self) -> bool {
        match self {
            EngineError::Timeout(_) => true,
            other => {
                let text = other.to_string().to_lowercase();
                text.contains("timeout") || text.contains("timed out")
            }
        }
    }
}

impl From<reqwest::Error> for EngineError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            EngineError::Timeout(err.to_string())
        } else if err.is_connect() {
            EngineError::Connect(err.to_string())
        } else if err.is_decode() {
            EngineError::Decode(err.to_string())
        } else {
            EngineError::Request(err.to_string())
        }
    }
}

/// A backend able to execute one program
pub trait SandboxEngine: Send + Sync {
    fn execute(
        &self,
        request: &ExecuteRequest,
    ) -> impl Future<Output = Result<ExecuteResponse, EngineError>> + Send;
}

/// Client for a Piston-compatible `/execute` endpoint
#[derive(Debug, Clone)]
pub struct PistonEngine {
    client: reqwest::Client,
    url: String,
    read_timeout: Duration,
}

impl PistonEngine {
    pub fn new(
        url: impl Into<String>,
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
            read_timeout,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whole-request timeout: never shorter than the run timeout plus margin
    pub fn request_timeout(&self, run_timeout_ms: u64) -> Duration {
        let floor = Duration::from_millis(run_timeout_ms.saturating_add(READ_TIMEOUT_MARGIN_MS));
        self.read_timeout.max(floor)
    }
}

impl SandboxEngine for PistonEngine {
    async fn execute(&self, request: &ExecuteRequest) -> Result<ExecuteResponse, EngineError> {
        let timeout = self.request_timeout(request.run_timeout);
        debug!(
            url = %self.url,
            language = %request.language,
            version = %request.version,
            timeout_ms = timeout.as_millis() as u64,
            "Sending program to sandbox"
        );

        let response = self
            .client
            .post(&self.url)
            .timeout(timeout)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<ExecuteResponse>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_shape() {
        let request = ExecuteRequest {
            language: "python".to_string(),
            version: "3.10.0".to_string(),
            files: vec![SandboxFile {
                name: "main.py".to_string(),
                content: "print(1)".to_string(),
            }],
            stdin: "{}".to_string(),
            run_timeout: 3000,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "language": "python",
                "version": "3.10.0",
                "files": [{"name": "main.py", "content": "print(1)"}],
                "stdin": "{}",
                "run_timeout": 3000
            })
        );
    }

    #[test]
    fn test_response_tolerates_missing_fields() {
        let response: ExecuteResponse = serde_json::from_value(json!({
            "language": "python",
            "compile": {"stdout": "", "stderr": ""},
            "run": {"stdout": "ok\n", "signal": "SIGKILL", "code": null}
        }))
        .unwrap();
        let run = response.run_stage();
        assert_eq!(run.stdout, "ok\n");
        assert_eq!(run.stderr, "");
        assert_eq!(run.signal.as_deref(), Some("SIGKILL"));
        assert_eq!(run.code, None);

        let empty: ExecuteResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty.run_stage(), RunStage::default());
    }

    #[test]
    fn test_timeout_classification() {
        assert!(EngineError::Timeout("x".to_string()).is_timeout());
        assert!(EngineError::Request("operation timed out".to_string()).is_timeout());
        assert!(EngineError::Status { status: 504, body: "Gateway Timeout".to_string() }.is_timeout());
        assert!(!EngineError::Connect("refused".to_string()).is_timeout());
        assert!(!EngineError::Status { status: 500, body: String::new() }.is_timeout());
    }

    #[test]
    fn test_request_timeout_exceeds_run_timeout() {
        let engine = PistonEngine::new(
            "http://127.0.0.1:1/execute",
            Duration::from_secs(10),
            Duration::from_secs(60),
        )
        .unwrap();
        assert_eq!(engine.request_timeout(10_000), Duration::from_secs(60));
        assert_eq!(engine.request_timeout(120_000), Duration::from_millis(125_000));
    }

    #[tokio::test]
    async fn test_unreachable_sandbox_is_a_transport_error() {
        let engine = PistonEngine::new(
            "http://127.0.0.1:9/execute",
            Duration::from_millis(500),
            Duration::from_secs(2),
        )
        .unwrap();
        let request = ExecuteRequest {
            language: "python".to_string(),
            version: String::new(),
            files: vec![],
            stdin: String::new(),
            run_timeout: 100,
        };
        assert!(engine.execute(&request).await.is_err());
    }
}

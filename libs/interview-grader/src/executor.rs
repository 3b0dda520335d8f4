/// Grading Executor - High-Level Orchestration
///
/// **Responsibility:**
/// Validate a grading request, prepare the program once, dispatch every test
/// case and aggregate the results.
///
/// **Architecture:**
/// 1. Validation and preparation errors abort the run (`GradingError`)
/// 2. `Dispatcher` runs each case against the sandbox (dispatcher.rs)
/// 3. `ReportBuilder` folds results and decides when to stop (evaluator.rs)
///
/// This module is the glue layer - it knows nothing about:
/// - How the sandbox is reached (engine's job)
/// - How stdout is classified (dispatcher's job)
use crate::dispatcher::Dispatcher;
use crate::engine::SandboxEngine;
use crate::error::GradingError;
use crate::evaluator::{Flow, ReportBuilder};
use crate::{harness, preparer};
use futures_util::stream::{self, StreamExt};
use interview_common::languages;
use interview_common::types::{Checker, RunReport, TestCase};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Where the test cases of a run come from
#[derive(Debug, Clone, PartialEq)]
pub enum TestSource {
    /// Caller-supplied JSON, expected to be a list of test cases
    Inline(Value),
    /// URL answering with a JSON list of test cases
    Remote(String),
}

/// One grading request as received from the route layer
#[derive(Debug, Clone, PartialEq)]
pub struct GradingRequest {
    pub code: String,
    pub language: String,
    pub function_name: Option<String>,
    pub tests: TestSource,
    pub default_checker: String,
    pub stop_on_fail: bool,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone)]
pub struct GraderOptions {
    /// Test cases in flight at once; 1 keeps dispatch strictly sequential
    pub max_parallel: usize,
    pub fetch_timeout: Duration,
}

impl Default for GraderOptions {
    fn default() -> Self {
        Self {
            max_parallel: 1,
            fetch_timeout: Duration::from_secs(10),
        }
    }
}

/// Decode a caller-supplied test-case list
pub fn parse_test_cases(value: Value) -> Result<Vec<TestCase>, GradingError> {
    let Value::Array(items) = value else {
        return Err(GradingError::validation("tests must be a list"));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value::<TestCase>(item).map_err(|e| {
                GradingError::Validation(format!("test case {} is invalid: {}", index, e))
            })
        })
        .collect()
}

pub struct Grader<E> {
    engine: E,
    http: reqwest::Client,
    options: GraderOptions,
}

impl<E: SandboxEngine> Grader<E> {
    pub fn new(engine: E, options: GraderOptions) -> Self {
        Self {
            engine,
            http: reqwest::Client::new(),
            options,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn options(&self) -> &GraderOptions {
        &self.options
    }

    /// Test-case JSON for a run
    ///
    /// A remote source that cannot be fetched yields an empty list.
    pub async fn resolve_tests(&self, source: &TestSource) -> Value {
        match source {
            TestSource::Inline(value) => value.clone(),
            TestSource::Remote(url) => match self.fetch_tests(url).await {
                Ok(value) => value,
                Err(e) => {
                    warn!(url = %url, error = %e, "Failed to fetch test cases; running none");
                    Value::Array(Vec::new())
                }
            },
        }
    }

    async fn fetch_tests(&self, url: &str) -> Result<Value, reqwest::Error> {
        let response = self
            .http
            .get(url)
            .timeout(self.options.fetch_timeout)
            .send()
            .await?
            .error_for_status()?;
        response.json::<Value>().await
    }

    /// Grade one submission
    ///
    /// Returns a report for every run that passes validation and preparation,
    /// however many of its test cases fail.
    #[instrument(
        skip_all,
        fields(run_id = %Uuid::new_v4(), language = %request.language)
    )]
    pub async fn run_grading(&self, request: GradingRequest) -> Result<RunReport, GradingError> {
        let function_name = match request.function_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => return Err(GradingError::validation("code and function are required")),
        };
        if request.code.trim().is_empty() {
            return Err(GradingError::validation("code and function are required"));
        }
        if request.timeout_ms == 0 {
            return Err(GradingError::validation("timeout must be a positive number of milliseconds"));
        }
        let default_checker: Checker = request
            .default_checker
            .parse::<Checker>()
            .map_err(|e| GradingError::Validation(e.to_string()))?;

        let test_cases = parse_test_cases(self.resolve_tests(&request.tests).await)?;
        let prepared = preparer::prepare(&request.code)?;
        let version = languages::resolve_version(&request.language);
        if !languages::is_known(&request.language) {
            warn!(
                language = %request.language,
                supported = ?languages::supported_languages(),
                "Unknown language; sending without a version"
            );
        }

        let parallel = self.options.max_parallel.max(1);
        info!(
            function = %function_name,
            test_cases = test_cases.len(),
            default_checker = %default_checker,
            stop_on_fail = request.stop_on_fail,
            timeout_ms = request.timeout_ms,
            parallel,
            typing_imports = ?prepared.typing_names(),
            harness_version = harness::HARNESS_VERSION,
            "Starting grading run"
        );

        let start = Instant::now();
        let dispatcher = Dispatcher::new(
            &self.engine,
            &request.language,
            version,
            prepared.text(),
            &function_name,
            default_checker,
            request.timeout_ms,
        );

        let mut builder = ReportBuilder::new(request.stop_on_fail);
        let mut batches = stream::iter(0..test_cases.len())
            .map(|i| dispatcher.dispatch(&test_cases[i]))
            .buffered(parallel);

        while let Some(batch) = batches.next().await {
            for result in &batch {
                debug!(
                    test_id = %result.id,
                    ok = result.ok,
                    timed_out = result.timed_out,
                    time_ms = ?result.time_ms,
                    checker = %result.checker,
                    "Test result"
                );
            }
            if builder.record(batch) == Flow::Halt {
                info!(
                    completed = builder.summary().total,
                    requested = test_cases.len(),
                    "Stopping at first failure"
                );
                break;
            }
        }
        drop(batches);

        let report = builder.finish();
        info!(
            passed = report.summary.passed,
            total = report.summary.total,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Grading run completed"
        );
        Ok(report)
    }
}

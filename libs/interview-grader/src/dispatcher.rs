/// Execution Dispatcher - One Sandbox Call Per Test Case
///
/// **Core Responsibility:**
/// Build the sandbox request for a single test case and turn whatever comes
/// back into test results.
///
/// **Classification (first match wins):**
/// 1. Transport failure → one failing result, `timed_out` if the transport timed out
/// 2. Empty stdout → one failing result carrying stderr or exit details
/// 3. Unparseable stdout → one failing result carrying the parse error
/// 4. Harness JSON → its `results`, verbatim
///
/// A dispatch never returns an error: every failure is isolated to the case
/// that caused it.
use crate::engine::{ExecuteRequest, RunStage, SandboxEngine, SandboxFile};
use crate::harness::{self, HarnessConfig};
use interview_common::types::{Checker, TestCase, TestResult};
use tracing::{debug, warn};

/// Name of the program file inside the sandbox
pub const ENTRY_FILE: &str = "main.py";

/// Signals that mean the sandbox killed the process for running too long
const TIMEOUT_SIGNALS: &[&str] = &["SIGKILL", "SIGXCPU"];

/// Phrases sandboxes use when reporting a time limit
const TIMEOUT_PHRASES: &[&str] = &["time limit", "timed out", "timeout", "exceeded time"];

/// Best-effort guess whether a failed run hit a time limit
pub fn looks_like_timeout(signal: Option<&str>, stderr: &str, stdout: &str) -> bool {
    let signal = signal.unwrap_or("");
    let text = format!("{} {} {}", signal, stderr, stdout).to_lowercase();
    if TIMEOUT_PHRASES.iter().any(|phrase| text.contains(phrase)) {
        return true;
    }
    let signal = signal.trim().to_uppercase();
    TIMEOUT_SIGNALS.contains(&signal.as_str())
}

/// Everything a dispatch needs besides the test case itself
pub struct Dispatcher<'a, E> {
    engine: &'a E,
    language: &'a str,
    version: &'a str,
    source: &'a str,
    function_name: &'a str,
    default_checker: Checker,
    timeout_ms: u64,
}

impl<'a, E: SandboxEngine> Dispatcher<'a, E> {
    pub fn new(
        engine: &'a E,
        language: &'a str,
        version: &'a str,
        source: &'a str,
        function_name: &'a str,
        default_checker: Checker,
        timeout_ms: u64,
    ) -> Self {
        Self {
            engine,
            language,
            version,
            source,
            function_name,
            default_checker,
            timeout_ms,
        }
    }

    /// Sandbox request for one test case
    pub fn build_request(&self, test_case: &TestCase) -> Result<ExecuteRequest, serde_json::Error> {
        let config = HarnessConfig {
            function_name: self.function_name.to_string(),
            test_cases: vec![test_case.clone()],
            default_checker: self.default_checker,
        };

        Ok(ExecuteRequest {
            language: self.language.to_string(),
            version: self.version.to_string(),
            files: vec![SandboxFile {
                name: ENTRY_FILE.to_string(),
                content: self.source.to_string(),
            }],
            stdin: config.to_stdin()?,
            run_timeout: self.timeout_ms,
        })
    }

    /// Run one test case, normally yielding exactly one result
    pub async fn dispatch(&self, test_case: &TestCase) -> Vec<TestResult> {
        let request = match self.build_request(test_case) {
            Ok(request) => request,
            Err(e) => {
                return vec![self.failure(test_case, format!("Failed to encode harness input: {}", e), false)];
            }
        };

        match self.engine.execute(&request).await {
            Ok(response) => self.interpret(test_case, response.run_stage()),
            Err(e) => {
                let timed_out = e.is_timeout();
                warn!(
                    test_id = %test_case.id,
                    timed_out,
                    error = %e,
                    "Sandbox request failed"
                );
                vec![self.failure(test_case, format!("Sandbox request failed: {}", e), timed_out)]
            }
        }
    }

    /// Classify the sandbox's process output
    pub fn interpret(&self, test_case: &TestCase, run: RunStage) -> Vec<TestResult> {
        let stdout = run.stdout.trim();

        if stdout.is_empty() {
            let timed_out = looks_like_timeout(run.signal.as_deref(), &run.stderr, stdout);
            let error = if run.stderr.trim().is_empty() {
                format!(
                    "Empty stdout (signal={}, exit={})",
                    run.signal.as_deref().unwrap_or("None"),
                    run.code.map(|c| c.to_string()).unwrap_or_else(|| "None".to_string())
                )
            } else {
                run.stderr.clone()
            };
            debug!(test_id = %test_case.id, timed_out, "Sandbox produced no output");
            return vec![self.failure(test_case, error, timed_out)];
        }

        match harness::parse_output(stdout) {
            Ok(output) => output.results,
            Err(e) => {
                let timed_out = looks_like_timeout(run.signal.as_deref(), &run.stderr, stdout);
                debug!(
                    test_id = %test_case.id,
                    timed_out,
                    stdout_preview = stdout.lines().next().unwrap_or(""),
                    "Sandbox output is not harness JSON"
                );
                vec![self.failure(test_case, format!("Failed to parse runner output: {}", e), timed_out)]
            }
        }
    }

    fn failure(&self, test_case: &TestCase, error: String, timed_out: bool) -> TestResult {
        TestResult::failure(test_case, self.default_checker, error, timed_out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineError, ExecuteResponse};
    use serde_json::{json, Value};

    struct NoEngine;

    impl SandboxEngine for NoEngine {
        async fn execute(&self, _request: &ExecuteRequest) -> Result<ExecuteResponse, EngineError> {
            Err(EngineError::Connect("unused".to_string()))
        }
    }

    fn case() -> TestCase {
        TestCase {
            id: json!(1),
            input: vec![json!([2, 7, 11, 15]), json!(9)],
            output: json!([0, 1]),
            checker: None,
        }
    }

    fn run(stdout: &str, stderr: &str, signal: Option<&str>, code: Option<i64>) -> RunStage {
        RunStage {
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            signal: signal.map(str::to_string),
            code,
        }
    }

    fn dispatcher(engine: &NoEngine) -> Dispatcher<'_, NoEngine> {
        Dispatcher::new(engine, "python", "3.10.0", "print(1)", "twoSum", Checker::DeepEqual, 3000)
    }

    #[test]
    fn test_timeout_heuristic() {
        assert!(looks_like_timeout(Some("SIGKILL"), "", ""));
        assert!(looks_like_timeout(Some("sigxcpu"), "", ""));
        assert!(looks_like_timeout(None, "Time limit exceeded", ""));
        assert!(looks_like_timeout(None, "", "process timed out"));
        assert!(looks_like_timeout(None, "TIMEOUT", ""));
        assert!(!looks_like_timeout(Some("SIGSEGV"), "Segmentation fault", ""));
        assert!(!looks_like_timeout(None, "", ""));
    }

    #[test]
    fn test_request_carries_single_case_and_limits() {
        let engine = NoEngine;
        let request = dispatcher(&engine).build_request(&case()).unwrap();
        assert_eq!(request.language, "python");
        assert_eq!(request.version, "3.10.0");
        assert_eq!(request.run_timeout, 3000);
        assert_eq!(request.files.len(), 1);
        assert_eq!(request.files[0].name, ENTRY_FILE);
        assert_eq!(request.files[0].content, "print(1)");

        let stdin: Value = serde_json::from_str(&request.stdin).unwrap();
        assert_eq!(stdin["function_name"], "twoSum");
        assert_eq!(stdin["default_checker"], "deep_equal");
        assert_eq!(stdin["test_cases"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_empty_stdout_with_kill_signal_is_timeout() {
        let engine = NoEngine;
        let results = dispatcher(&engine).interpret(&case(), run("", "", Some("SIGKILL"), None));
        assert_eq!(results.len(), 1);
        let result = &results[0];
        assert!(!result.ok);
        assert!(result.timed_out);
        assert_eq!(result.got, Value::Null);
        assert_eq!(result.time_ms, None);
        assert_eq!(result.error, "Empty stdout (signal=SIGKILL, exit=None)");
        assert_eq!(result.expected, json!([0, 1]));
    }

    #[test]
    fn test_empty_stdout_prefers_stderr() {
        let engine = NoEngine;
        let results = dispatcher(&engine).interpret(
            &case(),
            run("  \n", "SyntaxError: invalid syntax", None, Some(1)),
        );
        assert_eq!(results[0].error, "SyntaxError: invalid syntax");
        assert!(!results[0].timed_out);
    }

    #[test]
    fn test_runner_diagnostic_is_parse_failure() {
        let engine = NoEngine;
        let results = dispatcher(&engine).interpret(
            &case(),
            run("Runner error: Expecting value", "", None, Some(0)),
        );
        assert_eq!(results.len(), 1);
        assert!(!results[0].ok);
        assert!(results[0].error.starts_with("Failed to parse runner output"));
        assert!(!results[0].timed_out);
    }

    #[test]
    fn test_harness_results_are_returned_verbatim() {
        let engine = NoEngine;
        let stdout = json!({
            "summary": {"passed": 1, "total": 1},
            "results": [{
                "id": 1, "ok": true, "expected": [[0, 1], [1, 0]], "got": [1, 0],
                "time_ms": 2, "error": "", "checker": "one_of_deep_equal"
            }]
        })
        .to_string();
        let results = dispatcher(&engine).interpret(&case(), run(&stdout, "", None, Some(0)));
        assert_eq!(results.len(), 1);
        assert!(results[0].ok);
        assert_eq!(results[0].checker, Checker::OneOfDeepEqual);
        assert_eq!(results[0].time_ms, Some(2));
    }

    #[tokio::test]
    async fn test_transport_failure_becomes_result() {
        let engine = NoEngine;
        let results = dispatcher(&engine).dispatch(&case()).await;
        assert_eq!(results.len(), 1);
        assert!(!results[0].ok);
        assert!(!results[0].timed_out);
        assert!(results[0].error.starts_with("Sandbox request failed"));
    }
}

/// Test Runner Harness - In-Sandbox Program Template
///
/// The harness is a fixed Python program appended to every prepared
/// submission. Its only interface is the JSON contract below:
///
/// - stdin: [`HarnessConfig`]
/// - stdout: exactly one line holding a [`HarnessOutput`], or a single
///   `Runner error: ...` diagnostic line when the harness itself fails
///
/// Inside the sandbox it calls the candidate's function once per test case,
/// checks each return value with the named checker and never lets one
/// failing case abort the others.
use interview_common::types::{Checker, RunSummary, TestCase, TestResult};
use serde::{Deserialize, Serialize};

/// Bumped whenever the template or its JSON contract changes
pub const HARNESS_VERSION: u32 = 1;

/// Python checker table, keyed by [`Checker::name`]
pub const CHECKERS_SOURCE: &str = include_str!("../assets/checkers.py");

/// Python test runner reading [`HarnessConfig`] from stdin
pub const RUNNER_SOURCE: &str = include_str!("../assets/runner.py");

/// Standard input handed to the harness
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarnessConfig {
    pub function_name: String,
    pub test_cases: Vec<TestCase>,
    pub default_checker: Checker,
}

impl HarnessConfig {
    pub fn to_stdin(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Standard output printed by the harness
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HarnessOutput {
    #[serde(default)]
    pub summary: Option<RunSummary>,
    #[serde(default)]
    pub results: Vec<TestResult>,
}

/// Parse the harness summary out of the sandbox's stdout
///
/// The summary is printed last, so anything the candidate printed before it
/// is skipped by falling back to the last non-empty line.
pub fn parse_output(stdout: &str) -> Result<HarnessOutput, serde_json::Error> {
    let trimmed = stdout.trim();
    match serde_json::from_str(trimmed) {
        Ok(output) => Ok(output),
        Err(full_err) => match trimmed.lines().rev().find(|line| !line.trim().is_empty()) {
            Some(last) if last.len() != trimmed.len() => {
                serde_json::from_str(last.trim()).map_err(|_| full_err)
            }
            _ => Err(full_err),
        },
    }
}

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Named equality predicate used to compare a candidate's return value
/// against the expected output of a test case.
///
/// The set is closed: names are resolved when a run is set up, so an unknown
/// name is rejected before anything is sent to the sandbox.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Checker {
    #[default]
    DeepEqual,
    SequenceEqual,
    MultisetEqual,
    FloatClose,
    TextExact,
    TextNormalized,
    OneOfDeepEqual,
    OneOfMultisetEqual,
}

impl Checker {
    pub const ALL: [Checker; 8] = [
        Checker::DeepEqual,
        Checker::SequenceEqual,
        Checker::MultisetEqual,
        Checker::FloatClose,
        Checker::TextExact,
        Checker::TextNormalized,
        Checker::OneOfDeepEqual,
        Checker::OneOfMultisetEqual,
    ];

    /// Wire name, identical to the key in the harness checker table
    pub fn name(&self) -> &'static str {
        match self {
            Checker::DeepEqual => "deep_equal",
            Checker::SequenceEqual => "sequence_equal",
            Checker::MultisetEqual => "multiset_equal",
            Checker::FloatClose => "float_close",
            Checker::TextExact => "text_exact",
            Checker::TextNormalized => "text_normalized",
            Checker::OneOfDeepEqual => "one_of_deep_equal",
            Checker::OneOfMultisetEqual => "one_of_multiset_equal",
        }
    }

    /// True for checkers whose expected output is a list of alternatives
    pub fn is_one_of(&self) -> bool {
        matches!(self, Checker::OneOfDeepEqual | Checker::OneOfMultisetEqual)
    }
}

impl fmt::Display for Checker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownChecker(pub String);

impl fmt::Display for UnknownChecker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let known: Vec<&str> = Checker::ALL.iter().map(Checker::name).collect();
        write!(
            f,
            "unknown checker '{}' (expected one of: {})",
            self.0,
            known.join(", ")
        )
    }
}

impl std::error::Error for UnknownChecker {}

impl FromStr for Checker {
    type Err = UnknownChecker;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Checker::ALL
            .iter()
            .copied()
            .find(|checker| checker.name() == s)
            .ok_or_else(|| UnknownChecker(s.to_string()))
    }
}

/// One input/expected-output pair a submission is validated against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    /// Opaque, echoed back in the result
    #[serde(default)]
    pub id: Value,
    /// Positional arguments for the candidate's function
    pub input: Vec<Value>,
    /// A single expected value, or the list of alternatives for one-of checkers
    #[serde(default)]
    pub output: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checker: Option<Checker>,
}

impl TestCase {
    /// Checker actually used for this case
    pub fn resolve_checker(&self, default_checker: Checker) -> Checker {
        self.checker.unwrap_or(default_checker)
    }
}

/// Outcome of one test case against one submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    #[serde(default)]
    pub id: Value,
    pub ok: bool,
    #[serde(default)]
    pub expected: Value,
    /// Candidate's return value, `null` when it never produced one
    #[serde(default)]
    pub got: Value,
    #[serde(default)]
    pub time_ms: Option<u64>,
    #[serde(default)]
    pub error: String,
    pub checker: Checker,
    /// Set when the failure looks like an infrastructure timeout rather than a wrong answer
    #[serde(default, alias = "tle")]
    pub timed_out: bool,
}

impl TestResult {
    /// Failing result for a case whose execution never produced a value
    pub fn failure(
        test_case: &TestCase,
        default_checker: Checker,
        error: impl Into<String>,
        timed_out: bool,
    ) -> Self {
        Self {
            id: test_case.id.clone(),
            ok: false,
            expected: test_case.output.clone(),
            got: Value::Null,
            time_ms: None,
            error: error.into(),
            checker: test_case.resolve_checker(default_checker),
            timed_out,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub passed: usize,
    pub total: usize,
}

/// Aggregate of the results actually produced for a grading run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub summary: RunSummary,
    pub results: Vec<TestResult>,
}

impl RunReport {
    pub fn passed_count(&self) -> usize {
        self.summary.passed
    }

    pub fn total_count(&self) -> usize {
        self.summary.total
    }

    pub fn all_passed(&self) -> bool {
        self.summary.passed == self.summary.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_checker_names_round_trip_through_from_str() {
        for checker in Checker::ALL {
            assert_eq!(checker.name().parse::<Checker>(), Ok(checker));
            assert_eq!(checker.to_string(), checker.name());
        }
    }

    #[test]
    fn test_unknown_checker_lists_known_names() {
        let err = "fuzzy_equal".parse::<Checker>().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("fuzzy_equal"));
        assert!(message.contains("one_of_multiset_equal"));
    }

    #[test]
    fn test_checker_serde_uses_wire_names() {
        let checker: Checker = serde_json::from_value(json!("one_of_deep_equal")).unwrap();
        assert_eq!(checker, Checker::OneOfDeepEqual);
        assert_eq!(serde_json::to_value(Checker::FloatClose).unwrap(), json!("float_close"));
        assert!(serde_json::from_value::<Checker>(json!("nope")).is_err());
    }

    #[test]
    fn test_case_defaults() {
        let case: TestCase = serde_json::from_value(json!({"input": [1, 2]})).unwrap();
        assert_eq!(case.id, Value::Null);
        assert_eq!(case.output, Value::Null);
        assert_eq!(case.checker, None);
        assert_eq!(case.resolve_checker(Checker::TextExact), Checker::TextExact);
    }

    #[test]
    fn test_case_override_wins() {
        let case: TestCase = serde_json::from_value(json!({
            "id": "a",
            "input": [],
            "output": [[0, 1], [1, 0]],
            "checker": "one_of_deep_equal"
        }))
        .unwrap();
        assert_eq!(case.resolve_checker(Checker::DeepEqual), Checker::OneOfDeepEqual);
    }

    #[test]
    fn test_result_accepts_tle_alias_and_defaults() {
        let result: TestResult = serde_json::from_value(json!({
            "id": 3,
            "ok": false,
            "checker": "deep_equal",
            "tle": true
        }))
        .unwrap();
        assert!(result.timed_out);
        assert_eq!(result.got, Value::Null);
        assert_eq!(result.time_ms, None);
        assert!(result.error.is_empty());

        let harness_shaped: TestResult = serde_json::from_value(json!({
            "id": 1, "ok": true, "expected": 2, "got": 2,
            "time_ms": 0, "error": "", "checker": "deep_equal"
        }))
        .unwrap();
        assert!(!harness_shaped.timed_out);
    }

    #[test]
    fn test_failure_result_invariants() {
        let case = TestCase {
            id: json!(7),
            input: vec![json!(1)],
            output: json!(2),
            checker: None,
        };
        let result = TestResult::failure(&case, Checker::FloatClose, "boom", false);
        assert!(!result.ok);
        assert_eq!(result.got, Value::Null);
        assert_eq!(result.expected, json!(2));
        assert_eq!(result.checker, Checker::FloatClose);
        assert_eq!(result.id, json!(7));
    }

    #[test]
    fn test_report_serializes_summary_and_results() {
        let report = RunReport {
            summary: RunSummary { passed: 0, total: 0 },
            results: vec![],
        };
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({"summary": {"passed": 0, "total": 0}, "results": []})
        );
        assert!(report.all_passed());
    }
}

/// Result Aggregator - Running Pass/Fail Summary
///
/// **Core Responsibility:**
/// Fold per-test-case result batches into a [`RunReport`].
///
/// **Rules:**
/// - Results keep the order in which batches are recorded
/// - `passed` counts `ok` results, `total` counts results actually produced
/// - With `stop_on_fail`, recording stops at the first failing result; the
///   report then covers only the cases that ran
///
/// Knows nothing about the sandbox or about checkers.
use interview_common::types::{RunReport, RunSummary, TestResult};

/// Whether the caller should keep dispatching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Halt,
}

#[derive(Debug, Default)]
pub struct ReportBuilder {
    stop_on_fail: bool,
    passed: usize,
    results: Vec<TestResult>,
    halted: bool,
}

impl ReportBuilder {
    pub fn new(stop_on_fail: bool) -> Self {
        Self {
            stop_on_fail,
            ..Default::default()
        }
    }

    /// Record the results produced by one test case
    pub fn record(&mut self, batch: Vec<TestResult>) -> Flow {
        if self.halted {
            return Flow::Halt;
        }

        for result in batch {
            let ok = result.ok;
            if ok {
                self.passed += 1;
            }
            self.results.push(result);

            if self.stop_on_fail && !ok {
                self.halted = true;
                return Flow::Halt;
            }
        }
        Flow::Continue
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            passed: self.passed,
            total: self.results.len(),
        }
    }

    pub fn finish(self) -> RunReport {
        RunReport {
            summary: RunSummary {
                passed: self.passed,
                total: self.results.len(),
            },
            results: self.results,
        }
    }
}

/// Aggregate already-collected batches in one go
pub fn aggregate_results(batches: Vec<Vec<TestResult>>, stop_on_fail: bool) -> RunReport {
    let mut builder = ReportBuilder::new(stop_on_fail);
    for batch in batches {
        if builder.record(batch) == Flow::Halt {
            break;
        }
    }
    builder.finish()
}

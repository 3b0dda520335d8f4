// Prometheus metrics for the grading routes

use interview_common::types::RunReport;
use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter_vec, Encoder, Histogram, IntCounterVec, TextEncoder,
};

lazy_static! {
    /// Grading runs by outcome: completed, rejected (validation), failed (preparation)
    pub static ref GRADING_RUNS: IntCounterVec = register_int_counter_vec!(
        "interview_grading_runs_total",
        "Grading runs by outcome",
        &["outcome"]
    )
    .expect("grading run counter can be registered");

    /// Test results by status: passed, failed, timed_out
    pub static ref TEST_RESULTS: IntCounterVec = register_int_counter_vec!(
        "interview_test_results_total",
        "Test case results by status",
        &["status"]
    )
    .expect("test result counter can be registered");

    pub static ref GRADING_DURATION: Histogram = register_histogram!(
        "interview_grading_duration_seconds",
        "Wall time of a grading run",
        vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]
    )
    .expect("grading duration histogram can be registered");
}

pub fn record_rejected() {
    GRADING_RUNS.with_label_values(&["rejected"]).inc();
}

pub fn record_failed() {
    GRADING_RUNS.with_label_values(&["failed"]).inc();
}

pub fn record_report(report: &RunReport, elapsed_secs: f64) {
    GRADING_RUNS.with_label_values(&["completed"]).inc();
    GRADING_DURATION.observe(elapsed_secs);

    for result in &report.results {
        let status = if result.ok {
            "passed"
        } else if result.timed_out {
            "timed_out"
        } else {
            "failed"
        };
        TEST_RESULTS.with_label_values(&[status]).inc();
    }
}

/// Text exposition of every registered metric
pub fn render() -> Result<String, prometheus::Error> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&prometheus::gather(), &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

// CLI commands for grading and test authoring
use anyhow::{bail, Context, Result};
use interview_common::config::Config;
use interview_common::languages;
use interview_common::types::{Checker, RunReport, TestResult};
use interview_grader::{checker, preparer, Grader, GraderOptions, GradingRequest, PistonEngine, TestSource};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub struct RunArgs {
    pub source: PathBuf,
    pub tests: String,
    pub function: String,
    pub language: String,
    pub checker: String,
    pub stop_on_fail: bool,
    pub timeout: Option<u64>,
    pub parallel: Option<usize>,
    pub piston_url: Option<String>,
    pub json: bool,
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Test cases from a URL or a local JSON file
fn load_tests(tests: &str) -> Result<TestSource> {
    if tests.starts_with("http://") || tests.starts_with("https://") {
        return Ok(TestSource::Remote(tests.to_string()));
    }
    let content =
        fs::read_to_string(tests).with_context(|| format!("Failed to read test file {}", tests))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse test file {}", tests))?;
    Ok(TestSource::Inline(value))
}

/// A command-line value as JSON, or as a plain string when it is not JSON
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn result_line(result: &TestResult) -> String {
    let mark = if result.ok {
        "✅"
    } else if result.timed_out {
        "⏱️"
    } else {
        "❌"
    };
    let time = result
        .time_ms
        .map(|ms| format!("{}ms", ms))
        .unwrap_or_else(|| "-".to_string());

    let mut line = format!("{} [{}] {} ({}, {})", mark, result.id, result.checker, time, if result.ok { "ok" } else { "fail" });
    if !result.ok {
        line.push_str(&format!("\n     expected: {}\n     got:      {}", result.expected, result.got));
        if !result.error.is_empty() {
            line.push_str(&format!("\n     error:    {}", result.error));
        }
    }
    line
}

fn print_report(report: &RunReport) {
    for result in &report.results {
        println!("{}", result_line(result));
    }
    println!();
    println!("📊 Passed {}/{}", report.summary.passed, report.summary.total);
}

/// Grade a local solution through the sandbox
pub async fn run_tests(args: RunArgs) -> Result<()> {
    let config = Config::from_env().context("Invalid configuration")?;
    let sandbox = &config.sandbox;
    let url = args.piston_url.unwrap_or_else(|| sandbox.url.clone());

    let engine = PistonEngine::new(
        url.clone(),
        Duration::from_millis(sandbox.connect_timeout_ms),
        Duration::from_millis(sandbox.read_timeout_ms),
    )
    .context("Failed to build sandbox client")?;
    let grader = Grader::new(
        engine,
        GraderOptions {
            max_parallel: args.parallel.unwrap_or(sandbox.max_parallel_tests).max(1),
            fetch_timeout: Duration::from_millis(sandbox.test_fetch_timeout_ms),
        },
    );

    let request = GradingRequest {
        code: read_source(&args.source)?,
        language: args.language,
        function_name: Some(args.function),
        tests: load_tests(&args.tests)?,
        default_checker: args.checker,
        stop_on_fail: args.stop_on_fail,
        timeout_ms: args.timeout.unwrap_or(sandbox.default_run_timeout_ms),
    };

    if !args.json {
        println!("🚀 Grading {} against {} via {}", args.source.display(), args.tests, url);
    }
    let report = grader.run_grading(request).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if !report.all_passed() {
        bail!(
            "{} of {} test case(s) failed",
            report.total_count() - report.passed_count(),
            report.total_count()
        );
    }
    Ok(())
}

/// Print or save the prepared program
pub fn prepare_source(source: &Path, output: Option<&Path>) -> Result<()> {
    let prepared = preparer::prepare(&read_source(source)?)?;

    match output {
        Some(path) => {
            fs::write(path, prepared.text())
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("✅ Prepared program written to {}", path.display());
            if !prepared.typing_names().is_empty() {
                println!("   typing imports: {}", prepared.typing_names().join(", "));
            }
        }
        None => print!("{}", prepared.text()),
    }
    Ok(())
}

/// Run one checker locally
pub fn check_values(checker_name: &str, expected: &str, actual: &str) -> Result<()> {
    let selected: Checker = checker_name.parse()?;
    let (expected, actual) = (parse_value(expected), parse_value(actual));

    if checker::check(selected, &expected, &actual) {
        println!("✅ {}: {} matches {}", selected, actual, expected);
        Ok(())
    } else {
        bail!("{}: {} does not match {}", selected, actual, expected)
    }
}

pub fn list_languages() {
    println!("📦 Sandbox languages:");
    for (language, version) in languages::LANGUAGE_VERSIONS {
        let marker = if *language == languages::DEFAULT_LANGUAGE { " (default)" } else { "" };
        println!("   {:<12} {}{}", language, version, marker);
    }
}

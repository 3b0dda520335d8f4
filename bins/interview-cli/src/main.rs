mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "interview-cli")]
#[command(about = "Interview CLI - Grade solutions and author test cases", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grade a solution file against a test-case file through the sandbox
    Run {
        /// Candidate source file
        #[arg(short, long)]
        source: PathBuf,

        /// JSON list of test cases (local path or http(s) URL)
        #[arg(short, long)]
        tests: String,

        /// Function (or Solution method) to call
        #[arg(short, long)]
        function: String,

        /// Sandbox language
        #[arg(short, long, default_value = "python")]
        language: String,

        /// Checker for cases that do not name one
        #[arg(short, long, default_value = "deep_equal")]
        checker: String,

        /// Stop at the first failing case
        #[arg(long, default_value = "false")]
        stop_on_fail: bool,

        /// Per-case run timeout in milliseconds (defaults to DEFAULT_RUN_TIMEOUT_MS)
        #[arg(long)]
        timeout: Option<u64>,

        /// Cases in flight at once (defaults to MAX_PARALLEL_TESTS)
        #[arg(long)]
        parallel: Option<usize>,

        /// Sandbox execute URL (defaults to PISTON_URL)
        #[arg(long)]
        piston_url: Option<String>,

        /// Print the raw JSON report
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Print the program that would be sent to the sandbox
    Prepare {
        /// Candidate source file
        #[arg(short, long)]
        source: PathBuf,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Evaluate one checker on two JSON values
    Check {
        /// Checker name
        #[arg(short, long)]
        checker: String,

        /// Expected value (JSON; anything else is taken as a string)
        #[arg(short, long)]
        expected: String,

        /// Actual value (JSON; anything else is taken as a string)
        #[arg(short, long)]
        actual: String,
    },

    /// List sandbox languages and pinned versions
    Languages,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            source,
            tests,
            function,
            language,
            checker,
            stop_on_fail,
            timeout,
            parallel,
            piston_url,
            json,
        } => {
            commands::run_tests(commands::RunArgs {
                source,
                tests,
                function,
                language,
                checker,
                stop_on_fail,
                timeout,
                parallel,
                piston_url,
                json,
            })
            .await?;
        }
        Commands::Prepare { source, output } => {
            commands::prepare_source(&source, output.as_deref())?;
        }
        Commands::Check {
            checker,
            expected,
            actual,
        } => {
            commands::check_values(&checker, &expected, &actual)?;
        }
        Commands::Languages => {
            commands::list_languages();
        }
    }

    Ok(())
}

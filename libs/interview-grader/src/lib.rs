//! Remote code-grading pipeline
//!
//! A candidate's function body is turned into a self-contained program
//! ([`preparer`]), sent once per test case to a sandbox ([`engine`],
//! [`dispatcher`]) and the per-case results are folded into a
//! [`RunReport`](interview_common::types::RunReport) ([`evaluator`]).
//! [`executor::Grader`] ties the steps together.

pub mod checker;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod harness;
pub mod preparer;


pub use engine::{PistonEngine, SandboxEngine};
pub use error::GradingError;
pub use executor::{Grader, GraderOptions, GradingRequest, TestSource};

/// Submission Preparer - Candidate Source to Executable Program
///
/// Produces one self-contained program from a raw function body:
///
/// 1. typing import line, when annotations need one
/// 2. checker library
/// 3. candidate source, trimmed
/// 4. test runner harness
///
/// Nothing here parses the candidate's code. Syntax errors surface later as
/// sandbox-reported failures.
use crate::error::GradingError;
use crate::harness::{CHECKERS_SOURCE, RUNNER_SOURCE};

/// Prepared programs above this size are refused before dispatch
pub const MAX_PROGRAM_BYTES: usize = 1024 * 1024;

/// Literal substrings that imply a `typing` name is needed
const TYPING_MARKERS: &[(&str, &str)] = &[
    ("List[", "List"),
    ("Dict[", "Dict"),
    ("Set[", "Set"),
    ("Tuple[", "Tuple"),
    ("Optional[", "Optional"),
    ("Union[", "Union"),
];

/// An executable program plus the offsets of its sections
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedSource {
    text: String,
    typing_names: Vec<&'static str>,
    checkers_start: usize,
    candidate_start: usize,
    runner_start: usize,
}

impl PreparedSource {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    /// Names brought in by the injected import line, empty when none was added
    pub fn typing_names(&self) -> &[&'static str] {
        &self.typing_names
    }

    pub fn import_section(&self) -> &str {
        &self.text[..self.checkers_start]
    }

    pub fn checkers_section(&self) -> &str {
        &self.text[self.checkers_start..self.candidate_start]
    }

    pub fn candidate_section(&self) -> &str {
        &self.text[self.candidate_start..self.runner_start]
    }

    pub fn runner_section(&self) -> &str {
        &self.text[self.runner_start..]
    }
}

/// `typing` names the source appears to use, in marker order
///
/// Textual scan: false positives are harmless, false negatives show up as a
/// `NameError` in the test results.
pub fn detect_typing_names(code: &str) -> Vec<&'static str> {
    let mut names: Vec<&'static str> = TYPING_MARKERS
        .iter()
        .filter(|(marker, _)| code.contains(marker))
        .map(|(_, name)| *name)
        .collect();

    if code.contains("Any") && !code.contains("Any[") {
        names.push("Any");
    }
    names
}

fn imports_typing(code: &str) -> bool {
    code.contains("from typing import") || code.contains("import typing")
}

/// Assemble the program sent to the sandbox
pub fn prepare(code: &str) -> Result<PreparedSource, GradingError> {
    let detected = detect_typing_names(code);
    let typing_names = if imports_typing(code) { Vec::new() } else { detected };

    let import_line = if typing_names.is_empty() {
        String::new()
    } else {
        format!("from typing import {}\n", typing_names.join(", "))
    };

    let candidate = code.trim();
    let mut text = String::with_capacity(
        import_line.len() + CHECKERS_SOURCE.len() + candidate.len() + RUNNER_SOURCE.len() + 2,
    );

    text.push_str(&import_line);
    let checkers_start = text.len();
    text.push_str(CHECKERS_SOURCE);
    text.push('\n');
    let candidate_start = text.len();
    text.push_str(candidate);
    text.push('\n');
    let runner_start = text.len();
    text.push_str(RUNNER_SOURCE);

    if text.len() > MAX_PROGRAM_BYTES {
        return Err(GradingError::Preparation(format!(
            "prepared program is {} bytes, limit is {} bytes",
            text.len(),
            MAX_PROGRAM_BYTES
        )));
    }

    Ok(PreparedSource {
        text,
        typing_names,
        checkers_start,
        candidate_start,
        runner_start,
    })
}

// System prompt assembly for the interviewer model
//
// The current question is appended to the configured base prompt. Only the
// descriptive fields are included, never a reference solution.

use serde_json::Value;

/// Question details appended to the system prompt
///
/// `None` unless the question is an object with a title or a prompt.
pub fn question_block(question: &Value) -> Option<String> {
    let question = question.as_object()?;
    let text = |key: &str| {
        question
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or("")
            .to_string()
    };
    let list = |key: &str| -> Vec<String> {
        question
            .get(key)
            .and_then(Value::as_array)
            .map(|items| items.iter().map(item_text).collect())
            .unwrap_or_default()
    };

    let title = text("title");
    let prompt = text("prompt");
    if title.is_empty() && prompt.is_empty() {
        return None;
    }

    let mut block = String::from("\n\nCURRENT INTERVIEW QUESTION (for the candidate):\n");
    block.push_str(&format!("Title: {}\n", title));
    block.push_str(&format!("Difficulty: {}\n", text("difficulty")));
    block.push_str(&format!("Topics: {}\n", list("topics").join(", ")));
    block.push_str(&format!("Function: {}({})\n", text("function"), list("args").join(", ")));
    block.push_str(&format!("Prompt: {}\n", prompt));

    let constraints = list("constraints");
    if !constraints.is_empty() {
        block.push_str("Constraints:\n");
        for constraint in constraints {
            block.push_str(&format!("- {}\n", constraint));
        }
    }
    Some(block)
}

/// Base prompt followed by the question block, when there is one
pub fn system_prompt(base: &str, question: Option<&Value>) -> String {
    match question.and_then(question_block) {
        Some(block) => format!("{}{}", base, block),
        None => base.to_string(),
    }
}

fn item_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Checker Library - Equality Predicates Over JSON Values
///
/// **Core Responsibility:**
/// Decide whether a candidate's value matches the expected output.
///
/// The predicates are shipped to the sandbox as Python (`assets/checkers.py`)
/// and run there. This module is the Rust rendition of the same table, used
/// by tooling that needs to evaluate a checker without a sandbox round trip.
///
/// **Rules shared by every predicate:**
/// - Pure and total: malformed input yields `false`, never an error
/// - Integers and floats are different types (`1` does not deep-equal `1.0`)
/// - Non-finite floats travel as the strings `"NaN"`, `"Infinity"`,
///   `"-Infinity"`, so `"NaN"` deep-equals `"NaN"` and `float_close` reads
///   them as floats
use interview_common::types::Checker;
use serde_json::{Number, Value};

pub const DEFAULT_REL_TOL: f64 = 1e-9;
pub const DEFAULT_ABS_TOL: f64 = 0.0;

/// Evaluate `checker` on an expected/actual pair
pub fn check(checker: Checker, expected: &Value, actual: &Value) -> bool {
    match checker {
        Checker::DeepEqual => deep_equal(expected, actual),
        Checker::SequenceEqual => sequence_equal(expected, actual),
        Checker::MultisetEqual => multiset_equal(expected, actual),
        Checker::FloatClose => float_close(expected, actual),
        Checker::TextExact => text_exact(expected, actual),
        Checker::TextNormalized => text_normalized(expected, actual),
        Checker::OneOfDeepEqual => one_of_deep_equal(expected, actual),
        Checker::OneOfMultisetEqual => one_of_multiset_equal(expected, actual),
    }
}

/// Structural equality, order-sensitive for sequences
///
/// A one-element sequence on either side is unwrapped when the other side is
/// not a sequence, so `[5]` matches `5` in both directions.
pub fn deep_equal(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Array(items), other) if items.len() == 1 && !other.is_array() => {
            deep_equal(&items[0], other)
        }
        (other, Value::Array(items)) if items.len() == 1 && !other.is_array() => {
            deep_equal(other, &items[0])
        }
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a.is_f64() == b.is_f64() && numbers_equal(a, b),
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| deep_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, x)| b.get(key).is_some_and(|y| deep_equal(x, y)))
        }
        _ => false,
    }
}

/// Actual must be a sequence equal to expected, no unwrapping
pub fn sequence_equal(expected: &Value, actual: &Value) -> bool {
    actual.is_array() && loose_equal(expected, actual)
}

/// Bag equality: same elements with the same multiplicities, any order
///
/// Sequences are compared element-wise, strings character-wise. Anything else
/// is not enumerable and compares unequal.
pub fn multiset_equal(expected: &Value, actual: &Value) -> bool {
    let (Some(expected), Some(actual)) = (elements(expected), elements(actual)) else {
        return false;
    };
    if expected.len() != actual.len() {
        return false;
    }

    let mut unmatched: Vec<&Value> = actual.iter().collect();
    for item in &expected {
        match unmatched.iter().position(|candidate| loose_equal(item, candidate)) {
            Some(index) => {
                unmatched.swap_remove(index);
            }
            None => return false,
        }
    }
    true
}

/// Float comparison with the default tolerances
pub fn float_close(expected: &Value, actual: &Value) -> bool {
    float_close_with(expected, actual, DEFAULT_REL_TOL, DEFAULT_ABS_TOL)
}

/// Scalars must both be floats; sequences recurse element-wise
pub fn float_close_with(expected: &Value, actual: &Value, rel_tol: f64, abs_tol: f64) -> bool {
    if let (Some(a), Some(b)) = (as_float(expected), as_float(actual)) {
        return is_close(a, b, rel_tol, abs_tol);
    }
    match (expected, actual) {
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len()
                && a.iter()
                    .zip(b)
                    .all(|(x, y)| float_close_with(x, y, rel_tol, abs_tol))
        }
        _ => false,
    }
}

/// `math.isclose` semantics, except that NaN is close to NaN
pub fn is_close(a: f64, b: f64, rel_tol: f64, abs_tol: f64) -> bool {
    if a.is_nan() && b.is_nan() {
        return true;
    }
    if a == b {
        return true;
    }
    if a.is_infinite() || b.is_infinite() {
        return false;
    }
    (a - b).abs() <= (rel_tol * a.abs().max(b.abs())).max(abs_tol)
}

pub fn text_exact(expected: &Value, actual: &Value) -> bool {
    expected == actual
}

/// Equal after trimming and collapsing whitespace runs to one space
pub fn text_normalized(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::String(a), Value::String(b)) => normalize_whitespace(a) == normalize_whitespace(b),
        _ => false,
    }
}

pub fn one_of_deep_equal(alternatives: &Value, actual: &Value) -> bool {
    alternatives
        .as_array()
        .is_some_and(|options| options.iter().any(|option| deep_equal(option, actual)))
}

pub fn one_of_multiset_equal(alternatives: &Value, actual: &Value) -> bool {
    alternatives
        .as_array()
        .is_some_and(|options| options.iter().any(|option| multiset_equal(option, actual)))
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn numbers_equal(a: &Number, b: &Number) -> bool {
    match (a.as_i64(), b.as_i64()) {
        (Some(x), Some(y)) => x == y,
        _ => match (a.as_u64(), b.as_u64()) {
            (Some(x), Some(y)) => x == y,
            _ => a.as_f64() == b.as_f64(),
        },
    }
}

/// Value equality where numbers compare by value regardless of int/float
fn loose_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(p, q)| loose_equal(p, q))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(key, p)| y.get(key).is_some_and(|q| loose_equal(p, q)))
        }
        _ => a == b,
    }
}

fn elements(value: &Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items.clone()),
        Value::String(text) => Some(text.chars().map(|c| Value::String(c.to_string())).collect()),
        _ => None,
    }
}

fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) if n.is_f64() => n.as_f64(),
        Value::String(s) => match s.as_str() {
            "NaN" => Some(f64::NAN),
            "Infinity" => Some(f64::INFINITY),
            "-Infinity" => Some(f64::NEG_INFINITY),
            _ => None,
        },
        _ => None,
    }
}

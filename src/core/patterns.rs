use crate::core::values;
use crate::domain::model::{Pattern, Sensitivity};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[\d\s\-\(\)]+$").expect("phone pattern"));
static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z\s]+$").expect("name pattern"));
static ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9\-_]+$").expect("id pattern"));
static SSN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{3}-\d{2}-\d{4}$").expect("ssn pattern"));

const HIGH_SENSITIVITY_KEYWORDS: &[&str] = &[
    "ssn", "social", "password", "credit", "card", "account", "phone", "email", "address",
];
const MEDIUM_SENSITIVITY_KEYWORDS: &[&str] = &["name", "age", "gender", "income", "salary"];

/// Number of leading values inspected for sensitive content.
const SENSITIVITY_SAMPLE: usize = 100;

pub fn matches(pattern: Pattern, value: &str) -> bool {
    match pattern {
        Pattern::Email => value.contains('@'),
        Pattern::Phone => PHONE_RE.is_match(value),
        Pattern::Name => NAME_RE.is_match(value),
        Pattern::Id => ID_RE.is_match(value),
    }
}

/// Patterns matched by more than half of `values`.
///
/// Only string values can match, but every value counts towards the total.
pub fn detect_patterns(values: &[&Value]) -> Vec<Pattern> {
    const CANDIDATES: [Pattern; 4] = [Pattern::Email, Pattern::Phone, Pattern::Name, Pattern::Id];

    let mut counts = [0usize; 4];
    for value in values {
        if let Value::String(s) = value {
            for (i, pattern) in CANDIDATES.iter().enumerate() {
                if matches(*pattern, s) {
                    counts[i] += 1;
                }
            }
        }
    }

    let threshold = values.len() as f64 * 0.5;
    CANDIDATES
        .iter()
        .zip(counts)
        .filter(|(_, count)| *count as f64 > threshold)
        .map(|(pattern, _)| *pattern)
        .collect()
}

pub fn assess_sensitivity(column_name: &str, values: &[&Value]) -> Sensitivity {
    let name = column_name.to_lowercase();
    if HIGH_SENSITIVITY_KEYWORDS.iter().any(|k| name.contains(k)) {
        return Sensitivity::High;
    }
    if MEDIUM_SENSITIVITY_KEYWORDS.iter().any(|k| name.contains(k)) {
        return Sensitivity::Medium;
    }

    let looks_sensitive = values.iter().take(SENSITIVITY_SAMPLE).any(|v| {
        let text = values::display(v);
        text.contains('@') || SSN_RE.is_match(&text)
    });
    if looks_sensitive {
        Sensitivity::High
    } else {
        Sensitivity::Low
    }
}

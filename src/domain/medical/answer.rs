use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::search::NO_ADDITIONAL_CONTEXT;

const CONFIDENCE_BASE: f64 = 0.5;
const CONFIDENCE_KEYWORD_BONUS: f64 = 0.05;
const CONFIDENCE_CONTEXT_BONUS: f64 = 0.2;
const CONFIDENCE_CAP: f64 = 0.95;

const CONFIDENCE_KEYWORDS: &[&str] = &[
    "symptom",
    "treatment",
    "diagnosis",
    "medication",
    "condition",
    "therapy",
];

static MEDICATION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Z][a-z]+(?:in|ol|am|ine|ate|ide)\b").unwrap()
});

/// Model answer as cached by the AI gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiAnswer {
    pub response: String,
    pub confidence_score: f64,
    pub model_used: String,
    #[serde(default)]
    pub medications_detected: Vec<String>,
}

impl AiAnswer {
    /// Builds an answer, scoring it against the context it was generated with
    pub fn from_model_output(
        response: impl Into<String>,
        model_used: impl Into<String>,
        context: Option<&str>,
    ) -> Self {
        let response = response.into();
        Self {
            confidence_score: confidence_score(&response, context),
            medications_detected: detect_medications(&response),
            model_used: model_used.into(),
            response,
        }
    }
}

/// Heuristic confidence in `[0.5, 0.95]`
pub fn confidence_score(response: &str, context: Option<&str>) -> f64 {
    let lower = response.to_lowercase();
    let hits = CONFIDENCE_KEYWORDS
        .iter()
        .filter(|k| lower.contains(*k))
        .count();

    let mut score = CONFIDENCE_BASE + hits as f64 * CONFIDENCE_KEYWORD_BONUS;
    if context.is_some_and(|c| !c.is_empty() && c != NO_ADDITIONAL_CONTEXT) {
        score += CONFIDENCE_CONTEXT_BONUS;
    }

    score.min(CONFIDENCE_CAP)
}

/// Unique, sorted medication-like terms
pub fn detect_medications(text: &str) -> Vec<String> {
    let mut found: Vec<String> = MEDICATION_PATTERN
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect();
    found.sort();
    found.dedup();

    if !found.is_empty() {
        tracing::debug!(medications = ?found, "Detected medications");
    }
    found
}

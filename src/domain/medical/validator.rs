//! Safety gate applied to every incoming query

use serde::Serialize;

use crate::domain::DomainError;

/// Queries containing any of these are never forwarded to a model
pub const EMERGENCY_KEYWORDS: &[&str] = &[
    "suicide",
    "self-harm",
    "overdose",
    "emergency",
    "chest pain",
    "stroke",
    "heart attack",
    "unconscious",
    "bleeding heavily",
    "can't breathe",
];

pub const EMERGENCY_MESSAGE: &str = "This appears to be an emergency. Please contact your local emergency services (e.g., 911) or visit the nearest emergency department immediately.";

pub const MEDICAL_DISCLAIMER: &str = "⚠️ MEDICAL DISCLAIMER: This information is for educational purposes only and should not replace professional medical advice, diagnosis, or treatment. Always consult with a qualified healthcare provider for questions about a medical condition.";

pub const MIN_QUERY_CHARS: usize = 10;
pub const MAX_QUERY_CHARS: usize = 1000;

/// Why a query was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidReason {
    Empty,
    Emergency,
    TooShort,
    TooLong,
}

impl InvalidReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Emergency => "emergency",
            Self::TooShort => "too_short",
            Self::TooLong => "too_long",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "A medical query is required.",
            Self::Emergency => EMERGENCY_MESSAGE,
            Self::TooShort => {
                "Please provide more detail about your medical concern so we can help responsibly."
            }
            Self::TooLong => "Please shorten your question to at most 1000 characters.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<InvalidReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ValidationOutcome {
    fn valid() -> Self {
        Self {
            valid: true,
            reason: None,
            message: None,
        }
    }

    fn invalid(reason: InvalidReason) -> Self {
        Self {
            valid: false,
            reason: Some(reason),
            message: Some(reason.message().to_string()),
        }
    }

    /// Converts a refusal into the error surfaced to the API
    pub fn into_result(self) -> Result<(), DomainError> {
        match self.reason {
            None => Ok(()),
            Some(reason) => Err(DomainError::query_rejected(
                reason.as_str(),
                self.message.unwrap_or_else(|| reason.message().to_string()),
            )),
        }
    }
}

/// Validates queries and wraps model output with safety guidance
#[derive(Debug, Clone, Default)]
pub struct QueryValidator {
    append_disclaimer: bool,
}

impl QueryValidator {
    pub fn new(append_disclaimer: bool) -> Self {
        Self { append_disclaimer }
    }

    pub fn validate(&self, query: &str) -> ValidationOutcome {
        if query.trim().is_empty() {
            return ValidationOutcome::invalid(InvalidReason::Empty);
        }

        let normalized = query.to_lowercase();
        if EMERGENCY_KEYWORDS.iter().any(|k| normalized.contains(k)) {
            tracing::warn!("Emergency keyword detected in query");
            return ValidationOutcome::invalid(InvalidReason::Emergency);
        }

        let chars = query.chars().count();
        if chars < MIN_QUERY_CHARS {
            return ValidationOutcome::invalid(InvalidReason::TooShort);
        }
        if chars > MAX_QUERY_CHARS {
            return ValidationOutcome::invalid(InvalidReason::TooLong);
        }

        ValidationOutcome::valid()
    }

    pub fn disclaimer(&self) -> &'static str {
        MEDICAL_DISCLAIMER
    }

    pub fn wrap_response(&self, response: &str) -> String {
        if self.append_disclaimer {
            format!("{}\n\n{}", response, MEDICAL_DISCLAIMER)
        } else {
            response.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_query() {
        let outcome = QueryValidator::default().validate("flu symptoms");
        assert!(outcome.valid);
        assert!(outcome.reason.is_none());
    }

    #[test]
    fn test_emergency_in_any_case() {
        let validator = QueryValidator::default();

        for query in [
            "chest pain for 2 hours",
            "CHEST PAIN for 2 hours",
            "My friend is Unconscious and won't wake",
            "I think I can't breathe properly",
            "overdose",
        ] {
            let outcome = validator.validate(query);
            assert!(!outcome.valid, "{} should be rejected", query);
            assert_eq!(outcome.reason, Some(InvalidReason::Emergency));
            assert_eq!(outcome.message.as_deref(), Some(EMERGENCY_MESSAGE));
        }
    }

    #[test]
    fn test_emergency_checked_before_length() {
        let outcome = QueryValidator::default().validate("stroke");
        assert_eq!(outcome.reason, Some(InvalidReason::Emergency));
    }

    #[test]
    fn test_too_short() {
        let outcome = QueryValidator::default().validate("headache");
        assert_eq!(outcome.reason, Some(InvalidReason::TooShort));
    }

    #[test]
    fn test_empty_and_whitespace() {
        let validator = QueryValidator::default();
        assert_eq!(validator.validate("").reason, Some(InvalidReason::Empty));
        assert_eq!(validator.validate("   \n").reason, Some(InvalidReason::Empty));
    }

    #[test]
    fn test_too_long() {
        let query = "a".repeat(MAX_QUERY_CHARS + 1);
        let outcome = QueryValidator::default().validate(&query);
        assert_eq!(outcome.reason, Some(InvalidReason::TooLong));

        let query = "a".repeat(MAX_QUERY_CHARS);
        assert!(QueryValidator::default().validate(&query).valid);
    }

    #[test]
    fn test_into_result_carries_reason_code() {
        let err = QueryValidator::default()
            .validate("heart attack signs")
            .into_result()
            .unwrap_err();

        match err {
            DomainError::QueryRejected { code, message } => {
                assert_eq!(code, "emergency");
                assert_eq!(message, EMERGENCY_MESSAGE);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_value(QueryValidator::default().validate("chest pain for 2 hours"))
            .unwrap();
        assert_eq!(json["valid"], false);
        assert_eq!(json["reason"], "emergency");

        let json = serde_json::to_value(QueryValidator::default().validate("flu symptoms")).unwrap();
        assert_eq!(json, serde_json::json!({"valid": true}));
    }

    #[test]
    fn test_wrap_response() {
        assert_eq!(QueryValidator::new(false).wrap_response("answer"), "answer");

        let wrapped = QueryValidator::new(true).wrap_response("answer");
        assert!(wrapped.starts_with("answer\n\n"));
        assert!(wrapped.ends_with(MEDICAL_DISCLAIMER));
    }
}

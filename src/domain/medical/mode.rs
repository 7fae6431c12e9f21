use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// How a medical query is answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QueryMode {
    #[default]
    Quick,
    Image,
    DeepSearch,
    Expert,
}

impl QueryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quick => "quick",
            Self::Image => "image",
            Self::DeepSearch => "deep_search",
            Self::Expert => "expert",
        }
    }

    /// Label prefixed to the stored history query
    pub fn label(&self) -> &'static str {
        match self {
            Self::Quick => "QUICK CONSULT",
            Self::Image => "IMAGE ANALYSIS",
            Self::DeepSearch => "DEEP SEARCH",
            Self::Expert => "EXPERT MODE",
        }
    }
}

impl fmt::Display for QueryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "quick" => Ok(Self::Quick),
            "image" => Ok(Self::Image),
            "deep_search" => Ok(Self::DeepSearch),
            "expert" => Ok(Self::Expert),
            other => Err(DomainError::query_rejected(
                "invalid_mode",
                format!(
                    "Unknown mode: {}. Valid values: quick, image, deep_search, expert",
                    other
                ),
            )),
        }
    }
}

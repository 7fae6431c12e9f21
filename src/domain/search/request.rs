use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Sources the search is restricted to
pub const TRUSTED_MEDICAL_DOMAINS: &[&str] = &[
    "ncbi.nlm.nih.gov",
    "pubmed.ncbi.nlm.nih.gov",
    "mayoclinic.org",
    "webmd.com",
    "cdc.gov",
    "who.int",
    "healthline.com",
    "medlineplus.gov",
    "nih.gov",
    "uptodate.com",
];

pub const EXCLUDED_DOMAINS: &[&str] = &["wikipedia.org"];

/// Search depth supported by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchDepth {
    Basic,
    #[default]
    Advanced,
}

impl fmt::Display for SearchDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic => write!(f, "basic"),
            Self::Advanced => write!(f, "advanced"),
        }
    }
}

impl FromStr for SearchDepth {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "advanced" => Ok(Self::Advanced),
            _ => Err(DomainError::configuration(format!(
                "Unknown search depth: {}. Valid values: basic, advanced",
                s
            ))),
        }
    }
}

/// A web search request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub max_results: u32,
    pub depth: SearchDepth,
    #[serde(default)]
    pub include_domains: Vec<String>,
    #[serde(default)]
    pub exclude_domains: Vec<String>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, max_results: u32) -> Self {
        Self {
            query: query.into(),
            max_results,
            depth: SearchDepth::default(),
            include_domains: Vec::new(),
            exclude_domains: Vec::new(),
        }
    }

    /// Medical search restricted to trusted sources
    pub fn medical(query: &str, max_results: u32, depth: SearchDepth) -> Self {
        Self {
            query: format!("medical information {}", query),
            max_results,
            depth,
            include_domains: TRUSTED_MEDICAL_DOMAINS
                .iter()
                .map(|d| d.to_string())
                .collect(),
            exclude_domains: EXCLUDED_DOMAINS.iter().map(|d| d.to_string()).collect(),
        }
    }
}

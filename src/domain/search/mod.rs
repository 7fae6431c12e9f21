//! Web search domain models and traits

mod provider;
mod request;
mod response;

pub use provider::SearchProvider;
pub use request::{EXCLUDED_DOMAINS, SearchDepth, SearchRequest, TRUSTED_MEDICAL_DOMAINS};
pub use response::{NO_ADDITIONAL_CONTEXT, SearchContext, SearchResponse, SearchResult, Source};

#[cfg(test)]
pub use provider::mock::MockSearchProvider;

use async_trait::async_trait;
use std::fmt::Debug;

use super::{SearchRequest, SearchResponse};
use crate::domain::DomainError;

/// Trait for web search providers (Tavily)
#[async_trait]
pub trait SearchProvider: Send + Sync + Debug {
    async fn search(&self, request: SearchRequest) -> Result<SearchResponse, DomainError>;

    fn provider_name(&self) -> &'static str;
}

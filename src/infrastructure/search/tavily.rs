use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::{DomainError, SearchProvider, SearchRequest, SearchResponse, SearchResult};
use crate::infrastructure::llm::HttpClientTrait;

pub const DEFAULT_TAVILY_BASE_URL: &str = "https://api.tavily.com";

/// Tavily web search provider
#[derive(Debug)]
pub struct TavilyProvider<C: HttpClientTrait> {
    client: C,
    api_key: String,
    auth_header: String,
    base_url: String,
}

impl<C: HttpClientTrait> TavilyProvider<C> {
    pub fn new(client: C, api_key: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, DEFAULT_TAVILY_BASE_URL)
    }

    pub fn with_base_url(
        client: C,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let api_key = api_key.into();

        Self {
            client,
            auth_header: format!("Bearer {}", api_key),
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.base_url)
    }

    fn build_request(&self, request: &SearchRequest) -> serde_json::Value {
        serde_json::json!({
            "api_key": self.api_key,
            "query": request.query,
            "search_depth": request.depth.to_string(),
            "max_results": request.max_results,
            "include_domains": request.include_domains,
            "exclude_domains": request.exclude_domains,
        })
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("Authorization", self.auth_header.as_str()),
            ("Content-Type", "application/json"),
        ]
    }
}

#[async_trait]
impl<C: HttpClientTrait> SearchProvider for TavilyProvider<C> {
    async fn search(&self, request: SearchRequest) -> Result<SearchResponse, DomainError> {
        let body = self.build_request(&request);
        let json = self
            .client
            .post_json(&self.search_url(), self.headers(), &body)
            .await?;

        let response: TavilyResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::provider("tavily", format!("Failed to parse response: {}", e))
        })?;

        Ok(SearchResponse {
            query: response.query.unwrap_or(request.query),
            results: response
                .results
                .into_iter()
                .map(|r| SearchResult {
                    title: r.title,
                    content: r.content,
                    url: r.url,
                    score: r.score.unwrap_or(0.0),
                })
                .collect(),
        })
    }

    fn provider_name(&self) -> &'static str {
        "tavily"
    }
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    query: Option<String>,
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    title: Option<String>,
    url: Option<String>,
    content: Option<String>,
    score: Option<f64>,
}

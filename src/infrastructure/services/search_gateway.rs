//! Cached access to the web search provider

use std::sync::Arc;

use tracing::{debug, warn};

use super::cached::{self, GatewayCacheConfig};
use crate::domain::{
    Cache, CacheKeyGenerator, CacheKeyParams, SearchContext, SearchDepth, SearchProvider,
    SearchRequest, Sha256KeyGenerator,
};

const GATEWAY: &str = "search";

/// Search gateway settings
#[derive(Debug, Clone)]
pub struct SearchGatewayConfig {
    pub cache: GatewayCacheConfig,
    pub depth: SearchDepth,
    pub max_results: u32,
}

impl Default for SearchGatewayConfig {
    fn default() -> Self {
        Self {
            cache: GatewayCacheConfig::default(),
            depth: SearchDepth::Advanced,
            max_results: 10,
        }
    }
}

/// Wraps a [`SearchProvider`] with a content-addressed cache.
///
/// Searching never fails: without a provider, or when the provider errors,
/// the caller gets an empty [`SearchContext`].
#[derive(Debug)]
pub struct SearchGateway {
    provider: Option<Arc<dyn SearchProvider>>,
    cache: Arc<dyn Cache>,
    config: SearchGatewayConfig,
    key_generator: Sha256KeyGenerator,
}

impl SearchGateway {
    pub fn new(
        provider: Option<Arc<dyn SearchProvider>>,
        cache: Arc<dyn Cache>,
        config: SearchGatewayConfig,
    ) -> Self {
        Self {
            provider,
            cache,
            config,
            key_generator: Sha256KeyGenerator::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    /// `{namespace}:search:{sha256}` over the query and result count
    pub fn cache_key(&self, query: &str) -> String {
        let params = CacheKeyParams::new()
            .with_component("max_results", self.config.max_results)
            .with_component("query", query);

        self.key_generator.generate_with_namespace(
            &format!("{}:{}", self.config.cache.namespace, GATEWAY),
            &params,
        )
    }

    /// Searches trusted medical sources for context on the query
    pub async fn search(&self, query: &str) -> SearchContext {
        let Some(provider) = &self.provider else {
            debug!("Search provider not configured, skipping web search");
            return SearchContext::empty(query);
        };

        let key = self.cache_key(query);
        if let Some(context) = cached::lookup(self.cache.as_ref(), GATEWAY, &key).await {
            return context;
        }

        let request =
            SearchRequest::medical(query, self.config.max_results, self.config.depth);

        let context = match provider.search(request).await {
            Ok(response) => SearchContext::from_response(response),
            Err(e) => {
                warn!(
                    provider = provider.provider_name(),
                    error = %e,
                    "Web search failed, continuing without context"
                );
                return SearchContext::empty(query);
            }
        };

        cached::store(self.cache.as_ref(), &self.config.cache, GATEWAY, &key, &context).await;
        context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::domain::cache::MockCache;
    use crate::domain::search::{MockSearchProvider, NO_ADDITIONAL_CONTEXT};
    use crate::infrastructure::cache::InMemoryCache;

    fn gateway_with(
        provider: Arc<MockSearchProvider>,
        cache: Arc<dyn Cache>,
        ttl: Duration,
    ) -> SearchGateway {
        let config = SearchGatewayConfig {
            cache: GatewayCacheConfig::new("test", ttl),
            ..Default::default()
        };
        SearchGateway::new(Some(provider as Arc<dyn SearchProvider>), cache, config)
    }

    fn flu_provider() -> Arc<MockSearchProvider> {
        Arc::new(
            MockSearchProvider::new().with_result("Flu | CDC", "Flu spreads easily.", "https://cdc.gov/flu"),
        )
    }

    #[test]
    fn test_cache_key_is_stable_and_namespaced() {
        let gateway = gateway_with(
            flu_provider(),
            Arc::new(MockCache::new()),
            Duration::from_secs(60),
        );

        let key = gateway.cache_key("flu symptoms");
        assert!(key.starts_with("test:search:"));
        assert_eq!(key.len(), "test:search:".len() + 64);
        assert_eq!(key, gateway.cache_key("flu symptoms"));
        assert_ne!(key, gateway.cache_key("cold symptoms"));
    }

    #[tokio::test]
    async fn test_repeated_search_hits_cache() {
        let provider = flu_provider();
        let gateway = gateway_with(
            provider.clone(),
            Arc::new(InMemoryCache::new()),
            Duration::from_secs(60),
        );

        let first = gateway.search("flu symptoms").await;
        let second = gateway.search("flu symptoms").await;

        assert_eq!(provider.calls(), 1);
        assert_eq!(first, second);
        assert!(first.context.starts_with("Source: Flu | CDC\n"));
    }

    #[tokio::test]
    async fn test_zero_ttl_always_misses() {
        let provider = flu_provider();
        let gateway = gateway_with(
            provider.clone(),
            Arc::new(InMemoryCache::new()),
            Duration::ZERO,
        );

        gateway.search("flu symptoms").await;
        gateway.search("flu symptoms").await;

        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_provider_failure_degrades_to_empty_context() {
        let provider = Arc::new(MockSearchProvider::new().with_error("quota exceeded"));
        let cache = Arc::new(MockCache::new());
        let gateway = gateway_with(provider, cache.clone(), Duration::from_secs(60));

        let context = gateway.search("flu symptoms").await;

        assert_eq!(context.context, NO_ADDITIONAL_CONTEXT);
        assert!(context.results.is_empty());
        assert_eq!(cache.set_calls(), 0);
    }

    #[tokio::test]
    async fn test_cache_failure_falls_through_to_provider() {
        let provider = flu_provider();
        let cache = Arc::new(MockCache::new().with_error("redis down"));
        let gateway = gateway_with(provider.clone(), cache, Duration::from_secs(60));

        let context = gateway.search("flu symptoms").await;

        assert_eq!(provider.calls(), 1);
        assert!(context.has_context());
    }

    #[tokio::test]
    async fn test_without_provider_returns_empty_context() {
        let gateway = SearchGateway::new(
            None,
            Arc::new(MockCache::new()),
            SearchGatewayConfig::default(),
        );

        assert!(!gateway.is_enabled());
        assert!(!gateway.search("flu symptoms").await.has_context());
    }
}

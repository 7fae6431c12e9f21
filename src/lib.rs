//! Mediverse API
//!
//! A medical question gateway in front of hosted language models with support for:
//! - Safety validation with emergency detection
//! - Quick, deep-search, expert and image consultation modes
//! - Content-addressed caching of search and model answers
//! - Per-client rate limiting and query history

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use api::state::AppState;
use domain::{Cache, HistoryRepository, QueryValidator, SearchProvider};
use infrastructure::{
    cache::{CacheConfig as CacheBackendConfig, CacheFactory, CacheType},
    history::{InMemoryHistoryRepository, PostgresHistoryRepository},
    llm::{HttpClient, LlmProviderFactory},
    observability::PrometheusMetrics,
    rate_limit::{RateLimiter, RateLimiterConfig},
    search::TavilyProvider,
    services::{
        AiGateway, AiGatewayConfig, GatewayCacheConfig, MedicalQueryService, SearchGateway,
        SearchGatewayConfig,
    },
};
use tracing::{info, warn};

/// Create the application state from configuration
pub async fn create_app_state_with_config(
    config: &AppConfig,
    metrics: Option<PrometheusMetrics>,
) -> anyhow::Result<AppState> {
    let cache_type: CacheType = config.cache.backend.parse()?;
    let cache = CacheFactory::new()
        .create_or_fallback(&CacheBackendConfig {
            cache_type,
            redis_url: config.cache.redis_url.clone(),
            default_ttl: Duration::from_secs(config.cache.ttl_secs),
            max_capacity: config.cache.max_capacity,
        })
        .await;
    info!(backend = cache.backend_name(), "Cache initialized");

    let targets = LlmProviderFactory::from_config(&config.llm)?;
    info!(
        provider = targets.primary.provider.provider_name(),
        model = %targets.primary.model,
        expert = targets.expert.is_some(),
        "LLM providers configured"
    );

    let search_provider = create_search_provider(config)?;
    let history = create_history_repository(config).await?;

    let gateway_cache = GatewayCacheConfig::new(
        config.cache.namespace.clone(),
        Duration::from_secs(config.cache.ttl_secs),
    );

    let search = SearchGateway::new(
        search_provider,
        cache.clone(),
        SearchGatewayConfig {
            cache: gateway_cache.clone(),
            depth: config.search.depth,
            max_results: config.search.max_results,
        },
    );

    let ai = AiGateway::new(
        targets,
        cache.clone(),
        AiGatewayConfig {
            cache: gateway_cache,
            temperature: config.llm.temperature,
            max_output_tokens: config.llm.max_output_tokens,
        },
    );

    let query_service = MedicalQueryService::new(search, ai, history)
        .with_validator(QueryValidator::new(config.medical.append_disclaimer))
        .with_max_sources(config.search.max_sources);

    let mut state = AppState::new(Arc::new(query_service), cache).with_metrics(metrics);

    if config.rate_limit.enabled {
        info!(
            requests_per_minute = config.rate_limit.requests_per_minute,
            window_secs = config.rate_limit.window_secs,
            trust_forwarded_for = config.rate_limit.trust_forwarded_for,
            "Rate limiting enabled"
        );
        let limiter_config = RateLimiterConfig::new(
            config.rate_limit.requests_per_minute,
            Duration::from_secs(config.rate_limit.window_secs),
        )
        .with_trust_forwarded_for(config.rate_limit.trust_forwarded_for);
        state = state.with_rate_limiter(Arc::new(RateLimiter::new(limiter_config)));
    }

    Ok(state)
}

fn create_search_provider(config: &AppConfig) -> anyhow::Result<Option<Arc<dyn SearchProvider>>> {
    let Some(api_key) = config.search.api_key.as_ref() else {
        warn!("TAVILY_API_KEY not set, deep search will run without web context");
        return Ok(None);
    };

    let client = HttpClient::with_timeout(Duration::from_secs(config.llm.timeout_secs))?;
    let provider: Arc<dyn SearchProvider> = Arc::new(TavilyProvider::with_base_url(
        client,
        api_key.clone(),
        config.search.base_url.clone(),
    ));

    info!(depth = ?config.search.depth, "Tavily search enabled");
    Ok(Some(provider))
}

async fn create_history_repository(
    config: &AppConfig,
) -> anyhow::Result<Arc<dyn HistoryRepository>> {
    match config.database.url.as_deref() {
        Some(url) => {
            info!("Connecting to PostgreSQL...");
            let repository =
                PostgresHistoryRepository::connect(url, config.database.max_connections).await?;
            info!("PostgreSQL connection established");
            Ok(Arc::new(repository))
        }
        None => {
            info!("DATABASE_URL not set, keeping query history in memory");
            Ok(Arc::new(InMemoryHistoryRepository::new()))
        }
    }
}

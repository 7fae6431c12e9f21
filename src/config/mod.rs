//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, CacheConfig, DatabaseConfig, GeminiConfig, LlmConfig, LlmProviderKind, LogFormat,
    LoggingConfig, MedicalConfig, MetricsConfig, OpenRouterConfig, RateLimitConfig, SearchConfig,
    ServerConfig,
};

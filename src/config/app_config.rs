use serde::{Deserialize, Serialize};

use crate::domain::search::SearchDepth;

const REDACTED: &str = "***";

/// Conventional environment variables and the config keys they override
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("GEMINI_API_KEY", "llm.gemini.api_key"),
    ("GEMINI_MODEL", "llm.gemini.model"),
    ("LLM_PROVIDER", "llm.provider"),
    ("OPENROUTER_API_KEY", "llm.openrouter.api_key"),
    ("OPENROUTER_MODEL", "llm.openrouter.model"),
    ("OPENROUTER_BASE_URL", "llm.openrouter.base_url"),
    ("OPENROUTER_SITE_URL", "llm.openrouter.site_url"),
    ("OPENROUTER_APP_NAME", "llm.openrouter.app_name"),
    ("MAX_RESPONSE_LENGTH", "llm.max_output_tokens"),
    ("TAVILY_API_KEY", "search.api_key"),
    ("MAX_SEARCH_RESULTS", "search.max_results"),
    ("SEARCH_DEPTH", "search.depth"),
    ("DATABASE_URL", "database.url"),
    ("REDIS_URL", "cache.redis_url"),
    ("CACHE_TTL_SECONDS", "cache.ttl_secs"),
    ("CACHE_NAMESPACE", "cache.namespace"),
    ("RATE_LIMIT_PER_MINUTE", "rate_limit.requests_per_minute"),
    ("LOG_LEVEL", "logging.level"),
];

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub llm: LlmConfig,
    pub search: SearchConfig,
    pub cache: CacheConfig,
    pub rate_limit: RateLimitConfig,
    pub database: DatabaseConfig,
    pub medical: MedicalConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Which provider answers quick, deep search and image queries
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderKind {
    #[default]
    Gemini,
    OpenRouter,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProviderKind,
    pub gemini: GeminiConfig,
    pub openrouter: OpenRouterConfig,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenRouterConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub site_url: Option<String>,
    pub app_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub depth: SearchDepth,
    pub max_results: u32,
    /// Sources returned to clients in deep search mode
    pub max_sources: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// `in_memory` or `redis`; a configured `redis_url` selects Redis
    pub backend: String,
    pub redis_url: Option<String>,
    pub namespace: String,
    /// Zero disables storing
    pub ttl_secs: u64,
    pub max_capacity: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub requests_per_minute: u32,
    pub window_secs: u64,
    /// Key clients on the first `x-forwarded-for` hop; only safe behind a trusted proxy
    pub trust_forwarded_for: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// History is kept in memory when unset
    pub url: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MedicalConfig {
    pub append_disclaimer: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProviderKind::default(),
            gemini: GeminiConfig::default(),
            openrouter: OpenRouterConfig::default(),
            temperature: 0.5,
            max_output_tokens: 8000,
            timeout_secs: 120,
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "models/gemini-2.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
        }
    }
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "meta-llama/llama-3.1-70b-instruct".to_string(),
            base_url: "https://openrouter.ai/api/v1".to_string(),
            site_url: None,
            app_name: Some("Mediverse".to_string()),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.tavily.com".to_string(),
            depth: SearchDepth::Advanced,
            max_results: 10,
            max_sources: 10,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: "in_memory".to_string(),
            redis_url: None,
            namespace: "medical_ai".to_string(),
            ttl_secs: 300,
            max_capacity: 10_000,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_minute: 20,
            window_secs: 60,
            trust_forwarded_for: false,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 5,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_with(|name| std::env::var(name).ok())
    }

    /// Loads configuration resolving conventional variables through `lookup`
    pub fn load_with<F>(lookup: F) -> Result<Self, config::ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            );

        for (var, key) in ENV_OVERRIDES {
            let value = lookup(var).filter(|v| !v.trim().is_empty());
            builder = builder.set_override_option(*key, value)?;
        }

        if lookup("REDIS_URL").is_some_and(|v| !v.trim().is_empty()) {
            builder = builder.set_override("cache.backend", "redis")?;
        }

        let mut config: AppConfig = builder.build()?.try_deserialize()?;
        config.logging.level = config.logging.level.to_lowercase();
        config.llm.openrouter.base_url = config
            .llm
            .openrouter
            .base_url
            .trim_end_matches('/')
            .to_string();

        Ok(config)
    }

    /// Copy safe to print, with secrets masked
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        let mask = |value: &mut Option<String>| {
            if value.is_some() {
                *value = Some(REDACTED.to_string());
            }
        };

        mask(&mut config.llm.gemini.api_key);
        mask(&mut config.llm.openrouter.api_key);
        mask(&mut config.search.api_key);
        config.database.url = config.database.url.as_deref().map(redact_credentials);
        config.cache.redis_url = config.cache.redis_url.as_deref().map(redact_credentials);

        config
    }
}

/// Masks the userinfo part of a connection URL
fn redact_credentials(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://{}{}", &url[..scheme_end], REDACTED, &url[at..])
        }
        _ => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::load_with(lookup(&[])).unwrap();

        assert_eq!(config.server.port, 8000);
        assert_eq!(config.llm.provider, LlmProviderKind::Gemini);
        assert_eq!(config.llm.gemini.model, "models/gemini-2.5-flash");
        assert_eq!(config.llm.max_output_tokens, 8000);
        assert_eq!(config.search.depth, SearchDepth::Advanced);
        assert_eq!(config.search.max_results, 10);
        assert_eq!(config.cache.namespace, "medical_ai");
        assert_eq!(config.cache.ttl_secs, 300);
        assert_eq!(config.cache.backend, "in_memory");
        assert_eq!(config.rate_limit.requests_per_minute, 20);
        assert!(!config.rate_limit.trust_forwarded_for);
        assert!(config.database.url.is_none());
        assert!(!config.medical.append_disclaimer);
    }

    #[test]
    fn test_conventional_env_overrides() {
        let config = AppConfig::load_with(lookup(&[
            ("GEMINI_API_KEY", "g-key"),
            ("LLM_PROVIDER", "openrouter"),
            ("OPENROUTER_API_KEY", "or-key"),
            ("OPENROUTER_BASE_URL", "https://openrouter.ai/api/v1/"),
            ("TAVILY_API_KEY", "t-key"),
            ("SEARCH_DEPTH", "basic"),
            ("MAX_SEARCH_RESULTS", "5"),
            ("RATE_LIMIT_PER_MINUTE", "3"),
            ("CACHE_TTL_SECONDS", "0"),
            ("CACHE_NAMESPACE", "test_ns"),
            ("REDIS_URL", "redis://cache:6379"),
            ("DATABASE_URL", "postgres://u:p@db/mediverse"),
            ("LOG_LEVEL", "DEBUG"),
        ]))
        .unwrap();

        assert_eq!(config.llm.gemini.api_key.as_deref(), Some("g-key"));
        assert_eq!(config.llm.provider, LlmProviderKind::OpenRouter);
        assert_eq!(config.llm.openrouter.api_key.as_deref(), Some("or-key"));
        assert_eq!(config.llm.openrouter.base_url, "https://openrouter.ai/api/v1");
        assert_eq!(config.search.api_key.as_deref(), Some("t-key"));
        assert_eq!(config.search.depth, SearchDepth::Basic);
        assert_eq!(config.search.max_results, 5);
        assert_eq!(config.rate_limit.requests_per_minute, 3);
        assert_eq!(config.cache.ttl_secs, 0);
        assert_eq!(config.cache.namespace, "test_ns");
        assert_eq!(config.cache.backend, "redis");
        assert_eq!(config.cache.redis_url.as_deref(), Some("redis://cache:6379"));
        assert_eq!(
            config.database.url.as_deref(),
            Some("postgres://u:p@db/mediverse")
        );
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let config = AppConfig::load_with(lookup(&[("GEMINI_API_KEY", "  "), ("REDIS_URL", "")]))
            .unwrap();

        assert!(config.llm.gemini.api_key.is_none());
        assert_eq!(config.cache.backend, "in_memory");
    }

    #[test]
    fn test_redacted_masks_secrets() {
        let mut config = AppConfig::default();
        config.llm.gemini.api_key = Some("g-key".to_string());
        config.search.api_key = Some("t-key".to_string());
        config.database.url = Some("postgres://user:pass@db:5432/mediverse".to_string());

        let redacted = config.redacted();

        assert_eq!(redacted.llm.gemini.api_key.as_deref(), Some("***"));
        assert!(redacted.llm.openrouter.api_key.is_none());
        assert_eq!(redacted.search.api_key.as_deref(), Some("***"));
        assert_eq!(
            redacted.database.url.as_deref(),
            Some("postgres://***@db:5432/mediverse")
        );
    }
}

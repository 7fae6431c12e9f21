use std::sync::Arc;
use std::time::Duration;

use super::gemini::GeminiProvider;
use super::http_client::HttpClient;
use super::openrouter::{OpenRouterAttribution, OpenRouterProvider};
use crate::config::{LlmConfig, LlmProviderKind};
use crate::domain::{DomainError, LlmProvider};

/// A provider paired with the model it should be asked for
#[derive(Debug, Clone)]
pub struct ModelTarget {
    pub provider: Arc<dyn LlmProvider>,
    pub model: String,
}

impl ModelTarget {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }
}

/// Providers resolved from configuration
#[derive(Debug, Clone)]
pub struct LlmTargets {
    /// Answers quick, deep search and image queries
    pub primary: ModelTarget,
    /// Answers expert queries when OpenRouter is configured
    pub expert: Option<ModelTarget>,
}

/// Factory for creating LLM providers
#[derive(Debug)]
pub struct LlmProviderFactory;

impl LlmProviderFactory {
    /// Builds the primary and expert targets; the primary provider's key is required
    pub fn from_config(config: &LlmConfig) -> Result<LlmTargets, DomainError> {
        let http_client = HttpClient::with_timeout(Duration::from_secs(config.timeout_secs))?;

        let gemini = config.gemini.api_key.as_ref().map(|key| {
            ModelTarget::new(
                Arc::new(GeminiProvider::with_base_url(
                    http_client.clone(),
                    key.clone(),
                    config.gemini.base_url.clone(),
                )),
                config.gemini.model.clone(),
            )
        });

        let openrouter = config.openrouter.api_key.as_ref().map(|key| {
            let provider = OpenRouterProvider::with_base_url(
                http_client.clone(),
                key.clone(),
                config.openrouter.base_url.clone(),
            )
            .with_attribution(OpenRouterAttribution {
                site_url: config.openrouter.site_url.clone(),
                app_name: config.openrouter.app_name.clone(),
            });

            ModelTarget::new(Arc::new(provider), config.openrouter.model.clone())
        });

        let primary = match config.provider {
            LlmProviderKind::Gemini => gemini.ok_or_else(|| {
                DomainError::configuration("GEMINI_API_KEY must be set when LLM_PROVIDER=gemini")
            })?,
            LlmProviderKind::OpenRouter => openrouter.clone().ok_or_else(|| {
                DomainError::configuration(
                    "OPENROUTER_API_KEY must be set when LLM_PROVIDER=openrouter",
                )
            })?,
        };

        Ok(LlmTargets {
            primary,
            expert: openrouter,
        })
    }
}

//! Cached, mode-aware access to the LLM providers

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, warn};

use super::cached::{self, GatewayCacheConfig};
use crate::domain::medical::{consultation_prompt, imaging_prompt};
use crate::domain::search::NO_ADDITIONAL_CONTEXT;
use crate::domain::{
    AiAnswer, Cache, CacheKeyGenerator, CacheKeyParams, ContentPart, DomainError, ImageAttachment,
    LlmRequest, Message, QueryMode, Sha256KeyGenerator,
};
use crate::infrastructure::llm::{LlmTargets, ModelTarget};
use crate::infrastructure::observability::record_llm_request;

const GATEWAY: &str = "ai";

/// Characters of context that take part in the cache key
const KEY_CONTEXT_CHARS: usize = 200;

/// AI gateway settings
#[derive(Debug, Clone)]
pub struct AiGatewayConfig {
    pub cache: GatewayCacheConfig,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for AiGatewayConfig {
    fn default() -> Self {
        Self {
            cache: GatewayCacheConfig::default(),
            temperature: 0.5,
            max_output_tokens: 8000,
        }
    }
}

/// Routes a query to the right model for its mode and caches the answer
#[derive(Debug)]
pub struct AiGateway {
    targets: LlmTargets,
    cache: Arc<dyn Cache>,
    config: AiGatewayConfig,
    key_generator: Sha256KeyGenerator,
}

impl AiGateway {
    pub fn new(targets: LlmTargets, cache: Arc<dyn Cache>, config: AiGatewayConfig) -> Self {
        Self {
            targets,
            cache,
            config,
            key_generator: Sha256KeyGenerator::new(),
        }
    }

    pub fn has_expert(&self) -> bool {
        self.targets.expert.is_some()
    }

    /// `{namespace}:ai:{sha256}` over query, mode and the head of the context
    pub fn cache_key(&self, query: &str, context: &str, mode: QueryMode) -> String {
        let context: String = context.chars().take(KEY_CONTEXT_CHARS).collect();
        let params = CacheKeyParams::new()
            .with_component("context", context)
            .with_component("mode", mode.as_str())
            .with_component("query", query);

        self.key_generator.generate_with_namespace(
            &format!("{}:{}", self.config.cache.namespace, GATEWAY),
            &params,
        )
    }

    /// Answers a text query. `search_context` is only honoured in deep search mode.
    pub async fn generate(
        &self,
        query: &str,
        search_context: Option<&str>,
        mode: QueryMode,
    ) -> Result<AiAnswer, DomainError> {
        let context = match mode {
            QueryMode::Image => return self.analyze_image(query, None).await,
            QueryMode::DeepSearch => search_context
                .filter(|c| !c.trim().is_empty())
                .unwrap_or(NO_ADDITIONAL_CONTEXT),
            QueryMode::Quick | QueryMode::Expert => NO_ADDITIONAL_CONTEXT,
        };

        let key = self.cache_key(query, context, mode);
        if let Some(answer) = cached::lookup(self.cache.as_ref(), GATEWAY, &key).await {
            debug!(mode = %mode, "Returning cached AI response");
            return Ok(answer);
        }

        let target = self.target_for(mode);
        let request = self.request_for(Message::user(consultation_prompt(query, context)));
        let text = self.complete(target, request).await?;

        let answer = AiAnswer::from_model_output(text, target.model.clone(), Some(context));
        cached::store(self.cache.as_ref(), &self.config.cache, GATEWAY, &key, &answer).await;

        Ok(answer)
    }

    /// Runs the imaging analysis prompt, with the upload attached when present
    pub async fn analyze_image(
        &self,
        query: &str,
        image: Option<&ImageAttachment>,
    ) -> Result<AiAnswer, DomainError> {
        let context = match image {
            Some(image) => format!("image:{}", image.digest()),
            None => "image:none".to_string(),
        };

        let key = self.cache_key(query, &context, QueryMode::Image);
        if let Some(answer) = cached::lookup(self.cache.as_ref(), GATEWAY, &key).await {
            debug!("Returning cached image analysis");
            return Ok(answer);
        }

        let prompt = imaging_prompt(query);
        let message = match image {
            Some(image) => Message::user_with_parts(vec![
                ContentPart::Text { text: prompt },
                ContentPart::ImageBase64 {
                    data: image.to_base64(),
                    media_type: image.media_type.clone(),
                },
            ]),
            None => Message::user(prompt),
        };

        let target = &self.targets.primary;
        let text = self.complete(target, self.request_for(message)).await?;

        // Image answers are scored against the clinical context the user typed
        let answer = AiAnswer::from_model_output(text, target.model.clone(), Some(query));
        cached::store(self.cache.as_ref(), &self.config.cache, GATEWAY, &key, &answer).await;

        Ok(answer)
    }

    fn target_for(&self, mode: QueryMode) -> &ModelTarget {
        if mode != QueryMode::Expert {
            return &self.targets.primary;
        }

        match &self.targets.expert {
            Some(expert) => expert,
            None => {
                warn!("Expert model not configured, falling back to the default model");
                &self.targets.primary
            }
        }
    }

    fn request_for(&self, message: Message) -> LlmRequest {
        LlmRequest::builder()
            .message(message)
            .temperature(self.config.temperature)
            .max_tokens(self.config.max_output_tokens)
            .build()
    }

    async fn complete(&self, target: &ModelTarget, request: LlmRequest) -> Result<String, DomainError> {
        let provider = target.provider.provider_name();
        let started = Instant::now();

        match target.provider.chat(&target.model, request).await {
            Ok(response) => {
                record_llm_request(provider, true, started.elapsed());
                Ok(response.content().unwrap_or_default().to_string())
            }
            Err(e) => {
                record_llm_request(provider, false, started.elapsed());
                error!(provider, model = %target.model, error = %e, "LLM generation failed");
                Err(e)
            }
        }
    }
}

//! LLM provider implementations

mod factory;
mod gemini;
mod http_client;
mod openrouter;

pub use factory::{LlmProviderFactory, LlmTargets, ModelTarget};
pub use gemini::{GeminiProvider, DEFAULT_GEMINI_BASE_URL};
pub use http_client::{HttpClient, HttpClientTrait};
pub use openrouter::{OpenRouterAttribution, OpenRouterProvider, DEFAULT_OPENROUTER_BASE_URL};

#[cfg(test)]
pub use http_client::mock::MockHttpClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::http_client::HttpClientTrait;
use crate::domain::{
    ContentPart, DomainError, FinishReason, LlmProvider, LlmRequest, LlmResponse, Message,
    MessageRole, Usage,
};

pub const DEFAULT_OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Attribution headers OpenRouter shows on its dashboards
#[derive(Debug, Clone, Default)]
pub struct OpenRouterAttribution {
    pub site_url: Option<String>,
    pub app_name: Option<String>,
}

/// OpenRouter provider (OpenAI-compatible chat completions)
#[derive(Debug)]
pub struct OpenRouterProvider<C: HttpClientTrait> {
    client: C,
    auth_header: String,
    base_url: String,
    attribution: OpenRouterAttribution,
}

impl<C: HttpClientTrait> OpenRouterProvider<C> {
    pub fn new(client: C, api_key: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, DEFAULT_OPENROUTER_BASE_URL)
    }

    pub fn with_base_url(
        client: C,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            auth_header: format!("Bearer {}", api_key.into()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            attribution: OpenRouterAttribution::default(),
        }
    }

    pub fn with_attribution(mut self, attribution: OpenRouterAttribution) -> Self {
        self.attribution = attribution;
        self
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn build_request(&self, model: &str, request: &LlmRequest) -> serde_json::Value {
        let messages: Vec<OpenRouterMessage> = request
            .messages
            .iter()
            .map(OpenRouterMessage::from_domain)
            .collect();

        let mut body = serde_json::json!({
            "model": model,
            "messages": messages,
            "stream": false,
        });

        if let Some(temp) = request.temperature {
            body["temperature"] = serde_json::json!(temp);
        }

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        body
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        let mut headers = vec![
            ("Authorization", self.auth_header.as_str()),
            ("Content-Type", "application/json"),
        ];

        if let Some(ref site_url) = self.attribution.site_url {
            headers.push(("HTTP-Referer", site_url.as_str()));
        }
        if let Some(ref app_name) = self.attribution.app_name {
            headers.push(("X-Title", app_name.as_str()));
        }

        headers
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<LlmResponse, DomainError> {
        let response: OpenRouterResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::provider("openrouter", format!("Failed to parse response: {}", e))
        })?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::provider("openrouter", "No choices in response"))?;

        let message = Message::assistant(choice.message.content.unwrap_or_default());

        let mut llm_response = LlmResponse::new(response.id, response.model, message);

        if let Some(reason) = choice.finish_reason {
            llm_response = llm_response.with_finish_reason(parse_finish_reason(&reason));
        }

        if let Some(usage) = response.usage {
            llm_response = llm_response.with_usage(Usage::new(
                usage.prompt_tokens,
                usage.completion_tokens,
            ));
        }

        Ok(llm_response)
    }
}

#[async_trait]
impl<C: HttpClientTrait> LlmProvider for OpenRouterProvider<C> {
    async fn chat(&self, model: &str, request: LlmRequest) -> Result<LlmResponse, DomainError> {
        let url = self.chat_completions_url();
        let body = self.build_request(model, &request);
        let response = self
            .client
            .post_json(&url, self.headers(), &body)
            .await?;

        self.parse_response(response)
    }

    fn provider_name(&self) -> &'static str {
        "openrouter"
    }
}

fn parse_finish_reason(reason: &str) -> FinishReason {
    match reason {
        "length" => FinishReason::Length,
        "content_filter" => FinishReason::ContentFilter,
        _ => FinishReason::Stop,
    }
}

// OpenAI-compatible wire types

#[derive(Debug, Serialize)]
struct OpenRouterMessage {
    role: &'static str,
    content: serde_json::Value,
}

impl OpenRouterMessage {
    fn from_domain(message: &Message) -> Self {
        let role = match message.role {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        };

        let content = if message.has_image() {
            let parts: Vec<serde_json::Value> = message
                .content_parts()
                .into_iter()
                .map(|part| match part {
                    ContentPart::Text { text } => serde_json::json!({
                        "type": "text",
                        "text": text,
                    }),
                    ContentPart::ImageBase64 { data, media_type } => serde_json::json!({
                        "type": "image_url",
                        "image_url": { "url": format!("data:{};base64,{}", media_type, data) },
                    }),
                })
                .collect();
            serde_json::Value::Array(parts)
        } else {
            serde_json::Value::String(message.content_text().unwrap_or("").to_string())
        };

        Self { role, content }
    }
}

#[derive(Debug, Deserialize)]
struct OpenRouterResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    model: String,
    choices: Vec<OpenRouterChoice>,
    usage: Option<OpenRouterUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenRouterChoice {
    message: OpenRouterResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenRouterResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenRouterUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::llm::http_client::mock::MockHttpClient;
    use crate::infrastructure::llm::HttpClient;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TEST_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

    fn completion(content: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "gen-123",
            "model": "meta-llama/llama-3.1-70b-instruct",
            "choices": [{
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 20, "completion_tokens": 40, "total_tokens": 60 }
        })
    }

    #[tokio::test]
    async fn test_openrouter_chat() {
        let client = MockHttpClient::new().with_response(TEST_URL, completion("Expert answer"));
        let provider = OpenRouterProvider::new(client, "or-key").with_attribution(
            OpenRouterAttribution {
                site_url: Some("https://mediverse.example".to_string()),
                app_name: Some("Mediverse".to_string()),
            },
        );

        let request = LlmRequest::builder().user("migraine management").build();
        let response = provider
            .chat("meta-llama/llama-3.1-70b-instruct", request)
            .await
            .unwrap();

        assert_eq!(response.id, "gen-123");
        assert_eq!(response.content(), Some("Expert answer"));
        assert_eq!(response.finish_reason, Some(FinishReason::Stop));
        assert_eq!(response.usage.unwrap().total_tokens, 60);

        assert_eq!(provider.client.header("Authorization").as_deref(), Some("Bearer or-key"));
        assert_eq!(
            provider.client.header("HTTP-Referer").as_deref(),
            Some("https://mediverse.example")
        );
        assert_eq!(provider.client.header("X-Title").as_deref(), Some("Mediverse"));

        let body = provider.client.last_body().unwrap();
        assert_eq!(body["model"], "meta-llama/llama-3.1-70b-instruct");
        assert_eq!(body["messages"][0]["content"], "migraine management");
    }

    #[tokio::test]
    async fn test_openrouter_omits_attribution_when_unset() {
        let client = MockHttpClient::new().with_response(TEST_URL, completion("ok"));
        let provider = OpenRouterProvider::new(client, "or-key");

        provider
            .chat("m", LlmRequest::builder().user("q").build())
            .await
            .unwrap();

        assert!(provider.client.header("HTTP-Referer").is_none());
        assert!(provider.client.header("X-Title").is_none());
    }

    #[tokio::test]
    async fn test_openrouter_error_handling() {
        let client = MockHttpClient::new().with_error(TEST_URL, "HTTP 401: invalid key");
        let provider = OpenRouterProvider::new(client, "bad-key");

        let result = provider
            .chat("m", LlmRequest::builder().user("q").build())
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_openrouter_image_parts_use_data_urls() {
        let client = MockHttpClient::new().with_response(TEST_URL, completion("ok"));
        let provider = OpenRouterProvider::new(client, "or-key");

        let request = LlmRequest::builder()
            .message(Message::user_with_parts(vec![
                ContentPart::Text {
                    text: "Analyze".to_string(),
                },
                ContentPart::ImageBase64 {
                    data: "aGVsbG8=".to_string(),
                    media_type: "image/jpeg".to_string(),
                },
            ]))
            .build();

        provider.chat("m", request).await.unwrap();

        let body = provider.client.last_body().unwrap();
        assert_eq!(body["messages"][0]["content"][0]["type"], "text");
        assert_eq!(
            body["messages"][0]["content"][1]["image_url"]["url"],
            "data:image/jpeg;base64,aGVsbG8="
        );
    }

    #[tokio::test]
    async fn test_openrouter_against_http_server() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/chat/completions"))
            .and(header("authorization", "Bearer live-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("From server")))
            .expect(1)
            .mount(&server)
            .await;

        let provider = OpenRouterProvider::with_base_url(
            HttpClient::new(),
            "live-key",
            format!("{}/api/v1/", server.uri()),
        );
        let response = provider
            .chat("m", LlmRequest::builder().user("q").build())
            .await
            .unwrap();

        assert_eq!(response.content(), Some("From server"));
    }
}

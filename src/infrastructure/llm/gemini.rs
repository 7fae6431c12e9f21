use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::http_client::HttpClientTrait;
use crate::domain::{
    ContentPart, DomainError, FinishReason, LlmProvider, LlmRequest, LlmResponse, Message,
    MessageRole, Usage,
};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Google Gemini `generateContent` provider
#[derive(Debug)]
pub struct GeminiProvider<C: HttpClientTrait> {
    client: C,
    api_key: String,
    base_url: String,
}

impl<C: HttpClientTrait> GeminiProvider<C> {
    pub fn new(client: C, api_key: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, DEFAULT_GEMINI_BASE_URL)
    }

    pub fn with_base_url(
        client: C,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Accepts both `gemini-2.5-flash` and `models/gemini-2.5-flash`
    fn generate_url(&self, model: &str) -> String {
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }

    fn build_request(&self, request: &LlmRequest) -> serde_json::Value {
        let system: Vec<String> = request
            .messages
            .iter()
            .filter(|m| m.role == MessageRole::System)
            .filter_map(|m| m.content_text().map(str::to_string))
            .collect();

        let contents: Vec<GeminiContent> = request
            .messages
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .map(GeminiContent::from_domain)
            .collect();

        let mut body = serde_json::json!({ "contents": contents });

        if !system.is_empty() {
            body["systemInstruction"] = serde_json::json!({
                "parts": [{ "text": system.join("\n\n") }]
            });
        }

        let mut generation_config = serde_json::Map::new();
        if let Some(temp) = request.temperature {
            generation_config.insert("temperature".to_string(), serde_json::json!(temp));
        }
        if let Some(max_tokens) = request.max_tokens {
            generation_config.insert("maxOutputTokens".to_string(), serde_json::json!(max_tokens));
        }
        if !generation_config.is_empty() {
            body["generationConfig"] = serde_json::Value::Object(generation_config);
        }

        body
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("x-goog-api-key", self.api_key.as_str()),
            ("Content-Type", "application/json"),
        ]
    }

    fn parse_response(&self, model: &str, json: serde_json::Value) -> Result<LlmResponse, DomainError> {
        let response: GeminiResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::provider("gemini", format!("Failed to parse response: {}", e))
        })?;

        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::provider("gemini", "No candidates in response"))?;

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(DomainError::provider("gemini", "Empty response from model"));
        }

        let mut llm_response = LlmResponse::new(
            response.response_id.unwrap_or_default(),
            response.model_version.unwrap_or_else(|| model.to_string()),
            Message::assistant(text),
        );

        if let Some(reason) = candidate.finish_reason {
            llm_response = llm_response.with_finish_reason(parse_finish_reason(&reason));
        }

        if let Some(usage) = response.usage_metadata {
            llm_response = llm_response.with_usage(Usage::new(
                usage.prompt_token_count,
                usage.candidates_token_count,
            ));
        }

        Ok(llm_response)
    }
}

#[async_trait]
impl<C: HttpClientTrait> LlmProvider for GeminiProvider<C> {
    async fn chat(&self, model: &str, request: LlmRequest) -> Result<LlmResponse, DomainError> {
        let url = self.generate_url(model);
        let body = self.build_request(&request);
        let response = self
            .client
            .post_json(&url, self.headers(), &body)
            .await?;

        self.parse_response(model, response)
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }
}

fn parse_finish_reason(reason: &str) -> FinishReason {
    match reason {
        "MAX_TOKENS" => FinishReason::Length,
        "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" => {
            FinishReason::ContentFilter
        }
        _ => FinishReason::Stop,
    }
}

// Gemini API types

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: &'static str,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiPart {
    Text { text: String },
    InlineData { inline_data: GeminiInlineData },
}

#[derive(Debug, Serialize)]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

impl GeminiContent {
    fn from_domain(message: &Message) -> Self {
        let role = match message.role {
            MessageRole::Assistant => "model",
            _ => "user",
        };

        let parts = message
            .content_parts()
            .into_iter()
            .map(|part| match part {
                ContentPart::Text { text } => GeminiPart::Text { text },
                ContentPart::ImageBase64 { data, media_type } => GeminiPart::InlineData {
                    inline_data: GeminiInlineData {
                        mime_type: media_type,
                        data,
                    },
                },
            })
            .collect();

        Self { role, parts }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsage>,
    model_version: Option<String>,
    response_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::llm::http_client::mock::MockHttpClient;
    use crate::infrastructure::llm::HttpClient;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TEST_URL: &str =
        "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent";

    fn reply(text: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] },
                "finishReason": "STOP"
            }],
            "usageMetadata": { "promptTokenCount": 12, "candidatesTokenCount": 30 },
            "modelVersion": "gemini-2.5-flash",
            "responseId": "resp-1"
        })
    }

    #[tokio::test]
    async fn test_gemini_chat() {
        let client = MockHttpClient::new().with_response(TEST_URL, reply("Influenza symptoms include fever."));
        let provider = GeminiProvider::new(client, "test-key");

        let request = LlmRequest::builder()
            .user("flu symptoms")
            .temperature(0.5)
            .max_tokens(8000)
            .build();

        let response = provider
            .chat("models/gemini-2.5-flash", request)
            .await
            .unwrap();

        assert_eq!(response.id, "resp-1");
        assert_eq!(response.model, "gemini-2.5-flash");
        assert_eq!(response.content(), Some("Influenza symptoms include fever."));
        assert_eq!(response.finish_reason, Some(FinishReason::Stop));
        assert_eq!(response.usage.unwrap().total_tokens, 42);

        let body = provider.client.last_body().unwrap();
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "flu symptoms");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 8000);
        assert_eq!(provider.client.header("x-goog-api-key").as_deref(), Some("test-key"));
    }

    #[tokio::test]
    async fn test_gemini_sends_inline_image_and_system_instruction() {
        let client = MockHttpClient::new().with_response(TEST_URL, reply("Normal chest radiograph."));
        let provider = GeminiProvider::new(client, "test-key");

        let request = LlmRequest::builder()
            .system("You are a radiology assistant")
            .message(Message::user_with_parts(vec![
                ContentPart::Text {
                    text: "Analyze".to_string(),
                },
                ContentPart::ImageBase64 {
                    data: "aGVsbG8=".to_string(),
                    media_type: "image/png".to_string(),
                },
            ]))
            .build();

        provider.chat("gemini-2.5-flash", request).await.unwrap();

        let body = provider.client.last_body().unwrap();
        assert_eq!(
            body["systemInstruction"]["parts"][0]["text"],
            "You are a radiology assistant"
        );
        assert_eq!(body["contents"].as_array().unwrap().len(), 1);
        assert_eq!(
            body["contents"][0]["parts"][1]["inline_data"]["mime_type"],
            "image/png"
        );
        assert_eq!(body["contents"][0]["parts"][1]["inline_data"]["data"], "aGVsbG8=");
    }

    #[tokio::test]
    async fn test_gemini_empty_candidates_is_error() {
        let client = MockHttpClient::new().with_response(TEST_URL, serde_json::json!({ "candidates": [] }));
        let provider = GeminiProvider::new(client, "test-key");

        let result = provider
            .chat("gemini-2.5-flash", LlmRequest::builder().user("q").build())
            .await;

        assert!(matches!(result, Err(DomainError::Provider { .. })));
    }

    #[tokio::test]
    async fn test_gemini_safety_finish_reason() {
        let client = MockHttpClient::new().with_response(
            TEST_URL,
            serde_json::json!({
                "candidates": [{
                    "content": { "parts": [{ "text": "partial" }] },
                    "finishReason": "SAFETY"
                }]
            }),
        );
        let provider = GeminiProvider::new(client, "test-key");

        let response = provider
            .chat("gemini-2.5-flash", LlmRequest::builder().user("q").build())
            .await
            .unwrap();

        assert_eq!(response.finish_reason, Some(FinishReason::ContentFilter));
        assert_eq!(response.model, "gemini-2.5-flash");
    }

    #[tokio::test]
    async fn test_gemini_against_http_server() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .and(header("x-goog-api-key", "live-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply("Rest and hydrate.")))
            .expect(1)
            .mount(&server)
            .await;

        let provider = GeminiProvider::with_base_url(HttpClient::new(), "live-key", server.uri());
        let response = provider
            .chat("models/gemini-2.5-flash", LlmRequest::builder().user("cold remedies").build())
            .await
            .unwrap();

        assert_eq!(response.content(), Some("Rest and hydrate."));
    }
}

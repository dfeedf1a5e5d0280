//! Gemini client for text and vision completions.
//!
//! Text completions walk the configured model list in order; each model call
//! is retried on transient failures before moving on to the next model.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::completion::{CompletionRequest, ImageInput, TextCompletion, VisionCompletion, VisionRequest};
use crate::config::AiClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::retry::RetryPolicy;

/// Gemini API client.
pub struct GeminiClient {
    http: Client,
    config: AiClientConfig,
    retry: RetryPolicy,
}

/// Gemini API request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum Part {
    Text(String),
    InlineData(Blob),
    FileData(FileRef),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Blob {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileRef {
    mime_type: String,
    file_uri: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Gemini API response.
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GeminiResponse {
    /// Concatenated text of the first candidate.
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

impl GeminiClient {
    /// Create a new Gemini client.
    pub fn new(config: AiClientConfig) -> ClientResult<Self> {
        if config.text_models.is_empty() {
            return Err(ClientError::config("at least one text model is required"));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ClientError::Network)?;

        let retry = RetryPolicy::new(config.max_retries);
        Ok(Self { http, config, retry })
    }

    /// Create from environment variables.
    pub fn from_env() -> ClientResult<Self> {
        Self::new(AiClientConfig::from_env()?)
    }

    /// Override the retry policy (tests use a short base delay).
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn config(&self) -> &AiClientConfig {
        &self.config
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.config.base_url.trim_end_matches('/'),
            model,
            self.config.api_key
        )
    }

    /// Single generateContent call against one model.
    async fn generate(&self, model: &str, request: &GeminiRequest) -> ClientResult<String> {
        let url = self.endpoint(model);

        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClientError::Timeout(self.config.timeout.as_secs())
                } else {
                    ClientError::Network(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::from_status("Gemini API", status, &body));
        }

        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(|e| ClientError::invalid_response(format!("Failed to parse Gemini response: {}", e)))?;

        parsed
            .into_text()
            .ok_or_else(|| ClientError::EmptyResponse(model.to_string()))
    }

    async fn generate_with_retry(&self, model: &str, request: &GeminiRequest) -> ClientResult<String> {
        let operation = format!("Gemini {}", model);
        self.retry.run(&operation, || self.generate(model, request)).await
    }
}

#[async_trait]
impl TextCompletion for GeminiClient {
    async fn complete(&self, request: &CompletionRequest) -> ClientResult<String> {
        let body = GeminiRequest {
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part::Text(request.system.clone())],
            }),
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part::Text(request.user.clone())],
            }],
            generation_config: GenerationConfig {
                response_mime_type: request.json_output.then_some("application/json"),
                max_output_tokens: request.max_output_tokens,
                temperature: request.temperature,
            },
        };

        let mut last_error = None;

        for model in &self.config.text_models {
            debug!("Attempting Gemini completion with model: {}", model);
            match self.generate_with_retry(model, &body).await {
                Ok(text) => {
                    info!(model = %model, chars = text.len(), "Gemini completion succeeded");
                    return Ok(text);
                }
                Err(e) => {
                    warn!("Failed with model {}: {}", model, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ClientError::request_failed("All Gemini models failed")))
    }
}

#[async_trait]
impl VisionCompletion for GeminiClient {
    async fn analyze_image(&self, request: &VisionRequest) -> ClientResult<String> {
        let image_part = match &request.image {
            ImageInput::Inline { mime_type, data } => Part::InlineData(Blob {
                mime_type: mime_type.clone(),
                data: data.clone(),
            }),
            ImageInput::Url { mime_type, url } => Part::FileData(FileRef {
                mime_type: mime_type.clone(),
                file_uri: url.clone(),
            }),
        };

        let body = GeminiRequest {
            system_instruction: None,
            contents: vec![Content {
                role: Some("user"),
                parts: vec![image_part, Part::Text(request.context.clone())],
            }],
            generation_config: GenerationConfig {
                response_mime_type: Some("application/json"),
                max_output_tokens: request.max_output_tokens,
                temperature: Some(0.2),
            },
        };

        self.generate_with_retry(&self.config.vision_model, &body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, models: &[&str]) -> GeminiClient {
        let config = AiClientConfig {
            api_key: "test-key".to_string(),
            base_url: server.uri(),
            text_models: models.iter().map(|m| m.to_string()).collect(),
            vision_model: "vision-model".to_string(),
            timeout: Duration::from_secs(5),
            max_retries: 1,
        };
        GeminiClient::new(config)
            .unwrap()
            .with_retry_policy(RetryPolicy::new(1).with_base_delay(Duration::from_millis(1)))
    }

    fn text_response(text: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": text}]}}]
        })
    }

    #[tokio::test]
    async fn test_complete_sends_system_instruction() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/model-a:generateContent"))
            .and(query_param("key", "test-key"))
            .and(body_partial_json(serde_json::json!({
                "systemInstruction": {"parts": [{"text": "be a strategist"}]},
                "generationConfig": {"responseMimeType": "application/json"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response("{\"ok\":true}")))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, &["model-a"]);
        let text = client
            .complete(&CompletionRequest::new("be a strategist", "sell a kettle"))
            .await
            .unwrap();
        assert_eq!(text, "{\"ok\":true}");
    }

    #[tokio::test]
    async fn test_falls_back_to_next_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/model-a:generateContent"))
            .respond_with(ResponseTemplate::new(400).set_body_string("model not found"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/model-b:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response("from b")))
            .mount(&server)
            .await;

        let client = client_for(&server, &["model-a", "model-b"]);
        let text = client
            .complete(&CompletionRequest::new("sys", "user"))
            .await
            .unwrap();
        assert_eq!(text, "from b");
    }

    #[tokio::test]
    async fn test_retries_server_errors_then_reports_last_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/model-a:generateContent"))
            .respond_with(ResponseTemplate::new(503))
            .expect(2)
            .mount(&server)
            .await;

        let client = client_for(&server, &["model-a"]);
        let err = client
            .complete(&CompletionRequest::new("sys", "user"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_empty_candidates_is_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"candidates": []})))
            .mount(&server)
            .await;

        let client = client_for(&server, &["model-a"]);
        let err = client
            .complete(&CompletionRequest::new("sys", "user"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::EmptyResponse(_)));
    }

    #[tokio::test]
    async fn test_vision_sends_inline_image() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/vision-model:generateContent"))
            .and(body_partial_json(serde_json::json!({
                "contents": [{"role": "user", "parts": [
                    {"inlineData": {"mimeType": "image/png", "data": "AAAA"}},
                    {"text": "judge this hook scene"}
                ]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response("{\"verdict\":\"premium\"}")))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, &["model-a"]);
        let request = VisionRequest::new(ImageInput::inline("image/png", "AAAA"), "judge this hook scene");
        let text = client.analyze_image(&request).await.unwrap();
        assert!(text.contains("premium"));
    }
}

//! Render service client.
//!
//! The render service turns a `VideoSpec` into pixels. Two entry points are
//! used: a single-scene still capture for the feedback loop and a full encode.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use reel_models::VideoSpec;

use crate::config::RenderClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::retry::RetryPolicy;

/// A captured still frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StillFrame {
    /// Base64 image data or a `data:` URL
    pub image_data: String,
}

/// Result of a full encode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedVideo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
}

/// External renderer collaborator.
#[async_trait]
pub trait SceneRenderer: Send + Sync {
    /// Capture one still frame of scene `scene_index`.
    async fn render_still(&self, spec: &VideoSpec, scene_index: usize) -> ClientResult<StillFrame>;

    /// Encode the whole specification into a finished video.
    async fn render_video(&self, spec: &VideoSpec) -> ClientResult<RenderedVideo>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StillRequest<'a> {
    spec: &'a VideoSpec,
    scene_index: usize,
    return_still_frame: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoRequest<'a> {
    spec: &'a VideoSpec,
}

/// Wire response shared by both endpoints: `{success, imageData?, error?, ...}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderResponse {
    success: bool,
    #[serde(default)]
    image_data: Option<String>,
    #[serde(default)]
    output_url: Option<String>,
    #[serde(default)]
    duration_secs: Option<f64>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
}

/// HTTP client for the render service.
pub struct HttpRenderClient {
    http: Client,
    config: RenderClientConfig,
    retry: RetryPolicy,
}

impl HttpRenderClient {
    pub fn new(config: RenderClientConfig) -> ClientResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ClientError::Network)?;

        let retry = RetryPolicy::new(config.max_retries);
        Ok(Self { http, config, retry })
    }

    pub fn from_env() -> ClientResult<Self> {
        Self::new(RenderClientConfig::from_env())
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Check if the render service is healthy.
    pub async fn health_check(&self) -> ClientResult<bool> {
        let url = format!("{}/health", self.config.base_url);

        match self.http.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                let health: HealthResponse = response.json().await?;
                Ok(health.status == "healthy" || health.status == "ok")
            }
            Ok(response) => {
                warn!("Render service health check failed: {}", response.status());
                Ok(false)
            }
            Err(e) => {
                warn!("Render service health check error: {}", e);
                Ok(false)
            }
        }
    }

    async fn post<B: Serialize + Sync>(&self, endpoint: &str, body: &B) -> ClientResult<RenderResponse> {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint);
        debug!("Sending render request to {}", url);

        let response = self
            .retry
            .run("render request", || async {
                let response = self
                    .http
                    .post(&url)
                    .json(body)
                    .send()
                    .await
                    .map_err(ClientError::Network)?;

                if !response.status().is_success() {
                    let status = response.status();
                    let text = response.text().await.unwrap_or_default();
                    return Err(ClientError::from_status("Render service", status, &text));
                }

                Ok(response)
            })
            .await?;

        let parsed: RenderResponse = response
            .json()
            .await
            .map_err(|e| ClientError::invalid_response(format!("Failed to parse render response: {}", e)))?;

        if !parsed.success {
            return Err(ClientError::request_failed(
                parsed.error.unwrap_or_else(|| "render failed".to_string()),
            ));
        }

        Ok(parsed)
    }
}

#[async_trait]
impl SceneRenderer for HttpRenderClient {
    async fn render_still(&self, spec: &VideoSpec, scene_index: usize) -> ClientResult<StillFrame> {
        if scene_index >= spec.scenes.len() {
            return Err(ClientError::request_failed(format!(
                "scene index {} out of range ({} scenes)",
                scene_index,
                spec.scenes.len()
            )));
        }

        let request = StillRequest {
            spec,
            scene_index,
            return_still_frame: true,
        };
        let response = self.post("/render/still", &request).await?;

        let image_data = response
            .image_data
            .filter(|d| !d.is_empty())
            .ok_or_else(|| ClientError::EmptyResponse("render service".to_string()))?;

        Ok(StillFrame { image_data })
    }

    async fn render_video(&self, spec: &VideoSpec) -> ClientResult<RenderedVideo> {
        let response = self.post("/render/video", &VideoRequest { spec }).await?;
        Ok(RenderedVideo {
            output_url: response.output_url,
            duration_secs: response.duration_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_models::{Scene, SceneType};
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> HttpRenderClient {
        let config = RenderClientConfig {
            base_url: server.uri(),
            timeout: Duration::from_secs(5),
            max_retries: 1,
        };
        HttpRenderClient::new(config)
            .unwrap()
            .with_retry_policy(RetryPolicy::new(1).with_base_delay(Duration::from_millis(1)))
    }

    fn spec() -> VideoSpec {
        VideoSpec::new(30, 1080, 1920, vec![Scene::new(SceneType::Hook, "Ship faster")])
    }

    #[tokio::test]
    async fn test_render_still() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/render/still"))
            .and(body_partial_json(serde_json::json!({"sceneIndex": 0, "returnStillFrame": true})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"success": true, "imageData": "AAAA"})),
            )
            .mount(&server)
            .await;

        let frame = client_for(&server).render_still(&spec(), 0).await.unwrap();
        assert_eq!(frame.image_data, "AAAA");
    }

    #[tokio::test]
    async fn test_render_failure_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/render/still"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"success": false, "error": "font missing"})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server).render_still(&spec(), 0).await.unwrap_err();
        assert!(err.to_string().contains("font missing"));
    }

    #[tokio::test]
    async fn test_out_of_range_scene_is_rejected_locally() {
        let server = MockServer::start().await;
        let err = client_for(&server).render_still(&spec(), 3).await.unwrap_err();
        assert!(matches!(err, ClientError::RequestFailed(_)));
    }

    #[tokio::test]
    async fn test_render_video() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/render/video"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "outputUrl": "https://cdn.example.com/out.mp4",
                "durationSecs": 3.0
            })))
            .mount(&server)
            .await;

        let video = client_for(&server).render_video(&spec()).await.unwrap();
        assert_eq!(video.output_url.as_deref(), Some("https://cdn.example.com/out.mp4"));
    }
}

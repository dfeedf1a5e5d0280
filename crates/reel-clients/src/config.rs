//! Collaborator client configuration.

use std::time::Duration;

use crate::error::{ClientError, ClientResult};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Configuration for the text and vision completion client.
#[derive(Debug, Clone)]
pub struct AiClientConfig {
    pub api_key: String,
    /// Base URL of the generative language API
    pub base_url: String,
    /// Text models, tried in order until one succeeds
    pub text_models: Vec<String>,
    pub vision_model: String,
    /// Request timeout
    pub timeout: Duration,
    /// Max retries per model
    pub max_retries: u32,
}

impl Default for AiClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            text_models: vec![
                "gemini-2.5-flash".to_string(),
                "gemini-2.5-flash-lite".to_string(),
                "gemini-2.5-pro".to_string(),
            ],
            vision_model: "gemini-2.5-flash".to_string(),
            timeout: Duration::from_secs(120),
            max_retries: 2,
        }
    }
}

impl AiClientConfig {
    /// Create config from environment variables.
    ///
    /// `GEMINI_API_KEY` is required.
    pub fn from_env() -> ClientResult<Self> {
        let defaults = Self::default();

        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ClientError::config("GEMINI_API_KEY not set"))?;

        let text_models = std::env::var("GEMINI_TEXT_MODELS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|m| m.trim().to_string())
                    .filter(|m| !m.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|models| !models.is_empty())
            .unwrap_or(defaults.text_models);

        Ok(Self {
            api_key,
            base_url: std::env::var("GEMINI_BASE_URL").unwrap_or(defaults.base_url),
            text_models,
            vision_model: std::env::var("GEMINI_VISION_MODEL").unwrap_or(defaults.vision_model),
            timeout: Duration::from_secs(
                std::env::var("AI_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120),
            ),
            max_retries: std::env::var("AI_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
        })
    }
}

/// Configuration for the render service client.
#[derive(Debug, Clone)]
pub struct RenderClientConfig {
    /// Base URL of the render service
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Max retries
    pub max_retries: u32,
}

impl Default for RenderClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3100".to_string(),
            timeout: Duration::from_secs(180), // full encodes are slow
            max_retries: 1,
        }
    }
}

impl RenderClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("RENDER_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:3100".to_string()),
            timeout: Duration::from_secs(
                std::env::var("RENDER_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(180),
            ),
            max_retries: std::env::var("RENDER_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = AiClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_GEMINI_BASE_URL);
        assert_eq!(config.text_models.len(), 3);

        let config = RenderClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:3100");
        assert_eq!(config.max_retries, 1);
    }
}

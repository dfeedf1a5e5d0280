//! Text and vision completion collaborator traits.

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::ClientResult;

/// One text-completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// System instruction for the stage
    pub system: String,
    /// User message, usually fixed instructions plus prior artifacts
    pub user: String,
    pub max_output_tokens: u32,
    /// Ask the provider for a JSON response body
    pub json_output: bool,
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            max_output_tokens: 4096,
            json_output: true,
            temperature: None,
        }
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Image handed to the vision collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImageInput {
    /// Base64-encoded bytes
    Inline { mime_type: String, data: String },
    Url { mime_type: String, url: String },
}

impl ImageInput {
    pub fn inline(mime_type: impl Into<String>, base64_data: impl Into<String>) -> Self {
        Self::Inline {
            mime_type: mime_type.into(),
            data: base64_data.into(),
        }
    }

    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self::Inline {
            mime_type: mime_type.into(),
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }

    /// Accepts either raw base64 or a `data:<mime>;base64,<data>` URL.
    pub fn from_render_output(image_data: &str) -> Self {
        if let Some(rest) = image_data.strip_prefix("data:") {
            if let Some((mime, data)) = rest.split_once(";base64,") {
                return Self::inline(mime, data);
            }
        }
        if image_data.starts_with("http://") || image_data.starts_with("https://") {
            return Self::Url {
                mime_type: "image/png".to_string(),
                url: image_data.to_string(),
            };
        }
        Self::inline("image/png", image_data)
    }
}

/// One vision-completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisionRequest {
    pub image: ImageInput,
    /// Instructions plus scene-type context
    pub context: String,
    pub max_output_tokens: u32,
}

impl VisionRequest {
    pub fn new(image: ImageInput, context: impl Into<String>) -> Self {
        Self {
            image,
            context: context.into(),
            max_output_tokens: 1024,
        }
    }
}

/// External text-completion service.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    /// Complete the request and return the raw text blob.
    async fn complete(&self, request: &CompletionRequest) -> ClientResult<String>;
}

/// External vision-completion service.
#[async_trait]
pub trait VisionCompletion: Send + Sync {
    /// Describe or judge the image and return the raw text blob.
    async fn analyze_image(&self, request: &VisionRequest) -> ClientResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_input_from_data_url() {
        let input = ImageInput::from_render_output("data:image/jpeg;base64,AAAA");
        assert_eq!(input, ImageInput::inline("image/jpeg", "AAAA"));

        let input = ImageInput::from_render_output("iVBORw0KGgo=");
        assert_eq!(input, ImageInput::inline("image/png", "iVBORw0KGgo="));

        let input = ImageInput::from_bytes("image/png", b"png");
        assert_eq!(input, ImageInput::inline("image/png", "cG5n"));
    }
}

//! Caller-supplied generation input.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default output width (vertical 9:16).
pub const DEFAULT_WIDTH: u32 = 1080;
/// Default output height (vertical 9:16).
pub const DEFAULT_HEIGHT: u32 = 1920;
/// Default frame rate.
pub const DEFAULT_FPS: u32 = 30;

/// What a provided image most likely shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ImageKind {
    /// Packshot or product photo
    Product,
    /// App or web UI capture
    Screenshot,
    /// Brand mark
    Logo,
    /// Product in use, people, environments
    Lifestyle,
    /// Portrait or testimonial photo
    Person,
    #[default]
    #[serde(other)]
    Other,
}

impl ImageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageKind::Product => "product",
            ImageKind::Screenshot => "screenshot",
            ImageKind::Logo => "logo",
            ImageKind::Lifestyle => "lifestyle",
            ImageKind::Person => "person",
            ImageKind::Other => "other",
        }
    }
}

/// An image the caller uploaded and that scenes may reference by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProvidedImage {
    pub id: String,
    #[serde(default, alias = "type")]
    pub inferred_type: ImageKind,
    #[serde(default)]
    pub description: Option<String>,
}

/// Everything the orchestrator needs to produce a specification.
///
/// Immutable once a job starts; stages only ever borrow it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PipelineInput {
    /// Free-text product description
    pub prompt: String,
    #[serde(default)]
    pub product_type: Option<String>,
    #[serde(default)]
    pub audience: Option<String>,
    #[serde(default)]
    pub tone: Option<String>,
    /// BCP-47 style language hint ("en", "de", ...)
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub images: Vec<ProvidedImage>,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_fps")]
    pub fps: u32,
}

fn default_width() -> u32 {
    DEFAULT_WIDTH
}

fn default_height() -> u32 {
    DEFAULT_HEIGHT
}

fn default_fps() -> u32 {
    DEFAULT_FPS
}

impl PipelineInput {
    /// Create an input with only a prompt and default frame settings.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            product_type: None,
            audience: None,
            tone: None,
            language: None,
            images: Vec::new(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            fps: DEFAULT_FPS,
        }
    }

    pub fn with_images(mut self, images: Vec<ProvidedImage>) -> Self {
        self.images = images;
        self
    }

    pub fn with_tone(mut self, tone: impl Into<String>) -> Self {
        self.tone = Some(tone.into());
        self
    }

    /// Look up a provided image by id.
    pub fn image(&self, id: &str) -> Option<&ProvidedImage> {
        self.images.iter().find(|img| img.id == id)
    }

    /// Check whether an image id was provided by the caller.
    pub fn has_image(&self, id: &str) -> bool {
        self.image(id).is_some()
    }
}

//! Clients for the external collaborators of the generation pipeline.
//!
//! This crate provides:
//! - `TextCompletion` / `VisionCompletion` traits and a Gemini implementation
//! - `SceneRenderer` trait and an HTTP render-service client
//! - A single utility for parsing JSON out of model text output

pub mod completion;
pub mod config;
pub mod error;
pub mod gemini;
pub mod render;
pub mod retry;
pub mod structured;

pub use completion::{CompletionRequest, ImageInput, TextCompletion, VisionCompletion, VisionRequest};
pub use config::{AiClientConfig, RenderClientConfig};
pub use error::{ClientError, ClientResult};
pub use gemini::GeminiClient;
pub use render::{HttpRenderClient, RenderedVideo, SceneRenderer, StillFrame};
pub use retry::RetryPolicy;
pub use structured::{parse_json_value, parse_structured, strip_code_fences, StructuredOutputError};

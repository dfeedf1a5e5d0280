//! Shared data models for the PromoReel generation pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Caller input and provided images
//! - Strategist and art-director artifacts
//! - The renderable video specification (scenes, beats, image references)
//! - Vision critiques and correction results
//! - Job state and progress events

pub mod critique;
pub mod input;
pub mod job;
pub mod progress;
pub mod spec;
pub mod strategy;

// Re-export common types
pub use critique::{CorrectionResult, Critique, Verdict};
pub use input::{ImageKind, PipelineInput, ProvidedImage};
pub use job::{HistoryEntry, JobId, JobRecord, JobStage, JobStatus};
pub use progress::ProgressEvent;
pub use spec::{
    Accent, Background, BackgroundFill, Beat, ImageAnimation, ImagePlacement, ImageRef, ImageRole,
    LayoutTag, Motion, Position, Scene, SceneElement, SceneType, Texture, Transition, Typography,
    VideoSpec,
};
pub use strategy::{ArtDirection, MarketingStrategy, Palette, Shot};

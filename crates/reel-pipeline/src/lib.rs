//! Generation pipeline for short marketing videos.
//!
//! - [`catalog`] / [`validation`]: closed vocabularies, checks and auto-repair
//! - [`orchestrator`]: strategist -> art director -> executor
//! - [`correction`], [`critique`], [`fallback`], [`feedback`]: the visual
//!   feedback loop
//! - [`service`]: job-bound entry point used by the API

pub mod catalog;
pub mod config;
pub mod correction;
pub mod critique;
pub mod error;
pub mod fallback;
pub mod feedback;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod prompts;
pub mod service;
pub mod validation;

pub use config::{PipelineConfig, RefinementConfig, MAX_REFINEMENT_ITERATIONS};
pub use correction::CorrectionEngine;
pub use critique::{parse_critique, SceneCritic};
pub use error::{PipelineError, PipelineResult, PipelineStage, PipelineStageError};
pub use fallback::fallback_scene;
pub use feedback::{FeedbackLoop, FinalVerdict, RefinementSummary, SceneOutcome, SceneRefinement};
pub use logging::JobLogger;
pub use orchestrator::{PipelineOrchestrator, PipelineOutput};
pub use service::{GenerateRequest, GenerationOutput, GenerationService};
pub use validation::{
    check_image_references, repair_scene_defaults, validate, validate_and_fix_output, ValidationReport,
};

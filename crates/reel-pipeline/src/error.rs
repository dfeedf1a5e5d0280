//! Pipeline error types.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use reel_clients::{ClientError, StructuredOutputError};
use reel_progress::ProgressError;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Raw model output attached to errors is cut to this many characters.
pub const MAX_RAW_OUTPUT_CHARS: usize = 2000;

/// A generating stage of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Strategist,
    ArtDirector,
    Executor,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Strategist => "strategist",
            PipelineStage::ArtDirector => "art_director",
            PipelineStage::Executor => "executor",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fatal failure of one pipeline stage.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{stage} stage failed: {message}")]
pub struct PipelineStageError {
    pub stage: PipelineStage,
    pub message: String,
    /// Model output that could not be used, truncated
    pub raw_output: Option<String>,
}

impl PipelineStageError {
    pub fn new(stage: PipelineStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            raw_output: None,
        }
    }

    pub fn with_raw_output(mut self, raw: &str) -> Self {
        self.raw_output = Some(truncate_raw(raw));
        self
    }

    /// The collaborator call itself failed.
    pub fn from_client(stage: PipelineStage, err: &ClientError) -> Self {
        Self::new(stage, format!("completion failed: {}", err))
    }

    /// The response could not be parsed.
    pub fn from_parse(stage: PipelineStage, err: &StructuredOutputError) -> Self {
        let stage_error = Self::new(stage, err.to_string());
        match err.raw_output() {
            Some(raw) => stage_error.with_raw_output(raw),
            None => stage_error,
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Stage(#[from] PipelineStageError),

    #[error("Validation failed: {}", errors.join("; "))]
    Validation { errors: Vec<String> },

    #[error("Render failed: {0}")]
    Render(String),

    #[error("Progress error: {0}")]
    Progress(#[from] ProgressError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn stage_failed(stage: PipelineStage, msg: impl Into<String>) -> Self {
        Self::Stage(PipelineStageError::new(stage, msg))
    }

    pub fn validation(errors: Vec<String>) -> Self {
        Self::Validation { errors }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Check if the caller's request was at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PipelineError::InvalidInput(_) | PipelineError::Validation { .. }
        )
    }
}

/// Cut `raw` to [`MAX_RAW_OUTPUT_CHARS`] characters on a char boundary.
pub fn truncate_raw(raw: &str) -> String {
    match raw.char_indices().nth(MAX_RAW_OUTPUT_CHARS) {
        Some((idx, _)) => format!("{}…[truncated]", &raw[..idx]),
        None => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_raw() {
        assert_eq!(truncate_raw("short"), "short");

        let long = "é".repeat(MAX_RAW_OUTPUT_CHARS + 10);
        let cut = truncate_raw(&long);
        assert!(cut.ends_with("[truncated]"));
        assert_eq!(cut.chars().filter(|c| *c == 'é').count(), MAX_RAW_OUTPUT_CHARS);
    }

    #[test]
    fn test_stage_error_from_parse_keeps_raw() {
        let err = StructuredOutputError::InvalidJson {
            message: "expected value".into(),
            raw: "not json".into(),
        };
        let stage_error = PipelineStageError::from_parse(PipelineStage::ArtDirector, &err);
        assert_eq!(stage_error.stage, PipelineStage::ArtDirector);
        assert_eq!(stage_error.raw_output.as_deref(), Some("not json"));
        assert!(stage_error.to_string().starts_with("art_director stage failed"));
    }

    #[test]
    fn test_client_error_classification() {
        assert!(PipelineError::invalid_input("prompt is required").is_client_error());
        assert!(PipelineError::validation(vec!["x".into()]).is_client_error());
        assert!(!PipelineError::stage_failed(PipelineStage::Executor, "bad").is_client_error());
    }
}

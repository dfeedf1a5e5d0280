//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use reel_pipeline::PipelineError;
use reel_progress::ProgressError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Progress(#[from] ProgressError),
}

impl ApiError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Pipeline(e) => match e {
                PipelineError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                PipelineError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                PipelineError::Stage(_) | PipelineError::Render(_) => StatusCode::BAD_GATEWAY,
                PipelineError::Progress(ProgressError::JobNotFound(_)) => StatusCode::NOT_FOUND,
                PipelineError::Progress(ProgressError::DuplicateJob(_)) => StatusCode::CONFLICT,
                PipelineError::Progress(_) | PipelineError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Progress(ProgressError::JobNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Progress(ProgressError::DuplicateJob(_)) => StatusCode::CONFLICT,
            ApiError::Progress(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Conflict(_) => "conflict",
            ApiError::RateLimited => "rate_limited",
            ApiError::Internal(_) => "internal",
            ApiError::Pipeline(PipelineError::InvalidInput(_)) => "invalid_input",
            ApiError::Pipeline(PipelineError::Stage(_)) => "stage_failed",
            ApiError::Pipeline(PipelineError::Validation { .. }) => "validation_failed",
            ApiError::Pipeline(PipelineError::Render(_)) => "render_failed",
            ApiError::Pipeline(_) | ApiError::Progress(_) => match self.status_code() {
                StatusCode::NOT_FOUND => "not_found",
                StatusCode::CONFLICT => "conflict",
                _ => "internal",
            },
        }
    }

    fn is_internal(&self) -> bool {
        self.status_code() == StatusCode::INTERNAL_SERVER_ERROR
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_output: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Don't expose internal error details in production
        let detail = if self.is_internal()
            && std::env::var("ENVIRONMENT").unwrap_or_default() == "production"
        {
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };

        let mut body = ErrorResponse {
            detail,
            code: Some(self.code().to_string()),
            stage: None,
            raw_output: None,
            errors: Vec::new(),
        };
        match self {
            ApiError::Pipeline(PipelineError::Stage(e)) => {
                body.stage = Some(e.stage.as_str().to_string());
                body.raw_output = e.raw_output;
            }
            ApiError::Pipeline(PipelineError::Validation { errors }) => body.errors = errors,
            _ => {}
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_models::JobId;
    use reel_pipeline::PipelineStage;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(PipelineError::invalid_input("prompt is required")).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(PipelineError::stage_failed(PipelineStage::Executor, "bad json")).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::from(PipelineError::validation(vec!["scene 0: image 'x'".into()])).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::from(ProgressError::JobNotFound(JobId::from("nope"))).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(PipelineError::Progress(ProgressError::DuplicateJob(JobId::from("a")))).status_code(),
            StatusCode::CONFLICT
        );
    }
}

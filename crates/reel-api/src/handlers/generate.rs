//! Generation and render handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use reel_clients::RenderedVideo;
use reel_models::{JobId, JobStatus, PipelineInput, ProvidedImage, VideoSpec};
use reel_pipeline::{GenerateRequest, GenerationOutput};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::security::{is_valid_job_id, sanitize_input};
use crate::state::AppState;

/// Body of `POST /api/generate` and `POST /api/jobs`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateBody {
    #[serde(flatten)]
    pub input: PipelineInput,
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default, alias = "enableRefinement")]
    pub refine: Option<bool>,
    #[serde(default)]
    pub max_iterations: Option<u32>,
}

impl GenerateBody {
    fn into_request(self) -> ApiResult<GenerateRequest> {
        let job_id = match self.job_id {
            Some(id) if !is_valid_job_id(&id) => {
                return Err(ApiError::bad_request(
                    "jobId may only contain letters, digits, '-' and '_' (max 128)",
                ))
            }
            other => other.map(JobId::from),
        };

        Ok(GenerateRequest {
            input: sanitize_input(self.input),
            job_id,
            refine: self.refine,
            max_iterations: self.max_iterations,
        })
    }
}

fn parse_body(body: Result<Json<GenerateBody>, JsonRejection>) -> ApiResult<GenerateRequest> {
    match body {
        Ok(Json(body)) => body.into_request(),
        Err(rejection) => Err(ApiError::bad_request(rejection.body_text())),
    }
}

/// Run a generation and wait for the result.
pub async fn generate(
    State(state): State<AppState>,
    body: Result<Json<GenerateBody>, JsonRejection>,
) -> ApiResult<Json<GenerationOutput>> {
    let request = parse_body(body)?;
    metrics::record_job_started("sync");

    let output = state.service.generate(request).await?;
    info!(job_id = %output.job_id, scenes = output.spec.scenes.len(), "Generation served");
    Ok(Json(output))
}

/// Response of `POST /api/jobs`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobCreatedResponse {
    pub job_id: JobId,
    pub status: JobStatus,
    pub status_url: String,
    pub stream_url: String,
    pub ws_url: String,
}

/// Start a generation in the background.
pub async fn create_job(
    State(state): State<AppState>,
    body: Result<Json<GenerateBody>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<JobCreatedResponse>)> {
    let request = parse_body(body)?;
    let job_id = state.service.start(&request)?;
    metrics::record_job_started("async");

    let service = state.service.clone();
    let id = job_id.clone();
    tokio::spawn(async move {
        // outcome is recorded on the job itself
        if let Err(e) = service.run(id.clone(), request).await {
            warn!(job_id = %id, "Background generation failed: {}", e);
        }
    });

    info!(job_id = %job_id, "Generation job accepted");
    Ok((
        StatusCode::ACCEPTED,
        Json(JobCreatedResponse {
            status_url: format!("/api/jobs/{}", job_id),
            stream_url: format!("/api/jobs/{}/stream", job_id),
            ws_url: format!("/ws/jobs/{}", job_id),
            status: JobStatus::Pending,
            job_id,
        }),
    ))
}

/// Body of `POST /api/render`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderBody {
    pub spec: VideoSpec,
    #[serde(default)]
    pub images: Vec<ProvidedImage>,
}

/// Validate a specification and hand it to the renderer's encode path.
pub async fn render(
    State(state): State<AppState>,
    body: Result<Json<RenderBody>, JsonRejection>,
) -> ApiResult<Json<RenderedVideo>> {
    let Json(body) = body.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    let video = state.service.render(&body.spec, &body.images).await?;
    Ok(Json(video))
}

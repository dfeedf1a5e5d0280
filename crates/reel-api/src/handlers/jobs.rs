//! Job status and history handlers.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use reel_models::{HistoryEntry, JobId, JobRecord, JobStage, JobStatus};

use crate::error::{ApiError, ApiResult};
use crate::security::is_valid_job_id;
use crate::state::AppState;

/// Snapshot of one job.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusResponse {
    pub job_id: JobId,
    #[serde(flatten)]
    pub stage: JobStage,
    pub progress: u8,
    pub status: JobStatus,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub event_seq: u64,
}

impl From<JobRecord> for JobStatusResponse {
    fn from(record: JobRecord) -> Self {
        Self {
            message: record.history.last().map(|e| e.message.clone()),
            job_id: record.id,
            stage: record.stage,
            progress: record.progress,
            status: record.status,
            error: record.error,
            created_at: record.created_at,
            updated_at: record.updated_at,
            event_seq: record.event_seq,
        }
    }
}

pub(crate) fn lookup(state: &AppState, job_id: &str) -> ApiResult<JobRecord> {
    if !is_valid_job_id(job_id) {
        return Err(ApiError::bad_request("Invalid job id"));
    }
    state
        .registry
        .get(&JobId::from(job_id))
        .ok_or_else(|| ApiError::not_found(format!("job '{}'", job_id)))
}

/// Current state of a job.
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobStatusResponse>> {
    Ok(Json(lookup(&state, &job_id)?.into()))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Only entries with a greater sequence number
    #[serde(default)]
    pub since: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub job_id: JobId,
    pub status: JobStatus,
    pub event_seq: u64,
    pub entries: Vec<HistoryEntry>,
}

/// Stage history of a job, optionally after a known sequence number.
pub async fn get_history(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<HistoryResponse>> {
    let record = lookup(&state, &job_id)?;
    let entries = record.history_since(query.since.unwrap_or(0)).to_vec();

    Ok(Json(HistoryResponse {
        job_id: record.id,
        status: record.status,
        event_seq: record.event_seq,
        entries,
    }))
}

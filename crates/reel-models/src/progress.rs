//! Progress events pushed to stream subscribers.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::job::{HistoryEntry, JobId, JobRecord, JobStage, JobStatus};

/// One progress message, as sent over SSE/WebSocket/Redis.
///
/// Wire shape: `{jobId, stage, iteration?, progress, message, status, timestamp, seq}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub job_id: JobId,
    #[serde(flatten)]
    pub stage: JobStage,
    pub progress: u8,
    pub message: String,
    pub status: JobStatus,
    pub timestamp: DateTime<Utc>,
    pub seq: u64,
}

impl ProgressEvent {
    /// Event for a freshly recorded history entry.
    pub fn from_entry(job_id: &JobId, entry: &HistoryEntry) -> Self {
        Self {
            job_id: job_id.clone(),
            stage: entry.stage,
            progress: entry.progress,
            message: entry.message.clone(),
            status: entry.stage.status(),
            timestamp: entry.timestamp,
            seq: entry.seq,
        }
    }

    /// Event describing the current state of a job, for late subscribers.
    pub fn snapshot(record: &JobRecord) -> Self {
        let message = record
            .history
            .last()
            .map(|e| e.message.clone())
            .unwrap_or_else(|| "Job created".to_string());
        Self {
            job_id: record.id.clone(),
            stage: record.stage,
            progress: record.progress,
            message,
            status: record.status,
            timestamp: record.updated_at,
            seq: record.event_seq,
        }
    }

    /// True once no further events will follow for the job.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_shape() {
        let mut record = JobRecord::new(JobId::from("job-42"));
        let entry = record
            .apply(JobStage::VisionAnalysis(1), "Reviewing hook scene")
            .unwrap();
        let event = ProgressEvent::from_entry(&record.id, &entry);

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["jobId"], "job-42");
        assert_eq!(json["stage"], "vision_analysis");
        assert_eq!(json["iteration"], 1);
        assert_eq!(json["progress"], 60);
        assert_eq!(json["status"], "running");
        assert!(json.get("timestamp").is_some());

        let back: ProgressEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_snapshot_of_new_job() {
        let record = JobRecord::new(JobId::from("job-1"));
        let event = ProgressEvent::snapshot(&record);
        assert_eq!(event.stage, JobStage::Idle);
        assert_eq!(event.status, JobStatus::Pending);
        assert!(!event.is_terminal());
    }
}

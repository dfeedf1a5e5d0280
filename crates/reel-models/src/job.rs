//! Job state machine types.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Named stage of a generation job.
///
/// Serialized as `{"stage": "vision_analysis", "iteration": 2}`; stages
/// without an iteration omit the second key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "stage", content = "iteration", rename_all = "snake_case")]
pub enum JobStage {
    Idle,
    Initializing,
    Analyzing,
    GeneratingPlan,
    PlanComplete,
    RenderingFrames,
    VisionAnalysis(u32),
    ApplyingFixes(u32),
    Finalizing,
    Complete,
    Error,
}

impl JobStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStage::Idle => "idle",
            JobStage::Initializing => "initializing",
            JobStage::Analyzing => "analyzing",
            JobStage::GeneratingPlan => "generating_plan",
            JobStage::PlanComplete => "plan_complete",
            JobStage::RenderingFrames => "rendering_frames",
            JobStage::VisionAnalysis(_) => "vision_analysis",
            JobStage::ApplyingFixes(_) => "applying_fixes",
            JobStage::Finalizing => "finalizing",
            JobStage::Complete => "complete",
            JobStage::Error => "error",
        }
    }

    /// Feedback-loop iteration carried by the stage, if any.
    pub fn iteration(&self) -> Option<u32> {
        match self {
            JobStage::VisionAnalysis(i) | JobStage::ApplyingFixes(i) => Some(*i),
            _ => None,
        }
    }

    /// Fixed progress checkpoint for the stage.
    ///
    /// `Error` has none: a failed job keeps the progress it had reached.
    pub fn checkpoint(&self) -> Option<u8> {
        let value = match self {
            JobStage::Idle => 0,
            JobStage::Initializing => 5,
            JobStage::Analyzing => 15,
            JobStage::GeneratingPlan => 30,
            JobStage::PlanComplete => 50,
            JobStage::RenderingFrames => 55,
            JobStage::VisionAnalysis(i) => 60 + 10 * ((*i).clamp(1, 3) - 1) as u8,
            JobStage::ApplyingFixes(i) => 65 + 10 * ((*i).clamp(1, 3) - 1) as u8,
            JobStage::Finalizing => 95,
            JobStage::Complete => 100,
            JobStage::Error => return None,
        };
        Some(value)
    }

    /// Status a job is in once it reaches this stage.
    pub fn status(&self) -> JobStatus {
        match self {
            JobStage::Idle => JobStatus::Pending,
            JobStage::Complete => JobStatus::Complete,
            JobStage::Error => JobStatus::Error,
            _ => JobStatus::Running,
        }
    }
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.iteration() {
            Some(i) => write!(f, "{}({})", self.as_str(), i),
            None => write!(f, "{}", self.as_str()),
        }
    }
}

/// Coarse job status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Pending,
    Running,
    Complete,
    Error,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Complete => "complete",
            JobStatus::Error => "error",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Error)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry of a job's stage history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Sequence number, strictly increasing within a job
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub stage: JobStage,
    pub progress: u8,
    pub message: String,
}

/// Tracked state of one generation job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub id: JobId,
    #[serde(flatten)]
    pub stage: JobStage,
    pub progress: u8,
    pub status: JobStatus,
    pub history: Vec<HistoryEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub event_seq: u64,
}

impl JobRecord {
    /// Create a new idle job.
    pub fn new(id: JobId) -> Self {
        let now = Utc::now();
        Self {
            id,
            stage: JobStage::Idle,
            progress: 0,
            status: JobStatus::Pending,
            history: Vec::new(),
            error: None,
            created_at: now,
            updated_at: now,
            event_seq: 0,
        }
    }

    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Move the job to `stage` and record `message`.
    ///
    /// Progress never decreases: it becomes the larger of the current value
    /// and the stage checkpoint. Returns `None` once the job is terminal.
    pub fn apply(&mut self, stage: JobStage, message: impl Into<String>) -> Option<HistoryEntry> {
        if self.is_terminal() {
            return None;
        }

        let message = message.into();
        let now = Utc::now();
        if let Some(checkpoint) = stage.checkpoint() {
            self.progress = self.progress.max(checkpoint);
        }
        self.stage = stage;
        self.status = stage.status();
        if stage == JobStage::Error {
            self.error = Some(message.clone());
        }
        self.updated_at = now;
        self.event_seq += 1;

        let entry = HistoryEntry {
            seq: self.event_seq,
            timestamp: now,
            stage,
            progress: self.progress,
            message,
        };
        self.history.push(entry.clone());
        Some(entry)
    }

    /// History entries with a sequence number greater than `seq`.
    pub fn history_since(&self, seq: u64) -> &[HistoryEntry] {
        let start = self.history.partition_point(|e| e.seq <= seq);
        &self.history[start..]
    }
}

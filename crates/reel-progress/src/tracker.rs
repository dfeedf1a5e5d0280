//! Job-scoped progress handle.

use tracing::warn;

use reel_models::{JobId, JobStage};

use crate::registry::JobRegistry;

/// Emits stage transitions for one job.
///
/// A detached tracker (no job associated with the call) accepts every call
/// and does nothing, so pipeline code never branches on whether a job exists.
#[derive(Clone)]
pub struct ProgressTracker {
    target: Option<(JobRegistry, JobId)>,
}

impl ProgressTracker {
    pub fn new(registry: JobRegistry, job_id: JobId) -> Self {
        Self {
            target: Some((registry, job_id)),
        }
    }

    pub fn detached() -> Self {
        Self { target: None }
    }

    pub fn job_id(&self) -> Option<&JobId> {
        self.target.as_ref().map(|(_, id)| id)
    }

    /// Record a transition. Registry errors are logged, never propagated:
    /// losing a progress line must not fail the generation.
    pub fn stage(&self, stage: JobStage, message: impl Into<String>) {
        let Some((registry, job_id)) = &self.target else {
            return;
        };
        if let Err(e) = registry.transition(job_id, stage, message) {
            warn!(job_id = %job_id, stage = %stage, "Failed to record progress: {}", e);
        }
    }

    pub fn initializing(&self, message: impl Into<String>) {
        self.stage(JobStage::Initializing, message)
    }

    pub fn analyzing(&self, message: impl Into<String>) {
        self.stage(JobStage::Analyzing, message)
    }

    pub fn generating_plan(&self, message: impl Into<String>) {
        self.stage(JobStage::GeneratingPlan, message)
    }

    pub fn plan_complete(&self, message: impl Into<String>) {
        self.stage(JobStage::PlanComplete, message)
    }

    pub fn rendering_frames(&self, message: impl Into<String>) {
        self.stage(JobStage::RenderingFrames, message)
    }

    pub fn vision_analysis(&self, iteration: u32, message: impl Into<String>) {
        self.stage(JobStage::VisionAnalysis(iteration), message)
    }

    pub fn applying_fixes(&self, iteration: u32, message: impl Into<String>) {
        self.stage(JobStage::ApplyingFixes(iteration), message)
    }

    pub fn finalizing(&self, message: impl Into<String>) {
        self.stage(JobStage::Finalizing, message)
    }

    pub fn complete(&self, message: impl Into<String>) {
        self.stage(JobStage::Complete, message)
    }

    pub fn fail(&self, message: impl Into<String>) {
        self.stage(JobStage::Error, message)
    }
}

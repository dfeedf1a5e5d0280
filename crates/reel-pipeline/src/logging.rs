//! Structured job logging utilities.

use std::time::Duration;

use tracing::{error, info, warn, Span};

use reel_models::JobId;

/// Job logger with consistent job id / operation fields.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    operation: String,
}

impl JobLogger {
    pub fn new(job_id: &JobId, operation: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            operation: operation.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str, elapsed: Duration) {
        error!(
            job_id = %self.job_id,
            operation = %self.operation,
            duration_ms = elapsed.as_millis() as u64,
            "Job failed: {}", message
        );
    }

    pub fn log_completion(&self, message: &str, elapsed: Duration) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            duration_ms = elapsed.as_millis() as u64,
            "Job completed: {}", message
        );
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Span attached to everything a generation does.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "job",
            job_id = %self.job_id,
            operation = %self.operation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_logger_creation() {
        let job_id = JobId::new();
        let logger = JobLogger::new(&job_id, "generate");

        assert_eq!(logger.job_id(), job_id.to_string());
        assert_eq!(logger.operation(), "generate");
    }
}

//! In-process job registry.
//!
//! One map keyed by job id; each entry owns the job record and the broadcast
//! sender of its event bus. All mutation goes through the registry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{debug, info};

use reel_models::{JobId, JobRecord, JobStage, ProgressEvent};

use crate::error::{ProgressError, ProgressResult};
use crate::mirror::RedisProgressMirror;

/// Events buffered per job before slow subscribers start lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

struct JobEntry {
    record: JobRecord,
    events: broadcast::Sender<ProgressEvent>,
}

/// Registry of job state machines and their event buses.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct JobRegistry {
    jobs: Arc<RwLock<HashMap<JobId, JobEntry>>>,
    channel_capacity: usize,
    mirror: Option<RedisProgressMirror>,
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl JobRegistry {
    pub fn new() -> Self {
        Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            mirror: None,
        }
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Also publish every event to Redis.
    pub fn with_mirror(mut self, mirror: RedisProgressMirror) -> Self {
        self.mirror = Some(mirror);
        self
    }

    /// Create a job with the caller's id or a generated one.
    pub fn create(&self, job_id: Option<JobId>) -> ProgressResult<JobRecord> {
        let job_id = job_id.unwrap_or_default();
        let mut jobs = self.jobs.write();

        if jobs.contains_key(&job_id) {
            return Err(ProgressError::DuplicateJob(job_id));
        }

        let record = JobRecord::new(job_id.clone());
        let (events, _) = broadcast::channel(self.channel_capacity);
        jobs.insert(
            job_id.clone(),
            JobEntry {
                record: record.clone(),
                events,
            },
        );

        debug!(job_id = %job_id, "Job created");
        Ok(record)
    }

    /// Snapshot of a job.
    pub fn get(&self, job_id: &JobId) -> Option<JobRecord> {
        self.jobs.read().get(job_id).map(|e| e.record.clone())
    }

    pub fn contains(&self, job_id: &JobId) -> bool {
        self.jobs.read().contains_key(job_id)
    }

    pub fn len(&self) -> usize {
        self.jobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.read().is_empty()
    }

    /// Number of live subscribers on a job's bus.
    pub fn subscriber_count(&self, job_id: &JobId) -> usize {
        self.jobs
            .read()
            .get(job_id)
            .map_or(0, |e| e.events.receiver_count())
    }

    /// Subscribe to a job's bus.
    ///
    /// The snapshot and the receiver are taken under the same lock, so the
    /// receiver sees exactly the events with `seq > snapshot.event_seq`.
    pub fn subscribe(
        &self,
        job_id: &JobId,
    ) -> ProgressResult<(JobRecord, broadcast::Receiver<ProgressEvent>)> {
        let jobs = self.jobs.read();
        let entry = jobs
            .get(job_id)
            .ok_or_else(|| ProgressError::JobNotFound(job_id.clone()))?;
        Ok((entry.record.clone(), entry.events.subscribe()))
    }

    /// Move a job to `stage`.
    ///
    /// Returns the emitted event, or `None` if the job was already terminal.
    pub fn transition(
        &self,
        job_id: &JobId,
        stage: JobStage,
        message: impl Into<String>,
    ) -> ProgressResult<Option<ProgressEvent>> {
        let event = {
            let mut jobs = self.jobs.write();
            let entry = jobs
                .get_mut(job_id)
                .ok_or_else(|| ProgressError::JobNotFound(job_id.clone()))?;

            let Some(history_entry) = entry.record.apply(stage, message) else {
                debug!(job_id = %job_id, stage = %stage, "Ignoring transition on terminal job");
                return Ok(None);
            };

            let event = ProgressEvent::from_entry(job_id, &history_entry);
            // no subscribers is fine
            let _ = entry.events.send(event.clone());
            event
        };

        if let Some(mirror) = &self.mirror {
            mirror.publish_detached(event.clone());
        }

        Ok(Some(event))
    }

    /// Mark a job complete.
    pub fn complete(
        &self,
        job_id: &JobId,
        message: impl Into<String>,
    ) -> ProgressResult<Option<ProgressEvent>> {
        self.transition(job_id, JobStage::Complete, message)
    }

    /// Mark a job failed.
    pub fn fail(
        &self,
        job_id: &JobId,
        message: impl Into<String>,
    ) -> ProgressResult<Option<ProgressEvent>> {
        self.transition(job_id, JobStage::Error, message)
    }

    /// Remove a job. Open subscriber streams end once the bus is dropped.
    pub fn evict(&self, job_id: &JobId) -> Option<JobRecord> {
        let removed = self.jobs.write().remove(job_id).map(|e| e.record);
        if removed.is_some() {
            debug!(job_id = %job_id, "Job evicted");
        }
        removed
    }

    /// Evict terminal jobs idle for at least `retention` with no subscribers.
    pub fn reap(&self, retention: Duration) -> Vec<JobId> {
        let now = Utc::now();
        let mut jobs = self.jobs.write();

        let expired: Vec<JobId> = jobs
            .iter()
            .filter(|(_, entry)| {
                entry.record.is_terminal()
                    && entry.events.receiver_count() == 0
                    && (now - entry.record.updated_at)
                        .to_std()
                        .map_or(false, |age| age >= retention)
            })
            .map(|(id, _)| id.clone())
            .collect();

        for id in &expired {
            jobs.remove(id);
        }

        if !expired.is_empty() {
            info!(count = expired.len(), remaining = jobs.len(), "Reaped finished jobs");
        }
        expired
    }
}

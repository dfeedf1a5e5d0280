//! Background eviction of finished jobs.
//!
//! A job stays queryable for the retention period after it reaches a
//! terminal state. Jobs with an attached stream subscriber are kept until
//! the subscriber leaves.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use reel_progress::JobRegistry;

use crate::config::ApiConfig;
use crate::metrics;

pub struct JobReaper {
    registry: JobRegistry,
    retention: Duration,
    every: Duration,
}

impl JobReaper {
    pub fn new(registry: JobRegistry, retention: Duration, every: Duration) -> Self {
        Self {
            registry,
            retention,
            every: every.max(Duration::from_secs(1)),
        }
    }

    pub fn from_config(registry: JobRegistry, config: &ApiConfig) -> Self {
        Self::new(registry, config.job_retention, config.job_reap_interval)
    }

    /// Run a single reap pass. Returns how many jobs were evicted.
    pub fn reap_once(&self) -> usize {
        let reaped = self.registry.reap(self.retention);
        let remaining = self.registry.len();
        metrics::record_jobs_reaped(reaped.len(), remaining);
        if !reaped.is_empty() {
            debug!(jobs = ?reaped, "Evicted finished jobs");
        }
        reaped.len()
    }

    /// Reap forever. Meant to be spawned.
    pub async fn run(self) {
        info!(
            "Starting job reaper (retention: {:?}, interval: {:?})",
            self.retention, self.every
        );

        let mut ticker = interval(self.every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            self.reap_once();
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reap_once_keeps_running_and_recent_jobs() {
        let registry = JobRegistry::new();
        let running = registry.create(None).unwrap().id;
        registry
            .transition(&running, reel_models::JobStage::Analyzing, "working")
            .unwrap();
        let done = registry.create(None).unwrap().id;
        registry.complete(&done, "done").unwrap();

        let patient = JobReaper::new(registry.clone(), Duration::from_secs(3600), Duration::from_secs(60));
        assert_eq!(patient.reap_once(), 0);

        let eager = JobReaper::new(registry.clone(), Duration::ZERO, Duration::from_secs(60));
        assert_eq!(eager.reap_once(), 1);
        assert!(registry.contains(&running));
        assert!(!registry.contains(&done));
    }

    #[test]
    fn test_subscribed_job_survives_until_released() {
        let registry = JobRegistry::new();
        let id = registry.create(None).unwrap().id;
        registry.fail(&id, "boom").unwrap();
        let (_, rx) = registry.subscribe(&id).unwrap();

        let reaper = JobReaper::new(registry.clone(), Duration::ZERO, Duration::from_secs(60));
        assert_eq!(reaper.reap_once(), 0);
        drop(rx);
        assert_eq!(reaper.reap_once(), 1);
    }
}

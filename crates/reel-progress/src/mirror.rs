//! Mirror of progress events onto Redis Pub/Sub.
//!
//! Lets subscribers in other processes follow a job; the in-process bus
//! remains the source of truth.

use redis::AsyncCommands;
use tracing::{debug, warn};

use reel_models::{JobId, ProgressEvent};

use crate::error::ProgressResult;

#[derive(Clone)]
pub struct RedisProgressMirror {
    client: redis::Client,
}

impl RedisProgressMirror {
    pub fn new(redis_url: &str) -> ProgressResult<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self { client })
    }

    /// Get the channel name for a job.
    pub fn channel_name(job_id: &JobId) -> String {
        format!("progress:{}", job_id)
    }

    /// Publish a progress event.
    pub async fn publish(&self, event: &ProgressEvent) -> ProgressResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let channel = Self::channel_name(&event.job_id);
        let payload = serde_json::to_string(event)?;

        debug!("Publishing progress event to {}", channel);
        conn.publish::<_, _, ()>(channel, payload).await?;

        Ok(())
    }

    /// Publish without waiting; no-op outside a Tokio runtime.
    pub fn publish_detached(&self, event: ProgressEvent) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            debug!(job_id = %event.job_id, "No runtime, skipping Redis mirror");
            return;
        };

        let mirror = self.clone();
        handle.spawn(async move {
            if let Err(e) = mirror.publish(&event).await {
                warn!(job_id = %event.job_id, "Failed to mirror progress event: {}", e);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_name() {
        assert_eq!(
            RedisProgressMirror::channel_name(&JobId::from("abc")),
            "progress:abc"
        );
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        assert!(RedisProgressMirror::new("not a url").is_err());
    }
}

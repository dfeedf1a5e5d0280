//! Transport-agnostic progress stream.

use futures_util::stream::{self, BoxStream, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use reel_models::{JobId, ProgressEvent};

use crate::error::ProgressResult;
use crate::registry::JobRegistry;

pub type ProgressStream = BoxStream<'static, ProgressEvent>;

/// Stream of a job's progress.
///
/// Yields a snapshot of the current state first, then every later event in
/// order. Ends after the terminal event, or when the job is evicted.
pub fn progress_stream(registry: &JobRegistry, job_id: &JobId) -> ProgressResult<ProgressStream> {
    let (record, rx) = registry.subscribe(job_id)?;
    let snapshot = ProgressEvent::snapshot(&record);
    let last_seq = snapshot.seq;

    if snapshot.is_terminal() {
        return Ok(stream::once(async move { snapshot }).boxed());
    }

    let events = stream::unfold(Some((rx, last_seq)), |state| async move {
        let (mut rx, last_seq) = state?;
        loop {
            match rx.recv().await {
                Ok(event) if event.seq <= last_seq => continue,
                Ok(event) => {
                    let next = if event.is_terminal() {
                        None
                    } else {
                        Some((rx, event.seq))
                    };
                    return Some((event, next));
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Progress subscriber lagged, events dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Ok(stream::once(async move { snapshot }).chain(events).boxed())
}

//! Progress push transports: Server-Sent Events and WebSocket.
//!
//! Both are thin adapters over [`progress_stream`]: they forward events,
//! keep idle connections alive and close a short grace period after the
//! job's terminal event.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use futures_util::stream::{self, Stream};
use futures_util::{SinkExt, StreamExt};
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{debug, info, warn};

use reel_models::{JobId, ProgressEvent};
use reel_progress::{progress_stream, ProgressStream};

use crate::error::ApiResult;
use crate::handlers::jobs::lookup;
use crate::metrics;
use crate::state::AppState;

/// Decrements the active-connection gauge when the connection goes away.
struct ConnectionGuard {
    transport: &'static str,
}

impl ConnectionGuard {
    fn open(transport: &'static str) -> Self {
        metrics::record_stream_opened(transport);
        Self { transport }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        metrics::record_stream_closed(self.transport);
    }
}

fn subscribe(state: &AppState, job_id: &str) -> ApiResult<(JobId, ProgressStream)> {
    let record = lookup(state, job_id)?;
    let events = progress_stream(&state.registry, &record.id)?;
    Ok((record.id, events))
}

fn sse_event(event: &ProgressEvent) -> Event {
    let data = serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string());
    Event::default()
        .event("progress")
        .id(event.seq.to_string())
        .data(data)
}

/// `GET /api/jobs/:job_id/stream`
pub async fn job_events_sse(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let (job_id, events) = subscribe(&state, &job_id)?;
    let grace = state.config.stream_close_grace;
    let guard = ConnectionGuard::open("sse");
    info!(job_id = %job_id, "SSE subscriber attached");

    let forwarded = events.map(move |event| {
        let _live = &guard;
        metrics::record_stream_event("sse", event.stage.as_str());
        Ok::<_, Infallible>(sse_event(&event))
    });
    let closing = stream::once(async move {
        sleep(grace).await;
        Ok::<_, Infallible>(Event::default().event("close").data(job_id.to_string()))
    });

    Ok(Sse::new(forwarded.chain(closing)).keep_alive(
        KeepAlive::new()
            .interval(state.config.stream_keepalive.max(Duration::from_secs(1)))
            .text("keep-alive"),
    ))
}

/// `GET /ws/jobs/:job_id`
pub async fn job_events_ws(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    // unknown jobs are refused before the upgrade
    let (job_id, events) = subscribe(&state, &job_id)?;
    let keepalive = state.config.stream_keepalive;
    let grace = state.config.stream_close_grace;

    Ok(ws.on_upgrade(move |socket| async move {
        let _guard = ConnectionGuard::open("ws");
        forward_to_socket(socket, job_id, events, keepalive, grace).await;
    }))
}

async fn forward_to_socket(
    socket: WebSocket,
    job_id: JobId,
    mut events: ProgressStream,
    keepalive: Duration,
    grace: Duration,
) {
    let (mut sender, mut receiver) = socket.split();
    let mut heartbeat = interval(keepalive.max(Duration::from_secs(1)));
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // first tick fires immediately
    heartbeat.tick().await;

    info!(job_id = %job_id, "WebSocket subscriber attached");

    loop {
        tokio::select! {
            event = events.next() => {
                let Some(event) = event else {
                    debug!(job_id = %job_id, "Progress stream ended");
                    break;
                };
                let json = match serde_json::to_string(&event) {
                    Ok(json) => json,
                    Err(e) => {
                        warn!(job_id = %job_id, "Failed to encode progress event: {}", e);
                        continue;
                    }
                };
                if sender.send(Message::Text(json)).await.is_err() {
                    debug!(job_id = %job_id, "WebSocket send failed, client disconnected");
                    return;
                }
                metrics::record_stream_event("ws", event.stage.as_str());

                if event.is_terminal() {
                    sleep(grace).await;
                    break;
                }
            }
            _ = heartbeat.tick() => {
                if sender.send(Message::Ping(Vec::new())).await.is_err() {
                    warn!(job_id = %job_id, "Heartbeat failed, client disconnected");
                    return;
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => {
                        debug!(job_id = %job_id, "WebSocket closed by client");
                        return;
                    }
                    // pongs and client chatter are ignored
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    let _ = sender.send(Message::Close(None)).await;
    info!(job_id = %job_id, "WebSocket stream closed");
}

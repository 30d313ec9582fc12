//! Server-Sent Events leg of the transport.
//!
//! Each `GET /sse` gets one stream: a `connected` event right away, then a
//! `ping` event every heartbeat interval. Responses to POSTed messages are
//! never written here; they go back on the POST itself.
//!
//! ```text
//! event: connected
//! data: {"type":"connected","sessionId":"…"}
//!
//! event: ping
//! data: {"type":"ping"}
//! ```

use crate::session::{Session, SessionStore};
use axum::response::sse::Event;
use futures::stream::Stream;
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Default heartbeat interval.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Shortest heartbeat interval; shorter values are raised to this.
pub const MIN_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(1);

/// Server-initiated events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    Connected {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    Ping,
}

impl StreamEvent {
    /// SSE event name.
    pub fn name(&self) -> &'static str {
        match self {
            StreamEvent::Connected { .. } => "connected",
            StreamEvent::Ping => "ping",
        }
    }

    fn to_event(&self) -> Option<Event> {
        serde_json::to_string(self)
            .ok()
            .map(|data| Event::default().event(self.name()).data(data))
    }
}

/// Build the event stream for `session`.
///
/// The stream ends when the session's token is cancelled (session removed or
/// server shutting down). Dropping the stream, which is what happens when the
/// client disconnects or a write fails, cancels the token, and the session is
/// then removed from `store`. `heartbeat` is clamped to
/// [`MIN_HEARTBEAT_INTERVAL`].
pub fn event_stream(
    session: Arc<Session>,
    store: SessionStore,
    heartbeat: Duration,
) -> impl Stream<Item = Result<Event, Infallible>> {
    let heartbeat = heartbeat.max(MIN_HEARTBEAT_INTERVAL);
    let token = session.cancel_token().clone();
    let session_id = session.id().to_string();

    // Reaper: remove the session once its stream is gone.
    {
        let token = token.clone();
        let session_id = session_id.clone();
        tokio::spawn(async move {
            token.cancelled().await;
            store.remove(&session_id).await;
        });
    }

    let guard = token.clone().drop_guard();

    async_stream::stream! {
        let _guard = guard;

        info!(session_id = %session_id, "MCP SSE connection established");
        let connected = StreamEvent::Connected { session_id: session_id.clone() };
        if let Some(event) = connected.to_event() {
            yield Ok(event);
        }

        let mut ticker = interval_at(Instant::now() + heartbeat, heartbeat);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!(session_id = %session_id, "SSE stream cancelled");
                    break;
                }
                _ = ticker.tick() => {
                    if let Some(event) = StreamEvent::Ping.to_event() {
                        yield Ok(event);
                    }
                }
            }
        }

        info!(session_id = %session_id, "MCP SSE connection closed");
    }
}

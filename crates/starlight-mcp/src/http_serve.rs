//! HTTP/SSE front door.
//!
//! ```text
//! Client                               Server
//!   │                                    │
//!   │── GET /sse ───────────────────────►│ (open the event stream)
//!   │◄── SSE: connected {sessionId} ─────│
//!   │◄── SSE: ping (every heartbeat) ────│
//!   │                                    │
//!   │── POST /sse?sessionId=x ──────────►│ (one JSON-RPC envelope)
//!   │◄── 200 JSON-RPC response ──────────│ (or 204 for notifications)
//!   │                                    │
//! ```
//!
//! A POST naming a session that is not open gets `404`. Only the shared
//! default session is created on demand.
//!
//! # Endpoints
//!
//! - `GET /sse` - Open a session and receive server events
//! - `POST /sse` - Send a JSON-RPC message; the response is the POST reply
//! - `GET /health` - Liveness probe

use crate::config::{CorsConfig, ServerConfig};
use crate::dispatcher::ToolDispatcher;
use crate::error::McpError;
use crate::handler::McpHandler;
use crate::protocol::{JsonRpcRequest, JsonRpcResponse, RequestId};
use crate::registry::ToolRegistry;
use crate::session::{SessionStore, DEFAULT_SESSION_ID};
use crate::sse::{event_stream, DEFAULT_HEARTBEAT_INTERVAL, MIN_HEARTBEAT_INTERVAL};
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{sse::Sse, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn, Span};

/// Header carrying the session id when the query parameter is absent.
pub const SESSION_HEADER: &str = "mcp-session-id";

/// State shared by every HTTP handler.
#[derive(Clone)]
pub struct McpHttpState {
    /// Protocol handler.
    pub handler: Arc<McpHandler>,
    /// Active sessions.
    pub sessions: SessionStore,
    /// Interval between `ping` events.
    pub heartbeat: Duration,
    cors: CorsConfig,
}

impl McpHttpState {
    /// Create state around an existing handler.
    pub fn new(handler: McpHandler, sessions: SessionStore) -> Self {
        Self {
            handler: Arc::new(handler),
            sessions,
            heartbeat: DEFAULT_HEARTBEAT_INTERVAL,
            cors: CorsConfig::default(),
        }
    }

    /// Wire up handler, dispatcher and session store from configuration.
    ///
    /// Cancelling `shutdown` ends every open event stream.
    pub fn from_config(
        config: &ServerConfig,
        registry: ToolRegistry,
        shutdown: CancellationToken,
    ) -> Self {
        let dispatcher = ToolDispatcher::new(Arc::new(registry))
            .with_validation(config.validate_arguments)
            .with_timeout(config.tool_timeout());
        let handler = McpHandler::new(&config.name, &config.version, dispatcher)
            .with_strict_lifecycle(config.strict_lifecycle);

        Self::new(handler, SessionStore::new(shutdown))
            .with_heartbeat(config.heartbeat_interval())
            .with_cors(config.cors.clone())
    }

    /// Set the `ping` interval, raised to at least [`MIN_HEARTBEAT_INTERVAL`].
    pub fn with_heartbeat(mut self, heartbeat: Duration) -> Self {
        self.heartbeat = heartbeat.max(MIN_HEARTBEAT_INTERVAL);
        self
    }

    pub fn with_cors(mut self, cors: CorsConfig) -> Self {
        self.cors = cors;
        self
    }
}

/// Build the CORS layer, or `None` when CORS is disabled.
fn cors_layer(config: &CorsConfig) -> Option<CorsLayer> {
    if !config.enabled {
        return None;
    }

    let origin = if config.allows_any_origin() {
        AllowOrigin::from(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    Some(
        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any),
    )
}

/// Create the MCP HTTP router.
pub fn create_mcp_router(state: McpHttpState) -> Router {
    let cors = cors_layer(&state.cors);

    let router = Router::new()
        .route("/sse", get(mcp_sse).post(mcp_message))
        .route("/health", get(health))
        .with_state(state);

    let router = match cors {
        Some(cors) => router.layer(cors),
        None => router,
    };

    router.layer(
        TraceLayer::new_for_http()
            .make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            })
            .on_request(|request: &axum::http::Request<_>, _span: &Span| {
                debug!(
                    method = %request.method(),
                    path = %request.uri().path(),
                    "request"
                );
            })
            .on_response(
                |response: &axum::http::Response<_>, latency: Duration, _span: &Span| {
                    debug!(
                        status = %response.status(),
                        latency = ?latency,
                        "response"
                    );
                },
            ),
    )
}

async fn health(State(state): State<McpHttpState>) -> impl IntoResponse {
    let info = state.handler.server_info();
    Json(serde_json::json!({
        "status": "healthy",
        "server": info.name,
        "version": info.version,
    }))
}

/// SSE connection handler.
async fn mcp_sse(State(state): State<McpHttpState>) -> impl IntoResponse {
    let session = state.sessions.create().await;
    let stream = event_stream(session, state.sessions.clone(), state.heartbeat);

    (
        [(header::CONNECTION, HeaderValue::from_static("keep-alive"))],
        Sse::new(stream),
    )
}

#[derive(Debug, Default, Deserialize)]
struct MessageQuery {
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

/// Session id from the query string, then the header, then the default.
fn resolve_session_id(query: MessageQuery, headers: &HeaderMap) -> String {
    query
        .session_id
        .filter(|id| !id.is_empty())
        .or_else(|| {
            headers
                .get(SESSION_HEADER)
                .and_then(|v| v.to_str().ok())
                .filter(|id| !id.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| DEFAULT_SESSION_ID.to_string())
}

/// Decode a POST body into a single envelope.
///
/// On failure returns the error together with whatever id could be recovered
/// from the body, so the error response can still be correlated.
fn parse_envelope(body: &[u8]) -> Result<JsonRpcRequest, (Option<RequestId>, McpError)> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| (None, McpError::Parse(e.to_string())))?;

    let object = match &value {
        Value::Object(object) => object,
        Value::Array(_) => {
            return Err((
                None,
                McpError::InvalidRequest("batch requests are not supported".to_string()),
            ));
        }
        _ => {
            return Err((
                None,
                McpError::InvalidRequest("expected a JSON object".to_string()),
            ));
        }
    };

    let id = object
        .get("id")
        .and_then(|id| serde_json::from_value::<RequestId>(id.clone()).ok());

    serde_json::from_value(value).map_err(|e| (id, McpError::InvalidRequest(e.to_string())))
}

/// Message endpoint handler.
async fn mcp_message(
    State(state): State<McpHttpState>,
    Query(query): Query<MessageQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = match parse_envelope(&body) {
        Ok(request) => request,
        Err((id, e)) => {
            warn!(code = e.code(), error = %e, "Rejected MCP message");
            let response = JsonRpcResponse::failure(id, e.to_rpc_error());
            return (StatusCode::BAD_REQUEST, Json(response)).into_response();
        }
    };

    let session_id = resolve_session_id(query, &headers);
    let session = if session_id == DEFAULT_SESSION_ID {
        Some(state.sessions.get_or_create(&session_id).await)
    } else {
        state.sessions.get(&session_id).await
    };
    let Some(session) = session else {
        warn!(session_id = %session_id, "Message for unknown session");
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "Session not found" })),
        )
            .into_response();
    };

    debug!(
        session_id = %session_id,
        method = %request.method,
        "Received MCP message"
    );

    match state.handler.handle(&session, request).await {
        Some(response) => (StatusCode::OK, Json(response)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// Bind `config.bind_address()` and serve until `shutdown` is cancelled.
pub async fn serve(
    config: &ServerConfig,
    registry: ToolRegistry,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    serve_on(listener, config, registry, shutdown).await
}

/// Serve on an already bound listener until `shutdown` is cancelled.
pub async fn serve_on(
    listener: tokio::net::TcpListener,
    config: &ServerConfig,
    registry: ToolRegistry,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let state = McpHttpState::from_config(config, registry, shutdown.clone());
    let router = create_mcp_router(state);

    info!(address = %listener.local_addr()?, "MCP server listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

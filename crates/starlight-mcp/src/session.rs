//! Per-client session state.
//!
//! A session moves `Uninitialized → Initializing → Ready`. It is created when
//! a client opens the event stream and is removed when that stream ends. The
//! shared default session is the only one created by a POST.

use crate::protocol::{ClientInfo, InitializeParams, PROTOCOL_VERSION};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Session used for inbound messages that do not name a session.
pub const DEFAULT_SESSION_ID: &str = "default";

/// Lifecycle phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// No `initialize` received yet.
    #[default]
    Uninitialized,
    /// `initialize` answered, waiting for `initialized`.
    Initializing,
    /// Handshake complete.
    Ready,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Uninitialized => "uninitialized",
            SessionPhase::Initializing => "initializing",
            SessionPhase::Ready => "ready",
        }
    }
}

/// Negotiated state of a session.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub phase: SessionPhase,
    /// Capabilities announced by the client. Stored, never echoed back.
    pub client_capabilities: Map<String, Value>,
    /// Protocol version the client asked for.
    pub protocol_version: Option<String>,
    pub client_info: Option<ClientInfo>,
}

/// An active MCP session.
#[derive(Debug)]
pub struct Session {
    id: String,
    state: RwLock<SessionState>,
    /// Cancelled when the session's event stream must stop.
    cancel: CancellationToken,
    created_at: Instant,
}

impl Session {
    /// Create a session whose stream is cancelled together with `parent`.
    pub fn new(id: impl Into<String>, parent: &CancellationToken) -> Self {
        Self {
            id: id.into(),
            state: RwLock::new(SessionState::default()),
            cancel: parent.child_token(),
            created_at: Instant::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Time since the session was created.
    pub fn age(&self) -> std::time::Duration {
        self.created_at.elapsed()
    }

    pub async fn phase(&self) -> SessionPhase {
        self.state.read().await.phase
    }

    /// Snapshot of the negotiated state.
    pub async fn snapshot(&self) -> SessionState {
        self.state.read().await.clone()
    }

    /// Record the client's `initialize` parameters and enter `Initializing`.
    ///
    /// A repeated `initialize` restarts the handshake.
    pub async fn begin_initialize(&self, params: InitializeParams) {
        let mut state = self.state.write().await;
        state.client_capabilities = params.capabilities;
        state.protocol_version = Some(
            params
                .protocol_version
                .unwrap_or_else(|| PROTOCOL_VERSION.to_string()),
        );
        state.client_info = params.client_info;
        state.phase = SessionPhase::Initializing;
        debug!(
            session_id = %self.id,
            client = ?state.client_info.as_ref().map(|c| &c.name),
            "Session initializing"
        );
    }

    /// Enter `Ready`. Returns `false` if the session already was ready.
    pub async fn mark_initialized(&self) -> bool {
        let mut state = self.state.write().await;
        if state.phase == SessionPhase::Ready {
            return false;
        }
        state.phase = SessionPhase::Ready;
        info!(session_id = %self.id, "Session ready");
        true
    }
}

/// All live sessions, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Arc<Session>>>>,
    /// Parent of every session token; cancelled on server shutdown.
    shutdown: CancellationToken,
}

impl SessionStore {
    pub fn new(shutdown: CancellationToken) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            shutdown,
        }
    }

    /// Create and register a session with a fresh id.
    pub async fn create(&self) -> Arc<Session> {
        let session = Arc::new(Session::new(
            uuid::Uuid::new_v4().to_string(),
            &self.shutdown,
        ));
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session.clone());
        info!(session_id = %session.id, "MCP session registered");
        session
    }

    /// Fetch a session, creating it if it does not exist.
    ///
    /// Nothing reaps a session created here, so callers restrict this to
    /// [`DEFAULT_SESSION_ID`].
    pub async fn get_or_create(&self, id: &str) -> Arc<Session> {
        if let Some(session) = self.sessions.read().await.get(id) {
            return session.clone();
        }

        let mut sessions = self.sessions.write().await;
        sessions
            .entry(id.to_string())
            .or_insert_with(|| {
                info!(session_id = %id, "MCP session created on first message");
                Arc::new(Session::new(id, &self.shutdown))
            })
            .clone()
    }

    pub async fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Remove a session and cancel its stream.
    pub async fn remove(&self, id: &str) {
        if let Some(session) = self.sessions.write().await.remove(id) {
            session.cancel.cancel();
            info!(session_id = %id, age = ?session.age(), "MCP session unregistered");
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(version: Option<&str>) -> InitializeParams {
        InitializeParams {
            protocol_version: version.map(str::to_string),
            capabilities: json!({"roots": {"listChanged": true}})
                .as_object()
                .cloned()
                .unwrap(),
            client_info: Some(ClientInfo {
                name: "test".to_string(),
                version: "1.0.0".to_string(),
            }),
        }
    }

    #[tokio::test]
    async fn test_phase_transitions() {
        let session = Session::new("s1", &CancellationToken::new());
        assert_eq!(session.phase().await, SessionPhase::Uninitialized);

        session.begin_initialize(params(Some("2024-11-05"))).await;
        assert_eq!(session.phase().await, SessionPhase::Initializing);

        assert!(session.mark_initialized().await);
        assert_eq!(session.phase().await, SessionPhase::Ready);
    }

    #[tokio::test]
    async fn test_mark_initialized_is_idempotent() {
        let session = Session::new("s1", &CancellationToken::new());
        session.begin_initialize(params(None)).await;

        assert!(session.mark_initialized().await);
        let before = session.snapshot().await;
        assert!(!session.mark_initialized().await);
        let after = session.snapshot().await;

        assert_eq!(before.phase, after.phase);
        assert_eq!(before.client_capabilities, after.client_capabilities);
    }

    #[tokio::test]
    async fn test_initialize_stores_client_state() {
        let session = Session::new("s1", &CancellationToken::new());
        session.begin_initialize(params(None)).await;

        let state = session.snapshot().await;
        assert_eq!(state.protocol_version.as_deref(), Some(PROTOCOL_VERSION));
        assert!(state.client_capabilities.contains_key("roots"));
        assert_eq!(state.client_info.unwrap().name, "test");
    }

    #[tokio::test]
    async fn test_reinitialize_restarts_handshake() {
        let session = Session::new("s1", &CancellationToken::new());
        session.begin_initialize(params(None)).await;
        session.mark_initialized().await;

        session.begin_initialize(InitializeParams::default()).await;
        let state = session.snapshot().await;
        assert_eq!(state.phase, SessionPhase::Initializing);
        assert!(state.client_capabilities.is_empty());
    }

    #[tokio::test]
    async fn test_store_create_and_remove() {
        let store = SessionStore::new(CancellationToken::new());
        let session = store.create().await;
        assert_eq!(store.len().await, 1);
        assert!(store.get(session.id()).await.is_some());

        store.remove(session.id()).await;
        assert!(store.is_empty().await);
        assert!(session.cancel_token().is_cancelled());
    }

    #[tokio::test]
    async fn test_get_or_create_reuses_session() {
        let store = SessionStore::new(CancellationToken::new());
        let a = store.get_or_create(DEFAULT_SESSION_ID).await;
        let b = store.get_or_create(DEFAULT_SESSION_ID).await;
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_shutdown_cancels_sessions() {
        let shutdown = CancellationToken::new();
        let store = SessionStore::new(shutdown.clone());
        let session = store.create().await;

        shutdown.cancel();
        assert!(session.cancel_token().is_cancelled());
    }

    #[test]
    fn test_phase_as_str() {
        assert_eq!(SessionPhase::Uninitialized.as_str(), "uninitialized");
        assert_eq!(SessionPhase::Ready.as_str(), "ready");
    }
}

//! JSON-RPC protocol handler.
//!
//! Turns one inbound envelope into at most one response. Requests always get
//! exactly one response; notifications never get one. Every failure is
//! converted into a JSON-RPC error at this boundary, so nothing that happens
//! while handling a message can take down the session or its stream.

use crate::dispatcher::ToolDispatcher;
use crate::error::{McpError, McpResult};
use crate::protocol::{
    CallToolParams, InitializeParams, InitializeResult, JsonRpcRequest, JsonRpcResponse,
    ListToolsResult, RequestId, ServerCapabilities, ServerInfo, PROTOCOL_VERSION,
};
use crate::registry::ToolContext;
use crate::session::{Session, SessionPhase};
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Methods the server answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    Initialize,
    Initialized,
    Ping,
    ListTools,
    CallTool,
    Cancelled,
}

impl Method {
    /// Whether strict lifecycle mode requires a completed handshake.
    fn requires_ready(self) -> bool {
        matches!(self, Method::ListTools | Method::CallTool)
    }
}

fn method_table() -> HashMap<&'static str, Method> {
    HashMap::from([
        ("initialize", Method::Initialize),
        ("initialized", Method::Initialized),
        ("notifications/initialized", Method::Initialized),
        ("ping", Method::Ping),
        ("tools/list", Method::ListTools),
        ("tools/call", Method::CallTool),
        ("notifications/cancelled", Method::Cancelled),
    ])
}

/// Protocol handler shared by every session.
#[derive(Debug, Clone)]
pub struct McpHandler {
    server_info: ServerInfo,
    dispatcher: ToolDispatcher,
    methods: HashMap<&'static str, Method>,
    strict_lifecycle: bool,
}

impl McpHandler {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        dispatcher: ToolDispatcher,
    ) -> Self {
        Self {
            server_info: ServerInfo {
                name: name.into(),
                version: version.into(),
            },
            dispatcher,
            methods: method_table(),
            strict_lifecycle: false,
        }
    }

    /// Reject tool methods until the handshake completes.
    pub fn with_strict_lifecycle(mut self, strict: bool) -> Self {
        self.strict_lifecycle = strict;
        self
    }

    pub fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    pub fn dispatcher(&self) -> &ToolDispatcher {
        &self.dispatcher
    }

    /// Handle one envelope. `None` means "send no response".
    pub async fn handle(
        &self,
        session: &Session,
        request: JsonRpcRequest,
    ) -> Option<JsonRpcResponse> {
        debug!(
            session_id = %session.id(),
            method = %request.method,
            id = ?request.id,
            "Handling MCP message"
        );

        let Some(id) = request.id else {
            self.handle_notification(session, &request.method).await;
            return None;
        };

        let response = match self
            .handle_request(session, &id, &request.method, request.params)
            .await
        {
            Ok(result) => JsonRpcResponse::success(Some(id), result),
            Err(e) => {
                warn!(
                    session_id = %session.id(),
                    method = %request.method,
                    id = %id,
                    code = e.code(),
                    error = %e,
                    "MCP request failed"
                );
                JsonRpcResponse::failure(Some(id), e.to_rpc_error())
            }
        };
        Some(response)
    }

    async fn handle_notification(&self, session: &Session, method: &str) {
        match self.methods.get(method) {
            Some(Method::Initialized) => {
                if !session.mark_initialized().await {
                    debug!(session_id = %session.id(), "Duplicate initialized notification");
                }
            }
            Some(Method::Cancelled) => {
                debug!(session_id = %session.id(), "Client cancelled a request");
            }
            _ => {
                debug!(session_id = %session.id(), method = %method, "Ignoring notification");
            }
        }
    }

    async fn handle_request(
        &self,
        session: &Session,
        id: &RequestId,
        method: &str,
        params: Option<Value>,
    ) -> McpResult<Value> {
        let method_kind = self
            .methods
            .get(method)
            .copied()
            .ok_or_else(|| McpError::MethodNotFound(method.to_string()))?;

        if self.strict_lifecycle
            && method_kind.requires_ready()
            && session.phase().await != SessionPhase::Ready
        {
            return Err(McpError::NotInitialized);
        }

        match method_kind {
            Method::Initialize => self.initialize(session, params).await,
            Method::Initialized => {
                // Sent with an id: the request still gets its one response.
                session.mark_initialized().await;
                Ok(json!({}))
            }
            Method::Ping | Method::Cancelled => Ok(json!({})),
            Method::ListTools => self.list_tools(),
            Method::CallTool => self.call_tool(session, id, params).await,
        }
    }

    async fn initialize(&self, session: &Session, params: Option<Value>) -> McpResult<Value> {
        let params: InitializeParams = match params {
            None | Some(Value::Null) => InitializeParams::default(),
            Some(p) => {
                serde_json::from_value(p).map_err(|e| McpError::invalid_params(e.to_string()))?
            }
        };

        session.begin_initialize(params).await;
        info!(
            session_id = %session.id(),
            name = %self.server_info.name,
            version = %self.server_info.version,
            "Initializing MCP session"
        );

        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities::supported(),
            server_info: self.server_info.clone(),
        };
        Ok(serde_json::to_value(result)?)
    }

    fn list_tools(&self) -> McpResult<Value> {
        let tools = self.dispatcher.registry().list();
        debug!(count = tools.len(), "Listing MCP tools");
        Ok(serde_json::to_value(ListToolsResult { tools })?)
    }

    async fn call_tool(
        &self,
        session: &Session,
        id: &RequestId,
        params: Option<Value>,
    ) -> McpResult<Value> {
        let params: CallToolParams = match params {
            Some(p) => {
                serde_json::from_value(p).map_err(|e| McpError::invalid_params(e.to_string()))?
            }
            None => return Err(McpError::invalid_params("missing params")),
        };

        let ctx = ToolContext {
            session_id: session.id().to_string(),
            request_id: Some(id.clone()),
        };
        let result = self.dispatcher.dispatch(params, ctx).await?;
        Ok(serde_json::to_value(result)?)
    }
}

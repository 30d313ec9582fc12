//! Model Context Protocol (MCP) server over HTTP and Server-Sent Events.
//!
//! Clients open an event stream with `GET /sse` and send JSON-RPC messages
//! with `POST /sse`. Each message is answered on its own POST; the event
//! stream only carries `connected` and `ping` events.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐   ┌─────────────┐   ┌────────────────┐   ┌──────────────┐
//! │ http_serve │──▶│ McpHandler  │──▶│ ToolDispatcher │──▶│ ToolRegistry │
//! │  (axum)    │   │ (lifecycle) │   │ (validate/run) │   │   (tools)    │
//! └────────────┘   └─────────────┘   └────────────────┘   └──────────────┘
//!        │
//!        └──▶ SessionStore ──▶ sse::event_stream
//! ```
//!
//! # Example
//!
//! ```no_run
//! use serde_json::json;
//! use starlight_mcp::{http_serve, ClosureExecutor, ServerConfig, ToolBuilder, ToolContent, ToolRegistry};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let echo = ToolBuilder::new("echo")
//!     .description("Echo the input")
//!     .input_schema(json!({
//!         "type": "object",
//!         "properties": { "text": { "type": "string" } }
//!     }))
//!     .build(ClosureExecutor::new(|args, _ctx| {
//!         let text = args.get("text").and_then(|v| v.as_str()).unwrap_or_default();
//!         Ok(vec![ToolContent::text(text)])
//!     }));
//!
//! let registry = ToolRegistry::from_tools(vec![echo])?;
//! http_serve::serve(&ServerConfig::default(), registry, CancellationToken::new()).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dispatcher;
mod error;
pub mod handler;
pub mod http_serve;
pub mod protocol;
pub mod registry;
pub mod session;
pub mod sse;

pub use config::{CorsConfig, ServerConfig};
pub use dispatcher::ToolDispatcher;
pub use error::{McpError, McpResult};
pub use handler::McpHandler;
pub use http_serve::{create_mcp_router, McpHttpState};
pub use protocol::{
    CallToolParams, JsonRpcError, JsonRpcRequest, JsonRpcResponse, McpTool, RequestId,
    ToolCallResult, ToolContent,
};
pub use registry::{
    parse_arguments, ClosureExecutor, Tool, ToolBuilder, ToolContext, ToolExecutor, ToolRegistry,
};
pub use session::{Session, SessionPhase, SessionStore, DEFAULT_SESSION_ID};
pub use sse::{StreamEvent, MIN_HEARTBEAT_INTERVAL};

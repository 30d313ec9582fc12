//! MCP error types.

use crate::protocol::{error_codes, JsonRpcError};
use thiserror::Error;

/// Result type for MCP operations.
pub type McpResult<T> = Result<T, McpError>;

/// Errors that can occur while serving MCP requests.
#[derive(Debug, Error)]
pub enum McpError {
    /// The request body was not valid JSON.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The body was JSON but not a JSON-RPC envelope.
    #[error("Invalid Request: {0}")]
    InvalidRequest(String),

    /// No handler is registered for the method.
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// The session has not completed `initialize` (strict lifecycle only).
    #[error("Server not initialized")]
    NotInitialized,

    /// Method parameters could not be decoded.
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// Tool not found.
    #[error("Unknown tool: {0}")]
    ToolNotFound(String),

    /// Tool arguments failed schema validation.
    #[error("Invalid arguments for tool '{tool}': {message}")]
    InvalidArguments { tool: String, message: String },

    /// Tool execution failed.
    #[error("Tool execution failed: {0}")]
    ToolError(String),

    /// Tool task panicked.
    #[error("Tool '{0}' panicked")]
    ToolPanicked(String),

    /// Tool did not finish within the configured timeout.
    #[error("Tool '{tool}' timed out after {secs}s")]
    Timeout { tool: String, secs: u64 },

    /// Two tools were registered under the same name.
    #[error("Duplicate tool name: {0}")]
    DuplicateTool(String),

    /// A tool's input schema is not a valid JSON Schema.
    #[error("Invalid input schema for tool '{tool}': {message}")]
    InvalidSchema { tool: String, message: String },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML configuration error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl McpError {
    /// Create a tool error.
    pub fn tool_error(message: impl Into<String>) -> Self {
        Self::ToolError(message.into())
    }

    /// Create an invalid params error.
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams(message.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// JSON-RPC error code reported for this error.
    ///
    /// Everything that is not a transport or protocol error is reported as
    /// an internal error, including unknown tools.
    pub fn code(&self) -> i64 {
        match self {
            Self::Parse(_) => error_codes::PARSE_ERROR,
            Self::InvalidRequest(_) => error_codes::INVALID_REQUEST,
            Self::MethodNotFound(_) => error_codes::METHOD_NOT_FOUND,
            Self::NotInitialized => error_codes::SERVER_NOT_INITIALIZED,
            _ => error_codes::INTERNAL_ERROR,
        }
    }

    /// Convert into the wire error object.
    pub fn to_rpc_error(&self) -> JsonRpcError {
        JsonRpcError {
            code: self.code(),
            message: self.to_string(),
            data: None,
        }
    }
}

//! Tool dispatcher.
//!
//! Resolves `tools/call` targets in the registry, validates arguments, runs
//! the executor on its own task and normalizes the outcome. A failure never
//! yields partial content.

use crate::error::{McpError, McpResult};
use crate::protocol::{CallToolParams, ToolCallResult};
use crate::registry::{ToolContext, ToolRegistry};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Dispatches tool invocations.
#[derive(Debug, Clone)]
pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
    validate_arguments: bool,
    timeout: Option<Duration>,
}

impl ToolDispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            validate_arguments: true,
            timeout: None,
        }
    }

    /// Enable or disable schema validation of arguments.
    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.validate_arguments = enabled;
        self
    }

    /// Bound every invocation by `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Invoke a tool.
    pub async fn dispatch(
        &self,
        params: CallToolParams,
        ctx: ToolContext,
    ) -> McpResult<ToolCallResult> {
        let CallToolParams { name, arguments } = params;

        let tool = self
            .registry
            .resolve(&name)
            .ok_or_else(|| McpError::ToolNotFound(name.clone()))?;

        let args = match arguments {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(args @ Value::Object(_)) => args,
            Some(other) => {
                return Err(McpError::InvalidArguments {
                    tool: name,
                    message: format!("arguments must be an object, got {other}"),
                });
            }
        };

        if self.validate_arguments {
            self.registry.validate(&name, &args)?;
        }

        debug!(tool = %name, session_id = %ctx.session_id, "Calling tool");

        let executor = tool.executor.clone();
        let handle = tokio::spawn(async move { executor.execute(args, &ctx).await });

        let joined = match self.timeout {
            Some(limit) => {
                let abort = handle.abort_handle();
                match tokio::time::timeout(limit, handle).await {
                    Ok(joined) => joined,
                    Err(_) => {
                        abort.abort();
                        warn!(tool = %name, timeout = ?limit, "Tool timed out");
                        return Err(McpError::Timeout {
                            tool: name,
                            secs: limit.as_secs(),
                        });
                    }
                }
            }
            None => handle.await,
        };

        let content = match joined {
            Ok(Ok(content)) => content,
            Ok(Err(e)) => {
                warn!(tool = %name, error = %e, "Tool failed");
                return Err(e);
            }
            Err(join_err) => {
                warn!(tool = %name, error = %join_err, "Tool task did not complete");
                return Err(McpError::ToolPanicked(name));
            }
        };

        debug!(tool = %name, blocks = content.len(), "Tool completed successfully");
        Ok(ToolCallResult { content })
    }
}

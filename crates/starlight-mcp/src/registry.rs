//! Tool registry.
//!
//! Tools are declared once at startup and looked up by name for the rest of
//! the process lifetime. The registry keeps registration order so that
//! `tools/list` is stable.
//!
//! ```text
//! ┌────────────┐  resolve(name)   ┌──────────────┐   execute(args)   ┌──────────────┐
//! │ Dispatcher │ ───────────────► │ ToolRegistry │ ────────────────► │ ToolExecutor │
//! └────────────┘                  └──────────────┘                   └──────────────┘
//! ```

use crate::error::{McpError, McpResult};
use crate::protocol::{McpTool, RequestId, ToolContent};
use jsonschema::Validator;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Trait for tool execution.
#[async_trait::async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Execute the tool with already-validated arguments.
    async fn execute(&self, args: Value, ctx: &ToolContext) -> McpResult<Vec<ToolContent>>;
}

/// Context provided to tools during execution.
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    /// Session the call arrived on.
    pub session_id: String,
    /// Id of the `tools/call` request.
    pub request_id: Option<RequestId>,
}

/// A registered tool: descriptor, compiled schema and executor.
#[derive(Clone)]
pub struct Tool {
    /// Tool name.
    pub name: String,
    /// Tool description.
    pub description: String,
    /// JSON Schema for the arguments.
    pub input_schema: Value,
    /// Tool executor.
    pub executor: Arc<dyn ToolExecutor>,
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}

impl Tool {
    /// The descriptor advertised by `tools/list`.
    pub fn descriptor(&self) -> McpTool {
        McpTool {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: self.input_schema.clone(),
        }
    }
}

/// Builder for [`Tool`].
pub struct ToolBuilder {
    name: String,
    description: String,
    input_schema: Value,
}

impl ToolBuilder {
    /// Create a new tool builder with an empty object schema.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {}
            }),
        }
    }

    /// Set the tool description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the input schema.
    pub fn input_schema(mut self, schema: Value) -> Self {
        self.input_schema = schema;
        self
    }

    /// Build the tool with an executor.
    pub fn build(self, executor: impl ToolExecutor + 'static) -> Tool {
        Tool {
            name: self.name,
            description: self.description,
            input_schema: self.input_schema,
            executor: Arc::new(executor),
        }
    }
}

/// Simple executor that wraps a closure.
pub struct ClosureExecutor<F>
where
    F: Fn(Value, &ToolContext) -> McpResult<Vec<ToolContent>> + Send + Sync,
{
    f: F,
}

impl<F> ClosureExecutor<F>
where
    F: Fn(Value, &ToolContext) -> McpResult<Vec<ToolContent>> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait::async_trait]
impl<F> ToolExecutor for ClosureExecutor<F>
where
    F: Fn(Value, &ToolContext) -> McpResult<Vec<ToolContent>> + Send + Sync,
{
    async fn execute(&self, args: Value, ctx: &ToolContext) -> McpResult<Vec<ToolContent>> {
        (self.f)(args, ctx)
    }
}

/// Decode tool arguments into a typed struct.
///
/// Optional fields should carry `#[serde(default)]` on the target type so
/// that defaulting is explicit at the boundary.
pub fn parse_arguments<T: DeserializeOwned>(args: Value) -> McpResult<T> {
    serde_json::from_value(args).map_err(|e| McpError::invalid_params(e.to_string()))
}

struct Entry {
    tool: Tool,
    validator: Validator,
}

/// Ordered, append-only set of tools.
#[derive(Default)]
pub struct ToolRegistry {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a static declaration list.
    pub fn from_tools(tools: impl IntoIterator<Item = Tool>) -> McpResult<Self> {
        let mut registry = Self::new();
        for tool in tools {
            registry.register(tool)?;
        }
        Ok(registry)
    }

    /// Register a tool. Names must be unique and schemas must compile.
    pub fn register(&mut self, tool: Tool) -> McpResult<()> {
        if self.index.contains_key(&tool.name) {
            return Err(McpError::DuplicateTool(tool.name));
        }

        let validator =
            jsonschema::validator_for(&tool.input_schema).map_err(|e| McpError::InvalidSchema {
                tool: tool.name.clone(),
                message: e.to_string(),
            })?;

        tracing::debug!(tool = %tool.name, "Registered tool");
        self.index.insert(tool.name.clone(), self.entries.len());
        self.entries.push(Entry { tool, validator });
        Ok(())
    }

    /// Descriptors in registration order.
    pub fn list(&self) -> Vec<McpTool> {
        self.entries.iter().map(|e| e.tool.descriptor()).collect()
    }

    /// Look up a tool by name.
    pub fn resolve(&self, name: &str) -> Option<&Tool> {
        self.index.get(name).map(|&i| &self.entries[i].tool)
    }

    /// Tool names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.tool.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Validate arguments against the named tool's input schema.
    ///
    /// Reports at most five violations.
    pub fn validate(&self, name: &str, args: &Value) -> McpResult<()> {
        let entry = self
            .index
            .get(name)
            .map(|&i| &self.entries[i])
            .ok_or_else(|| McpError::ToolNotFound(name.to_string()))?;

        if entry.validator.is_valid(args) {
            return Ok(());
        }

        let message = entry
            .validator
            .iter_errors(args)
            .take(5)
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");

        Err(McpError::InvalidArguments {
            tool: name.to_string(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn text_tool(name: &str) -> Tool {
        ToolBuilder::new(name)
            .description(format!("{name} tool"))
            .build(ClosureExecutor::new(|_, _| Ok(vec![ToolContent::text("ok")])))
    }

    #[test]
    fn test_list_keeps_registration_order() {
        let registry =
            ToolRegistry::from_tools(["zeta", "alpha", "mid"].into_iter().map(text_tool)).unwrap();

        let names: Vec<String> = registry.list().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        assert_eq!(registry.names(), vec!["zeta", "alpha", "mid"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let err = ToolRegistry::from_tools(vec![text_tool("echo"), text_tool("echo")]).unwrap_err();
        assert!(matches!(err, McpError::DuplicateTool(name) if name == "echo"));
    }

    #[test]
    fn test_invalid_schema_rejected() {
        let tool = ToolBuilder::new("broken")
            .input_schema(json!({"type": "not-a-type"}))
            .build(ClosureExecutor::new(|_, _| Ok(vec![])));

        let err = ToolRegistry::new().register(tool).unwrap_err();
        assert!(matches!(err, McpError::InvalidSchema { .. }));
    }

    #[test]
    fn test_resolve() {
        let registry = ToolRegistry::from_tools(vec![text_tool("echo")]).unwrap();
        assert_eq!(registry.resolve("echo").unwrap().name, "echo");
        assert!(registry.resolve("missing").is_none());
    }

    #[test]
    fn test_empty_registry() {
        let registry = ToolRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.list().is_empty());
    }

    #[test]
    fn test_validate_arguments() {
        let tool = ToolBuilder::new("echo")
            .input_schema(json!({
                "type": "object",
                "properties": { "text": { "type": "string" } },
                "required": ["text"]
            }))
            .build(ClosureExecutor::new(|_, _| Ok(vec![])));
        let registry = ToolRegistry::from_tools(vec![tool]).unwrap();

        assert!(registry.validate("echo", &json!({"text": "hi"})).is_ok());
        assert!(matches!(
            registry.validate("echo", &json!({})),
            Err(McpError::InvalidArguments { .. })
        ));
        assert!(matches!(
            registry.validate("echo", &json!({"text": 3})),
            Err(McpError::InvalidArguments { .. })
        ));
        assert!(matches!(
            registry.validate("nope", &json!({})),
            Err(McpError::ToolNotFound(_))
        ));
    }

    #[test]
    fn test_descriptor_and_debug() {
        let tool = text_tool("debug-tool");
        let descriptor = tool.descriptor();
        assert_eq!(descriptor.description, "debug-tool tool");
        assert_eq!(descriptor.input_schema["type"], "object");

        let debug_str = format!("{:?}", tool);
        assert!(debug_str.contains("debug-tool"));
    }

    #[tokio::test]
    async fn test_closure_executor_uses_context() {
        let executor = ClosureExecutor::new(|_, ctx| Ok(vec![ToolContent::text(&ctx.session_id)]));
        let ctx = ToolContext {
            session_id: "custom-session".to_string(),
            request_id: Some(RequestId::from(1)),
        };

        let result = executor.execute(json!({}), &ctx).await.unwrap();
        assert_eq!(result, vec![ToolContent::text("custom-session")]);
    }

    #[test]
    fn test_parse_arguments_with_defaults() {
        #[derive(Deserialize)]
        struct Args {
            name: String,
            #[serde(default)]
            count: u32,
        }

        let args: Args = parse_arguments(json!({"name": "x"})).unwrap();
        assert_eq!(args.name, "x");
        assert_eq!(args.count, 0);

        let err = parse_arguments::<Args>(json!({"count": 2})).err().unwrap();
        assert!(matches!(err, McpError::InvalidParams(_)));
    }
}

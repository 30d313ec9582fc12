//! Echo tool - returns its input, for connectivity checks.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use starlight_mcp::{
    parse_arguments, McpResult, Tool, ToolBuilder, ToolContent, ToolContext, ToolExecutor,
};

#[derive(Debug, Deserialize)]
struct EchoArgs {
    text: String,
}

/// Echoes `text` back as `echo: <text>`.
pub struct EchoTool;

#[async_trait]
impl ToolExecutor for EchoTool {
    async fn execute(&self, args: Value, _ctx: &ToolContext) -> McpResult<Vec<ToolContent>> {
        let args: EchoArgs = parse_arguments(args)?;
        Ok(vec![ToolContent::text(format!("echo: {}", args.text))])
    }
}

pub fn tool() -> Tool {
    ToolBuilder::new("echo")
        .description("Echo the given text back to the caller")
        .input_schema(json!({
            "type": "object",
            "properties": {
                "text": {
                    "type": "string",
                    "description": "Text to echo"
                }
            },
            "required": ["text"]
        }))
        .build(EchoTool)
}

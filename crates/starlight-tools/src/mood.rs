//! Mood tool - reports a random mood for someone.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde::Deserialize;
use serde_json::{json, Value};
use starlight_mcp::{
    parse_arguments, McpResult, Tool, ToolBuilder, ToolContent, ToolContext, ToolExecutor,
};

const DEFAULT_NAME: &str = "World";

const MOODS: &[&str] = &[
    "is in a great mood today! 😊",
    "is feeling a bit tired today... 😴",
    "is full of energy today! ⚡",
    "is very calm today 😌",
    "is a little excited today! 🎉",
    "is pondering life today... 🤔",
];

#[derive(Debug, Deserialize)]
struct MoodArgs {
    #[serde(default = "default_name")]
    name: String,
}

fn default_name() -> String {
    DEFAULT_NAME.to_string()
}

fn pick_mood(name: &str) -> String {
    let mood = MOODS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(MOODS[0]);
    format!("{name} {mood}")
}

pub struct MoodTool;

#[async_trait]
impl ToolExecutor for MoodTool {
    async fn execute(&self, args: Value, _ctx: &ToolContext) -> McpResult<Vec<ToolContent>> {
        let args: MoodArgs = parse_arguments(args)?;
        Ok(vec![ToolContent::text(pick_mood(&args.name))])
    }
}

pub fn tool() -> Tool {
    ToolBuilder::new("get_mood")
        .description("Get the current mood of someone")
        .input_schema(json!({
            "type": "object",
            "properties": {
                "name": {
                    "type": "string",
                    "description": "Who to ask about"
                }
            },
            "required": []
        }))
        .build(MoodTool)
}

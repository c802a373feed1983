//! Local time - auto-executing demo tool

use super::{ExecutionContext, Tool, ToolError, ToolExecutor};
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

/// Reports the current time. Runs without confirmation.
pub struct LocalTimeTool;

#[derive(Debug, Deserialize)]
struct LocalTimeInput {
    location: String,
}

impl Tool for LocalTimeTool {
    fn name(&self) -> &'static str {
        "getLocalTime"
    }

    fn description(&self) -> String {
        "Get the local time for a specified location".to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["location"],
            "properties": {
                "location": {
                    "type": "string",
                    "description": "The location to get the time for"
                }
            }
        })
    }
}

#[async_trait]
impl ToolExecutor for LocalTimeTool {
    async fn execute(&self, args: Value, _ctx: ExecutionContext) -> Result<Value, ToolError> {
        let input: LocalTimeInput =
            serde_json::from_value(args).map_err(|e| ToolError::InvalidInput(e.to_string()))?;

        // No timezone database; report UTC and let the model convert
        let now = Utc::now().format("%H:%M");
        Ok(json!({
            "location": input.location,
            "utc_time": now.to_string(),
        }))
    }
}

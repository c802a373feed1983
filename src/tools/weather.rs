//! Weather lookup - confirmation-gated demo tool

use super::{ExecutionContext, Tool, ToolError, ToolExecutor};
use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde::Deserialize;
use serde_json::{json, Value};

const CONDITIONS: [&str; 4] = ["sunny", "cloudy", "rainy", "snowy"];

/// Reports the weather in a city. Needs a human to approve every call.
pub struct WeatherTool;

#[derive(Debug, Deserialize)]
struct WeatherInput {
    city: String,
}

impl Tool for WeatherTool {
    fn name(&self) -> &'static str {
        "getWeatherInformation"
    }

    fn description(&self) -> String {
        "Show the weather in a given city to the user".to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["city"],
            "properties": {
                "city": {
                    "type": "string",
                    "description": "The city to report the weather for"
                }
            }
        })
    }
}

#[async_trait]
impl ToolExecutor for WeatherTool {
    async fn execute(&self, args: Value, ctx: ExecutionContext) -> Result<Value, ToolError> {
        let input: WeatherInput =
            serde_json::from_value(args).map_err(|e| ToolError::InvalidInput(e.to_string()))?;

        if ctx.cancel.is_cancelled() {
            return Err(ToolError::Cancelled);
        }

        let condition = CONDITIONS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or("sunny");

        tracing::debug!(city = %input.city, condition, "Weather looked up");
        Ok(Value::String(format!(
            "The weather in {} is {condition}.",
            input.city
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    fn test_context(cancel: CancellationToken) -> ExecutionContext {
        ExecutionContext::new(cancel, "call-weather", Arc::from(Vec::new()), 0)
    }

    #[tokio::test]
    async fn test_weather_reports_city() {
        let out = WeatherTool
            .execute(json!({"city": "Paris"}), test_context(CancellationToken::new()))
            .await
            .unwrap();
        let text = out.as_str().unwrap();
        assert!(text.starts_with("The weather in Paris is "));
        assert!(CONDITIONS.iter().any(|c| text.ends_with(&format!("{c}."))));
    }

    #[tokio::test]
    async fn test_weather_missing_city() {
        let err = WeatherTool
            .execute(json!({}), test_context(CancellationToken::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_weather_respects_cancellation() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = WeatherTool
            .execute(json!({"city": "Oslo"}), test_context(cancel))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Cancelled));
    }
}

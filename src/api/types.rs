//! API request and response types

use crate::conversation::Message;
use crate::tools::ToolDefinition;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A conversation submitted by the UI
#[derive(Debug, Deserialize)]
pub struct ConversationRequest {
    pub messages: Vec<Message>,
}

/// Request to record a human decision on one tool call
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRequest {
    pub messages: Vec<Message>,
    pub tool_call_id: String,
    pub approved: bool,
}

/// Response with a conversation
#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    pub messages: Vec<Message>,
}

/// Response with the tool catalog
#[derive(Debug, Serialize)]
pub struct ToolsResponse {
    pub tools: Vec<ToolDefinition>,
}

/// A tool call waiting for a human
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingConfirmation {
    pub tool_call_id: String,
    pub tool_name: String,
    pub args: Value,
}

/// Response listing calls that wait for a human
#[derive(Debug, Serialize)]
pub struct PendingResponse {
    pub pending: Vec<PendingConfirmation>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

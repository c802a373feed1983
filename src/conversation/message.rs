//! Conversation messages and their parts

use super::invocation::ToolInvocation;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `type` tag of a tool-invocation part
pub const TOOL_INVOCATION_PART: &str = "tool-invocation";

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// One entry of a conversation.
///
/// Only `parts` is interpreted. `content` and `createdAt` are carried in
/// whatever form the client sent them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parts: Option<Vec<Part>>,
    /// Fields owned by other layers (annotations, attachments, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Message {
    pub fn new(id: impl Into<String>, role: Role, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role,
            content: Some(content.into()),
            created_at: Some(Value::String(
                Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            )),
            parts: None,
            extra: Map::new(),
        }
    }

    #[must_use]
    pub fn with_parts(mut self, parts: Vec<Part>) -> Self {
        self.parts = Some(parts);
        self
    }

    /// Tool invocations carried by this message, in part order
    pub fn tool_invocations(&self) -> impl Iterator<Item = &ToolInvocation> {
        self.parts
            .iter()
            .flatten()
            .filter_map(Part::as_tool_invocation)
    }

    pub fn tool_invocations_mut(&mut self) -> impl Iterator<Item = &mut ToolInvocation> {
        self.parts.iter_mut().flatten().filter_map(|part| match part {
            Part::ToolInvocation { invocation, .. } => Some(invocation),
            Part::Other(_) => None,
        })
    }
}

/// A message part. Only tool invocations are interpreted; everything else,
/// including tool-invocation parts we fail to parse, is carried as raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum Part {
    ToolInvocation {
        invocation: ToolInvocation,
        /// Keys of the part object besides `type` and `toolInvocation`
        extra: Map<String, Value>,
    },
    Other(Value),
}

impl Part {
    pub fn tool_invocation(invocation: ToolInvocation) -> Self {
        Part::ToolInvocation {
            invocation,
            extra: Map::new(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert("type".to_string(), Value::String("text".to_string()));
        map.insert("text".to_string(), Value::String(text.into()));
        Part::Other(Value::Object(map))
    }

    pub fn as_tool_invocation(&self) -> Option<&ToolInvocation> {
        match self {
            Part::ToolInvocation { invocation, .. } => Some(invocation),
            Part::Other(_) => None,
        }
    }
}

impl From<Value> for Part {
    fn from(value: Value) -> Self {
        let Value::Object(map) = &value else {
            return Part::Other(value);
        };
        if map.get("type").and_then(Value::as_str) != Some(TOOL_INVOCATION_PART) {
            return Part::Other(value);
        }
        let Some(inner) = map.get("toolInvocation") else {
            return Part::Other(value);
        };

        match serde_json::from_value::<ToolInvocation>(inner.clone()) {
            Ok(invocation) => {
                let mut extra = map.clone();
                extra.remove("type");
                extra.remove("toolInvocation");
                Part::ToolInvocation { invocation, extra }
            }
            Err(e) => {
                tracing::debug!(error = %e, "Keeping malformed tool invocation part untouched");
                Part::Other(value)
            }
        }
    }
}

impl From<Part> for Value {
    fn from(part: Part) -> Self {
        match part {
            Part::ToolInvocation { invocation, extra } => {
                let mut map = extra;
                map.insert(
                    "type".to_string(),
                    Value::String(TOOL_INVOCATION_PART.to_string()),
                );
                map.insert(
                    "toolInvocation".to_string(),
                    serde_json::to_value(invocation).unwrap_or(Value::Null),
                );
                Value::Object(map)
            }
            Part::Other(value) => value,
        }
    }
}

//! Tool invocations and their resolution state
//!
//! On the wire an invocation carries a `state` string plus an optional
//! `result`, and the UI overloads `result` with approval sentinels. In memory
//! that pair is folded into [`ToolState`] so every branch is matched
//! exhaustively instead of string-compared.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Sentinel the UI writes into `result` once a human approved the call
pub const APPROVAL_YES: &str = "Yes, confirmed.";

/// Sentinel the UI writes into `result` once a human denied the call
pub const APPROVAL_NO: &str = "No, denied.";

/// Terminal result of a denied call
pub const DENIAL_RESULT: &str = "Error: User denied access to tool execution";

/// A human decision on a confirmation-gated tool call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approved,
    Denied,
}

impl Decision {
    /// The literal the UI puts in `result` to record this decision
    pub fn sentinel(self) -> &'static str {
        match self {
            Decision::Approved => APPROVAL_YES,
            Decision::Denied => APPROVAL_NO,
        }
    }

    /// Parse a wire `result` value; anything but an exact sentinel is `None`
    pub fn from_sentinel(value: &Value) -> Option<Self> {
        match value.as_str()? {
            APPROVAL_YES => Some(Decision::Approved),
            APPROVAL_NO => Some(Decision::Denied),
            _ => None,
        }
    }
}

/// Resolution state of a single tool invocation
#[derive(Debug, Clone, PartialEq)]
pub enum ToolState {
    /// Requested by the model, no decision yet (`call` / `partial-call`)
    Pending { partial: bool },
    /// A human decided; the resolver has not enacted it yet
    AwaitingExecution(Decision),
    /// Terminal: the human refused the call
    Denied,
    /// Terminal: executed (successfully or not) or produced directly
    Resolved(Value),
}

impl ToolState {
    /// Classify a wire `result` attached to `state = result`
    pub fn from_result(value: Value) -> Self {
        if let Some(decision) = Decision::from_sentinel(&value) {
            return ToolState::AwaitingExecution(decision);
        }
        if value.as_str() == Some(DENIAL_RESULT) {
            return ToolState::Denied;
        }
        ToolState::Resolved(value)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ToolState::Denied | ToolState::Resolved(_))
    }

    /// Short name used in logs and error messages
    pub fn label(&self) -> &'static str {
        match self {
            ToolState::Pending { partial: false } => "call",
            ToolState::Pending { partial: true } => "partial-call",
            ToolState::AwaitingExecution(_) => "awaiting-execution",
            ToolState::Denied => "denied",
            ToolState::Resolved(_) => "resolved",
        }
    }

    /// The value carried in the wire `result` field, if any
    pub fn wire_result(&self) -> Option<Value> {
        match self {
            ToolState::Pending { .. } => None,
            ToolState::AwaitingExecution(decision) => {
                Some(Value::String(decision.sentinel().to_string()))
            }
            ToolState::Denied => Some(Value::String(DENIAL_RESULT.to_string())),
            ToolState::Resolved(value) => Some(value.clone()),
        }
    }

    fn wire_state(&self) -> WireState {
        match self {
            ToolState::Pending { partial: false } => WireState::Call,
            ToolState::Pending { partial: true } => WireState::PartialCall,
            _ => WireState::Result,
        }
    }
}

/// Why a wire invocation could not be interpreted
#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("tool call {tool_call_id} carries a result while in state {state}")]
    ResultBeforeCompletion {
        tool_call_id: String,
        state: &'static str,
    },
    #[error("tool call {0} is in state result without a result value")]
    MissingResult(String),
}

/// A model-requested action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireInvocation", into = "WireInvocation")]
pub struct ToolInvocation {
    pub tool_call_id: String,
    pub tool_name: String,
    pub args: Value,
    pub state: ToolState,
    /// Fields we do not interpret (e.g. `step`), kept for the round trip
    extra: Map<String, Value>,
}

impl ToolInvocation {
    pub fn new(tool_call_id: impl Into<String>, tool_name: impl Into<String>, args: Value) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            args,
            state: ToolState::Pending { partial: false },
            extra: Map::new(),
        }
    }

    #[must_use]
    pub fn with_state(mut self, state: ToolState) -> Self {
        self.state = state;
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum WireState {
    Call,
    PartialCall,
    Result,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireInvocation {
    tool_call_id: String,
    tool_name: String,
    #[serde(default)]
    args: Value,
    state: WireState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl TryFrom<WireInvocation> for ToolInvocation {
    type Error = InvocationError;

    fn try_from(wire: WireInvocation) -> Result<Self, Self::Error> {
        let state = match (wire.state, wire.result) {
            (WireState::Call, None) => ToolState::Pending { partial: false },
            (WireState::PartialCall, None) => ToolState::Pending { partial: true },
            (WireState::Call | WireState::PartialCall, Some(_)) => {
                return Err(InvocationError::ResultBeforeCompletion {
                    tool_call_id: wire.tool_call_id,
                    state: if matches!(wire.state, WireState::Call) {
                        "call"
                    } else {
                        "partial-call"
                    },
                });
            }
            (WireState::Result, Some(result)) => ToolState::from_result(result),
            (WireState::Result, None) => {
                return Err(InvocationError::MissingResult(wire.tool_call_id));
            }
        };

        Ok(Self {
            tool_call_id: wire.tool_call_id,
            tool_name: wire.tool_name,
            args: wire.args,
            state,
            extra: wire.extra,
        })
    }
}

impl From<ToolInvocation> for WireInvocation {
    fn from(invocation: ToolInvocation) -> Self {
        Self {
            tool_call_id: invocation.tool_call_id,
            tool_name: invocation.tool_name,
            args: invocation.args,
            state: invocation.state.wire_state(),
            result: invocation.state.wire_result(),
            extra: invocation.extra,
        }
    }
}

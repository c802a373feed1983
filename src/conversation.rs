//! Conversation data model
//!
//! Messages, parts and tool invocations as exchanged with the UI, plus the
//! UI-side half of the approval contract: finding calls that need a human
//! decision and recording that decision as a sentinel.

mod invocation;
mod message;

pub use invocation::{
    Decision, InvocationError, ToolInvocation, ToolState, APPROVAL_NO, APPROVAL_YES,
    DENIAL_RESULT,
};
pub use message::{Message, Part, Role, TOOL_INVOCATION_PART};

use crate::tools::ToolCatalog;
use thiserror::Error;

/// Errors raised when recording a human decision
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversationError {
    #[error("no tool call with id {0} in this conversation")]
    UnknownToolCall(String),
    #[error("tool call {tool_call_id} is not awaiting a decision (state: {state})")]
    NotAwaitingDecision {
        tool_call_id: String,
        state: &'static str,
    },
}

/// Completed calls to confirmation-gated tools that still need a human
/// decision, in conversation order.
pub fn pending_confirmations<'a>(
    messages: &'a [Message],
    catalog: &ToolCatalog,
) -> Vec<&'a ToolInvocation> {
    messages
        .iter()
        .flat_map(Message::tool_invocations)
        .filter(|inv| matches!(inv.state, ToolState::Pending { partial: false }))
        .filter(|inv| catalog.requires_confirmation(&inv.tool_name))
        .collect()
}

/// Record a human decision on a pending call by moving it to
/// `AwaitingExecution`. The resolver enacts it on the next pass.
pub fn record_decision(
    messages: &mut [Message],
    tool_call_id: &str,
    decision: Decision,
) -> Result<(), ConversationError> {
    let invocation = messages
        .iter_mut()
        .flat_map(Message::tool_invocations_mut)
        .find(|inv| inv.tool_call_id == tool_call_id)
        .ok_or_else(|| ConversationError::UnknownToolCall(tool_call_id.to_string()))?;

    if invocation.state != (ToolState::Pending { partial: false }) {
        return Err(ConversationError::NotAwaitingDecision {
            tool_call_id: tool_call_id.to_string(),
            state: invocation.state.label(),
        });
    }

    invocation.state = ToolState::AwaitingExecution(decision);
    tracing::debug!(tool_call_id, ?decision, "Recorded tool decision");
    Ok(())
}

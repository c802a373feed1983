//! Conversation resolver
//!
//! Walks a conversation, enacts every recorded human decision and streams one
//! [`ToolUpdate`] per enacted decision. Approved calls run through the
//! [`ExecutionRegistry`]; denied calls never run. Executions may overlap up to
//! a configured limit, but updates are always written in conversation order.

#[cfg(test)]
mod proptests;
#[cfg(test)]
pub(crate) mod testing;

use crate::channel::{OutputChannel, ToolUpdate};
use crate::conversation::{Decision, Message, Part, ToolState};
use crate::tools::{ExecutionContext, ExecutionRegistry, ToolError};
use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};
use serde_json::Value;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Default number of approved tools executed at the same time
pub const DEFAULT_MAX_CONCURRENT_EXECUTIONS: usize = 4;

/// A call whose decision has been recorded but not enacted
#[derive(Debug, Clone)]
struct PendingCall {
    message_index: usize,
    part_index: usize,
    tool_call_id: String,
    tool_name: String,
    args: Value,
    decision: Decision,
}

/// Enacts human decisions on tool calls
pub struct Resolver {
    registry: Arc<ExecutionRegistry>,
    max_concurrent: usize,
    cancel: CancellationToken,
}

impl Resolver {
    pub fn new(registry: Arc<ExecutionRegistry>) -> Self {
        Self {
            registry,
            max_concurrent: DEFAULT_MAX_CONCURRENT_EXECUTIONS,
            cancel: CancellationToken::new(),
        }
    }

    /// Limit on overlapping executions; `1` runs them strictly one by one
    #[must_use]
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// Parent token for the cancellation signal handed to executors
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Resolve every call awaiting execution.
    ///
    /// Returns the conversation with the same messages in the same order;
    /// only invocations in `AwaitingExecution` change. Executor failures and
    /// channel failures are contained and never abort the pass.
    pub async fn resolve<C>(&self, mut messages: Vec<Message>, channel: &C) -> Vec<Message>
    where
        C: OutputChannel + ?Sized,
    {
        let pending = collect_pending(&messages);
        if pending.is_empty() {
            return messages;
        }

        tracing::info!(
            pending = pending.len(),
            max_concurrent = self.max_concurrent,
            "Resolving tool decisions"
        );

        // Executors see the conversation as submitted
        let snapshot: Arc<[Message]> = Arc::from(messages.clone());

        let settlements: Vec<BoxFuture<'_, (PendingCall, ToolState)>> = pending
            .into_iter()
            .map(|call| {
                let snapshot = Arc::clone(&snapshot);
                async move {
                    let state = self.settle(&call, snapshot).await;
                    (call, state)
                }
                .boxed()
            })
            .collect();
        let mut outcomes = futures::stream::iter(settlements).buffered(self.max_concurrent);

        while let Some((call, state)) = outcomes.next().await {
            let update = ToolUpdate {
                tool_call_id: call.tool_call_id.clone(),
                tool_name: call.tool_name.clone(),
                result: state.wire_result().unwrap_or(Value::Null),
            };
            apply(&mut messages, &call, state);

            if let Err(e) = channel.write(update).await {
                tracing::warn!(
                    tool_call_id = %call.tool_call_id,
                    error = %e,
                    "Failed to stream tool update"
                );
            }
        }

        messages
    }

    /// Turn one recorded decision into a terminal state
    async fn settle(&self, call: &PendingCall, conversation: Arc<[Message]>) -> ToolState {
        if call.decision == Decision::Denied {
            tracing::info!(
                tool_call_id = %call.tool_call_id,
                tool = %call.tool_name,
                "Tool call denied"
            );
            return ToolState::Denied;
        }

        let Some(executor) = self.registry.lookup(&call.tool_name) else {
            tracing::warn!(
                tool_call_id = %call.tool_call_id,
                tool = %call.tool_name,
                "Approved tool has no registered executor"
            );
            return ToolState::Resolved(missing_executor_result(&call.tool_name));
        };

        let ctx = ExecutionContext::new(
            self.cancel.child_token(),
            call.tool_call_id.clone(),
            conversation,
            call.message_index + 1,
        );

        tracing::info!(
            tool_call_id = %call.tool_call_id,
            tool = %call.tool_name,
            "Executing approved tool"
        );
        let start = std::time::Instant::now();
        let outcome = AssertUnwindSafe(executor.execute(call.args.clone(), ctx))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(ToolError::Panicked(panic_message(&*panic))));

        match outcome {
            Ok(value) => {
                tracing::info!(
                    tool_call_id = %call.tool_call_id,
                    tool = %call.tool_name,
                    duration_ms = %start.elapsed().as_millis(),
                    "Tool executed"
                );
                terminal_from_output(value)
            }
            Err(e) => {
                tracing::warn!(
                    tool_call_id = %call.tool_call_id,
                    tool = %call.tool_name,
                    error = %e,
                    "Tool execution failed"
                );
                ToolState::Resolved(e.to_result_value())
            }
        }
    }
}

/// Result recorded when an approved tool has nothing to run it
pub fn missing_executor_result(tool_name: &str) -> Value {
    Value::String(format!("Error: No executor registered for tool {tool_name}"))
}

/// An executor output that reads back as an approval sentinel would be
/// enacted again on the next pass, so it is recorded as an error instead.
fn terminal_from_output(value: Value) -> ToolState {
    match ToolState::from_result(value) {
        ToolState::AwaitingExecution(_) | ToolState::Pending { .. } => ToolState::Resolved(
            ToolError::failed("Tool returned a reserved approval value").to_result_value(),
        ),
        terminal => terminal,
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn collect_pending(messages: &[Message]) -> Vec<PendingCall> {
    messages
        .iter()
        .enumerate()
        .flat_map(|(message_index, message)| {
            message
                .parts
                .iter()
                .flatten()
                .enumerate()
                .filter_map(move |(part_index, part)| {
                    let invocation = part.as_tool_invocation()?;
                    let ToolState::AwaitingExecution(decision) = invocation.state else {
                        return None;
                    };
                    Some(PendingCall {
                        message_index,
                        part_index,
                        tool_call_id: invocation.tool_call_id.clone(),
                        tool_name: invocation.tool_name.clone(),
                        args: invocation.args.clone(),
                        decision,
                    })
                })
        })
        .collect()
}

fn apply(messages: &mut [Message], call: &PendingCall, state: ToolState) {
    let part = messages
        .get_mut(call.message_index)
        .and_then(|message| message.parts.as_mut())
        .and_then(|parts| parts.get_mut(call.part_index));

    if let Some(Part::ToolInvocation { invocation, .. }) = part {
        invocation.state = state;
    }
}

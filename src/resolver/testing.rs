//! Mock executors and channels for resolver tests

use crate::channel::{ChannelError, OutputChannel, ToolUpdate};
use crate::conversation::{Message, Part, Role};
use crate::tools::{ExecutionContext, ToolError, ToolExecutor};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

// ============================================================================
// Conversation builders
// ============================================================================

pub fn user(id: &str, text: &str) -> Message {
    Message::new(id, Role::User, text)
}

pub fn assistant(id: &str, parts: Vec<Part>) -> Message {
    Message::new(id, Role::Assistant, "").with_parts(parts)
}

// ============================================================================
// Channels
// ============================================================================

/// Channel that records every update it is handed
#[derive(Default)]
pub struct RecordingChannel {
    updates: Mutex<Vec<ToolUpdate>>,
}

impl RecordingChannel {
    pub fn updates(&self) -> Vec<ToolUpdate> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl OutputChannel for RecordingChannel {
    async fn write(&self, update: ToolUpdate) -> Result<(), ChannelError> {
        self.updates.lock().unwrap().push(update);
        Ok(())
    }

    async fn close(&self) {}
}

/// Channel whose receiver is gone
#[derive(Default)]
pub struct FailingChannel {
    attempts: AtomicUsize,
}

impl FailingChannel {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OutputChannel for FailingChannel {
    async fn write(&self, _update: ToolUpdate) -> Result<(), ChannelError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(ChannelError::Disconnected)
    }

    async fn close(&self) {}
}

// ============================================================================
// Executors
// ============================================================================

/// What an executor was called with
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub args: Value,
    pub tool_call_id: String,
    /// Ids of the messages visible through the context
    pub visible_messages: Vec<String>,
}

/// Executor with a fixed outcome that records its calls
pub struct MockExecutor {
    outcome: Result<Value, String>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockExecutor {
    pub fn returning(value: Value) -> Self {
        Self {
            outcome: Ok(value),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            outcome: Err(message.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolExecutor for MockExecutor {
    async fn execute(&self, args: Value, ctx: ExecutionContext) -> Result<Value, ToolError> {
        self.calls.lock().unwrap().push(RecordedCall {
            args,
            tool_call_id: ctx.tool_call_id.clone(),
            visible_messages: ctx.messages().iter().map(|m| m.id.clone()).collect(),
        });
        self.outcome.clone().map_err(ToolError::Failed)
    }
}

/// Executor that panics mid-call
pub struct PanickingExecutor;

#[async_trait]
impl ToolExecutor for PanickingExecutor {
    async fn execute(&self, _args: Value, _ctx: ExecutionContext) -> Result<Value, ToolError> {
        panic!("boom")
    }
}

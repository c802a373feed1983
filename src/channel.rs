//! Output channel for resolution updates
//!
//! The resolver only ever writes; closing belongs to whoever owns the
//! request/response boundary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::conversation::Message;

/// One resolved invocation, as streamed to the UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolUpdate {
    pub tool_call_id: String,
    pub tool_name: String,
    pub result: Value,
}

/// Frames produced at the request/response boundary
#[derive(Debug, Clone)]
pub enum StreamEvent {
    ToolUpdate(ToolUpdate),
    Conversation { messages: Vec<Message> },
    Done,
    Error { message: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChannelError {
    #[error("output channel is closed")]
    Closed,
    #[error("output channel receiver went away")]
    Disconnected,
}

/// Append-only sink for resolution updates
#[async_trait]
pub trait OutputChannel: Send + Sync {
    async fn write(&self, update: ToolUpdate) -> Result<(), ChannelError>;

    async fn close(&self);
}

/// Channel backed by a bounded tokio mpsc queue of [`StreamEvent`]s
pub struct MpscChannel {
    tx: Mutex<Option<mpsc::Sender<StreamEvent>>>,
}

impl MpscChannel {
    pub fn new(tx: mpsc::Sender<StreamEvent>) -> Self {
        Self {
            tx: Mutex::new(Some(tx)),
        }
    }

    /// Create a channel together with the receiving end
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<StreamEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }

    /// Send a boundary frame (final conversation, done marker, error)
    pub async fn emit(&self, event: StreamEvent) -> Result<(), ChannelError> {
        let tx = self
            .tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(ChannelError::Closed)?;
        tx.send(event).await.map_err(|_| ChannelError::Disconnected)
    }
}

#[async_trait]
impl OutputChannel for MpscChannel {
    async fn write(&self, update: ToolUpdate) -> Result<(), ChannelError> {
        self.emit(StreamEvent::ToolUpdate(update)).await
    }

    async fn close(&self) {
        self.tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

//! Server-Sent Events framing for resolution streams

use crate::channel::StreamEvent;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tokio_util::sync::DropGuard;

/// Convert the resolver's event queue to an SSE response.
///
/// `cancel_on_drop` lives as long as the response stream, so a client that
/// goes away cancels the executions still running for it.
pub fn sse_stream(
    rx: mpsc::Receiver<StreamEvent>,
    keepalive: Duration,
    cancel_on_drop: DropGuard,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events = ReceiverStream::new(rx).map(move |event| {
        let _guard = &cancel_on_drop;
        Ok(stream_event_to_axum(event))
    });

    Sse::new(events).keep_alive(KeepAlive::new().interval(keepalive).text("ping"))
}

fn stream_event_to_axum(event: StreamEvent) -> Event {
    let (event_type, data) = match event {
        StreamEvent::ToolUpdate(update) => (
            "tool_update",
            json!({
                "type": "tool_update",
                "toolCallId": update.tool_call_id,
                "toolName": update.tool_name,
                "result": update.result
            }),
        ),
        StreamEvent::Conversation { messages } => (
            "conversation",
            json!({
                "type": "conversation",
                "messages": messages
            }),
        ),
        StreamEvent::Done => (
            "done",
            json!({
                "type": "done"
            }),
        ),
        StreamEvent::Error { message } => (
            "error",
            json!({
                "type": "error",
                "message": message
            }),
        ),
    };

    Event::default().event(event_type).data(data.to_string())
}

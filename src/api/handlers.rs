//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{
    ConversationRequest, ConversationResponse, DecisionRequest, ErrorResponse,
    PendingConfirmation, PendingResponse, ToolsResponse,
};
use super::AppState;
use crate::channel::{MpscChannel, OutputChannel, StreamEvent};
use crate::conversation::{pending_confirmations, record_decision, Decision};
use crate::resolver::Resolver;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Frames buffered between the resolver and a slow client
const STREAM_BUFFER: usize = 32;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/tools", get(list_tools))
        .route("/api/chat/pending", post(list_pending))
        .route("/api/chat/decision", post(decide))
        .route("/api/chat/resolve", post(resolve))
        .with_state(state)
}

// ============================================================
// Tool Catalog
// ============================================================

async fn list_tools(State(state): State<AppState>) -> Json<ToolsResponse> {
    Json(ToolsResponse {
        tools: state.catalog.definitions(),
    })
}

// ============================================================
// Decisions
// ============================================================

async fn list_pending(
    State(state): State<AppState>,
    Json(req): Json<ConversationRequest>,
) -> Json<PendingResponse> {
    let pending = pending_confirmations(&req.messages, &state.catalog)
        .into_iter()
        .map(|inv| PendingConfirmation {
            tool_call_id: inv.tool_call_id.clone(),
            tool_name: inv.tool_name.clone(),
            args: inv.args.clone(),
        })
        .collect();

    Json(PendingResponse { pending })
}

async fn decide(Json(req): Json<DecisionRequest>) -> Result<Json<ConversationResponse>, AppError> {
    let decision = if req.approved {
        Decision::Approved
    } else {
        Decision::Denied
    };

    let mut messages = req.messages;
    record_decision(&mut messages, &req.tool_call_id, decision)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    Ok(Json(ConversationResponse { messages }))
}

// ============================================================
// Resolution Stream
// ============================================================

async fn resolve(
    State(state): State<AppState>,
    Json(req): Json<ConversationRequest>,
) -> impl IntoResponse {
    let cancel = CancellationToken::new();
    let resolver = Resolver::new(state.registry.clone())
        .with_max_concurrent(state.config.max_concurrent_executions)
        .with_cancel(cancel.clone());

    let (channel, rx) = MpscChannel::bounded(STREAM_BUFFER);
    let channel = Arc::new(channel);

    tokio::spawn(async move {
        let worker = {
            let channel = channel.clone();
            tokio::spawn(async move { resolver.resolve(req.messages, channel.as_ref()).await })
        };

        let frame = match worker.await {
            Ok(messages) => StreamEvent::Conversation { messages },
            Err(e) => {
                tracing::error!(error = %e, "Resolution task failed");
                StreamEvent::Error {
                    message: format!("Resolution failed: {e}"),
                }
            }
        };

        let finished = match channel.emit(frame).await {
            Ok(()) => channel.emit(StreamEvent::Done).await,
            Err(e) => Err(e),
        };
        if let Err(e) = finished {
            tracing::warn!(error = %e, "Failed to stream resolution result");
        }
        channel.close().await;
    });

    sse_stream(rx, state.config.sse_keepalive, cancel.drop_guard())
}

// ============================================================
// Error Handling
// ============================================================

enum AppError {
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}

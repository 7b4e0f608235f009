use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use bytes::Bytes;
use futures::Stream;
use http::StatusCode;
use reasoner::errors::ReasonerError;
use reasoner::models::display::{DisplayEvent, DisplaySink};
use reasoner::models::stream::Channel;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{
    convert::Infallible,
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::session::error_response;

#[derive(Debug, Deserialize)]
struct ReplyRequest {
    message: String,
}

// Streaming response, one protocol line per display event
pub struct SseResponse {
    rx: UnboundedReceiverStream<String>,
}

impl SseResponse {
    fn new(rx: UnboundedReceiverStream<String>) -> Self {
        Self { rx }
    }
}

impl Stream for SseResponse {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.rx)
            .poll_next(cx)
            .map(|opt| opt.map(|s| Ok(Bytes::from(s))))
    }
}

impl IntoResponse for SseResponse {
    fn into_response(self) -> Response {
        let body = axum::body::Body::from_stream(self);

        http::Response::builder()
            .header("Content-Type", "text/event-stream")
            .header("Cache-Control", "no-cache")
            .header("Connection", "keep-alive")
            .body(body)
            .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
    }
}

#[derive(Serialize)]
struct Fragment<'a> {
    channel: Channel,
    text: &'a str,
}

// Protocol-specific line formatting
struct ProtocolFormatter;

impl ProtocolFormatter {
    fn format_event(event: &DisplayEvent) -> String {
        match event {
            // Provisional text starts with "p:", replaced by the next "u:" on its channel
            DisplayEvent::Provisional { channel, text } => {
                format!("p:{}\n", Self::fragment(*channel, text))
            }
            // Formatted units start with "u:"
            DisplayEvent::Unit { channel, text } => {
                format!("u:{}\n", Self::fragment(*channel, text))
            }
            // Errors start with "3:"
            DisplayEvent::Error { message } => {
                let encoded = serde_json::to_string(message).unwrap_or_else(|_| "\"\"".to_string());
                format!("3:{}\n", encoded)
            }
        }
    }

    fn fragment(channel: Channel, text: &str) -> String {
        serde_json::to_string(&Fragment { channel, text }).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_finish(reason: &str) -> String {
        // Finish messages start with "d:"
        format!("d:{}\n", json!({ "finishReason": reason }))
    }
}

/// Forwards display events to the response stream
struct ChannelSink {
    tx: mpsc::UnboundedSender<String>,
}

impl DisplaySink for ChannelSink {
    fn emit(&mut self, event: DisplayEvent) {
        // A closed channel means the client left; the heartbeat cancels the turn
        let _ = self.tx.send(ProtocolFormatter::format_event(&event));
    }
}

async fn handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ReplyRequest>,
) -> Response {
    let Some(session) = state.session(&id) else {
        return error_response(StatusCode::NOT_FOUND, "Unknown session");
    };
    let message = request.message.trim().to_string();
    if message.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Message must not be empty");
    }
    // One turn per conversation at a time
    let Ok(mut conversation) = session.try_lock_owned() else {
        return error_response(StatusCode::CONFLICT, "A reply is already in progress");
    };

    let (tx, rx) = mpsc::unbounded_channel();
    let driver = state.driver.clone();

    // Spawn task to handle streaming
    tokio::spawn(async move {
        let mut sink = ChannelSink { tx: tx.clone() };
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let mut heartbeat = tokio::time::interval(Duration::from_millis(500));

        let result = {
            let run = driver.run(&mut conversation, &message, &mut sink, cancel_rx);
            tokio::pin!(run);
            loop {
                tokio::select! {
                    result = &mut run => break result,
                    // Heartbeat, used to detect disconnected clients and then cancel the turn
                    _ = heartbeat.tick() => {
                        if tx.is_closed() {
                            let _ = cancel_tx.send(true);
                        }
                    }
                }
            }
        };

        let reason = match &result {
            Ok(_) => "stop",
            Err(ReasonerError::Cancelled) => "cancelled",
            Err(_) => "error",
        };
        tracing::info!(session = %id, reason, "reply finished");
        let _ = tx.send(ProtocolFormatter::format_finish(reason));
    });

    SseResponse::new(UnboundedReceiverStream::new(rx)).into_response()
}

// Configure routes for this module
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/sessions/:id/reply", post(handler))
        .with_state(state)
}

//! Chat handler
//!
//! Relays one generate stream as SSE. Every decoded upstream line becomes one
//! `data:` frame; a failure becomes an error frame followed by a
//! `{"done": true}` frame so the client's read loop can stop.

use std::convert::Infallible;

use ai_core::{ChatTurn, DecodedEvent, EventStream, InferenceError};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    response::sse::{Event, Sse},
};
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, instrument};

use crate::{error::ApiError, state::AppState};

/// Chat request body
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Model to use (server default when absent)
    #[serde(default)]
    pub model: Option<String>,
    /// User prompt
    pub prompt: String,
    /// Context returned by the previous turn
    #[serde(default)]
    pub context: Option<Vec<Value>>,
}

impl From<ChatRequest> for ChatTurn {
    fn from(request: ChatRequest) -> Self {
        Self {
            model: request.model,
            prompt: request.prompt,
            context: request.context.unwrap_or_default(),
        }
    }
}

/// Handle a streaming chat request via SSE
#[instrument(skip_all)]
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let Json(request) = payload?;

    info!(
        model = request.model.as_deref().unwrap_or(state.inference.default_model()),
        prompt_len = request.prompt.len(),
        "Chat turn started"
    );

    let events = state.inference.generate_stream(request.into());
    Ok(Sse::new(sse_frames(events)))
}

/// Map an event stream to SSE frames
pub fn sse_frames(events: EventStream) -> impl Stream<Item = Result<Event, Infallible>> + Send {
    events
        .flat_map(|item| stream::iter(frames_for(item)))
        .map(Ok)
}

fn frames_for(item: Result<DecodedEvent, InferenceError>) -> Vec<Event> {
    match item {
        Ok(event) => vec![Event::default().data(event.to_json())],
        Err(err) => {
            let payload = serde_json::to_string(&err.payload()).unwrap_or_default();
            vec![
                Event::default().data(payload),
                Event::default().data(DecodedEvent::done_sentinel().to_json()),
            ]
        },
    }
}

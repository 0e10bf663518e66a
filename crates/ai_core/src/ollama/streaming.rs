//! NDJSON stream decoding for Ollama's generate API
//!
//! Ollama emits one JSON object per line:
//! ```text
//! {"model":"llava:13b","response":"Hel","done":false}
//! {"model":"llava:13b","response":"lo","done":false}
//! {"model":"llava:13b","response":"","done":true,"context":[1,2,3]}
//! ```
//!
//! Lines that are not a JSON object are skipped without surfacing an error.

use std::error::Error as StdError;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde_json::{Map, Value};
use tracing::{trace, warn};

use crate::{
    config::StreamFraming,
    error::InferenceError,
    ports::{DecodedEvent, EventStream},
};

/// Incremental NDJSON decoder
#[derive(Debug)]
pub struct NdjsonDecoder {
    framing: StreamFraming,
    /// Bytes after the last newline seen so far (buffered framing only)
    pending: Vec<u8>,
}

impl NdjsonDecoder {
    /// Create a decoder with the given framing
    pub const fn new(framing: StreamFraming) -> Self {
        Self {
            framing,
            pending: Vec::new(),
        }
    }

    /// Decode the events completed by one chunk
    pub fn decode(&mut self, chunk: &[u8]) -> Vec<DecodedEvent> {
        match self.framing {
            StreamFraming::PerChunk => parse_lines(chunk),
            StreamFraming::Buffered => {
                let scanned = self.pending.len();
                self.pending.extend_from_slice(chunk);
                let Some(last_newline) = chunk.iter().rposition(|b| *b == b'\n') else {
                    return Vec::new();
                };
                let last_newline = scanned + last_newline;
                let complete: Vec<u8> = self.pending.drain(..=last_newline).collect();
                parse_lines(&complete)
            },
        }
    }

    /// Decode whatever is left once the body ends without a final newline
    pub fn finish(&mut self) -> Vec<DecodedEvent> {
        let rest = std::mem::take(&mut self.pending);
        parse_lines(&rest)
    }
}

/// Turn a response byte stream into an event stream.
///
/// A read error ends the stream with a single `ConnectionFailed`.
pub fn translate<S, E>(bytes: S, framing: StreamFraming) -> EventStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: StdError + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut decoder = NdjsonDecoder::new(framing);
        let mut bytes = std::pin::pin!(bytes);

        while let Some(chunk) = bytes.next().await {
            match chunk {
                Ok(chunk) => {
                    for event in decoder.decode(&chunk) {
                        yield Ok(event);
                    }
                },
                Err(e) => {
                    warn!(error = %e, "Upstream stream interrupted");
                    yield Err(InferenceError::connection(&e));
                    return;
                },
            }
        }

        for event in decoder.finish() {
            yield Ok(event);
        }
    })
}

fn parse_lines(bytes: &[u8]) -> Vec<DecodedEvent> {
    bytes.split(|b| *b == b'\n').filter_map(parse_line).collect()
}

fn parse_line(line: &[u8]) -> Option<DecodedEvent> {
    let Ok(text) = std::str::from_utf8(line) else {
        trace!(len = line.len(), "Skipping non UTF-8 stream line");
        return None;
    };
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    match serde_json::from_str::<Map<String, Value>>(text) {
        Ok(fields) => Some(DecodedEvent::from(fields)),
        Err(e) => {
            trace!(line = %text, error = %e, "Skipping malformed stream line");
            None
        },
    }
}

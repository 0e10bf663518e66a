//! Ollama inference engine
//!
//! Talks to the `/api/generate` endpoint of a local Ollama server and turns
//! its NDJSON output into [`DecodedEvent`](crate::ports::DecodedEvent)s.

mod client;
mod streaming;

pub use client::OllamaInferenceEngine;
pub use streaming::{NdjsonDecoder, translate};

//! AI Core - Ollama stream translation
//!
//! Sends one chat turn to a local Ollama server and exposes its NDJSON
//! output as a lazy stream of decoded events.

pub mod config;
pub mod error;
pub mod ollama;
pub mod ports;

pub use config::{InferenceConfig, StreamFraming};
pub use error::{CONNECTION_ERROR_MESSAGE, ErrorPayload, InferenceError};
pub use ollama::{NdjsonDecoder, OllamaInferenceEngine, translate};
pub use ports::{ChatTurn, DecodedEvent, EventStream, InferenceEngine};

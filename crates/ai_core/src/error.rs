//! Inference errors

use std::error::Error as StdError;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message reported to consumers when the Ollama server cannot be reached
pub const CONNECTION_ERROR_MESSAGE: &str = "Could not connect to Ollama server.";

/// Errors that terminate a generate turn
#[derive(Debug, Error)]
pub enum InferenceError {
    /// Server unreachable, or the connection dropped mid-stream
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Server answered with a non-2xx status
    #[error("Ollama API error: {status}")]
    Upstream {
        /// HTTP status code
        status: u16,
        /// Response body text, drained before reporting
        body: String,
    },

    /// HTTP client could not be constructed
    #[error("Client setup failed: {0}")]
    ClientSetup(String),
}

/// Error event body delivered to the consumer in place of model output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: String,
    pub details: String,
}

impl InferenceError {
    /// Consumer-facing `{error, details}` pair for this failure
    pub fn payload(&self) -> ErrorPayload {
        match self {
            Self::ConnectionFailed(cause) | Self::ClientSetup(cause) => ErrorPayload {
                error: CONNECTION_ERROR_MESSAGE.to_string(),
                details: cause.clone(),
            },
            Self::Upstream { status, body } => ErrorPayload {
                error: format!("Ollama API error: {status}"),
                details: body.clone(),
            },
        }
    }

    /// Transport failure built from any error, keeping its source chain
    pub fn connection(err: &(dyn StdError + 'static)) -> Self {
        Self::ConnectionFailed(error_chain(err))
    }
}

impl From<reqwest::Error> for InferenceError {
    fn from(err: reqwest::Error) -> Self {
        Self::connection(&err)
    }
}

/// Render an error and its sources as `outer: inner: root`
fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        // reqwest and hyper sometimes repeat the inner message in the outer one
        if !rendered.contains(&text) {
            rendered.push_str(": ");
            rendered.push_str(&text);
        }
        source = cause.source();
    }
    rendered
}

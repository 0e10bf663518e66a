//! Ollama generate client

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::streaming::translate;
use crate::{
    config::InferenceConfig,
    error::InferenceError,
    ports::{ChatTurn, EventStream, InferenceEngine},
};

/// Inference engine backed by a local Ollama server
#[derive(Debug, Clone)]
pub struct OllamaInferenceEngine {
    client: Client,
    config: InferenceConfig,
}

impl OllamaInferenceEngine {
    /// Create a new Ollama inference engine
    pub fn new(config: InferenceConfig) -> Result<Self, InferenceError> {
        // No overall timeout: generation may stall for minutes between tokens
        let mut builder = Client::builder();
        if let Some(ms) = config.connect_timeout_ms {
            builder = builder.connect_timeout(Duration::from_millis(ms));
        }
        let client = builder
            .build()
            .map_err(|e| InferenceError::ClientSetup(e.to_string()))?;

        info!(
            base_url = %config.base_url,
            model = %config.default_model,
            framing = ?config.framing,
            "Initialized Ollama inference engine"
        );

        Ok(Self { client, config })
    }

    /// Create with default configuration
    pub fn with_defaults() -> Result<Self, InferenceError> {
        Self::new(InferenceConfig::default())
    }

    /// Build the API URL for a given endpoint
    fn api_url(&self, endpoint: &str) -> String {
        format!(
            "{}/api/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    /// Build the upstream body for a turn
    fn generate_request(&self, turn: ChatTurn) -> GenerateRequest {
        GenerateRequest {
            model: turn
                .model
                .unwrap_or_else(|| self.config.default_model.clone()),
            prompt: turn.prompt,
            context: turn.context,
            stream: true,
        }
    }
}

/// Ollama-format generate request
#[derive(Debug, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    context: Vec<Value>,
    stream: bool,
}

#[async_trait]
impl InferenceEngine for OllamaInferenceEngine {
    fn generate_stream(&self, turn: ChatTurn) -> EventStream {
        let client = self.client.clone();
        let url = self.api_url("generate");
        let framing = self.config.framing;
        let request = self.generate_request(turn);

        Box::pin(async_stream::stream! {
            debug!(
                model = %request.model,
                prompt_len = request.prompt.len(),
                context_len = request.context.len(),
                "Starting streaming request to Ollama"
            );

            let response = match client.post(&url).json(&request).send().await {
                Ok(response) => response,
                Err(e) => {
                    let err = InferenceError::from(e);
                    warn!(url = %url, error = %err, "Could not reach Ollama");
                    yield Err(err);
                    return;
                },
            };

            let status = response.status();
            if !status.is_success() {
                match response.text().await {
                    Ok(body) => {
                        warn!(status = %status, body = %body, "Generate request failed");
                        yield Err(InferenceError::Upstream {
                            status: status.as_u16(),
                            body,
                        });
                    },
                    Err(e) => {
                        let err = InferenceError::from(e);
                        warn!(status = %status, error = %err, "Error body interrupted");
                        yield Err(err);
                    },
                }
                return;
            }

            let mut events = translate(response.bytes_stream(), framing);
            while let Some(event) = events.next().await {
                yield event;
            }
            debug!(model = %request.model, "Ollama stream closed");
        })
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<bool, InferenceError> {
        let response = self
            .client
            .get(self.api_url("tags"))
            .timeout(Duration::from_secs(5))
            .send()
            .await;

        match response {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(e) if e.is_timeout() || e.is_connect() => Ok(false),
            Err(e) => Err(InferenceError::from(e)),
        }
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }
}

//! Configuration for the inference engine

use serde::{Deserialize, Serialize};

/// How the NDJSON decoder cuts the upstream byte stream into lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamFraming {
    /// Carry an incomplete trailing fragment over to the next read
    #[default]
    Buffered,
    /// Split every read on its own; a line bisected by a read boundary is lost
    PerChunk,
}

impl std::str::FromStr for StreamFraming {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "buffered" => Ok(Self::Buffered),
            "per_chunk" => Ok(Self::PerChunk),
            _ => Err(format!(
                "Invalid framing: {s}. Use 'buffered' or 'per_chunk'"
            )),
        }
    }
}

/// Configuration for the inference engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Base URL of the Ollama server
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used when a turn does not name one
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Line framing for the generate stream
    #[serde(default)]
    pub framing: StreamFraming,

    /// Connect timeout in milliseconds.
    ///
    /// There is never a read timeout: a model may take arbitrarily long
    /// between two tokens.
    #[serde(default)]
    pub connect_timeout_ms: Option<u64>,
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llava:13b".to_string()
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            default_model: default_model(),
            framing: StreamFraming::default(),
            connect_timeout_ms: None,
        }
    }
}

impl InferenceConfig {
    /// Config pointing at a custom server, everything else defaulted
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sensible_values() {
        let config = InferenceConfig::default();
        assert_eq!(config.base_url, "http://localhost:11434");
        assert_eq!(config.default_model, "llava:13b");
        assert_eq!(config.framing, StreamFraming::Buffered);
        assert!(config.connect_timeout_ms.is_none());
    }

    #[test]
    fn with_base_url_keeps_defaults() {
        let config = InferenceConfig::with_base_url("http://gpu-box:11434");
        assert_eq!(config.base_url, "http://gpu-box:11434");
        assert_eq!(config.default_model, "llava:13b");
    }

    #[test]
    fn config_deserialization() {
        let json = r#"{"base_url":"http://custom:8080","default_model":"llama3","framing":"per_chunk"}"#;
        let config: InferenceConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.base_url, "http://custom:8080");
        assert_eq!(config.default_model, "llama3");
        assert_eq!(config.framing, StreamFraming::PerChunk);
    }

    #[test]
    fn config_deserialization_with_defaults() {
        let config: InferenceConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.base_url, "http://localhost:11434");
        assert_eq!(config.framing, StreamFraming::Buffered);
    }

    #[test]
    fn framing_from_str() {
        assert_eq!("buffered".parse::<StreamFraming>(), Ok(StreamFraming::Buffered));
        assert_eq!("per-chunk".parse::<StreamFraming>(), Ok(StreamFraming::PerChunk));
        assert_eq!("PER_CHUNK".parse::<StreamFraming>(), Ok(StreamFraming::PerChunk));
        assert!("lines".parse::<StreamFraming>().is_err());
    }
}

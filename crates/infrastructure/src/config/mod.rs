//! Application configuration
//!
//! Sources, later ones winning:
//! - built-in defaults
//! - an optional `config.toml` in the working directory
//! - `OLLAMA_RELAY_*` environment variables, `__` between nesting levels
//!   (e.g. `OLLAMA_RELAY_SERVER__PORT=9000`,
//!   `OLLAMA_RELAY_INFERENCE__DEFAULT_MODEL=llama3`)

mod server;

use std::path::Path;

use ai_core::InferenceConfig;
use serde::{Deserialize, Serialize};

pub use server::{LogFormat, ServerConfig};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "OLLAMA_RELAY";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Inference configuration
    #[serde(default)]
    pub inference: InferenceConfig,
}

impl AppConfig {
    /// Load configuration from environment and optional `config` file
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::build(config::File::with_name("config").required(false), None)
    }

    /// Load configuration from an explicit file, still honoring the environment
    pub fn load_from(path: &Path) -> Result<Self, config::ConfigError> {
        Self::build(config::File::from(path).required(true), None)
    }

    /// `env` replaces the process environment when given
    fn build<S>(
        file: S,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, config::ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let builder = config::Config::builder()
            // Start with defaults
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("inference.base_url", "http://localhost:11434")?
            .set_default("inference.default_model", "llava:13b")?
            .set_default("inference.framing", "buffered")?
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("server.allowed_origins")
                    .source(env),
            );

        builder.build()?.try_deserialize()
    }
}

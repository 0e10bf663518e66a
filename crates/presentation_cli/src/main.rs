//! Ollama Relay console
//!
//! Interactive chat against an Ollama server, straight from the terminal.

#![allow(clippy::print_stdout)]

mod console;

use std::{io, sync::Arc};

use ai_core::{InferenceConfig, OllamaInferenceEngine, StreamFraming};
use clap::Parser;
use infrastructure::{LogFormat, init_tracing};
use tokio::io::BufReader;
use tracing::debug;

use crate::console::Console;

/// Ollama Relay console chat
#[derive(Parser)]
#[command(name = "ollama-relay-console")]
#[command(author, version, about = "Chat with an Ollama model from the terminal", long_about = None)]
struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Ollama server URL
    #[arg(short, long, env = "OLLAMA_URL", default_value = "http://localhost:11434")]
    url: String,

    /// Model used for every turn
    #[arg(short, long, default_value = "llava:13b")]
    model: String,

    /// How response bytes are split into lines (buffered or per_chunk)
    #[arg(long, default_value = "buffered")]
    framing: StreamFraming,
}

const fn log_filter_from_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(LogFormat::Text, log_filter_from_verbosity(cli.verbose))?;

    let config = InferenceConfig {
        default_model: cli.model.clone(),
        framing: cli.framing,
        ..InferenceConfig::with_base_url(cli.url)
    };
    debug!(url = %config.base_url, model = %config.default_model, "Starting console");

    let engine = OllamaInferenceEngine::new(config)?;
    let mut console = Console::new(Arc::new(engine), cli.model, io::stdout());
    console.run(BufReader::new(tokio::io::stdin())).await?;

    Ok(())
}

//! Interactive console chat
//!
//! Reads one prompt per line, streams the reply fragments as they arrive and
//! carries the returned context into the next turn. Failures end the turn,
//! never the session.

use std::{
    fmt,
    io::{self, Write},
    sync::Arc,
};

use ai_core::{ChatTurn, InferenceEngine};
use futures::StreamExt;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

const BANNER: &str = "Console Chatbot. Type 'exit' to quit.";
const PROMPT: &str = "> ";
const REPLY_PREFIX: &str = "AI: ";

/// Sequential chat session writing to `out`
pub struct Console<W> {
    engine: Arc<dyn InferenceEngine>,
    model: String,
    out: W,
}

impl<W: Write> Console<W> {
    pub fn new(engine: Arc<dyn InferenceEngine>, model: impl Into<String>, out: W) -> Self {
        Self {
            engine,
            model: model.into(),
            out,
        }
    }

    /// Run until `exit` or end of input
    pub async fn run<R>(&mut self, input: R) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        writeln!(self.out, "{BANNER}")?;
        let mut lines = input.lines();
        let mut context = Vec::new();

        loop {
            write!(self.out, "{PROMPT}")?;
            self.out.flush()?;

            let Some(line) = lines.next_line().await? else {
                writeln!(self.out)?;
                break;
            };
            let prompt = line.trim();
            if prompt.eq_ignore_ascii_case("exit") {
                break;
            }
            if prompt.is_empty() {
                continue;
            }

            write!(self.out, "{REPLY_PREFIX}")?;
            context = self.turn(prompt, context).await?;
        }

        Ok(())
    }

    /// Stream one reply; returns the context for the next turn
    async fn turn(&mut self, prompt: &str, context: Vec<Value>) -> io::Result<Vec<Value>> {
        let turn = ChatTurn::new(prompt)
            .with_model(self.model.as_str())
            .with_context(context.clone());
        let mut events = self.engine.generate_stream(turn);
        let mut mid_line = false;

        while let Some(item) = events.next().await {
            match item {
                Ok(event) => {
                    if let Some(text) = event.response() {
                        write!(self.out, "{text}")?;
                        self.out.flush()?;
                        mid_line |= !text.is_empty();
                    }
                    if event.is_done() {
                        writeln!(self.out)?;
                        let next = event.context().map(<[Value]>::to_vec).unwrap_or_default();
                        debug!(context_len = next.len(), "Turn complete");
                        return Ok(next);
                    }
                },
                Err(err) => {
                    warn!(error = %err, "Turn failed");
                    let payload = err.payload();
                    if mid_line {
                        writeln!(self.out)?;
                    }
                    writeln!(self.out, "Error: {}", payload.error)?;
                    writeln!(self.out, "{}", payload.details)?;
                    return Ok(context);
                },
            }
        }

        // Body ended without a final event
        writeln!(self.out)?;
        Ok(context)
    }
}

impl<W> fmt::Debug for Console<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Console")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

//! Port definitions for the inference engine
//!
//! Defines the turn handed to an engine, the events it streams back and the
//! trait adapters implement.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::InferenceError;

/// One user turn to send upstream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Model to use (falls back to the engine default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// User prompt
    pub prompt: String,
    /// Opaque state returned by the previous turn, echoed back verbatim
    #[serde(default)]
    pub context: Vec<Value>,
}

impl ChatTurn {
    /// Create a first turn with no prior context
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            model: None,
            prompt: prompt.into(),
            context: Vec::new(),
        }
    }

    /// Set the model for this turn
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Continue from the context a previous turn returned
    pub fn with_context(mut self, context: Vec<Value>) -> Self {
        self.context = context;
        self
    }
}

/// One JSON object decoded from a single NDJSON line.
///
/// Fields are forwarded untouched; only `done`, `context` and `response`
/// have accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecodedEvent(Map<String, Value>);

impl DecodedEvent {
    /// The `{"done": true}` sentinel closing an aborted SSE stream
    pub fn done_sentinel() -> Self {
        let mut fields = Map::new();
        fields.insert("done".to_string(), Value::Bool(true));
        Self(fields)
    }

    /// Whether the server marked this as the final event
    pub fn is_done(&self) -> bool {
        self.0.get("done").and_then(Value::as_bool).unwrap_or(false)
    }

    /// Generated text fragment, if any
    pub fn response(&self) -> Option<&str> {
        self.0.get("response").and_then(Value::as_str)
    }

    /// Updated conversation state (final event only)
    pub fn context(&self) -> Option<&[Value]> {
        self.0.get("context").and_then(Value::as_array).map(Vec::as_slice)
    }

    /// Compact JSON text of the event
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "{}".to_string())
    }
}

impl From<Map<String, Value>> for DecodedEvent {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// Lazy event stream of one turn.
///
/// An `Err` item is terminal: nothing follows it.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<DecodedEvent, InferenceError>> + Send>>;

/// Port for inference engine implementations
#[async_trait]
pub trait InferenceEngine: Send + Sync {
    /// Stream the server's output for one turn.
    ///
    /// Nothing is sent until the stream is first polled; each call issues
    /// exactly one upstream request.
    fn generate_stream(&self, turn: ChatTurn) -> EventStream;

    /// Check if the inference server is reachable
    async fn health_check(&self) -> Result<bool, InferenceError>;

    /// Model used when a turn names none
    fn default_model(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn event(value: Value) -> DecodedEvent {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn chat_turn_builder() {
        let turn = ChatTurn::new("Hi")
            .with_model("llama3")
            .with_context(vec![json!(1), json!(2)]);
        assert_eq!(turn.prompt, "Hi");
        assert_eq!(turn.model.as_deref(), Some("llama3"));
        assert_eq!(turn.context, vec![json!(1), json!(2)]);
    }

    #[test]
    fn chat_turn_deserializes_without_optional_fields() {
        let turn: ChatTurn = serde_json::from_str(r#"{"prompt":"Hello"}"#).unwrap();
        assert!(turn.model.is_none());
        assert!(turn.context.is_empty());
    }

    #[test]
    fn decoded_event_accessors() {
        let ev = event(json!({
            "model": "llava:13b",
            "response": "",
            "done": true,
            "context": [1, 2, 3]
        }));
        assert!(ev.is_done());
        assert_eq!(ev.response(), Some(""));
        assert_eq!(ev.context(), Some([json!(1), json!(2), json!(3)].as_slice()));
    }

    #[test]
    fn missing_done_is_not_done() {
        let ev = event(json!({"response": "Hel"}));
        assert!(!ev.is_done());
        assert!(ev.context().is_none());
    }

    #[test]
    fn non_bool_done_is_not_done() {
        let ev = event(json!({"done": "yes"}));
        assert!(!ev.is_done());
    }

    #[test]
    fn done_sentinel_serializes_minimal() {
        assert_eq!(DecodedEvent::done_sentinel().to_json(), r#"{"done":true}"#);
    }

    #[test]
    fn to_json_keeps_unknown_fields() {
        let ev = event(json!({"response": "a", "eval_count": 7, "nested": {"k": [1]}}));
        let back: Value = serde_json::from_str(&ev.to_json()).unwrap();
        assert_eq!(back["eval_count"], 7);
        assert_eq!(back["nested"]["k"][0], 1);
    }

    #[test]
    fn to_json_preserves_field_order() {
        let line = r#"{"model":"m","created_at":"t","response":"x","done":false}"#;
        let ev: DecodedEvent = serde_json::from_str(line).unwrap();
        assert_eq!(ev.to_json(), line);
    }
}

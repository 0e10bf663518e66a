//! Integration tests for the Ollama inference engine using WireMock
//!
//! These tests mock the Ollama HTTP API to verify streaming and failure
//! behavior without requiring an actual Ollama server.

use ai_core::{
    ChatTurn, DecodedEvent, InferenceConfig, InferenceEngine, InferenceError,
    OllamaInferenceEngine, StreamFraming,
};
use futures::StreamExt;
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, body_partial_json, method, path},
};

// =============================================================================
// Test Helpers
// =============================================================================

fn inference_config_for_mock(base_url: &str) -> InferenceConfig {
    InferenceConfig {
        base_url: base_url.to_string(),
        default_model: "test-model".to_string(),
        framing: StreamFraming::Buffered,
        connect_timeout_ms: Some(2000),
    }
}

fn engine_for(server: &MockServer) -> OllamaInferenceEngine {
    OllamaInferenceEngine::new(inference_config_for_mock(&server.uri()))
        .expect("Failed to create engine")
}

/// Sample Ollama generate stream
fn generate_ndjson() -> String {
    [
        json!({"model": "test-model", "response": "Hello", "done": false}),
        json!({"model": "test-model", "response": " there", "done": false}),
        json!({"model": "test-model", "response": "", "done": true, "context": [10, 20, 30]}),
    ]
    .iter()
    .map(|v| format!("{v}\n"))
    .collect()
}

fn ndjson_response(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "application/x-ndjson")
}

async fn collect(engine: &OllamaInferenceEngine, turn: ChatTurn) -> Vec<Result<DecodedEvent, InferenceError>> {
    engine.generate_stream(turn).collect().await
}

/// Address nothing is listening on
fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

// =============================================================================
// Generate Stream Tests
// =============================================================================

mod generate_tests {
    use super::*;

    #[tokio::test]
    async fn streams_every_line_in_order() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ndjson_response(generate_ndjson()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let engine = engine_for(&mock_server);
        let events = collect(&engine, ChatTurn::new("Hi")).await;

        assert_eq!(events.len(), 3);
        let events: Vec<DecodedEvent> = events.into_iter().map(Result::unwrap).collect();
        assert_eq!(events[0].response(), Some("Hello"));
        assert_eq!(events[1].response(), Some(" there"));
        assert!(events[2].is_done());
        assert_eq!(events[2].context(), Some([json!(10), json!(20), json!(30)].as_slice()));
    }

    #[tokio::test]
    async fn sends_default_model_and_forces_stream() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_json(json!({
                "model": "test-model",
                "prompt": "Hi",
                "context": [],
                "stream": true
            })))
            .respond_with(ndjson_response(generate_ndjson()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let engine = engine_for(&mock_server);
        let events = collect(&engine, ChatTurn::new("Hi")).await;
        assert!(events.iter().all(Result::is_ok));
    }

    #[tokio::test]
    async fn passes_model_and_context_verbatim() {
        let mock_server = MockServer::start().await;
        let context = vec![json!(1), json!({"opaque": true}), json!(3)];

        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(json!({
                "model": "llama3",
                "context": [1, {"opaque": true}, 3]
            })))
            .respond_with(ndjson_response(generate_ndjson()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let engine = engine_for(&mock_server);
        let turn = ChatTurn::new("Continue")
            .with_model("llama3")
            .with_context(context);
        let events = collect(&engine, turn).await;
        assert_eq!(events.len(), 3);
    }

    #[tokio::test]
    async fn skips_malformed_lines() {
        let mock_server = MockServer::start().await;
        let body = format!(
            "{}\n{{\"response\": \"cut\n{}\n",
            json!({"response": "a", "done": false}),
            json!({"response": "", "done": true})
        );

        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ndjson_response(body))
            .mount(&mock_server)
            .await;

        let engine = engine_for(&mock_server);
        let events = collect(&engine, ChatTurn::new("Hi")).await;

        assert_eq!(events.len(), 2);
        assert!(events.iter().all(Result::is_ok));
    }

    #[tokio::test]
    async fn server_error_yields_single_upstream_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(
                ResponseTemplate::new(404).set_body_string(r#"{"error":"model 'x' not found"}"#),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let engine = engine_for(&mock_server);
        let events = collect(&engine, ChatTurn::new("Hi")).await;

        assert_eq!(events.len(), 1);
        let err = events.into_iter().next().unwrap().unwrap_err();
        let payload = err.payload();
        assert_eq!(payload.error, "Ollama API error: 404");
        assert_eq!(payload.details, r#"{"error":"model 'x' not found"}"#);
    }

    #[tokio::test]
    async fn unreachable_server_yields_single_connection_error() {
        let config = InferenceConfig::with_base_url(closed_port_url());
        let engine = OllamaInferenceEngine::new(config).expect("Failed to create engine");

        let events = collect(&engine, ChatTurn::new("Hi")).await;

        assert_eq!(events.len(), 1);
        let err = events.into_iter().next().unwrap().unwrap_err();
        assert!(matches!(err, InferenceError::ConnectionFailed(_)));
        let payload = err.payload();
        assert_eq!(payload.error, "Could not connect to Ollama server.");
        assert!(!payload.details.is_empty());
    }

    #[tokio::test]
    async fn truncated_error_body_yields_connection_error() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut request = Vec::new();
            let mut buf = [0_u8; 1024];
            while !request.ends_with(br#""stream":true}"#) {
                let n = socket.read(&mut buf).await.expect("read request");
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket
                .write_all(
                    b"HTTP/1.1 500 Internal Server Error\r\n\
                      Content-Type: text/plain\r\n\
                      Content-Length: 1000\r\n\r\n\
                      model crashed while",
                )
                .await
                .expect("write response");
        });

        let config = InferenceConfig::with_base_url(format!("http://{addr}"));
        let engine = OllamaInferenceEngine::new(config).expect("Failed to create engine");
        let events = collect(&engine, ChatTurn::new("Hi")).await;
        server.await.expect("server task");

        assert_eq!(events.len(), 1);
        let err = events.into_iter().next().unwrap().unwrap_err();
        assert!(matches!(err, InferenceError::ConnectionFailed(_)));
        assert_eq!(err.payload().error, "Could not connect to Ollama server.");
    }

    #[tokio::test]
    async fn nothing_is_sent_until_polled() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ndjson_response(generate_ndjson()))
            .expect(0)
            .mount(&mock_server)
            .await;

        let engine = engine_for(&mock_server);
        let stream = engine.generate_stream(ChatTurn::new("Hi"));
        drop(stream);
    }

    #[tokio::test]
    async fn each_turn_issues_one_request() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ndjson_response(generate_ndjson()))
            .expect(2)
            .mount(&mock_server)
            .await;

        let engine = engine_for(&mock_server);
        collect(&engine, ChatTurn::new("one")).await;
        collect(&engine, ChatTurn::new("two")).await;
    }

    #[tokio::test]
    async fn per_chunk_framing_streams_whole_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ndjson_response(generate_ndjson()))
            .mount(&mock_server)
            .await;

        let config = InferenceConfig {
            framing: StreamFraming::PerChunk,
            ..inference_config_for_mock(&mock_server.uri())
        };
        let engine = OllamaInferenceEngine::new(config).expect("Failed to create engine");
        let events = collect(&engine, ChatTurn::new("Hi")).await;

        assert_eq!(events.len(), 3);
    }
}

// =============================================================================
// Health Check Tests
// =============================================================================

mod health_tests {
    use super::*;

    #[tokio::test]
    async fn health_check_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"models": []})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let engine = engine_for(&mock_server);
        assert!(engine.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn health_check_server_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&mock_server)
            .await;

        let engine = engine_for(&mock_server);
        assert!(!engine.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn health_check_server_down() {
        let config = InferenceConfig::with_base_url(closed_port_url());
        let engine = OllamaInferenceEngine::new(config).expect("Failed to create engine");

        assert!(!engine.health_check().await.unwrap());
    }
}

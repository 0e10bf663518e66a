//! Ollama Relay HTTP presentation layer
//!
//! Exposes `POST /api/chat`, relaying Ollama's generate stream as
//! Server-Sent Events.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_app, create_router, cors_layer};
pub use state::AppState;

//! Application state shared across handlers

use std::{fmt, sync::Arc};

use ai_core::InferenceEngine;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Engine every chat turn is sent to
    pub inference: Arc<dyn InferenceEngine>,
}

impl AppState {
    /// Wrap an engine
    pub fn new(inference: Arc<dyn InferenceEngine>) -> Self {
        Self { inference }
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("default_model", &self.inference.default_model())
            .finish_non_exhaustive()
    }
}

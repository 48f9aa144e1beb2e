use std::sync::Arc;

use crate::models::ModelManager;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Lazily-loaded engine singletons, shared across requests
    pub models: Arc<ModelManager>,
}

impl AppState {
    pub fn new(models: Arc<ModelManager>) -> Self {
        Self { models }
    }
}

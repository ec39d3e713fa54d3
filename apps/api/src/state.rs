use crate::config::Config;
use crate::screening::batch::BatchRunner;

/// Shared application state injected into all route handlers via Axum extractors.
/// Read-only: every screening run owns its own request data.
#[derive(Clone)]
pub struct AppState {
    /// PDF extractor + chat model used for every run.
    pub runner: BatchRunner,
    pub config: Config,
}

use std::sync::Arc;

use crate::config::Config;
use crate::recommendation::orchestrator::Recommender;

/// Shared application state injected into all route handlers via Axum extractors.
/// Read-only after startup; each request builds its own `RequestContext`.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub recommender: Arc<Recommender>,
}

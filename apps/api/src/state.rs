use std::sync::Arc;

use crate::config::Config;
use crate::upload::storage::UploadStore;
use crate::worker::invoker::WorkerInvoker;

/// Shared application state injected into route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Ephemeral upload storage behind a trait so tests can substitute an
    /// instrumented store.
    pub store: Arc<dyn UploadStore>,
    pub invoker: Arc<WorkerInvoker>,
}

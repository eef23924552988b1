use std::sync::Arc;

use crate::matching::store::MatchStore;
use crate::matching::triggers::MatchDispatcher;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Match table reads and workflow-field writes.
    pub matches: Arc<dyn MatchStore>,
    /// Runs matching batches, in the background or on demand.
    pub dispatcher: MatchDispatcher,
}

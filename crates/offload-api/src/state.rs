//! Shared application state passed to every handler.

use std::sync::Arc;
use std::time::Instant;

use offload_database::DatabasePool;
use offload_worker::{IntakeHook, OffloadControl, UrlResolver};

/// State threaded through the router with `.with_state(state)`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Manual trigger surface over the processor
    pub control: OffloadControl,
    /// Upload intake hook
    pub intake: IntakeHook,
    /// Public URL resolver
    pub resolver: UrlResolver,
    /// Bearer token granting administrative privilege. `None` disables
    /// every privileged endpoint.
    pub admin_token: Option<Arc<str>>,
    /// Database pool, checked by the health endpoint when present
    pub db: Option<DatabasePool>,
    /// Process start time
    pub started_at: Instant,
}

impl AppState {
    /// Create state without a database handle.
    pub fn new(
        control: OffloadControl,
        intake: IntakeHook,
        resolver: UrlResolver,
        admin_token: Option<String>,
    ) -> Self {
        Self {
            control,
            intake,
            resolver,
            admin_token: admin_token
                .filter(|t| !t.trim().is_empty())
                .map(Arc::from),
            db: None,
            started_at: Instant::now(),
        }
    }

    /// Attach the database pool used by the health check.
    pub fn with_database(mut self, db: DatabasePool) -> Self {
        self.db = Some(db);
        self
    }
}

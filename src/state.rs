use std::sync::{Arc, Mutex};

use sqlx::SqlitePool;

use crate::{db::health::DbHealthReport, session::SessionHandle};

/// Shared application context handed to every view. Cloning is cheap;
/// the fields are handles.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub sessions: SessionHandle,
    pub db_health: Arc<Mutex<DbHealthReport>>,
}

impl AppState {
    pub fn new(pool: SqlitePool, sessions: SessionHandle, db_health: DbHealthReport) -> Self {
        AppState {
            pool,
            sessions,
            db_health: Arc::new(Mutex::new(db_health)),
        }
    }

    /// The health snapshot taken at startup; the write guard consults it.
    pub fn db_health_snapshot(&self) -> DbHealthReport {
        self.db_health
            .lock()
            .map(|report| report.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

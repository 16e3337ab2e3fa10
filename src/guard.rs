//! Blocks database mutations while the cached health report is in error.
//!
//! The report is captured at startup. When the guard rejects a write it
//! surfaces `DB_UNHEALTHY_CODE`, and the CLI maps the same condition to
//! `DB_UNHEALTHY_EXIT_CODE` so automation can detect it uniformly.

use tracing::warn;

use crate::{db::health::DbHealthStatus, state::AppState, AppError, AppResult};

/// Stable error code returned when database health prevents write operations.
pub const DB_UNHEALTHY_CODE: &str = "DB_UNHEALTHY_WRITE_BLOCKED";
/// User-facing message presented when writes are blocked for health reasons.
pub const DB_UNHEALTHY_MESSAGE: &str =
    "Database integrity checks failed. Editing is disabled until repair completes.";
/// CLI guidance surfaced when a mutating command is blocked due to database health.
pub const DB_UNHEALTHY_CLI_HINT: &str = "Run 'ladle db status' for details.";
/// Exit status used by CLI subcommands when writes are rejected.
pub const DB_UNHEALTHY_EXIT_CODE: i32 = 2;

#[must_use = "Database health must be checked before executing a mutation"]
#[derive(Debug)]
pub struct DbWriteGuard {
    _private: (),
}

impl DbWriteGuard {
    fn new() -> Self {
        Self { _private: () }
    }
}

/// Ensure the cached database health permits write operations.
#[must_use = "Database health must be checked before executing a mutation"]
pub fn ensure_db_writable(state: &AppState) -> AppResult<DbWriteGuard> {
    let report = state.db_health_snapshot();

    if !matches!(report.status, DbHealthStatus::Ok) {
        warn!(
            target: "ladle",
            event = "db_write_blocked",
            status = ?report.status
        );
        return Err(AppError::new(DB_UNHEALTHY_CODE, DB_UNHEALTHY_MESSAGE)
            .with_context("status", format!("{:?}", report.status)));
    }

    Ok(DbWriteGuard::new())
}

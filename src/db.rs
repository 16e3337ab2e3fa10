use anyhow::{Context, Result as AnyResult};
use futures::future::BoxFuture;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite, Transaction};
use std::path::Path;

pub mod health;

pub async fn open_sqlite_pool(db_path: &Path) -> AnyResult<Pool<Sqlite>> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            tracing::error!(
                target = "ladle",
                error = %e,
                event = "db_dir_create_failed",
                path = %parent.display()
            );
            e
        })?;
    }
    tracing::info!(target = "ladle", event = "db_path", path = %db_path.display());

    let opts = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Full)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .after_connect(|conn, _| {
            Box::pin(async move {
                sqlx::query("PRAGMA foreign_keys=ON;")
                    .execute(&mut *conn)
                    .await?;
                sqlx::query("PRAGMA busy_timeout = 5000;")
                    .execute(&mut *conn)
                    .await?;
                sqlx::query("PRAGMA wal_autocheckpoint = 1000;")
                    .execute(&mut *conn)
                    .await?;
                Ok::<_, sqlx::Error>(())
            })
        })
        .connect_with(opts)
        .await
        .with_context(|| format!("open sqlite database at {}", db_path.display()))?;

    log_effective_pragmas(&pool).await;

    Ok(pool)
}

async fn log_effective_pragmas(pool: &Pool<Sqlite>) {
    use tracing::{info, warn};

    let (sqlite_ver,): (String,) = sqlx::query_as("select sqlite_version()")
        .fetch_one(pool)
        .await
        .unwrap_or((String::from("unknown"),));

    let jm: (String,) = sqlx::query_as("PRAGMA journal_mode;")
        .fetch_one(pool)
        .await
        .unwrap_or((String::from("unknown"),));

    let sync: (i64,) = sqlx::query_as("PRAGMA synchronous;")
        .fetch_one(pool)
        .await
        .unwrap_or((i64::MIN,));

    let fks: (i64,) = sqlx::query_as("PRAGMA foreign_keys;")
        .fetch_one(pool)
        .await
        .unwrap_or((i64::MIN,));

    let busy: (i64,) = sqlx::query_as("PRAGMA busy_timeout;")
        .fetch_one(pool)
        .await
        .unwrap_or((i64::MIN,));

    info!(
        target: "ladle",
        event = "db_open",
        sqlite_version = %sqlite_ver,
        journal_mode = %jm.0,
        synchronous = %sync.0,
        foreign_keys = %fks.0,
        busy_timeout_ms = %busy.0
    );

    if !jm.0.eq_ignore_ascii_case("wal") {
        warn!(
            target = "ladle",
            event = "db_open_warning",
            msg = "journal_mode != WAL; running with reduced crash safety"
        );
    }
}

/// Run work inside a transaction. Commits on success, rolls back on error.
///
/// Dropping the returned future before completion also rolls back, which is
/// what ties an in-flight save to the lifetime of the request that issued it.
pub async fn run_in_tx<R, E, F>(pool: &Pool<Sqlite>, f: F) -> Result<R, E>
where
    E: From<sqlx::Error>,
    F: for<'c> FnOnce(&'c mut Transaction<'static, Sqlite>) -> BoxFuture<'c, Result<R, E>>,
{
    use tracing::{error, info, warn};

    let mut tx = pool.begin().await.map_err(E::from)?;
    info!(target = "ladle", event = "db_tx_begin");
    match f(&mut tx).await {
        Ok(val) => {
            tx.commit().await.map_err(E::from)?;
            info!(target = "ladle", event = "db_tx_commit");
            Ok(val)
        }
        Err(e) => {
            if let Err(rb) = tx.rollback().await {
                error!(target = "ladle", event = "db_tx_rollback_failed", error = %rb);
            } else {
                warn!(target = "ladle", event = "db_tx_rollback");
            }
            Err(e)
        }
    }
}

use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::sqlite::SqliteRow;
use sqlx::{pool::PoolConnection, Row, Sqlite, SqlitePool};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DbHealthStatus {
    Ok,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbHealthCheck {
    pub name: String,
    pub passed: bool,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbHealthOffender {
    pub table: String,
    pub rowid: i64,
    pub message: String,
}

/// Snapshot of the startup integrity checks; cached in [`crate::state::AppState`]
/// and consulted by the write guard before every mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbHealthReport {
    pub status: DbHealthStatus,
    pub checks: Vec<DbHealthCheck>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub offenders: Vec<DbHealthOffender>,
    pub schema_hash: String,
    pub app_version: String,
    pub generated_at: String,
}

impl DbHealthReport {
    /// A report that unconditionally permits writes; used by tests and tools
    /// that operate on databases they just created.
    pub fn healthy() -> Self {
        DbHealthReport {
            status: DbHealthStatus::Ok,
            checks: Vec::new(),
            offenders: Vec::new(),
            schema_hash: String::new(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

pub async fn run_health_checks(pool: &SqlitePool) -> Result<DbHealthReport> {
    let mut conn = pool
        .acquire()
        .await
        .context("acquire connection for health checks")?;

    let mut checks: Vec<DbHealthCheck> = Vec::new();
    let mut offenders: Vec<DbHealthOffender> = Vec::new();
    let mut overall_ok = true;

    let quick_check = run_pragma_check(&mut conn, "quick_check", "PRAGMA quick_check;").await;
    overall_ok &= quick_check.passed;
    checks.push(quick_check);

    let integrity_check =
        run_pragma_check(&mut conn, "integrity_check", "PRAGMA integrity_check(1);").await;
    overall_ok &= integrity_check.passed;
    checks.push(integrity_check);

    let fk_result = run_foreign_key_check(&mut conn).await;
    overall_ok &= fk_result.check.passed;
    offenders.extend(fk_result.offenders);
    checks.push(fk_result.check);

    let schema_hash = compute_schema_hash(&mut conn).await.unwrap_or_default();

    let status = if overall_ok {
        DbHealthStatus::Ok
    } else {
        DbHealthStatus::Error
    };

    Ok(DbHealthReport {
        status,
        checks,
        offenders,
        schema_hash,
        app_version: env!("CARGO_PKG_VERSION").to_string(),
        generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

struct ForeignKeyCheckResult {
    check: DbHealthCheck,
    offenders: Vec<DbHealthOffender>,
}

async fn run_pragma_check(
    conn: &mut PoolConnection<Sqlite>,
    name: &str,
    pragma: &str,
) -> DbHealthCheck {
    let start = Instant::now();
    let mut check = DbHealthCheck {
        name: name.to_string(),
        passed: true,
        duration_ms: 0,
        details: None,
    };

    match sqlx::query_scalar::<_, String>(pragma)
        .fetch_one(conn.as_mut())
        .await
    {
        Ok(result) => {
            if !result.eq_ignore_ascii_case("ok") {
                check.passed = false;
                check.details = Some(result);
            }
        }
        Err(err) => {
            check.passed = false;
            check.details = Some(format!("{name} failed: {err}"));
        }
    }

    check.duration_ms = start.elapsed().as_millis() as u64;
    check
}

async fn run_foreign_key_check(conn: &mut PoolConnection<Sqlite>) -> ForeignKeyCheckResult {
    let start = Instant::now();
    let mut check = DbHealthCheck {
        name: "foreign_key_check".to_string(),
        passed: true,
        duration_ms: 0,
        details: None,
    };

    let rows = sqlx::query("PRAGMA foreign_key_check;")
        .fetch_all(conn.as_mut())
        .await;

    let mut offenders = Vec::new();
    match rows {
        Ok(rows) => {
            for row in rows {
                if let Some(offender) = offender_from_row(&row) {
                    offenders.push(offender);
                }
            }
            if !offenders.is_empty() {
                check.passed = false;
                check.details = Some(format!("{} foreign key violation(s)", offenders.len()));
            }
        }
        Err(err) => {
            check.passed = false;
            check.details = Some(format!("foreign_key_check failed: {err}"));
        }
    }

    check.duration_ms = start.elapsed().as_millis() as u64;
    ForeignKeyCheckResult { check, offenders }
}

fn offender_from_row(row: &SqliteRow) -> Option<DbHealthOffender> {
    let table: String = row.try_get("table").ok()?;
    let rowid: i64 = row.try_get("rowid").ok()?;
    let parent: Option<String> = row.try_get("parent").ok();
    let fkid: Option<i64> = row.try_get("fkid").ok();

    let mut message = String::new();
    if let Some(parent) = parent {
        message.push_str(&format!("missing parent '{parent}'"));
    }
    if let Some(fkid) = fkid {
        if !message.is_empty() {
            message.push_str(", ");
        }
        message.push_str(&format!("constraint #{fkid}"));
    }
    if message.is_empty() {
        message.push_str("foreign key violation");
    }

    Some(DbHealthOffender {
        table,
        rowid,
        message,
    })
}

async fn compute_schema_hash(conn: &mut PoolConnection<Sqlite>) -> Result<String> {
    let rows = sqlx::query(
        "SELECT type, name, tbl_name, sql FROM sqlite_master\n         WHERE type IN ('table','index','trigger','view')\n         ORDER BY type, name",
    )
    .fetch_all(conn.as_mut())
    .await?;

    let mut hasher = Sha256::new();
    for row in rows {
        let ty: String = row.try_get("type")?;
        let name: String = row.try_get("name")?;
        let tbl: String = row.try_get("tbl_name")?;
        let sql: Option<String> = row.try_get("sql").ok();

        hasher.update(ty.as_bytes());
        hasher.update([0]);
        hasher.update(name.as_bytes());
        hasher.update([0]);
        hasher.update(tbl.as_bytes());
        hasher.update([0]);
        if let Some(sql) = sql {
            hasher.update(sql.as_bytes());
        }
        hasher.update([0]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

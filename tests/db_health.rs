use anyhow::Result;
use ladle_lib::db::health::{run_health_checks, DbHealthStatus};
use ladle_lib::guard::{ensure_db_writable, DB_UNHEALTHY_CODE};
use ladle_lib::{AppState, SessionHandle};

#[path = "util.rs"]
mod util;

#[tokio::test]
async fn fresh_database_reports_healthy() -> Result<()> {
    let pool = util::memory_pool().await?;

    let report = run_health_checks(&pool).await?;
    assert_eq!(report.status, DbHealthStatus::Ok);
    assert!(report.checks.iter().all(|check| check.passed));
    let names: Vec<&str> = report
        .checks
        .iter()
        .map(|check| check.name.as_str())
        .collect();
    assert_eq!(names, ["quick_check", "integrity_check", "foreign_key_check"]);
    assert!(report.offenders.is_empty());
    assert!(!report.schema_hash.is_empty());
    Ok(())
}

#[tokio::test]
async fn foreign_key_violations_surface_as_offenders() -> Result<()> {
    let pool = util::memory_pool().await?;

    // Sneak an orphan row past enforcement on this connection.
    sqlx::query("PRAGMA foreign_keys = OFF;")
        .execute(&pool)
        .await?;
    sqlx::query(
        "INSERT INTO recipes (id, user_id, title, instructions, meal_kind, created_at, updated_at) \
         VALUES ('r-orphan', 'missing-user', 'Ghost Stew', '', 'main_course', 0, 0)",
    )
    .execute(&pool)
    .await?;
    sqlx::query("PRAGMA foreign_keys = ON;")
        .execute(&pool)
        .await?;

    let report = run_health_checks(&pool).await?;
    assert_eq!(report.status, DbHealthStatus::Error);
    let fk_check = report
        .checks
        .iter()
        .find(|check| check.name == "foreign_key_check")
        .expect("foreign key check runs");
    assert!(!fk_check.passed);
    assert!(report
        .offenders
        .iter()
        .any(|offender| offender.table == "recipes"));
    Ok(())
}

#[tokio::test]
async fn unhealthy_report_blocks_writes_through_the_guard() -> Result<()> {
    let pool = util::memory_pool().await?;
    sqlx::query("PRAGMA foreign_keys = OFF;")
        .execute(&pool)
        .await?;
    sqlx::query(
        "INSERT INTO recipes (id, user_id, title, instructions, meal_kind, created_at, updated_at) \
         VALUES ('r-orphan', 'missing-user', 'Ghost Stew', '', 'main_course', 0, 0)",
    )
    .execute(&pool)
    .await?;
    sqlx::query("PRAGMA foreign_keys = ON;")
        .execute(&pool)
        .await?;

    let report = run_health_checks(&pool).await?;
    let state = AppState::new(pool, SessionHandle::in_memory(), report);

    let err = ensure_db_writable(&state).expect_err("writes blocked");
    assert_eq!(err.code(), DB_UNHEALTHY_CODE);
    Ok(())
}

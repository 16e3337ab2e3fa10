#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use anyhow::Result;
use ladle_lib::db::health::run_health_checks;
use ladle_lib::id::new_uuid_v7;
use ladle_lib::time::now_ms;
use ladle_lib::{migrate, AppState, SessionHandle};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

pub async fn memory_pool() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    sqlx::query("PRAGMA foreign_keys=ON;")
        .execute(&pool)
        .await?;
    migrate::apply_migrations(&pool).await?;
    Ok(pool)
}

pub async fn memory_state() -> Result<AppState> {
    let pool = memory_pool().await?;
    let report = run_health_checks(&pool).await?;
    Ok(AppState::new(pool, SessionHandle::in_memory(), report))
}

pub async fn seed_user(pool: &SqlitePool, email: &str) -> Result<String> {
    let id = new_uuid_v7();
    let now = now_ms();
    sqlx::query("INSERT INTO users (id, email, created_at, updated_at) VALUES (?1, ?2, ?3, ?4)")
        .bind(&id)
        .bind(email)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;
    Ok(id)
}

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::ConnectOptions;
use sqlx::SqlitePool;

use ladle_lib::db::health::{run_health_checks, DbHealthReport, DbHealthStatus};
use ladle_lib::guard::{DB_UNHEALTHY_CLI_HINT, DB_UNHEALTHY_CODE, DB_UNHEALTHY_EXIT_CODE};
use ladle_lib::{default_db_path, logging, migrate};

#[derive(Debug, Parser)]
#[command(name = "ladle", about = "Ladle recipe journal", version, arg_required_else_help = true)]
struct Cli {
    /// Optional explicit database path.
    #[arg(long, value_name = "PATH", global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance and inspection commands.
    #[command(subcommand)]
    Db(DbCommand),
}

#[derive(Debug, Subcommand)]
enum DbCommand {
    /// Run the SQLite health checks and report their status.
    Status {
        /// Emit the raw JSON health report instead of the table view.
        #[arg(long)]
        json: bool,
    },
    /// Run VACUUM to compact the database when it is healthy.
    Vacuum,
    /// Apply pending schema migrations.
    Migrate,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("Error: {err:#}");
            process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<i32> {
    let db_path = match cli.db {
        Some(path) => path,
        None => default_db_path().context("determine database path")?,
    };
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create database parent directory {}", parent.display()))?;
    }

    let logs_dir = db_path.parent().map(|parent| parent.join("logs"));
    let _log_guard = logging::init(logs_dir.as_deref()).context("initialize logging")?;

    match cli.command {
        Commands::Db(command) => handle_db_command(&db_path, command).await,
    }
}

async fn handle_db_command(db_path: &Path, command: DbCommand) -> Result<i32> {
    match command {
        DbCommand::Status { json } => {
            let pool = open_maintenance_pool(db_path).await?;
            let report = run_health_checks(&pool)
                .await
                .context("run database health checks")?;
            pool.close().await;

            if json {
                print_report_json(&report)?;
            } else {
                print_report_table(&report);
            }

            Ok(match report.status {
                DbHealthStatus::Ok => 0,
                DbHealthStatus::Error => 1,
            })
        }
        DbCommand::Vacuum => match guard_cli_db_mutation(db_path).await? {
            Ok(pool) => {
                let result = sqlx::query("VACUUM;")
                    .execute(&pool)
                    .await
                    .context("vacuum database");
                pool.close().await;
                result?;
                println!("Database vacuum completed.");
                Ok(0)
            }
            Err(code) => Ok(code),
        },
        DbCommand::Migrate => {
            let pool = open_maintenance_pool(db_path).await?;
            let result = migrate::apply_migrations(&pool)
                .await
                .context("apply migrations");
            match result {
                Ok(()) => {
                    let applied = migrate::applied_count(&pool).await.unwrap_or(0);
                    pool.close().await;
                    println!("Migrations up to date ({applied} applied).");
                    Ok(0)
                }
                Err(err) => {
                    pool.close().await;
                    Err(err)
                }
            }
        }
    }
}

/// Open the database and refuse to hand back a pool unless the health
/// checks pass, mirroring the in-app write guard for CLI mutations.
async fn guard_cli_db_mutation(db_path: &Path) -> Result<Result<SqlitePool, i32>> {
    let pool = open_maintenance_pool(db_path).await?;
    let report = run_health_checks(&pool)
        .await
        .context("run database health checks")?;
    if !matches!(report.status, DbHealthStatus::Ok) {
        eprintln!("Error: {}. {}", DB_UNHEALTHY_CODE, DB_UNHEALTHY_CLI_HINT);
        pool.close().await;
        return Ok(Err(DB_UNHEALTHY_EXIT_CODE));
    }
    Ok(Ok(pool))
}

async fn open_maintenance_pool(db_path: &Path) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Full)
        .foreign_keys(true)
        .log_statements(log::LevelFilter::Off);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .with_context(|| format!("open sqlite database at {}", db_path.display()))?;

    sqlx::query("PRAGMA busy_timeout = 5000;")
        .execute(&pool)
        .await
        .ok();
    sqlx::query("PRAGMA wal_autocheckpoint = 1000;")
        .execute(&pool)
        .await
        .ok();

    Ok(pool)
}

fn print_report_json(report: &DbHealthReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("serialize health report")?;
    println!("{json}");
    Ok(())
}

fn print_report_table(report: &DbHealthReport) {
    println!("Database health report");
    println!("Status       : {}", status_label(&report.status));
    println!("Schema hash  : {}", report.schema_hash);
    println!("App version  : {}", report.app_version);
    println!("Generated at : {}", report.generated_at);

    println!("\nChecks:");
    println!(
        "{:<20} {:<7} {:>13}  Details",
        "Check", "Passed", "Duration (ms)"
    );
    for check in &report.checks {
        let passed = if check.passed { "yes" } else { "no" };
        let details = check
            .details
            .as_deref()
            .map(|value| value.replace('\n', " "))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<20} {:<7} {:>13}  {}",
            check.name, passed, check.duration_ms, details
        );
    }

    if report.offenders.is_empty() {
        println!("\nOffenders: none");
    } else {
        println!("\nOffenders:");
        println!("{:<20} {:>10}  Message", "Table", "RowID");
        for offender in &report.offenders {
            println!(
                "{:<20} {:>10}  {}",
                offender.table,
                offender.rowid,
                offender.message.replace('\n', " ")
            );
        }
    }
}

fn status_label(status: &DbHealthStatus) -> &'static str {
    match status {
        DbHealthStatus::Ok => "ok",
        DbHealthStatus::Error => "error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use sqlx::Connection;
    use tempfile::tempdir;

    async fn ensure_database(db_path: &Path) -> Result<()> {
        let pool = open_maintenance_pool(db_path).await?;
        migrate::apply_migrations(&pool).await?;
        pool.close().await;
        Ok(())
    }

    async fn prepare_fk_violation(db_path: &Path) -> Result<()> {
        ensure_database(db_path).await?;

        let mut conn = SqliteConnectOptions::new()
            .filename(db_path)
            .foreign_keys(false)
            .connect()
            .await?;
        sqlx::query(
            "INSERT INTO recipes (id, user_id, title, instructions, meal_kind, created_at, updated_at) \
             VALUES ('r-orphan', 'missing-user', 'Ghost Stew', '', 'main_course', 0, 0);",
        )
        .execute(&mut conn)
        .await?;
        conn.close().await?;
        Ok(())
    }

    #[tokio::test]
    async fn guard_cli_db_mutation_allows_healthy_db() -> Result<()> {
        let tmp = tempdir()?;
        let db_path = tmp.path().join("ladle.sqlite3");
        ensure_database(&db_path).await?;

        let guard = guard_cli_db_mutation(&db_path).await?;
        let pool = guard.expect("expected healthy database guard to allow writes");
        pool.close().await;
        Ok(())
    }

    #[tokio::test]
    async fn guard_cli_db_mutation_blocks_unhealthy_db() -> Result<()> {
        let tmp = tempdir()?;
        let db_path = tmp.path().join("ladle.sqlite3");
        prepare_fk_violation(&db_path).await?;

        let guard = guard_cli_db_mutation(&db_path).await?;
        match guard {
            Err(code) => assert_eq!(code, DB_UNHEALTHY_EXIT_CODE),
            Ok(_) => panic!("expected unhealthy database guard to block writes"),
        }
        Ok(())
    }
}

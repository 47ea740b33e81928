//! Database initialization
//!
//! Creates the database file and tables on first run. Every statement is
//! idempotent so opening an existing database is safe.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Open (creating if needed) the rollcall database and ensure the schema
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // One pass at a time; a small pool is plenty
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create all tables if they do not exist
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_roster_table(pool).await?;
    create_periods_table(pool).await?;
    create_submissions_table(pool).await?;
    create_history_table(pool).await?;
    Ok(())
}

async fn create_roster_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS roster (
            id INTEGER PRIMARY KEY,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL DEFAULT '',
            active INTEGER NOT NULL DEFAULT 1,
            direct_contact INTEGER NOT NULL DEFAULT 1,
            delegate_id INTEGER,
            contact_address TEXT NOT NULL DEFAULT '',
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_periods_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS periods (
            period_key TEXT PRIMARY KEY,
            form_link TEXT NOT NULL,
            response_link TEXT,
            status TEXT NOT NULL DEFAULT 'pending',
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_submissions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS submissions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            period_key TEXT NOT NULL REFERENCES periods(period_key),
            submitted_at TEXT NOT NULL,
            reported_identity TEXT NOT NULL,
            metrics TEXT NOT NULL DEFAULT '[]'
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_submissions_period ON submissions(period_key)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// History is append-only; the primary key enforces one row per
/// (period, normalized identity)
async fn create_history_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS history (
            period_key TEXT NOT NULL,
            reported_identity TEXT NOT NULL,
            submitted_at TEXT NOT NULL,
            metrics TEXT NOT NULL DEFAULT '[]',
            appended_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (period_key, reported_identity)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

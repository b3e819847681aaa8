//! Database wiring: connection pool and schema bootstrap.
//!
//! The schema is small enough to be created idempotently at startup instead
//! of through a migration tool. Name uniqueness of tinkers and identifier
//! uniqueness of recipients are enforced here, at the database level, so
//! racing writers cannot both succeed.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS tinkers (
        id               UUID PRIMARY KEY,
        name             TEXT NOT NULL,
        reason           TEXT NOT NULL,
        source           TEXT NOT NULL,
        blockchain       TEXT NOT NULL,
        hype_level       TEXT NOT NULL,
        risk_level       TEXT NOT NULL,
        contract_address TEXT NOT NULL,
        found_at         TIMESTAMPTZ NOT NULL,
        created_at       TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS tinkers_name_key ON tinkers (name)",
    r#"
    CREATE TABLE IF NOT EXISTS recipients (
        identifier TEXT PRIMARY KEY,
        joined_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
];

/// Open a Postgres connection pool.
pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url)
        .await
}

/// Create tables and indexes if they do not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    info!("database schema ready");
    Ok(())
}

/// Whether an error is a unique constraint violation (`23505`).
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if let Some(code) = db_err.code() {
            return code.as_ref() == "23505";
        }
    }
    false
}

/// Render an sqlx error with the operation it happened in.
pub(crate) fn describe(operation: &str, err: &sqlx::Error) -> String {
    match err {
        sqlx::Error::Database(db_err) => {
            format!("database error in {}: {}", operation, db_err.message())
        }
        sqlx::Error::PoolClosed => format!("connection pool closed in {}", operation),
        sqlx::Error::PoolTimedOut => format!("connection pool timed out in {}", operation),
        other => format!("sqlx error in {}: {}", operation, other),
    }
}

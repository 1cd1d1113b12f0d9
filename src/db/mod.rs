mod blobs;
mod error;
mod models;
mod slug;

pub use blobs::*;
pub use error::StoreError;
pub use models::*;
pub use slug::{insert_with_unique_slug, slugify, SlugTable};

use anyhow::{Context, Result};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
    SqlitePool,
};
use std::str::FromStr;
use tracing::info;

pub type DbPool = SqlitePool;

/// Execute a SQL migration file, properly handling comments
async fn execute_sql(pool: &SqlitePool, sql: &str) -> Result<()> {
    for statement in sql.split(';') {
        // Strip SQL comment lines (lines starting with --)
        let cleaned: String = statement
            .lines()
            .filter(|line| !line.trim().starts_with("--"))
            .collect::<Vec<_>>()
            .join("\n");
        let trimmed = cleaned.trim();
        if !trimmed.is_empty() {
            sqlx::query(trimmed).execute(pool).await?;
        }
    }
    Ok(())
}

/// Connect to the document store described by `dbconf` and bring the schema up to date.
pub async fn init(dbconf: &str, max_connections: u32) -> Result<DbPool> {
    info!(dbconf = %dbconf, "Connecting to document store");

    let options = SqliteConnectOptions::from_str(dbconf)
        .with_context(|| format!("Invalid database connection string: {}", dbconf))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to connect to {}", dbconf))?;

    run_migrations(&pool).await?;

    info!("Document store initialized successfully");
    Ok(pool)
}

/// Single-connection in-memory store. Every pooled connection to
/// `sqlite::memory:` would otherwise see its own empty database.
pub async fn init_memory() -> Result<DbPool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;
    Ok(pool)
}

async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    info!("Running database migrations...");

    // Migration 001: users, sessions, cookbooks, recipes, images
    let has_users_table: Option<(String,)> = sqlx::query_as(
        "SELECT name FROM sqlite_master WHERE type='table' AND name='users'",
    )
    .fetch_optional(pool)
    .await?;
    if has_users_table.is_none() {
        execute_sql(pool, include_str!("../../migrations/001_initial.sql")).await?;
    }

    // Migration 002: chunked blob store
    let has_blob_files_table: Option<(String,)> = sqlx::query_as(
        "SELECT name FROM sqlite_master WHERE type='table' AND name='blob_files'",
    )
    .fetch_optional(pool)
    .await?;
    if has_blob_files_table.is_none() {
        execute_sql(pool, include_str!("../../migrations/002_blob_store.sql")).await?;
    }

    info!("Migrations completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let pool = init_memory().await.unwrap();
        run_migrations(&pool).await.unwrap();

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type='table' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();
        let names: Vec<String> = tables.into_iter().map(|(n,)| n).collect();

        for expected in [
            "blob_chunks",
            "blob_files",
            "cookbooks",
            "images",
            "recipes",
            "sessions",
            "users",
        ] {
            assert!(names.contains(&expected.to_string()), "missing {}", expected);
        }
    }
}

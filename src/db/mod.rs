mod models;
mod postgrest;
mod seeders;
mod sqlite;
mod store;

pub use models::*;
pub use postgrest::{in_filter, parse_content_range, PostgrestStore};
pub use seeders::{seed_test_accounts, test_account_profile};
pub use sqlite::SqliteStore;
pub use store::{
    clamp_limit, Store, StoreError, StoreResult, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT,
};

use anyhow::{Context, Result};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::Config;

/// Execute a SQL migration file, properly handling comments
async fn execute_sql(pool: &SqlitePool, sql: &str) -> Result<(), sqlx::Error> {
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

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Filesystem path behind a `sqlite:` URL, if it names a file.
pub fn sqlite_file_path(url: &str) -> Option<PathBuf> {
    if is_memory_url(url) {
        return None;
    }
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        None
    } else {
        Some(PathBuf::from(path))
    }
}

/// Open the local SQLite database and bring its schema up to date.
pub async fn connect_sqlite(url: &str) -> Result<SqlitePool, sqlx::Error> {
    let pool = if is_memory_url(url) {
        // Every connection to an in-memory database is a separate database,
        // so keep exactly one alive for the lifetime of the pool.
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect(url)
            .await?
    } else {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await?;

        // Enable WAL mode for better concurrency
        sqlx::query("PRAGMA journal_mode = WAL")
            .execute(&pool)
            .await?;
        sqlx::query("PRAGMA synchronous = NORMAL")
            .execute(&pool)
            .await?;
        pool
    };

    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;

    run_migrations(&pool).await?;
    Ok(pool)
}

async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    info!("Running database migrations...");

    // Migration 001: users, projects, blog_posts, applications
    execute_sql(pool, include_str!("../../migrations/001_portal.sql")).await?;

    info!("Migrations completed");
    Ok(())
}

/// Build the store the portal runs against: the hosted database when its URL
/// and service-role key are configured, the local SQLite file otherwise.
pub async fn connect(config: &Config) -> Result<Arc<dyn Store>> {
    if let Some((url, key)) = config.database.hosted() {
        info!(url = %url, "Using hosted database");
        let store = PostgrestStore::new(
            url,
            key,
            Duration::from_secs(config.database.request_timeout),
        )
        .context("Failed to build hosted database client")?;
        return Ok(Arc::new(store));
    }

    let url = &config.database.sqlite_url;
    info!(url = %url, "No hosted database configured, using local SQLite");

    if let Some(parent) = sqlite_file_path(url).as_deref().and_then(|p| p.parent()) {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }

    let pool = connect_sqlite(url)
        .await
        .with_context(|| format!("Failed to open SQLite database at {}", url))?;
    seed_test_accounts(&pool, &config.auth.test_accounts)
        .await
        .context("Failed to seed test accounts")?;

    info!("Database initialized successfully");
    Ok(Arc::new(SqliteStore::new(pool)))
}

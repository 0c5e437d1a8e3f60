//! Database setup and initialization.
//!
//! Entry points call [`setup_database`] with the path resolved by
//! [`cgraph_core::database_path`].

use std::path::Path;

use anyhow::Result;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};

/// Open (or create) the database file and ensure the schema exists.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created, the file
/// cannot be opened, or schema creation fails.
///
/// # Example
///
/// ```rust,no_run
/// use cgraph_db::setup_database;
///
/// # async fn example() -> anyhow::Result<()> {
/// let db_path = cgraph_core::database_path()?;
/// let pool = setup_database(&db_path).await?;
/// # Ok(())
/// # }
/// ```
pub async fn setup_database(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let pool = SqlitePool::connect_with(
        SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal),
    )
    .await?;

    create_schema(&pool).await?;
    Ok(pool)
}

/// In-memory database with the production schema.
///
/// Every connection to `sqlite::memory:` is its own database, so the pool is
/// pinned to a single connection that is never recycled.
#[cfg(any(test, feature = "test-utils"))]
pub async fn setup_test_database() -> Result<SqlitePool> {
    use sqlx::sqlite::SqlitePoolOptions;

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;
    create_schema(&pool).await?;
    Ok(pool)
}

/// Create all tables and indexes. Safe to call repeatedly.
async fn create_schema(pool: &SqlitePool) -> Result<()> {
    // Full entity is kept as JSON; page_id and title are lifted out for lookup.
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS media_entities (
            page_id INTEGER PRIMARY KEY NOT NULL,
            title TEXT NOT NULL UNIQUE,
            payload TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        ",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS annotations (
            page_id INTEGER PRIMARY KEY NOT NULL,
            bookmarked INTEGER NOT NULL DEFAULT 0,
            last_viewed_at TEXT,
            updated_at TEXT NOT NULL
        )
        ",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_annotations_viewed ON annotations(last_viewed_at)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS entity_labels (
            entity_id TEXT NOT NULL,
            language TEXT NOT NULL,
            label TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (entity_id, language)
        )
        ",
    )
    .execute(pool)
    .await?;

    Ok(())
}

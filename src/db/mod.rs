//! Database module for SQLite persistence.
//!
//! SQLite is the source of truth for all imported activity data. The store
//! holds two collections: the auto-keyed current import (`records`) and the
//! explicitly-keyed saved snapshots (`snapshots`). A schema version row gates
//! additive migrations; a store that cannot be read (corruption, or a schema
//! newer than this build) is destroyed and recreated from empty.

mod repository;

pub use repository::*;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;

/// Current schema version. Bump when the schema changes.
pub const SCHEMA_VERSION: i32 = 2;

/// Open the database, recovering from a corrupted or incompatible store by
/// recreating it from scratch. Unrecognized open failures propagate.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    match open_database(db_path).await {
        Ok(pool) => Ok(pool),
        Err(err) if is_recoverable_open_error(&err) => {
            tracing::warn!("Database open failed ({err}). Recreating from scratch.");
            destroy_database(db_path).await;
            open_database(db_path).await
        }
        Err(err) => Err(err),
    }
}

async fn open_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;
    ensure_snapshots_migrated(&pool).await?;

    Ok(pool)
}

/// Whether an open failure is one of the recognized classes we recover from
/// by recreating the store.
fn is_recoverable_open_error(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            let message = db_err.message();
            message.contains("file is not a database")
                || message.contains("malformed")
                || matches!(db_err.code().as_deref(), Some("11") | Some("26"))
        }
        sqlx::Error::Protocol(message) => message.contains("schema version"),
        _ => false,
    }
}

/// Remove the database file and its WAL siblings.
async fn destroy_database(db_path: &Path) {
    tokio::fs::remove_file(db_path).await.ok();
    for suffix in ["-wal", "-shm"] {
        let mut sibling = db_path.as_os_str().to_owned();
        sibling.push(suffix);
        tokio::fs::remove_file(Path::new(&sibling)).await.ok();
    }
}

/// Run database migrations. Migrations are additive only: missing tables and
/// columns are created, existing data is never dropped.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS meta (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            schema_version INTEGER NOT NULL DEFAULT 0,
            generated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        INSERT OR IGNORE INTO meta (id, schema_version, generated_at)
        VALUES (1, 0, datetime('now'));
        "#,
    )
    .execute(pool)
    .await?;

    let version: i32 = sqlx::query("SELECT schema_version FROM meta WHERE id = 1")
        .fetch_one(pool)
        .await?
        .get("schema_version");

    if version > SCHEMA_VERSION {
        // A store written by a newer build is treated like corruption: the
        // caller destroys it and starts over.
        return Err(sqlx::Error::Protocol(format!(
            "stored schema version {} is newer than supported version {}",
            version, SCHEMA_VERSION
        )));
    }

    if version < 1 {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                query TEXT NOT NULL,
                timestamp TEXT,
                category_id TEXT NOT NULL,
                category_name TEXT NOT NULL,
                category_color TEXT NOT NULL,
                lat TEXT NOT NULL DEFAULT '',
                lon TEXT NOT NULL DEFAULT ''
            );

            CREATE INDEX IF NOT EXISTS idx_records_timestamp ON records(timestamp);

            CREATE TABLE IF NOT EXISTS snapshots (
                id TEXT PRIMARY KEY,
                name TEXT,
                records TEXT NOT NULL,
                date TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;
    }

    if version < 2 && !column_exists(pool, "snapshots", "label").await? {
        // v2: snapshots are labeled via `label`; `name` stays as the legacy
        // column that ensure_snapshots_migrated drains.
        sqlx::query("ALTER TABLE snapshots ADD COLUMN label TEXT")
            .execute(pool)
            .await?;
    }

    if version != SCHEMA_VERSION {
        sqlx::query(
            "UPDATE meta SET schema_version = ?, generated_at = datetime('now') WHERE id = 1",
        )
        .bind(SCHEMA_VERSION)
        .execute(pool)
        .await?;
    }

    Ok(())
}

async fn column_exists(
    pool: &SqlitePool,
    table: &str,
    column: &str,
) -> Result<bool, sqlx::Error> {
    let rows = sqlx::query(&format!("PRAGMA table_info({})", table))
        .fetch_all(pool)
        .await?;
    Ok(rows
        .iter()
        .any(|row| row.get::<String, _>("name") == column))
}

/// One-time migration of snapshots still labeled through the legacy `name`
/// column. Idempotent: already-migrated rows are untouched, so this runs on
/// every open.
pub async fn ensure_snapshots_migrated(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let result = sqlx::query(
        "UPDATE snapshots SET label = name, name = NULL WHERE label IS NULL AND name IS NOT NULL",
    )
    .execute(pool)
    .await?;

    if result.rows_affected() > 0 {
        tracing::info!(
            snapshots = result.rows_affected(),
            "migrated legacy snapshot labels"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_fresh_database_has_both_collections() {
        let temp = TempDir::new().unwrap();
        let pool = init_database(&temp.path().join("fresh.sqlite"))
            .await
            .unwrap();

        let records: i64 = sqlx::query("SELECT COUNT(*) AS n FROM records")
            .fetch_one(&pool)
            .await
            .unwrap()
            .get("n");
        let snapshots: i64 = sqlx::query("SELECT COUNT(*) AS n FROM snapshots")
            .fetch_one(&pool)
            .await
            .unwrap()
            .get("n");

        assert_eq!(records, 0);
        assert_eq!(snapshots, 0);
    }

    #[tokio::test]
    async fn test_corrupted_file_is_recreated() {
        let temp = TempDir::new().unwrap();
        let db_path = temp.path().join("corrupt.sqlite");
        tokio::fs::write(&db_path, b"this is not a sqlite database, not even close")
            .await
            .unwrap();

        let pool = init_database(&db_path).await.unwrap();

        let records: i64 = sqlx::query("SELECT COUNT(*) AS n FROM records")
            .fetch_one(&pool)
            .await
            .unwrap()
            .get("n");
        let snapshots: i64 = sqlx::query("SELECT COUNT(*) AS n FROM snapshots")
            .fetch_one(&pool)
            .await
            .unwrap()
            .get("n");

        assert_eq!(records, 0);
        assert_eq!(snapshots, 0);
    }

    #[tokio::test]
    async fn test_future_schema_version_is_recreated() {
        let temp = TempDir::new().unwrap();
        let db_path = temp.path().join("future.sqlite");

        let pool = init_database(&db_path).await.unwrap();
        sqlx::query("UPDATE meta SET schema_version = ? WHERE id = 1")
            .bind(SCHEMA_VERSION + 5)
            .execute(&pool)
            .await
            .unwrap();
        pool.close().await;

        let pool = init_database(&db_path).await.unwrap();
        let version: i32 = sqlx::query("SELECT schema_version FROM meta WHERE id = 1")
            .fetch_one(&pool)
            .await
            .unwrap()
            .get("schema_version");
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[tokio::test]
    async fn test_legacy_name_migration_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let pool = init_database(&temp.path().join("legacy.sqlite"))
            .await
            .unwrap();

        sqlx::query(
            "INSERT INTO snapshots (id, name, label, records, date) VALUES (?, ?, NULL, '[]', ?)",
        )
        .bind("1700000000000-abc")
        .bind("May Upload")
        .bind("2023-05-01T10:00:00Z")
        .execute(&pool)
        .await
        .unwrap();

        ensure_snapshots_migrated(&pool).await.unwrap();
        ensure_snapshots_migrated(&pool).await.unwrap();

        let row = sqlx::query("SELECT name, label FROM snapshots WHERE id = '1700000000000-abc'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(row.get::<Option<String>, _>("name"), None);
        assert_eq!(
            row.get::<Option<String>, _>("label").as_deref(),
            Some("May Upload")
        );
    }
}

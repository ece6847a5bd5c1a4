use crate::domain::error::{AppError, Result};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

const SCHEMA_V1: &str = include_str!("../../resources/schema.sql");

#[derive(Clone)]
pub struct ScanDb {
    pool: SqlitePool,
}

impl ScanDb {
    pub async fn connect(db_path: &Path) -> Result<Self> {
        let db_url = db_path_to_url(db_path)?;
        let options = SqliteConnectOptions::from_str(&db_url)
            .map_err(|e| AppError::DatabaseError(format!("Failed to parse scan DB URL: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .pragma("foreign_keys", "ON");

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect scan DB: {e}")))?;

        apply_migrations(&pool).await?;

        Ok(Self { pool })
    }

    /// Private in-memory database; used by tests
    pub async fn connect_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| AppError::DatabaseError(format!("Failed to parse scan DB URL: {e}")))?
            .pragma("foreign_keys", "ON");

        // One connection only: each pool connection would get its own
        // empty in-memory database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect scan DB: {e}")))?;

        apply_migrations(&pool).await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

async fn apply_migrations(pool: &SqlitePool) -> Result<()> {
    const CURRENT_SCHEMA_VERSION: i64 = 1;

    let version: i64 = sqlx::query_scalar("PRAGMA user_version")
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to read scan DB user_version: {e}")))?;

    if version < CURRENT_SCHEMA_VERSION {
        apply_full_schema(pool).await?;
        let pragma = format!("PRAGMA user_version = {}", CURRENT_SCHEMA_VERSION);
        sqlx::query(&pragma).execute(pool).await.map_err(|e| {
            AppError::DatabaseError(format!("Failed to set scan DB user_version: {e}"))
        })?;
    }

    Ok(())
}

/// Apply the full V1 schema to the database
async fn apply_full_schema(pool: &SqlitePool) -> Result<()> {
    for statement in SCHEMA_V1.split(';') {
        let stmt = statement.trim();
        if stmt.is_empty() {
            continue;
        }
        sqlx::query(stmt)
            .execute(pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to apply scan schema: {e}")))?;
    }
    Ok(())
}

fn db_path_to_url(db_path: &Path) -> Result<String> {
    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| AppError::DatabaseError("Scan DB path is not valid UTF-8".to_string()))?;
    Ok(format!("sqlite://{}", db_path_str.replace("\\", "/")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_path_to_url_normalizes_separators() {
        let url = db_path_to_url(Path::new("data\\scans.db")).unwrap();
        assert_eq!(url, "sqlite://data/scans.db");
    }

    #[tokio::test]
    async fn test_in_memory_schema_applies_once() {
        let db = ScanDb::connect_in_memory().await.unwrap();

        let version: i64 = sqlx::query_scalar("PRAGMA user_version")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(version, 1);

        let tables: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('datasets', 'scan_records', 'model_versions')",
        )
        .fetch_one(db.pool())
        .await
        .unwrap();
        assert_eq!(tables, 3);

        // Idempotent on an already-migrated pool
        apply_migrations(db.pool()).await.unwrap();
    }
}

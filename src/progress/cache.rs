use std::path::Path;

use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};

use crate::errors::AppError;
use crate::models::ProgressRecord;

/// sqlite mirror of the progress snapshot. Loaded once at startup, written
/// best-effort after every in-memory mutation, never consulted on the hot
/// path. Rows with `pending` set never reached the remote and are retried
/// next session.
pub struct ProgressCache {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone)]
pub struct CachedRecord {
    pub record: ProgressRecord,
    pub pending: bool,
}

impl ProgressCache {
    pub async fn open(path: &Path) -> Result<Self, AppError> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| AppError::Database(format!("Failed to create {:?}: {}", parent, e)))?;
            }
        }

        log::info!("[ProgressCache] Opening cache at {:?}", path);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(
                sqlx::sqlite::SqliteConnectOptions::new()
                    .filename(path)
                    .create_if_missing(true),
            )
            .await?;

        Self::with_pool(pool).await
    }

    pub async fn open_in_memory() -> Result<Self, AppError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: Pool<Sqlite>) -> Result<Self, AppError> {
        let schema = include_str!("schema.sql");
        for statement in schema.split(';') {
            let stmt = statement.trim();
            if !stmt.is_empty() {
                sqlx::query(stmt).execute(&pool).await?;
            }
        }
        Ok(Self { pool })
    }

    pub async fn load_all(&self) -> Result<Vec<CachedRecord>, AppError> {
        let rows: Vec<(String, f64, Option<String>, i64)> = sqlx::query_as(
            "SELECT video_id, position_secs, thumbnail, pending FROM progress ORDER BY updated_at",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(video_id, position_secs, thumbnail, pending)| CachedRecord {
                record: ProgressRecord::new(video_id, position_secs, thumbnail),
                pending: pending != 0,
            })
            .collect())
    }

    pub async fn upsert(&self, record: &ProgressRecord, pending: bool) -> Result<(), AppError> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            "INSERT INTO progress (video_id, position_secs, thumbnail, pending, updated_at) \
             VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT(video_id) DO UPDATE SET \
             position_secs = excluded.position_secs, thumbnail = excluded.thumbnail, \
             pending = excluded.pending, updated_at = excluded.updated_at",
        )
        .bind(&record.video_id)
        .bind(record.position_secs)
        .bind(&record.thumbnail)
        .bind(pending as i32)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn remove(&self, video_id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM progress WHERE video_id = ?")
            .bind(video_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upsert_load_remove_round_trip() {
        let cache = ProgressCache::open_in_memory().await.unwrap();

        let record = ProgressRecord::new("movies/Dráma/Film.mp4", 42.0, None);
        cache.upsert(&record, true).await.unwrap();

        let rows = cache.load_all().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].record, record);
        assert!(rows[0].pending);

        // Second upsert replaces in place.
        let updated = ProgressRecord::new("movies/Dráma/Film.mp4", 99.5, Some("/t.jpg".into()));
        cache.upsert(&updated, false).await.unwrap();
        let rows = cache.load_all().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].record.position_secs, 99.5);
        assert!(!rows[0].pending);

        cache.remove("movies/Dráma/Film.mp4").await.unwrap();
        assert!(cache.load_all().await.unwrap().is_empty());
    }
}

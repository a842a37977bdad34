//! Frame annotation stage store

use crate::{open_pool, Result, StageStore, StoreError};
use annotator_common::RecordKey;
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::path::Path;

/// Persisted frame analyses for one video
///
/// One labeled block per sampled frame, in timeline order; a frame whose
/// describer call failed holds an empty string.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationEntry {
    pub analyses: Vec<String>,
}

/// SQLite-backed annotation store
pub struct AnnotationStore {
    pool: SqlitePool,
}

impl AnnotationStore {
    /// Open the store at `db_path`, creating file and schema if needed.
    pub async fn open(db_path: &Path) -> Result<Self> {
        let pool = open_pool(db_path).await?;
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS annotation (
                creator_id TEXT NOT NULL,
                video_id TEXT NOT NULL,
                analyses TEXT NOT NULL,
                PRIMARY KEY (creator_id, video_id)
            )
            ",
        )
        .execute(&pool)
        .await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl StageStore for AnnotationStore {
    type Entry = AnnotationEntry;

    async fn exists(&self, key: &RecordKey) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM annotation WHERE creator_id = ?1 AND video_id = ?2")
            .bind(&key.creator_id)
            .bind(&key.video_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn get(&self, key: &RecordKey) -> Result<AnnotationEntry> {
        let row = sqlx::query(
            "SELECT analyses FROM annotation WHERE creator_id = ?1 AND video_id = ?2",
        )
        .bind(&key.creator_id)
        .bind(&key.video_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(key.clone()))?;

        Ok(AnnotationEntry {
            analyses: serde_json::from_str(&row.try_get::<String, _>(0)?)?,
        })
    }

    async fn put_if_absent(&self, key: &RecordKey, entry: &AnnotationEntry) -> Result<bool> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO annotation (creator_id, video_id, analyses) VALUES (?1, ?2, ?3)",
        )
        .bind(&key.creator_id)
        .bind(&key.video_id)
        .bind(serde_json::to_string(&entry.analyses)?)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) FROM annotation")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<i64, _>(0)? as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip_preserves_empty_slots() {
        let dir = tempfile::tempdir().unwrap();
        let store = AnnotationStore::open(&dir.path().join("annotation.db"))
            .await
            .unwrap();
        let key = RecordKey::new("alice", "v1");

        let entry = AnnotationEntry {
            analyses: vec![
                "Frame 1 at 0 seconds: a podium".to_string(),
                String::new(),
                "Frame 3 at 60 seconds: a crowd".to_string(),
            ],
        };
        assert!(store.put_if_absent(&key, &entry).await.unwrap());

        let loaded = store.get(&key).await.unwrap();
        assert_eq!(loaded.analyses.len(), 3);
        assert!(loaded.analyses[1].is_empty());
    }

    #[tokio::test]
    async fn test_put_if_absent_is_insert_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = AnnotationStore::open(&dir.path().join("annotation.db"))
            .await
            .unwrap();
        let key = RecordKey::new("alice", "v1");
        let entry = AnnotationEntry {
            analyses: vec!["Frame 1 at 0 seconds: a flag".to_string()],
        };

        assert!(store.put_if_absent(&key, &entry).await.unwrap());
        assert!(!store.put_if_absent(&key, &entry).await.unwrap());
        assert_eq!(store.count().await.unwrap(), 1);
    }
}

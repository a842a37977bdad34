//! Synthesis stage store

use crate::{open_pool, Result, StageStore, StoreError};
use annotator_common::RecordKey;
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::path::Path;

/// Persisted synthesis report for one video
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisEntry {
    pub report: String,
}

/// SQLite-backed synthesis store
pub struct SynthesisStore {
    pool: SqlitePool,
}

impl SynthesisStore {
    /// Open the store at `db_path`, creating file and schema if needed.
    pub async fn open(db_path: &Path) -> Result<Self> {
        let pool = open_pool(db_path).await?;
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS synthesis (
                creator_id TEXT NOT NULL,
                video_id TEXT NOT NULL,
                report TEXT NOT NULL,
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
impl StageStore for SynthesisStore {
    type Entry = SynthesisEntry;

    async fn exists(&self, key: &RecordKey) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM synthesis WHERE creator_id = ?1 AND video_id = ?2")
            .bind(&key.creator_id)
            .bind(&key.video_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn get(&self, key: &RecordKey) -> Result<SynthesisEntry> {
        let row =
            sqlx::query("SELECT report FROM synthesis WHERE creator_id = ?1 AND video_id = ?2")
                .bind(&key.creator_id)
                .bind(&key.video_id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| StoreError::NotFound(key.clone()))?;

        Ok(SynthesisEntry {
            report: row.try_get(0)?,
        })
    }

    async fn put_if_absent(&self, key: &RecordKey, entry: &SynthesisEntry) -> Result<bool> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO synthesis (creator_id, video_id, report) VALUES (?1, ?2, ?3)",
        )
        .bind(&key.creator_id)
        .bind(&key.video_id)
        .bind(&entry.report)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) FROM synthesis")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<i64, _>(0)? as u64)
    }
}

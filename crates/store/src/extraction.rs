//! Extraction stage store
//!
//! Holds the sampled frame locators, per-frame on-screen text, and the
//! speech transcript for each processed video. Frame and OCR sequences are
//! variable length (at most six entries) and persist as JSON arrays in
//! single text columns.

use crate::{open_pool, Result, StageStore, StoreError};
use annotator_common::RecordKey;
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::path::Path;

/// Persisted extraction output for one video
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionEntry {
    /// Frame locators in timeline order
    pub frames: Vec<String>,

    /// On-screen text per frame, parallel to `frames`
    pub ocr: Vec<String>,

    /// Raw transcript text
    pub transcript: String,

    /// Detected transcript language code
    pub transcript_language: String,

    /// Transcript translated to the target language; empty on translation
    /// failure
    pub transcript_translated: String,

    /// Probed media duration in seconds
    pub probed_duration_secs: f64,
}

/// SQLite-backed extraction store
pub struct ExtractionStore {
    pool: SqlitePool,
}

impl ExtractionStore {
    /// Open the store at `db_path`, creating file and schema if needed.
    pub async fn open(db_path: &Path) -> Result<Self> {
        let pool = open_pool(db_path).await?;
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS extraction (
                creator_id TEXT NOT NULL,
                video_id TEXT NOT NULL,
                frames TEXT NOT NULL,
                ocr TEXT NOT NULL,
                transcript TEXT NOT NULL,
                transcript_language TEXT NOT NULL,
                transcript_translated TEXT NOT NULL,
                probed_duration_secs REAL NOT NULL,
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
impl StageStore for ExtractionStore {
    type Entry = ExtractionEntry;

    async fn exists(&self, key: &RecordKey) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM extraction WHERE creator_id = ?1 AND video_id = ?2")
            .bind(&key.creator_id)
            .bind(&key.video_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn get(&self, key: &RecordKey) -> Result<ExtractionEntry> {
        let row = sqlx::query(
            r"
            SELECT frames, ocr, transcript, transcript_language,
                   transcript_translated, probed_duration_secs
            FROM extraction
            WHERE creator_id = ?1 AND video_id = ?2
            ",
        )
        .bind(&key.creator_id)
        .bind(&key.video_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(key.clone()))?;

        Ok(ExtractionEntry {
            frames: serde_json::from_str(&row.try_get::<String, _>(0)?)?,
            ocr: serde_json::from_str(&row.try_get::<String, _>(1)?)?,
            transcript: row.try_get(2)?,
            transcript_language: row.try_get(3)?,
            transcript_translated: row.try_get(4)?,
            probed_duration_secs: row.try_get(5)?,
        })
    }

    async fn put_if_absent(&self, key: &RecordKey, entry: &ExtractionEntry) -> Result<bool> {
        let result = sqlx::query(
            r"
            INSERT OR IGNORE INTO extraction
            (creator_id, video_id, frames, ocr, transcript,
             transcript_language, transcript_translated, probed_duration_secs)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
        )
        .bind(&key.creator_id)
        .bind(&key.video_id)
        .bind(serde_json::to_string(&entry.frames)?)
        .bind(serde_json::to_string(&entry.ocr)?)
        .bind(&entry.transcript)
        .bind(&entry.transcript_language)
        .bind(&entry.transcript_translated)
        .bind(entry.probed_duration_secs)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) FROM extraction")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<i64, _>(0)? as u64)
    }
}

//! Persistent stage stores for the annotation pipeline
//!
//! Each pipeline stage owns one embedded SQLite database keyed by
//! (creator id, video id). Entries are append-only: the pipeline checks
//! existence before computing and only ever inserts, never updates or
//! deletes. Uniqueness is enforced at the storage layer with a composite
//! primary key plus `INSERT OR IGNORE`, so the client-side check-then-act
//! can never produce a duplicate row even if a second pipeline instance is
//! pointed at the same store directory.
//!
//! The intended deployment is still exactly one pipeline instance per
//! store directory; a violated constraint degrades to recomputed work,
//! not to corrupt data.

use annotator_common::RecordKey;
use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::path::Path;
use thiserror::Error;
use tracing::info;

pub mod annotation;
pub mod extraction;
pub mod synthesis;

pub use annotation::{AnnotationEntry, AnnotationStore};
pub use extraction::{ExtractionEntry, ExtractionStore};
pub use synthesis::{SynthesisEntry, SynthesisStore};

/// Database file name for the extraction store
pub const EXTRACTION_DB_FILE: &str = "extraction.db";

/// Database file name for the annotation store
pub const ANNOTATION_DB_FILE: &str = "annotation.db";

/// Database file name for the synthesis store
pub const SYNTHESIS_DB_FILE: &str = "synthesis.db";

/// Stage store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing database cannot be reached or written; fatal for a run
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("no entry for {0}")]
    NotFound(RecordKey),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Contract shared by all three stage stores
#[async_trait]
pub trait StageStore: Send + Sync {
    /// The persisted unit for this stage
    type Entry: Send + Sync;

    /// Whether an entry exists for the key
    async fn exists(&self, key: &RecordKey) -> Result<bool>;

    /// Fetch the entry for the key; [`StoreError::NotFound`] when absent
    async fn get(&self, key: &RecordKey) -> Result<Self::Entry>;

    /// Insert the entry unless one already exists for the key.
    ///
    /// Returns true when a row was inserted, false when the key was
    /// already present. Never overwrites.
    async fn put_if_absent(&self, key: &RecordKey, entry: &Self::Entry) -> Result<bool>;

    /// Number of entries in the store
    async fn count(&self) -> Result<u64>;
}

/// Open (creating if needed) the SQLite database at `db_path`.
pub(crate) async fn open_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| StoreError::Unavailable(e.to_string()))?;
    }

    let newly_created = !db_path.exists();
    let url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&url)
        .await?;

    // WAL keeps the durable write cheap; the busy timeout covers the
    // single-writer lock handoff between pool checkouts.
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    if newly_created {
        info!("initialized stage store: {}", db_path.display());
    }
    Ok(pool)
}

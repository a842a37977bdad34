//! Generic stage processing
//!
//! All three stages follow the same per-record algorithm: look the record
//! up in the stage's store, load the cached output on a hit, otherwise run
//! the stage's analyzers and insert the result. Analyzer failures are
//! contained to the record; store failures abort the pass.

use annotator_common::{RecordKey, VideoRecord};
use annotator_analyzers::AnalyzerError;
use annotator_store::StoreError;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// One cacheable unit of per-record work
#[async_trait]
pub trait Stage: Send + Sync {
    /// In-memory output populated onto the record
    type Output: Send;

    fn name(&self) -> &'static str;

    /// Records the stage does not apply to are skipped without analyzer
    /// calls or store writes.
    fn eligible(&self, record: &VideoRecord) -> bool {
        let _ = record;
        true
    }

    /// Cached output for the key, if a store entry exists
    async fn cached(&self, key: &RecordKey) -> Result<Option<Self::Output>, StoreError>;

    /// Run the stage's analyzers against the record
    async fn compute(&self, record: &VideoRecord) -> Result<Self::Output, AnalyzerError>;

    /// Insert the output into the stage's store unless an entry exists
    async fn persist(&self, key: &RecordKey, output: &Self::Output) -> Result<bool, StoreError>;
}

/// What happened to one record in one stage
#[derive(Debug)]
pub enum StageOutcome<T> {
    /// Store hit; analyzers were not invoked
    Cached(T),

    /// Computed fresh and persisted
    Computed(T),

    /// Analyzer failure; fields stay empty and no store entry was written,
    /// so the record is retried on the next run
    Failed,

    /// Stage does not apply to this record
    Skipped,
}

impl<T> StageOutcome<T> {
    /// The stage output, whether cached or computed
    pub fn into_output(self) -> Option<T> {
        match self {
            StageOutcome::Cached(output) | StageOutcome::Computed(output) => Some(output),
            StageOutcome::Failed | StageOutcome::Skipped => None,
        }
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, StageOutcome::Failed)
    }
}

/// Process one record through one stage.
///
/// Cache writes are all-or-nothing per stage per record: a record either
/// gets a complete entry or none at all. Only [`StoreError`] propagates;
/// it is fatal for the pass.
pub async fn process_record<S: Stage>(
    stage: &S,
    record: &VideoRecord,
) -> Result<StageOutcome<S::Output>, StoreError> {
    if !stage.eligible(record) {
        debug!(stage = stage.name(), record = %record.key, "stage not applicable, skipping");
        return Ok(StageOutcome::Skipped);
    }

    if let Some(output) = stage.cached(&record.key).await? {
        debug!(stage = stage.name(), record = %record.key, "already processed, using cached output");
        return Ok(StageOutcome::Cached(output));
    }

    match stage.compute(record).await {
        Ok(output) => {
            if !stage.persist(&record.key, &output).await? {
                // Lost a race against another pipeline instance; the
                // existing row stands and this output is discarded.
                debug!(stage = stage.name(), record = %record.key, "entry appeared concurrently");
            }
            Ok(StageOutcome::Computed(output))
        }
        Err(err) => {
            warn!(
                stage = stage.name(),
                record = %record.key,
                error = %err,
                "record failed, leaving fields empty"
            );
            Ok(StageOutcome::Failed)
        }
    }
}

/// Bound an analyzer call so a hung external service cannot stall the
/// pipeline. A timeout counts as that call failing.
pub(crate) async fn bounded<T, F>(limit: Duration, what: &str, call: F) -> Result<T, AnalyzerError>
where
    F: Future<Output = Result<T, AnalyzerError>> + Send,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(AnalyzerError::Timeout(format!(
            "{what} exceeded {}s",
            limit.as_secs_f64()
        ))),
    }
}

//! Per-frame annotation stage
//!
//! Runs the vision-language describer over every extracted frame with the
//! fixed analytical prompt at deterministic sampling. Failures are
//! frame-grained: one failed frame leaves an empty block and processing
//! moves to the next frame. The stage only fails as a whole, writing no
//! cache entry, when not a single frame could be described.

use crate::stage::{bounded, Stage};
use annotator_analyzers::{prompts, AnalyzerError, SamplingOptions, VisionDescriber};
use annotator_common::{AnnotationOutput, RecordKey, VideoRecord};
use annotator_store::{AnnotationEntry, AnnotationStore, StageStore, StoreError};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Stage processor for per-frame vision descriptions
pub struct AnnotationStage {
    describer: Arc<dyn VisionDescriber>,
    store: AnnotationStore,
    options: SamplingOptions,
    call_timeout: Duration,
}

impl AnnotationStage {
    pub fn new(
        describer: Arc<dyn VisionDescriber>,
        store: AnnotationStore,
        call_timeout: Duration,
    ) -> Self {
        Self {
            describer,
            store,
            options: SamplingOptions::frame_analysis(),
            call_timeout,
        }
    }
}

#[async_trait]
impl Stage for AnnotationStage {
    type Output = AnnotationOutput;

    fn name(&self) -> &'static str {
        "annotation"
    }

    /// Records whose extraction produced no frames are excluded from this
    /// stage entirely.
    fn eligible(&self, record: &VideoRecord) -> bool {
        !record.frames().is_empty()
    }

    async fn cached(&self, key: &RecordKey) -> Result<Option<AnnotationOutput>, StoreError> {
        if !self.store.exists(key).await? {
            return Ok(None);
        }
        let entry = self.store.get(key).await?;
        Ok(Some(AnnotationOutput {
            analyses: entry.analyses,
        }))
    }

    async fn compute(&self, record: &VideoRecord) -> Result<AnnotationOutput, AnalyzerError> {
        let mut analyses = Vec::new();
        let mut described = 0usize;

        for (i, frame) in record.frames().iter().enumerate() {
            let frame_index = i + 1;
            match bounded(
                self.call_timeout,
                "frame description",
                self.describer.describe(
                    frame,
                    prompts::FRAME_SYSTEM_PROMPT,
                    prompts::FRAME_USER_PROMPT,
                    &self.options,
                ),
            )
            .await
            {
                Ok(description) => {
                    analyses.push(prompts::frame_block(frame_index, &description));
                    described += 1;
                }
                Err(err) => {
                    warn!(
                        record = %record.key,
                        frame = frame_index,
                        error = %err,
                        "frame description failed, leaving the block empty"
                    );
                    analyses.push(String::new());
                }
            }
        }

        if described == 0 {
            return Err(AnalyzerError::Failed(format!(
                "all {} frame descriptions failed",
                analyses.len()
            )));
        }
        Ok(AnnotationOutput { analyses })
    }

    async fn persist(&self, key: &RecordKey, output: &AnnotationOutput) -> Result<bool, StoreError> {
        self.store
            .put_if_absent(
                key,
                &AnnotationEntry {
                    analyses: output.analyses.clone(),
                },
            )
            .await
    }
}

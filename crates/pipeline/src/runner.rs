//! Partition runner
//!
//! Owns the three stage processors and drives each language partition
//! record by record: extraction, then annotation, then synthesis, then the
//! result sink. Stores and analyzer clients are constructed by the caller
//! and passed in; nothing here is process-wide.

use crate::annotation::AnnotationStage;
use crate::config::PipelineConfig;
use crate::extraction::ExtractionStage;
use crate::stage::process_record;
use crate::synthesis::SynthesisStage;
use annotator_analyzers::{
    FrameExtractor, SpeechTranscriber, SynthesisGenerator, TextReader, Translator,
    VisionDescriber,
};
use annotator_common::VideoRecord;
use annotator_dataset::DatasetError;
use annotator_store::{
    AnnotationStore, ExtractionStore, StoreError, SynthesisStore, ANNOTATION_DB_FILE,
    EXTRACTION_DB_FILE, SYNTHESIS_DB_FILE,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// The three stage stores for one pipeline instance
pub struct PipelineStores {
    pub extraction: ExtractionStore,
    pub annotation: AnnotationStore,
    pub synthesis: SynthesisStore,
}

impl PipelineStores {
    /// Open (creating if needed) all three stores under one directory.
    pub async fn open(store_dir: &Path) -> Result<Self, StoreError> {
        Ok(Self {
            extraction: ExtractionStore::open(&store_dir.join(EXTRACTION_DB_FILE)).await?,
            annotation: AnnotationStore::open(&store_dir.join(ANNOTATION_DB_FILE)).await?,
            synthesis: SynthesisStore::open(&store_dir.join(SYNTHESIS_DB_FILE)).await?,
        })
    }
}

/// The external capability clients for one pipeline instance
pub struct Analyzers {
    pub frame_extractor: Arc<dyn FrameExtractor>,
    pub text_reader: Arc<dyn TextReader>,
    pub transcriber: Arc<dyn SpeechTranscriber>,
    pub translator: Arc<dyn Translator>,
    pub describer: Arc<dyn VisionDescriber>,
    pub generator: Arc<dyn SynthesisGenerator>,
}

/// Result of one partition pass
#[derive(Debug)]
pub struct PartitionSummary {
    pub language: String,

    /// Records loaded for the partition
    pub records: usize,

    /// Stage failures across all records (a record can fail more than one
    /// stage in a pass)
    pub failures: usize,

    /// Rewritten partition output file
    pub output_path: PathBuf,
}

/// Result of a full run
#[derive(Debug)]
pub struct RunSummary {
    pub partitions: Vec<PartitionSummary>,
}

/// The assembled pipeline
pub struct Pipeline {
    extraction: ExtractionStage,
    annotation: AnnotationStage,
    synthesis: SynthesisStage,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, stores: PipelineStores, analyzers: Analyzers) -> Self {
        let extraction = ExtractionStage::new(
            analyzers.frame_extractor,
            analyzers.text_reader,
            analyzers.transcriber,
            analyzers.translator,
            stores.extraction,
            config.media_root.clone(),
            config.frames_root.clone(),
            config.call_timeout,
        );
        let annotation =
            AnnotationStage::new(analyzers.describer, stores.annotation, config.call_timeout);
        let synthesis =
            SynthesisStage::new(analyzers.generator, stores.synthesis, config.call_timeout);

        Self {
            extraction,
            annotation,
            synthesis,
            config,
        }
    }

    /// Process every configured language partition in order.
    pub async fn run(&self) -> Result<RunSummary, PipelineError> {
        let mut partitions = Vec::new();
        for language in &self.config.languages {
            partitions.push(self.run_partition(language).await?);
        }
        Ok(RunSummary { partitions })
    }

    /// One full pass over one language partition, ending with the sink
    /// rewrite. A record's failure never aborts the pass; only a store
    /// error does.
    pub async fn run_partition(&self, language: &str) -> Result<PartitionSummary, PipelineError> {
        info!(language, "starting partition pass");
        let mut records = annotator_dataset::load_partition(&self.config.dataset, language)?;

        let mut failures = 0;
        for record in &mut records {
            failures += self.process(record).await?;
        }

        let output_path =
            annotator_dataset::write_partition(&self.config.output_dir, language, &records)?;
        info!(
            language,
            records = records.len(),
            failures,
            "partition pass complete"
        );

        Ok(PartitionSummary {
            language: language.to_string(),
            records: records.len(),
            failures,
            output_path,
        })
    }

    /// All three stages for one record, in dependency order. Returns the
    /// number of stage failures.
    async fn process(&self, record: &mut VideoRecord) -> Result<usize, StoreError> {
        let mut failures = 0;

        let outcome = process_record(&self.extraction, record).await?;
        failures += usize::from(outcome.is_failed());
        record.extraction = outcome.into_output();

        let outcome = process_record(&self.annotation, record).await?;
        failures += usize::from(outcome.is_failed());
        record.annotation = outcome.into_output();

        let outcome = process_record(&self.synthesis, record).await?;
        failures += usize::from(outcome.is_failed());
        record.synthesis = outcome.into_output();

        Ok(failures)
    }
}

//! Incremental annotation pipeline
//!
//! Drives each dataset partition through three cached stages: extraction
//! (frames, on-screen text, transcript), per-frame annotation (vision
//! descriptions), and synthesis (one long-form report per video). Every
//! stage checks its persistent store before invoking any analyzer, so a
//! rerun never recomputes finished work and an interrupted pass resumes
//! where it stopped.
//!
//! Failure handling is record-grained: a failed record is logged, left
//! with empty fields, and picked up again on the next run because no cache
//! row was written for it. Only storage unavailability aborts a pass.

pub mod annotation;
pub mod config;
pub mod extraction;
pub mod runner;
pub mod stage;
pub mod synthesis;

pub use annotation::AnnotationStage;
pub use config::PipelineConfig;
pub use extraction::ExtractionStage;
pub use runner::{Analyzers, PartitionSummary, Pipeline, PipelineError, PipelineStores, RunSummary};
pub use stage::{process_record, Stage, StageOutcome};
pub use synthesis::SynthesisStage;

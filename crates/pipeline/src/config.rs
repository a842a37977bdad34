//! Pipeline configuration

use std::path::PathBuf;
use std::time::Duration;

/// Everything a full pipeline run needs to know
///
/// Constructed once and passed into [`crate::Pipeline::new`]; there is no
/// process-wide state.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Input dataset CSV
    pub dataset: PathBuf,

    /// Directory for the rewritten partition output files
    pub output_dir: PathBuf,

    /// Root of the scraped video tree ({country}/{creator}/{video}.mp4)
    pub media_root: PathBuf,

    /// Root of the extracted frame tree ({creator}/{video}/{n}.jpg)
    pub frames_root: PathBuf,

    /// Language partitions to process, in order
    pub languages: Vec<String>,

    /// Upper bound on any single external analyzer call. A hung model or
    /// service call otherwise blocks the whole sequential pipeline.
    pub call_timeout: Duration,
}

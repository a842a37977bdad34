/// Common types and constants for the video annotation pipeline
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

pub mod layout;

/// Seconds between sampled frames.
pub const FRAME_INTERVAL_SECS: f64 = 30.0;

/// Frame sampling stops once this much video time has elapsed.
pub const MAX_CLIP_SECS: f64 = 180.0;

/// Upper bound on sampled frames per video.
pub const MAX_FRAMES: usize = 6;

/// Translation input is truncated to this many characters.
pub const TRANSLATION_CHAR_LIMIT: usize = 3000;

/// Target language code for transcript translation.
pub const TRANSLATION_TARGET_LANG: &str = "en";

/// Base URL for canonical video and creator links.
pub const PLATFORM_URL: &str = "https://www.tiktok.com";

/// Elapsed video time for a 1-based frame index.
///
/// Frame index i maps to (i - 1) * 30 seconds; index 1 is always the first
/// frame of the video.
#[must_use]
pub fn elapsed_secs(frame_index: usize) -> f64 {
    (frame_index as f64 - 1.0) * FRAME_INTERVAL_SECS
}

/// Primary key identifying one video across every stage store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    /// Creator identifier (account handle)
    pub creator_id: String,

    /// Video identifier, unique per creator
    pub video_id: String,
}

impl RecordKey {
    pub fn new(creator_id: impl Into<String>, video_id: impl Into<String>) -> Self {
        Self {
            creator_id: creator_id.into(),
            video_id: video_id.into(),
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.creator_id, self.video_id)
    }
}

/// Ordered frame locators for one video, at most [`MAX_FRAMES`] entries.
pub type FrameSet = Vec<PathBuf>;

/// Speech transcript for one video
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    /// Raw transcript text in the source language
    pub text: String,

    /// Detected source language code (e.g. "fi")
    pub language: String,

    /// Translation to [`TRANSLATION_TARGET_LANG`]; empty when translation
    /// failed or was never attempted
    pub translated: String,
}

/// Output of the extraction stage for one video
///
/// `ocr[i]` is the on-screen text read from `frames[i]`. Failed reads are
/// empty strings, never missing entries, so consumers test for non-empty
/// text rather than index presence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionOutput {
    /// Sampled frame locators in timeline order
    pub frames: FrameSet,

    /// On-screen text per frame, parallel to `frames`
    pub ocr: Vec<String>,

    /// Speech transcript with detected language and translation
    pub transcript: Transcript,

    /// Probed media duration in seconds, before clamping
    pub probed_duration_secs: f64,
}

impl ExtractionOutput {
    /// On-screen text for a 1-based frame index; empty for indices beyond
    /// the sampled frame set
    #[must_use]
    pub fn ocr_at(&self, frame_index: usize) -> &str {
        frame_index
            .checked_sub(1)
            .and_then(|i| self.ocr.get(i))
            .map_or("", String::as_str)
    }
}

/// Output of the per-frame annotation stage for one video
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationOutput {
    /// Labeled analysis block per frame, parallel to the extraction
    /// frame set; a failed frame leaves an empty string in place
    pub analyses: Vec<String>,
}

impl AnnotationOutput {
    /// Analysis block for a 1-based frame index. Unreached indices (beyond
    /// the frame set) read as empty, never as absent, so consumers only
    /// ever test for non-empty text.
    #[must_use]
    pub fn analysis_at(&self, frame_index: usize) -> &str {
        frame_index
            .checked_sub(1)
            .and_then(|i| self.analyses.get(i))
            .map_or("", String::as_str)
    }
}

/// Output of the synthesis stage for one video
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SynthesisOutput {
    /// Structured long-form analysis report
    pub report: String,
}

/// One video's full working data across all stages
///
/// Materialized fresh from the dataset on every run. Input fields are never
/// mutated; stage outputs are populated in memory as each stage completes
/// (from cache or fresh computation) and flow to the result sink.
#[derive(Debug, Clone)]
pub struct VideoRecord {
    /// Primary key (creator, video)
    pub key: RecordKey,

    /// Partition language code
    pub language: String,

    /// Country the video was scraped from; addresses the media file
    pub country: String,

    /// Free-text video description
    pub description: String,

    /// Creation timestamp, seconds since epoch
    pub created_at: i64,

    /// Duration in seconds as recorded at scrape time
    pub duration_secs: f64,

    /// Engagement counters
    pub digg_count: u64,
    pub share_count: u64,
    pub comment_count: u64,
    pub play_count: u64,

    /// Creator display name
    pub creator_name: String,

    /// Creator profile bio
    pub creator_bio: String,

    /// Extraction stage output, once available
    pub extraction: Option<ExtractionOutput>,

    /// Annotation stage output, once available
    pub annotation: Option<AnnotationOutput>,

    /// Synthesis stage output, once available
    pub synthesis: Option<SynthesisOutput>,
}

impl VideoRecord {
    /// Frame locators from the extraction stage; empty when extraction has
    /// not run or failed
    #[must_use]
    pub fn frames(&self) -> &[PathBuf] {
        self.extraction.as_ref().map_or(&[], |e| &e.frames)
    }

    /// Per-frame on-screen text; empty when extraction has not run
    #[must_use]
    pub fn ocr_texts(&self) -> &[String] {
        self.extraction.as_ref().map_or(&[], |e| &e.ocr)
    }

    /// Per-frame analysis blocks; empty when annotation has not run
    #[must_use]
    pub fn analyses(&self) -> &[String] {
        self.annotation.as_ref().map_or(&[], |a| &a.analyses)
    }

    /// Transcript, if extraction has produced one
    #[must_use]
    pub fn transcript(&self) -> Option<&Transcript> {
        self.extraction.as_ref().map(|e| &e.transcript)
    }
}

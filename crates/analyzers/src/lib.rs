//! External analyzer capabilities
//!
//! The pipeline consumes five opaque capabilities: frame extraction,
//! text-in-image reading, vision-language description, speech
//! transcription with translation, and synthesis generation. Each is a
//! trait here so stages stay independent of the concrete engines; the
//! shipped backends are an ffmpeg CLI wrapper, an Ollama chat client, and
//! an HTTP client for the companion inference sidecar.
//!
//! Every capability call may fail independently per record or per frame;
//! callers decide how a failure propagates.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod ffmpeg;
pub mod ollama;
pub mod options;
pub mod prompts;
pub mod sidecar;

pub use ffmpeg::FfmpegFrameExtractor;
pub use ollama::{OllamaClient, OllamaConfig};
pub use options::SamplingOptions;
pub use sidecar::{SidecarClient, SidecarConfig};

/// Analyzer errors
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("media file not found: {0}")]
    MediaNotFound(PathBuf),

    #[error("failed to decode media: {0}")]
    Decode(String),

    #[error("analyzer call failed: {0}")]
    Failed(String),

    #[error("translation failed: {0}")]
    Translation(String),

    #[error("analyzer call timed out: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AnalyzerError>;

/// Transcription result before translation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTranscript {
    /// Transcribed speech in the source language
    pub text: String,

    /// Detected source language code
    pub language: String,
}

/// Probes media duration and extracts single frames at a timestamp
#[async_trait]
pub trait FrameExtractor: Send + Sync {
    /// Total media duration in seconds
    async fn probe_duration(&self, media: &Path) -> Result<f64>;

    /// Decode the frame at `at_secs` and write it to `dest`
    async fn extract_frame(&self, media: &Path, at_secs: f64, dest: &Path) -> Result<()>;
}

/// Reads on-screen text out of a frame image
#[async_trait]
pub trait TextReader: Send + Sync {
    async fn read_text(&self, image: &Path) -> Result<String>;
}

/// Describes a frame image with a vision-language model
#[async_trait]
pub trait VisionDescriber: Send + Sync {
    async fn describe(
        &self,
        image: &Path,
        system_prompt: &str,
        user_prompt: &str,
        options: &SamplingOptions,
    ) -> Result<String>;
}

/// Transcribes speech from a media file
#[async_trait]
pub trait SpeechTranscriber: Send + Sync {
    async fn transcribe(&self, media: &Path) -> Result<RawTranscript>;
}

/// Translates text between languages
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, source_lang: &str, target_lang: &str)
        -> Result<String>;
}

/// Generates the long-form synthesis report
#[async_trait]
pub trait SynthesisGenerator: Send + Sync {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &SamplingOptions,
    ) -> Result<String>;
}

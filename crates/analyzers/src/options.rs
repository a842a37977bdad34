//! Deterministic sampling options for generation calls
//!
//! Annotation and synthesis outputs must be reproducible across runs, so
//! every generation call pins the full sampling configuration. Field names
//! follow the Ollama options object and serialize directly into requests.

use serde::{Deserialize, Serialize};

/// Sampling configuration for a generation call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingOptions {
    pub temperature: f32,
    pub num_ctx: u32,
    pub num_predict: u32,
    pub repeat_last_n: u32,
    pub repeat_penalty: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub min_p: f32,
}

impl SamplingOptions {
    /// Fixed options for per-frame description calls.
    #[must_use]
    pub fn frame_analysis() -> Self {
        Self {
            temperature: 0.0,
            num_ctx: 8096,
            num_predict: 2048,
            repeat_last_n: 64,
            repeat_penalty: 1.1,
            top_p: 0.9,
            top_k: 40,
            min_p: 0.0,
        }
    }

    /// Fixed options for synthesis calls; larger context window for the
    /// assembled multi-frame prompt.
    #[must_use]
    pub fn synthesis() -> Self {
        Self {
            num_ctx: 10240,
            ..Self::frame_analysis()
        }
    }
}

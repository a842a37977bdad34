//! Client for the companion inference sidecar
//!
//! OCR, speech transcription, and translation run in a separate service
//! that hosts the heavyweight models; this client speaks its small JSON
//! API. Paths are passed by reference because the sidecar shares the
//! pipeline host's filesystem.

use crate::{AnalyzerError, RawTranscript, Result, SpeechTranscriber, TextReader, Translator};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Sidecar endpoint configuration
#[derive(Debug, Clone)]
pub struct SidecarConfig {
    /// Base URL of the inference sidecar
    pub base_url: String,
}

impl Default for SidecarConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("ANNOTATOR_SIDECAR_URL")
                .unwrap_or_else(|_| "http://localhost:8750".to_string()),
        }
    }
}

#[derive(Serialize)]
struct OcrRequest<'a> {
    image_path: &'a str,
}

#[derive(Serialize)]
struct TranscribeRequest<'a> {
    media_path: &'a str,
}

#[derive(Serialize)]
struct TranslateRequest<'a> {
    text: &'a str,
    source_lang: &'a str,
    target_lang: &'a str,
}

#[derive(Deserialize)]
struct TextResponse {
    text: String,
}

#[derive(Deserialize)]
struct TranscribeResponse {
    text: String,
    language: String,
}

/// HTTP client for the inference sidecar
pub struct SidecarClient {
    config: SidecarConfig,
    http: reqwest::Client,
}

impl SidecarClient {
    pub fn new(config: SidecarConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    async fn post<Req: Serialize, Resp: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        request: &Req,
    ) -> Result<Resp> {
        let response = self
            .http
            .post(format!("{}{endpoint}", self.config.base_url))
            .json(request)
            .send()
            .await
            .map_err(|e| AnalyzerError::Failed(format!("sidecar request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalyzerError::Failed(format!(
                "sidecar {endpoint} returned {status}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AnalyzerError::Failed(format!("invalid sidecar response: {e}")))
    }
}

#[async_trait]
impl TextReader for SidecarClient {
    async fn read_text(&self, image: &Path) -> Result<String> {
        let response: TextResponse = self
            .post(
                "/ocr",
                &OcrRequest {
                    image_path: &image.to_string_lossy(),
                },
            )
            .await?;
        debug!(image = %image.display(), chars = response.text.len(), "ocr completed");
        Ok(response.text)
    }
}

#[async_trait]
impl SpeechTranscriber for SidecarClient {
    async fn transcribe(&self, media: &Path) -> Result<RawTranscript> {
        let response: TranscribeResponse = self
            .post(
                "/transcribe",
                &TranscribeRequest {
                    media_path: &media.to_string_lossy(),
                },
            )
            .await?;
        debug!(
            media = %media.display(),
            language = %response.language,
            "transcription completed"
        );
        Ok(RawTranscript {
            text: response.text,
            language: response.language,
        })
    }
}

#[async_trait]
impl Translator for SidecarClient {
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String> {
        let response: TextResponse = self
            .post(
                "/translate",
                &TranslateRequest {
                    text,
                    source_lang,
                    target_lang,
                },
            )
            .await
            .map_err(|e| AnalyzerError::Translation(e.to_string()))?;
        Ok(response.text)
    }
}

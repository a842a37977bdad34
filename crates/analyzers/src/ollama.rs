//! Ollama chat client
//!
//! Serves both generation capabilities: per-frame vision description
//! (image attached to the user message) and the synthesis report. Requests
//! are non-streaming; sampling options are passed through verbatim.

use crate::{
    AnalyzerError, Result, SamplingOptions, SynthesisGenerator, VisionDescriber,
};
use async_trait::async_trait;
use base64::Engine as _;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use tracing::debug;

/// Ollama endpoint configuration
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Base URL of the Ollama server
    pub base_url: String,

    /// Model name to run
    pub model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("ANNOTATOR_OLLAMA_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            model: std::env::var("ANNOTATOR_OLLAMA_MODEL")
                .unwrap_or_else(|_| "llama3.2-vision:11b".to_string()),
        }
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    images: Option<Vec<String>>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    options: &'a SamplingOptions,
    stream: bool,
}

/// Client for the Ollama chat API
pub struct OllamaClient {
    config: OllamaConfig,
    http: reqwest::Client,
}

impl OllamaClient {
    pub fn new(config: OllamaConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    async fn chat(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        images: Option<Vec<String>>,
        options: &SamplingOptions,
    ) -> Result<String> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                    images: None,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                    images,
                },
            ],
            options,
            stream: false,
        };

        let response = self
            .http
            .post(format!("{}/api/chat", self.config.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| AnalyzerError::Failed(format!("ollama request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalyzerError::Failed(format!(
                "ollama returned {status}"
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AnalyzerError::Failed(format!("invalid ollama response: {e}")))?;
        let content = body["message"]["content"]
            .as_str()
            .ok_or_else(|| AnalyzerError::Failed("ollama response without content".to_string()))?;

        debug!(model = %self.config.model, chars = content.len(), "ollama chat completed");
        Ok(content.to_string())
    }
}

#[async_trait]
impl VisionDescriber for OllamaClient {
    async fn describe(
        &self,
        image: &Path,
        system_prompt: &str,
        user_prompt: &str,
        options: &SamplingOptions,
    ) -> Result<String> {
        let bytes = tokio::fs::read(image).await?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        self.chat(system_prompt, user_prompt, Some(vec![encoded]), options)
            .await
    }
}

#[async_trait]
impl SynthesisGenerator for OllamaClient {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &SamplingOptions,
    ) -> Result<String> {
        self.chat(system_prompt, user_prompt, None, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_shape() {
        let options = SamplingOptions::frame_analysis();
        let request = ChatRequest {
            model: "llama3.2-vision:11b",
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "system",
                    images: None,
                },
                ChatMessage {
                    role: "user",
                    content: "user",
                    images: Some(vec!["aGVsbG8=".to_string()]),
                },
            ],
            options: &options,
            stream: false,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["stream"], false);
        assert_eq!(json["messages"][0]["role"], "system");
        // The system message must not carry an images key at all.
        assert!(json["messages"][0].get("images").is_none());
        assert_eq!(json["messages"][1]["images"][0], "aGVsbG8=");
        assert_eq!(json["options"]["num_ctx"], 8096);
    }
}

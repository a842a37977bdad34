//! Synthesis stage
//!
//! Assembles one long-form prompt per record out of the video metadata,
//! the frame analyses with their on-screen text, and the transcript, and
//! runs the synthesis generator at deterministic sampling. Synthesis runs
//! for every record; missing upstream outputs simply appear as empty
//! sections.

use crate::stage::{bounded, Stage};
use annotator_analyzers::{prompts, AnalyzerError, SamplingOptions, SynthesisGenerator};
use annotator_common::{RecordKey, SynthesisOutput, VideoRecord, PLATFORM_URL};
use annotator_store::{StageStore, StoreError, SynthesisEntry, SynthesisStore};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Stage processor for the per-video synthesis report
pub struct SynthesisStage {
    generator: Arc<dyn SynthesisGenerator>,
    store: SynthesisStore,
    options: SamplingOptions,
    call_timeout: Duration,
}

impl SynthesisStage {
    pub fn new(
        generator: Arc<dyn SynthesisGenerator>,
        store: SynthesisStore,
        call_timeout: Duration,
    ) -> Self {
        Self {
            generator,
            store,
            options: SamplingOptions::synthesis(),
            call_timeout,
        }
    }
}

/// Hashtags in the description, in order of appearance.
#[must_use]
pub fn hashtags(description: &str) -> String {
    description
        .split_whitespace()
        .filter(|token| token.starts_with('#'))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Metadata section of the synthesis context.
#[must_use]
pub fn metadata_block(record: &VideoRecord) -> String {
    let timestamp = chrono::DateTime::from_timestamp(record.created_at, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default();

    format!(
        "- Creator name: {name}\n\
         - Creator username: {username}\n\
         - Creator bio: {bio}\n\
         - Description: {description}\n\
         - Timestamp: {timestamp}\n\
         - Duration: {duration} seconds\n\
         - Diggs: {diggs}\n\
         - Shares: {shares}\n\
         - Comments: {comments}\n\
         - Plays: {plays}\n\
         - Video URL: {platform}/@{username}/video/{video}\n\
         - Creator URL: {platform}/@{username}\n\
         - Hashtags: {hashtags}",
        name = record.creator_name,
        username = record.key.creator_id,
        bio = record.creator_bio,
        description = record.description,
        duration = record.duration_secs,
        diggs = record.digg_count,
        shares = record.share_count,
        comments = record.comment_count,
        plays = record.play_count,
        platform = PLATFORM_URL,
        video = record.key.video_id,
        hashtags = hashtags(&record.description),
    )
}

/// Frame section of the synthesis context: the analysis block of every
/// frame with a non-empty analysis, in ascending frame order, each
/// followed by the on-screen text for the same frame. Frames whose
/// analysis is empty (failed or never reached) are omitted entirely.
#[must_use]
pub fn frame_context(record: &VideoRecord) -> String {
    let mut sections = Vec::new();
    for (i, analysis) in record.analyses().iter().enumerate() {
        if analysis.is_empty() {
            continue;
        }
        let frame_index = i + 1;
        let ocr = record
            .extraction
            .as_ref()
            .map_or("", |e| e.ocr_at(frame_index));
        sections.push(format!(
            "{analysis}\n\n{}",
            prompts::ocr_block(frame_index, ocr)
        ));
    }
    sections.join("\n\n")
}

/// Transcript section of the synthesis context.
#[must_use]
pub fn transcript_section(record: &VideoRecord) -> String {
    let Some(transcript) = record.transcript() else {
        return String::new();
    };
    let mut section = transcript.text.clone();
    if !transcript.language.is_empty() {
        section.push_str(&format!("\n\nDetected language: {}", transcript.language));
    }
    if !transcript.translated.is_empty() {
        section.push_str(&format!("\n\nEnglish translation:\n{}", transcript.translated));
    }
    section
}

/// The full user prompt for one record.
#[must_use]
pub fn assemble_user_prompt(record: &VideoRecord) -> String {
    prompts::synthesis_user_prompt(
        &metadata_block(record),
        &transcript_section(record),
        &frame_context(record),
    )
}

#[async_trait]
impl Stage for SynthesisStage {
    type Output = SynthesisOutput;

    fn name(&self) -> &'static str {
        "synthesis"
    }

    async fn cached(&self, key: &RecordKey) -> Result<Option<SynthesisOutput>, StoreError> {
        if !self.store.exists(key).await? {
            return Ok(None);
        }
        let entry = self.store.get(key).await?;
        Ok(Some(SynthesisOutput {
            report: entry.report,
        }))
    }

    async fn compute(&self, record: &VideoRecord) -> Result<SynthesisOutput, AnalyzerError> {
        let user_prompt = assemble_user_prompt(record);
        let report = bounded(
            self.call_timeout,
            "synthesis generation",
            self.generator
                .generate(prompts::SYNTHESIS_SYSTEM_PROMPT, &user_prompt, &self.options),
        )
        .await?;
        Ok(SynthesisOutput { report })
    }

    async fn persist(&self, key: &RecordKey, output: &SynthesisOutput) -> Result<bool, StoreError> {
        self.store
            .put_if_absent(
                key,
                &SynthesisEntry {
                    report: output.report.clone(),
                },
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use annotator_common::{AnnotationOutput, ExtractionOutput, RecordKey, Transcript};

    fn record() -> VideoRecord {
        VideoRecord {
            key: RecordKey::new("alice", "v1"),
            language: "fi".to_string(),
            country: "FI".to_string(),
            description: "Vote on Sunday! #eu2024 #vote".to_string(),
            created_at: 1_717_200_000,
            duration_secs: 95.0,
            digg_count: 10,
            share_count: 2,
            comment_count: 3,
            play_count: 400,
            creator_name: "Alice".to_string(),
            creator_bio: "candidate".to_string(),
            extraction: None,
            annotation: None,
            synthesis: None,
        }
    }

    #[test]
    fn test_hashtags() {
        assert_eq!(hashtags("Vote! #eu2024 now #vote"), "#eu2024, #vote");
        assert_eq!(hashtags("no tags here"), "");
    }

    #[test]
    fn test_metadata_block_fields() {
        let block = metadata_block(&record());
        assert!(block.contains("- Creator name: Alice"));
        assert!(block.contains("- Diggs: 10"));
        assert!(block.contains("- Timestamp: 2024-06-01 00:00:00"));
        assert!(block.contains("- Video URL: https://www.tiktok.com/@alice/video/v1"));
        assert!(block.contains("- Hashtags: #eu2024, #vote"));
    }

    #[test]
    fn test_frame_context_skips_empty_blocks_keeps_order() {
        let mut rec = record();
        rec.extraction = Some(ExtractionOutput {
            frames: vec!["1.jpg".into(), "2.jpg".into(), "3.jpg".into(), "4.jpg".into()],
            ocr: vec![
                "FIRST".to_string(),
                String::new(),
                "THIRD".to_string(),
                "FOURTH".to_string(),
            ],
            transcript: Transcript::default(),
            probed_duration_secs: 95.0,
        });
        rec.annotation = Some(AnnotationOutput {
            analyses: vec![
                "### Frame 1 at 0 seconds\n\na podium".to_string(),
                "### Frame 2 at 30 seconds\n\na crowd".to_string(),
                String::new(),
                "### Frame 4 at 90 seconds\n\na flag".to_string(),
            ],
        });

        let context = frame_context(&rec);
        let first = context.find("Frame 1 at 0 seconds").unwrap();
        let second = context.find("Frame 2 at 30 seconds").unwrap();
        let fourth = context.find("Frame 4 at 90 seconds").unwrap();
        assert!(first < second && second < fourth);
        assert!(!context.contains("Frame 3 at 60 seconds"));
        // Each kept frame carries its own on-screen text.
        assert!(context.contains("FIRST"));
        assert!(context.contains("FOURTH"));
        assert!(!context.contains("THIRD"));
    }

    #[test]
    fn test_frame_context_empty_without_annotation() {
        assert_eq!(frame_context(&record()), "");
    }

    #[test]
    fn test_transcript_section_variants() {
        let mut rec = record();
        assert_eq!(transcript_section(&rec), "");

        rec.extraction = Some(ExtractionOutput {
            transcript: Transcript {
                text: "hei kaikki".to_string(),
                language: "fi".to_string(),
                translated: String::new(),
            },
            ..Default::default()
        });
        let section = transcript_section(&rec);
        assert!(section.starts_with("hei kaikki"));
        assert!(section.contains("Detected language: fi"));
        assert!(!section.contains("English translation"));

        rec.extraction.as_mut().unwrap().transcript.translated = "hello everyone".to_string();
        assert!(transcript_section(&rec).contains("English translation:\nhello everyone"));
    }
}

//! Extraction stage
//!
//! Samples frames every 30 seconds of video time (at most six, stopping at
//! the 180-second mark), reads on-screen text from each frame, and
//! transcribes and translates the speech track. The whole result is cached
//! as one store entry per record.

use crate::stage::{bounded, Stage};
use annotator_analyzers::{
    AnalyzerError, FrameExtractor, SpeechTranscriber, TextReader, Translator,
};
use annotator_common::{
    layout, ExtractionOutput, RecordKey, Transcript, VideoRecord, FRAME_INTERVAL_SECS,
    MAX_CLIP_SECS, MAX_FRAMES, TRANSLATION_CHAR_LIMIT, TRANSLATION_TARGET_LANG,
};
use annotator_store::{ExtractionEntry, ExtractionStore, StageStore, StoreError};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Stage processor for frame, on-screen text, and transcript extraction
pub struct ExtractionStage {
    extractor: Arc<dyn FrameExtractor>,
    reader: Arc<dyn TextReader>,
    transcriber: Arc<dyn SpeechTranscriber>,
    translator: Arc<dyn Translator>,
    store: ExtractionStore,
    media_root: PathBuf,
    frames_root: PathBuf,
    call_timeout: Duration,
}

impl ExtractionStage {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        extractor: Arc<dyn FrameExtractor>,
        reader: Arc<dyn TextReader>,
        transcriber: Arc<dyn SpeechTranscriber>,
        translator: Arc<dyn Translator>,
        store: ExtractionStore,
        media_root: PathBuf,
        frames_root: PathBuf,
        call_timeout: Duration,
    ) -> Self {
        Self {
            extractor,
            reader,
            transcriber,
            translator,
            store,
            media_root,
            frames_root,
            call_timeout,
        }
    }
}

/// Frame sample timestamps for a probed duration: t = 0, 30, 60, ... while
/// t stays below the duration clamped to [`MAX_CLIP_SECS`], at most
/// [`MAX_FRAMES`] samples.
fn sample_times(probed_duration_secs: f64) -> Vec<f64> {
    let clamped = probed_duration_secs.min(MAX_CLIP_SECS);
    let mut times = Vec::new();
    let mut t = 0.0;
    while t < clamped && times.len() < MAX_FRAMES {
        times.push(t);
        t += FRAME_INTERVAL_SECS;
    }
    times
}

fn entry_to_output(entry: ExtractionEntry) -> ExtractionOutput {
    ExtractionOutput {
        frames: entry.frames.into_iter().map(PathBuf::from).collect(),
        ocr: entry.ocr,
        transcript: Transcript {
            text: entry.transcript,
            language: entry.transcript_language,
            translated: entry.transcript_translated,
        },
        probed_duration_secs: entry.probed_duration_secs,
    }
}

fn output_to_entry(output: &ExtractionOutput) -> ExtractionEntry {
    ExtractionEntry {
        frames: output
            .frames
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect(),
        ocr: output.ocr.clone(),
        transcript: output.transcript.text.clone(),
        transcript_language: output.transcript.language.clone(),
        transcript_translated: output.transcript.translated.clone(),
        probed_duration_secs: output.probed_duration_secs,
    }
}

#[async_trait]
impl Stage for ExtractionStage {
    type Output = ExtractionOutput;

    fn name(&self) -> &'static str {
        "extraction"
    }

    async fn cached(&self, key: &RecordKey) -> Result<Option<ExtractionOutput>, StoreError> {
        if !self.store.exists(key).await? {
            return Ok(None);
        }
        Ok(Some(entry_to_output(self.store.get(key).await?)))
    }

    async fn compute(&self, record: &VideoRecord) -> Result<ExtractionOutput, AnalyzerError> {
        let media = layout::video_path(&self.media_root, &record.country, &record.key);
        let duration = bounded(
            self.call_timeout,
            "duration probe",
            self.extractor.probe_duration(&media),
        )
        .await?;

        let frame_dir = layout::frame_dir(&self.frames_root, &record.key);
        std::fs::create_dir_all(&frame_dir)?;

        let mut frames = Vec::new();
        let mut ocr = Vec::new();
        for (i, at_secs) in sample_times(duration).into_iter().enumerate() {
            let frame_index = i + 1;
            let dest = layout::frame_path(&frame_dir, frame_index);
            bounded(
                self.call_timeout,
                "frame extraction",
                self.extractor.extract_frame(&media, at_secs, &dest),
            )
            .await?;

            let text = match bounded(
                self.call_timeout,
                "on-screen text read",
                self.reader.read_text(&dest),
            )
            .await
            {
                Ok(text) => text,
                Err(err) => {
                    warn!(
                        record = %record.key,
                        frame = frame_index,
                        error = %err,
                        "on-screen text read failed, substituting empty text"
                    );
                    String::new()
                }
            };

            frames.push(dest);
            ocr.push(text);
        }

        let raw = bounded(
            self.call_timeout,
            "transcription",
            self.transcriber.transcribe(&media),
        )
        .await?;
        let translated = self.translate_capped(&record.key, &raw.text, &raw.language).await;

        Ok(ExtractionOutput {
            frames,
            ocr,
            transcript: Transcript {
                text: raw.text,
                language: raw.language,
                translated,
            },
            probed_duration_secs: duration,
        })
    }

    async fn persist(&self, key: &RecordKey, output: &ExtractionOutput) -> Result<bool, StoreError> {
        self.store.put_if_absent(key, &output_to_entry(output)).await
    }
}

impl ExtractionStage {
    /// Translate the first [`TRANSLATION_CHAR_LIMIT`] characters of the
    /// transcript. Translation failure is non-fatal: the transcript is
    /// kept and the translated field stays empty.
    async fn translate_capped(&self, key: &RecordKey, text: &str, language: &str) -> String {
        let capped: String = text.chars().take(TRANSLATION_CHAR_LIMIT).collect();
        if capped.is_empty() {
            return String::new();
        }
        match bounded(
            self.call_timeout,
            "translation",
            self.translator
                .translate(&capped, language, TRANSLATION_TARGET_LANG),
        )
        .await
        {
            Ok(translated) => translated,
            Err(err) => {
                warn!(
                    record = %key,
                    error = %err,
                    "translation failed, keeping transcript untranslated"
                );
                String::new()
            }
        }
    }
}

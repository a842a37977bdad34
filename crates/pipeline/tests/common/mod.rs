//! Shared fixtures for pipeline integration tests
//!
//! Call-counting fake analyzers plus a scratch environment with a dataset
//! CSV, a media tree, and a store directory. Fakes are deterministic so
//! repeated passes produce identical output, and each can be told to fail
//! whenever the incoming path or prompt contains a marker string.

use annotator_analyzers::{
    AnalyzerError, FrameExtractor, RawTranscript, SamplingOptions, SpeechTranscriber,
    SynthesisGenerator, TextReader, Translator, VisionDescriber,
};
use annotator_pipeline::{Analyzers, PipelineConfig};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

type Result<T> = std::result::Result<T, AnalyzerError>;

fn fails(path: &str, marker: &Option<String>) -> bool {
    marker.as_deref().is_some_and(|m| path.contains(m))
}

/// Fake frame extractor; durations are configured per video id.
#[derive(Default)]
pub struct FakeExtractor {
    pub durations: HashMap<String, f64>,
    pub probe_calls: AtomicUsize,
    pub extract_calls: AtomicUsize,
    pub requested_times: Mutex<Vec<f64>>,
}

impl FakeExtractor {
    pub fn new(durations: &[(&str, f64)]) -> Self {
        Self {
            durations: durations
                .iter()
                .map(|(video, secs)| ((*video).to_string(), *secs))
                .collect(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl FrameExtractor for FakeExtractor {
    async fn probe_duration(&self, media: &Path) -> Result<f64> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        if !media.exists() {
            return Err(AnalyzerError::MediaNotFound(media.to_path_buf()));
        }
        let video = media.file_stem().unwrap().to_string_lossy().into_owned();
        Ok(*self.durations.get(&video).unwrap_or(&0.0))
    }

    async fn extract_frame(&self, media: &Path, at_secs: f64, dest: &Path) -> Result<()> {
        self.extract_calls.fetch_add(1, Ordering::SeqCst);
        if !media.exists() {
            return Err(AnalyzerError::MediaNotFound(media.to_path_buf()));
        }
        self.requested_times.lock().unwrap().push(at_secs);
        std::fs::write(dest, b"jpeg")?;
        Ok(())
    }
}

/// Fake on-screen text reader
#[derive(Default)]
pub struct FakeReader {
    pub calls: AtomicUsize,
    pub fail_marker: Option<String>,
}

#[async_trait]
impl TextReader for FakeReader {
    async fn read_text(&self, image: &Path) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let path = image.to_string_lossy();
        if fails(&path, &self.fail_marker) {
            return Err(AnalyzerError::Failed(format!("ocr refused {path}")));
        }
        Ok(format!(
            "text in {}",
            image.file_name().unwrap().to_string_lossy()
        ))
    }
}

/// Fake speech transcriber
#[derive(Default)]
pub struct FakeTranscriber {
    pub calls: AtomicUsize,
    pub fail_marker: Option<String>,
    pub delay: Option<Duration>,
}

#[async_trait]
impl SpeechTranscriber for FakeTranscriber {
    async fn transcribe(&self, media: &Path) -> Result<RawTranscript> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let path = media.to_string_lossy();
        if fails(&path, &self.fail_marker) {
            return Err(AnalyzerError::Failed(format!("transcriber refused {path}")));
        }
        Ok(RawTranscript {
            text: "puhutaan vaaleista".to_string(),
            language: "fi".to_string(),
        })
    }
}

/// Fake translator
#[derive(Default)]
pub struct FakeTranslator {
    pub calls: AtomicUsize,
    pub fail: bool,
}

#[async_trait]
impl Translator for FakeTranslator {
    async fn translate(&self, text: &str, _source: &str, target: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AnalyzerError::Translation("translator offline".to_string()));
        }
        Ok(format!("[{target}] {text}"))
    }
}

/// Fake vision describer
#[derive(Default)]
pub struct FakeDescriber {
    pub calls: AtomicUsize,
    pub fail_marker: Option<String>,
}

#[async_trait]
impl VisionDescriber for FakeDescriber {
    async fn describe(
        &self,
        image: &Path,
        _system_prompt: &str,
        _user_prompt: &str,
        _options: &SamplingOptions,
    ) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let path = image.to_string_lossy();
        if fails(&path, &self.fail_marker) {
            return Err(AnalyzerError::Failed(format!("describer refused {path}")));
        }
        Ok(format!(
            "scene in {}",
            image.file_name().unwrap().to_string_lossy()
        ))
    }
}

/// Fake synthesis generator; remembers the last assembled user prompt.
#[derive(Default)]
pub struct FakeGenerator {
    pub calls: AtomicUsize,
    pub fail_marker: Option<String>,
    pub last_user_prompt: Mutex<Option<String>>,
}

#[async_trait]
impl SynthesisGenerator for FakeGenerator {
    async fn generate(
        &self,
        _system_prompt: &str,
        user_prompt: &str,
        _options: &SamplingOptions,
    ) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if fails(user_prompt, &self.fail_marker) {
            return Err(AnalyzerError::Failed("generator refused".to_string()));
        }
        *self.last_user_prompt.lock().unwrap() = Some(user_prompt.to_string());
        Ok("structured analysis report".to_string())
    }
}

/// One set of fakes wired into an [`Analyzers`] bundle
pub struct FakeSet {
    pub extractor: Arc<FakeExtractor>,
    pub reader: Arc<FakeReader>,
    pub transcriber: Arc<FakeTranscriber>,
    pub translator: Arc<FakeTranslator>,
    pub describer: Arc<FakeDescriber>,
    pub generator: Arc<FakeGenerator>,
}

impl FakeSet {
    pub fn new(durations: &[(&str, f64)]) -> Self {
        Self {
            extractor: Arc::new(FakeExtractor::new(durations)),
            reader: Arc::new(FakeReader::default()),
            transcriber: Arc::new(FakeTranscriber::default()),
            translator: Arc::new(FakeTranslator::default()),
            describer: Arc::new(FakeDescriber::default()),
            generator: Arc::new(FakeGenerator::default()),
        }
    }

    pub fn analyzers(&self) -> Analyzers {
        Analyzers {
            frame_extractor: self.extractor.clone(),
            text_reader: self.reader.clone(),
            transcriber: self.transcriber.clone(),
            translator: self.translator.clone(),
            describer: self.describer.clone(),
            generator: self.generator.clone(),
        }
    }

    /// Total external calls across every capability
    pub fn total_calls(&self) -> usize {
        self.extractor.probe_calls.load(Ordering::SeqCst)
            + self.extractor.extract_calls.load(Ordering::SeqCst)
            + self.reader.calls.load(Ordering::SeqCst)
            + self.transcriber.calls.load(Ordering::SeqCst)
            + self.translator.calls.load(Ordering::SeqCst)
            + self.describer.calls.load(Ordering::SeqCst)
            + self.generator.calls.load(Ordering::SeqCst)
    }
}

const HEADER: &str = "creator_id,video_id,language,country,has_transcript,description,\
                      created_at,duration_secs,digg_count,share_count,comment_count,\
                      play_count,creator_name,creator_bio";

/// Scratch directories for one test
pub struct TestEnv {
    pub root: TempDir,
    pub dataset: PathBuf,
    pub media_root: PathBuf,
    pub frames_root: PathBuf,
    pub store_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let root = TempDir::new().unwrap();
        let env = Self {
            dataset: root.path().join("videos.csv"),
            media_root: root.path().join("media"),
            frames_root: root.path().join("frames"),
            store_dir: root.path().join("stores"),
            output_dir: root.path().join("out"),
            root,
        };
        std::fs::create_dir_all(&env.media_root).unwrap();
        std::fs::create_dir_all(&env.frames_root).unwrap();
        env
    }

    /// (Re)write the dataset file from (creator, video, language) triples.
    pub fn write_dataset(&self, rows: &[(&str, &str, &str)]) {
        let mut contents = format!("{HEADER}\n");
        for (creator, video, language) in rows {
            contents.push_str(&format!(
                "{creator},{video},{language},FI,true,Vote! #eu2024,1717200000,60.0,\
                 10,2,3,400,{creator} name,{creator} bio\n"
            ));
        }
        std::fs::write(&self.dataset, contents).unwrap();
    }

    /// Create a dummy media file where the extraction stage expects it.
    pub fn touch_media(&self, creator: &str, video: &str) {
        let dir = self.media_root.join("FI").join(creator);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(format!("{video}.mp4")), b"media").unwrap();
    }

    pub fn config(&self, languages: &[&str]) -> PipelineConfig {
        self.config_with_timeout(languages, Duration::from_secs(5))
    }

    pub fn config_with_timeout(&self, languages: &[&str], call_timeout: Duration) -> PipelineConfig {
        PipelineConfig {
            dataset: self.dataset.clone(),
            output_dir: self.output_dir.clone(),
            media_root: self.media_root.clone(),
            frames_root: self.frames_root.clone(),
            languages: languages.iter().map(|l| (*l).to_string()).collect(),
            call_timeout,
        }
    }
}

//! Annotator CLI - incremental annotation pipeline for short social videos
//!
//! Command-line interface wiring the stage stores and external analyzer
//! clients into the pipeline.

use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use annotator_analyzers::{
    FfmpegFrameExtractor, OllamaClient, OllamaConfig, SidecarClient, SidecarConfig,
};
use annotator_pipeline::{Analyzers, Pipeline, PipelineConfig, PipelineStores};
use annotator_store::{AnnotationStore, ExtractionStore, StageStore as _, SynthesisStore};
use annotator_store::{ANNOTATION_DB_FILE, EXTRACTION_DB_FILE, SYNTHESIS_DB_FILE};

#[derive(Parser)]
#[command(
    name = "annotator",
    version,
    about = "Incremental annotation pipeline for short social-media videos",
    long_about = "Annotates scraped videos with frame analyses, on-screen text, \
                  speech transcripts, and a per-video synthesis report.\n\
                  Every stage caches its results per (creator, video), so reruns \
                  skip finished work and an interrupted pass simply resumes.\n\n\
                  Run exactly one pipeline instance per store directory at a time."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Process one or more language partitions end to end
    Run(RunCommand),

    /// Show per-stage cache entry counts
    Stats(StatsCommand),
}

#[derive(Args)]
struct RunCommand {
    /// Input dataset CSV
    #[arg(long)]
    dataset: PathBuf,

    /// Language partitions to process, comma separated (e.g. fi,sv,pl)
    #[arg(long, value_delimiter = ',', required = true)]
    languages: Vec<String>,

    /// Root of the scraped video tree ({country}/{creator}/{video}.mp4)
    #[arg(long)]
    media_root: PathBuf,

    /// Root directory for extracted frames
    #[arg(long)]
    frames_root: PathBuf,

    /// Directory holding the three stage store databases
    #[arg(long)]
    store_dir: PathBuf,

    /// Directory for the rewritten partition output files
    #[arg(long)]
    output_dir: PathBuf,

    /// Upper bound in seconds on any single analyzer call
    #[arg(long, default_value_t = 300)]
    timeout_secs: u64,
}

#[derive(Args)]
struct StatsCommand {
    /// Directory holding the three stage store databases
    #[arg(long)]
    store_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    match cli.command {
        Commands::Run(cmd) => run(cmd).await,
        Commands::Stats(cmd) => stats(cmd).await,
    }
}

async fn run(cmd: RunCommand) -> Result<()> {
    let stores = PipelineStores::open(&cmd.store_dir)
        .await
        .context("Failed to open stage stores")?;

    let sidecar = Arc::new(SidecarClient::new(SidecarConfig::default()));
    let ollama = Arc::new(OllamaClient::new(OllamaConfig::default()));
    let analyzers = Analyzers {
        frame_extractor: Arc::new(FfmpegFrameExtractor::default()),
        text_reader: sidecar.clone(),
        transcriber: sidecar.clone(),
        translator: sidecar,
        describer: ollama.clone(),
        generator: ollama,
    };

    let config = PipelineConfig {
        dataset: cmd.dataset,
        output_dir: cmd.output_dir,
        media_root: cmd.media_root,
        frames_root: cmd.frames_root,
        languages: cmd.languages,
        call_timeout: Duration::from_secs(cmd.timeout_secs),
    };

    let pipeline = Pipeline::new(config, stores, analyzers);
    let summary = pipeline.run().await.context("Pipeline run failed")?;

    for partition in &summary.partitions {
        println!(
            "{}: {} records, {} stage failures -> {}",
            partition.language,
            partition.records,
            partition.failures,
            partition.output_path.display()
        );
    }
    Ok(())
}

async fn stats(cmd: StatsCommand) -> Result<()> {
    let extraction = ExtractionStore::open(&cmd.store_dir.join(EXTRACTION_DB_FILE))
        .await
        .context("Failed to open extraction store")?;
    let annotation = AnnotationStore::open(&cmd.store_dir.join(ANNOTATION_DB_FILE))
        .await
        .context("Failed to open annotation store")?;
    let synthesis = SynthesisStore::open(&cmd.store_dir.join(SYNTHESIS_DB_FILE))
        .await
        .context("Failed to open synthesis store")?;

    println!("extraction: {} entries", extraction.count().await?);
    println!("annotation: {} entries", annotation.count().await?);
    println!("synthesis:  {} entries", synthesis.count().await?);
    Ok(())
}

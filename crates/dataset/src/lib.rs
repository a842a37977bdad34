//! Record source and result sink for the annotation pipeline
//!
//! The input dataset is one CSV file with a row per scraped video. A run
//! loads one language partition at a time, keeping dataset row order, and
//! after the pass rewrites the whole partition file with the stage output
//! columns appended.

use annotator_common::{RecordKey, VideoRecord};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Dataset errors
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DatasetError>;

/// One input dataset row as scraped
#[derive(Debug, Deserialize)]
struct InputRow {
    creator_id: String,
    video_id: String,
    language: String,
    country: String,
    has_transcript: bool,
    #[serde(default)]
    description: String,
    created_at: i64,
    duration_secs: f64,
    digg_count: u64,
    share_count: u64,
    comment_count: u64,
    play_count: u64,
    #[serde(default)]
    creator_name: String,
    #[serde(default)]
    creator_bio: String,
}

impl InputRow {
    fn into_record(self) -> VideoRecord {
        VideoRecord {
            key: RecordKey::new(self.creator_id, self.video_id),
            language: self.language,
            country: self.country,
            description: self.description,
            created_at: self.created_at,
            duration_secs: self.duration_secs,
            digg_count: self.digg_count,
            share_count: self.share_count,
            comment_count: self.comment_count,
            play_count: self.play_count,
            creator_name: self.creator_name,
            creator_bio: self.creator_bio,
            extraction: None,
            annotation: None,
            synthesis: None,
        }
    }
}

/// One output row: the input columns plus the stage output columns
///
/// Variable-length per-frame sequences are written as JSON arrays so the
/// row stays flat regardless of how many frames a video produced.
#[derive(Debug, Serialize)]
struct OutputRow<'a> {
    creator_id: &'a str,
    video_id: &'a str,
    language: &'a str,
    country: &'a str,
    has_transcript: bool,
    description: &'a str,
    created_at: i64,
    duration_secs: f64,
    digg_count: u64,
    share_count: u64,
    comment_count: u64,
    play_count: u64,
    creator_name: &'a str,
    creator_bio: &'a str,
    frames: String,
    ocr: String,
    transcript: String,
    transcript_language: String,
    transcript_translated: String,
    frame_analysis: String,
    summary: String,
}

/// Load one language partition from the dataset, in file order.
///
/// Rows whose transcript-existence flag is false are excluded from the
/// whole run; they carry no speech and the scraper marks them unusable.
pub fn load_partition(dataset: &Path, language: &str) -> Result<Vec<VideoRecord>> {
    let mut reader = csv::Reader::from_path(dataset)?;
    let mut records = Vec::new();

    for row in reader.deserialize::<InputRow>() {
        let row = row?;
        if !row.has_transcript || row.language != language {
            continue;
        }
        records.push(row.into_record());
    }

    info!(
        language,
        records = records.len(),
        "loaded dataset partition"
    );
    Ok(records)
}

/// Rewrite the partition output file from the enriched records.
///
/// The whole file is overwritten at the end of a pass; output is not
/// append-only.
pub fn write_partition(
    output_dir: &Path,
    language: &str,
    records: &[VideoRecord],
) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join(format!("annotated_{language}.csv"));
    let mut writer = csv::Writer::from_path(&path)?;

    for record in records {
        let frames: Vec<String> = record
            .frames()
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        let transcript = record.transcript().cloned().unwrap_or_default();
        let summary = record
            .synthesis
            .as_ref()
            .map_or(String::new(), |s| s.report.clone());

        writer.serialize(OutputRow {
            creator_id: &record.key.creator_id,
            video_id: &record.key.video_id,
            language: &record.language,
            country: &record.country,
            has_transcript: true,
            description: &record.description,
            created_at: record.created_at,
            duration_secs: record.duration_secs,
            digg_count: record.digg_count,
            share_count: record.share_count,
            comment_count: record.comment_count,
            play_count: record.play_count,
            creator_name: &record.creator_name,
            creator_bio: &record.creator_bio,
            frames: frames.join(","),
            ocr: serde_json::to_string(record.ocr_texts()).unwrap_or_default(),
            transcript: transcript.text,
            transcript_language: transcript.language,
            transcript_translated: transcript.translated,
            frame_analysis: serde_json::to_string(record.analyses()).unwrap_or_default(),
            summary,
        })?;
    }

    writer.flush()?;
    info!(
        language,
        path = %path.display(),
        "wrote partition output"
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use annotator_common::{ExtractionOutput, SynthesisOutput, Transcript};
    use std::io::Write as _;

    const HEADER: &str = "creator_id,video_id,language,country,has_transcript,description,\
                          created_at,duration_secs,digg_count,share_count,comment_count,\
                          play_count,creator_name,creator_bio";

    fn write_dataset(rows: &[&str]) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("videos.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "{HEADER}").unwrap();
        for row in rows {
            writeln!(file, "{row}").unwrap();
        }
        (dir, path)
    }

    #[test]
    fn test_load_filters_language_and_transcript_flag() {
        let (_dir, path) = write_dataset(&[
            "alice,v1,fi,FI,true,hello,1717000000,75.0,1,2,3,4,Alice,bio",
            "bob,v2,sv,SE,true,hej,1717000001,30.0,1,2,3,4,Bob,bio",
            "carol,v3,fi,FI,false,moi,1717000002,60.0,1,2,3,4,Carol,bio",
            "dave,v4,fi,FI,true,terve,1717000003,200.0,1,2,3,4,Dave,bio",
        ]);

        let records = load_partition(&path, "fi").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].key, RecordKey::new("alice", "v1"));
        assert_eq!(records[1].key, RecordKey::new("dave", "v4"));
        assert_eq!(records[0].duration_secs, 75.0);
    }

    #[test]
    fn test_write_partition_round_trip() {
        let (_dir, path) = write_dataset(&[
            "alice,v1,fi,FI,true,hello,1717000000,75.0,1,2,3,4,Alice,bio",
        ]);
        let mut records = load_partition(&path, "fi").unwrap();
        records[0].extraction = Some(ExtractionOutput {
            frames: vec!["a/1.jpg".into(), "a/2.jpg".into()],
            ocr: vec!["VOTE".to_string(), String::new()],
            transcript: Transcript {
                text: "hei".to_string(),
                language: "fi".to_string(),
                translated: "hi".to_string(),
            },
            probed_duration_secs: 75.0,
        });
        records[0].synthesis = Some(SynthesisOutput {
            report: "report".to_string(),
        });

        let out_dir = tempfile::tempdir().unwrap();
        let out_path = write_partition(out_dir.path(), "fi", &records).unwrap();
        assert_eq!(out_path, out_dir.path().join("annotated_fi.csv"));

        let mut reader = csv::Reader::from_path(&out_path).unwrap();
        let row: std::collections::HashMap<String, String> =
            reader.deserialize().next().unwrap().unwrap();
        assert_eq!(row["frames"], "a/1.jpg,a/2.jpg");
        assert_eq!(row["ocr"], r#"["VOTE",""]"#);
        assert_eq!(row["transcript"], "hei");
        assert_eq!(row["transcript_translated"], "hi");
        assert_eq!(row["summary"], "report");
        // Annotation never ran, so the analysis column is an empty sequence.
        assert_eq!(row["frame_analysis"], "[]");
    }

    #[test]
    fn test_write_partition_overwrites() {
        let (_dir, path) = write_dataset(&[
            "alice,v1,fi,FI,true,hello,1717000000,75.0,1,2,3,4,Alice,bio",
            "dave,v4,fi,FI,true,terve,1717000003,200.0,1,2,3,4,Dave,bio",
        ]);
        let records = load_partition(&path, "fi").unwrap();

        let out_dir = tempfile::tempdir().unwrap();
        write_partition(out_dir.path(), "fi", &records).unwrap();
        let out_path = write_partition(out_dir.path(), "fi", &records[..1]).unwrap();

        let mut reader = csv::Reader::from_path(&out_path).unwrap();
        assert_eq!(reader.records().count(), 1);
    }
}

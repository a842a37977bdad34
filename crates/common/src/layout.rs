//! Deterministic media and frame storage layout
//!
//! Video files are addressed by (country, creator, video id); extracted
//! frames live in a per-(creator, video) directory, numbered from 1 in
//! timeline order.

use crate::RecordKey;
use std::path::{Path, PathBuf};

/// Path of the raw video file for a record.
#[must_use]
pub fn video_path(media_root: &Path, country: &str, key: &RecordKey) -> PathBuf {
    media_root
        .join(country)
        .join(&key.creator_id)
        .join(format!("{}.mp4", key.video_id))
}

/// Directory that holds the extracted frames for a record.
#[must_use]
pub fn frame_dir(frames_root: &Path, key: &RecordKey) -> PathBuf {
    frames_root.join(&key.creator_id).join(&key.video_id)
}

/// Path of one extracted frame, 1-based index.
#[must_use]
pub fn frame_path(frame_dir: &Path, frame_index: usize) -> PathBuf {
    frame_dir.join(format!("{frame_index}.jpg"))
}

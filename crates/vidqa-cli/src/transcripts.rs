//! Transcript file loading into the in-memory store.
//!
//! Files use the speech-to-text output shape:
//!
//! ```json
//! { "text": "full text", "segments": [{ "start": 0.0, "end": 4.2, "text": "Hello" }] }
//! ```
//!
//! The video id is the file stem. A directory loads every `*.json` inside it.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};
use vidqa_core::{InMemoryStore, Transcript, TranscriptSegment};

use crate::error::CliError;

#[derive(Debug, Deserialize)]
struct TranscriptFile {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    segments: Vec<SegmentRecord>,
}

#[derive(Debug, Deserialize)]
struct SegmentRecord {
    start: f64,
    end: f64,
    text: String,
}

/// Load `path` (a file or a directory of files) into `store`.
///
/// Returns the number of videos loaded.
pub fn load_transcripts(path: &Path, store: &InMemoryStore) -> Result<usize, CliError> {
    let files = if path.is_dir() {
        json_files_in(path)?
    } else {
        vec![path.to_path_buf()]
    };

    for file in &files {
        let (video_id, transcript) = load_file(file)?;
        debug!(
            video_id = %video_id,
            segments = transcript.segments.len(),
            "Loaded transcript"
        );
        store.insert_transcript(video_id, transcript);
    }

    info!(videos = files.len(), path = %path.display(), "Loaded transcripts");
    Ok(files.len())
}

fn json_files_in(dir: &Path) -> Result<Vec<PathBuf>, CliError> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    Ok(files)
}

fn load_file(path: &Path) -> Result<(String, Transcript), CliError> {
    let video_id = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .ok_or_else(|| CliError::Transcript(format!("{}: no usable file name", path.display())))?
        .to_string();

    let text = fs::read_to_string(path)?;
    let file: TranscriptFile = serde_json::from_str(&text)
        .map_err(|e| CliError::Transcript(format!("{}: {e}", path.display())))?;

    // Speech-to-text output often contains silent, empty segments
    let segments = file
        .segments
        .into_iter()
        .filter(|record| !record.text.trim().is_empty())
        .map(|record| TranscriptSegment::new(record.start, record.end, record.text.trim()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| CliError::Transcript(format!("{}: {e}", path.display())))?;

    let mut transcript = Transcript::from_segments(segments);
    if let Some(full_text) = file.text.filter(|t| !t.trim().is_empty()) {
        transcript.full_text = full_text.trim().to_string();
    }
    Ok((video_id, transcript))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidqa_core::TranscriptStore;

    const LECTURE: &str = r#"{
        "text": " Welcome. Today: caches. ",
        "segments": [
            {"start": 0.0, "end": 2.0, "text": " Welcome. "},
            {"start": 2.0, "end": 2.5, "text": "   "},
            {"start": 2.5, "end": 6.0, "text": "Today: caches."}
        ]
    }"#;

    #[tokio::test]
    async fn test_loads_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("lecture.json"), LECTURE).unwrap();
        fs::write(dir.path().join("intro.json"), r#"{"segments": [{"start": 1, "end": 3, "text": "hi"}]}"#).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let store = InMemoryStore::new();
        assert_eq!(load_transcripts(dir.path(), &store).unwrap(), 2);
        assert_eq!(store.video_ids(), vec!["intro", "lecture"]);

        let lecture = store.get_transcript("lecture").await.unwrap().unwrap();
        assert_eq!(lecture.segments.len(), 2);
        assert_eq!(lecture.segments[0].text, "Welcome.");
        assert_eq!(lecture.full_text, "Welcome. Today: caches.");

        let intro = store.get_transcript("intro").await.unwrap().unwrap();
        assert_eq!(intro.full_text, "hi");
    }

    #[test]
    fn test_rejects_inverted_segment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{"segments": [{"start": 5, "end": 1, "text": "oops"}]}"#).unwrap();

        let err = load_transcripts(&path, &InMemoryStore::new()).unwrap_err();
        assert!(matches!(err, CliError::Transcript(_)));
        assert_eq!(err.exit_code(), 65);
    }

    #[test]
    fn test_rejects_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            load_transcripts(&path, &InMemoryStore::new()),
            Err(CliError::Transcript(_))
        ));
    }
}

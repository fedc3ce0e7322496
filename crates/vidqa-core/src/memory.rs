//! In-memory record store and lexical segment search.
//!
//! Backs the CLI when transcripts are loaded from JSON files and serves as
//! the store in tests. Search scores a segment by the fraction of distinct
//! query terms it contains.

use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use crate::domain::{QuizItem, ScoredSegment, Transcript};
use crate::ports::{RepositoryError, SegmentSearch, TranscriptStore};

#[derive(Debug, Default, Clone)]
struct VideoRecord {
    transcript: Option<Transcript>,
    summary: Option<String>,
    quiz: Option<Vec<QuizItem>>,
}

/// Transcript, summary and quiz records keyed by video id.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<HashMap<String, VideoRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the transcript for `video_id`.
    pub fn insert_transcript(&self, video_id: impl Into<String>, transcript: Transcript) {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        records.entry(video_id.into()).or_default().transcript = Some(transcript);
    }

    pub fn video_ids(&self) -> Vec<String> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<String> = records.keys().cloned().collect();
        ids.sort();
        ids
    }

    fn read<T>(&self, video_id: &str, f: impl FnOnce(&VideoRecord) -> Option<T>) -> Option<T> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records.get(video_id).and_then(f)
    }

    fn write(&self, video_id: &str, f: impl FnOnce(&mut VideoRecord)) {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        f(records.entry(video_id.to_string()).or_default());
    }
}

#[async_trait]
impl TranscriptStore for InMemoryStore {
    async fn get_transcript(&self, video_id: &str) -> Result<Option<Transcript>, RepositoryError> {
        Ok(self.read(video_id, |r| r.transcript.clone()))
    }

    async fn get_summary(&self, video_id: &str) -> Result<Option<String>, RepositoryError> {
        Ok(self.read(video_id, |r| r.summary.clone()))
    }

    async fn save_summary(&self, video_id: &str, summary: &str) -> Result<(), RepositoryError> {
        self.write(video_id, |r| r.summary = Some(summary.to_string()));
        Ok(())
    }

    async fn get_quiz(&self, video_id: &str) -> Result<Option<Vec<QuizItem>>, RepositoryError> {
        Ok(self.read(video_id, |r| r.quiz.clone()))
    }

    async fn save_quiz(&self, video_id: &str, quiz: &[QuizItem]) -> Result<(), RepositoryError> {
        self.write(video_id, |r| r.quiz = Some(quiz.to_vec()));
        Ok(())
    }
}

#[async_trait]
impl SegmentSearch for InMemoryStore {
    async fn search(
        &self,
        query: &str,
        video_id: &str,
        k: usize,
    ) -> Result<Vec<ScoredSegment>, RepositoryError> {
        let terms = terms(query);
        if terms.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let Some(transcript) = self.read(video_id, |r| r.transcript.clone()) else {
            return Ok(Vec::new());
        };

        #[allow(clippy::cast_precision_loss)]
        let mut scored: Vec<ScoredSegment> = transcript
            .segments
            .into_iter()
            .filter_map(|segment| {
                let words = terms_of(&segment.text);
                let hits = terms.iter().filter(|t| words.contains(*t)).count();
                (hits > 0).then(|| ScoredSegment {
                    score: hits as f32 / terms.len() as f32,
                    segment,
                })
            })
            .collect();

        // Stable sort keeps transcript order among equal scores.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        Ok(scored)
    }
}

fn terms(text: &str) -> HashSet<String> {
    terms_of(text)
        .into_iter()
        .filter(|t| t.chars().count() > 2)
        .collect()
}

fn terms_of(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

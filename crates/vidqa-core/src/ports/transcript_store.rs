//! Record store port definition.
//!
//! Transcripts, summaries and quizzes are persisted by an external store
//! keyed by video id.

use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::{QuizItem, Transcript};

/// Port for the external record store.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Get the most recent transcript for a video, if any.
    async fn get_transcript(&self, video_id: &str) -> Result<Option<Transcript>, RepositoryError>;

    /// Get the stored summary for a video, if any.
    async fn get_summary(&self, video_id: &str) -> Result<Option<String>, RepositoryError>;

    /// Persist a summary for a video, replacing any previous one.
    async fn save_summary(&self, video_id: &str, summary: &str) -> Result<(), RepositoryError>;

    /// Get the stored quiz for a video, if any.
    async fn get_quiz(&self, video_id: &str) -> Result<Option<Vec<QuizItem>>, RepositoryError>;

    /// Persist a quiz for a video, replacing any previous one.
    async fn save_quiz(&self, video_id: &str, quiz: &[QuizItem]) -> Result<(), RepositoryError>;
}

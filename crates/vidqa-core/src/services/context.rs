//! Prompt context assembly from transcript material.

use std::sync::Arc;

use tracing::debug;

use crate::domain::TranscriptSegment;
use crate::ports::{RepositoryError, SegmentSearch};
use crate::settings::DEFAULT_SEARCH_K;
use crate::utils::format_position;

/// Returned in place of a context when a video has no transcript.
pub const NO_TRANSCRIPT: &str = "No transcript available for this video.";

/// Segments requested from search for navigation prompts.
pub const NAVIGATION_SEARCH_K: usize = 3;

/// Questions requested in a generated quiz.
pub const QUIZ_QUESTION_COUNT: usize = 5;

/// Builds the transcript portion of each prompt.
#[derive(Clone)]
pub struct ContextBuilder {
    search: Arc<dyn SegmentSearch>,
    qa_k: usize,
}

impl ContextBuilder {
    pub fn new(search: Arc<dyn SegmentSearch>) -> Self {
        Self {
            search,
            qa_k: DEFAULT_SEARCH_K,
        }
    }

    /// Number of segments requested for question answering.
    #[must_use]
    pub const fn with_qa_k(mut self, k: usize) -> Self {
        self.qa_k = k;
        self
    }

    /// Top `k` search hits, or the first `k` transcript segments when search
    /// returns nothing.
    pub async fn relevant_segments(
        &self,
        video_id: &str,
        query: &str,
        segments: &[TranscriptSegment],
        k: usize,
    ) -> Result<Vec<TranscriptSegment>, RepositoryError> {
        let hits = self.search.search(query, video_id, k).await?;
        if hits.is_empty() {
            debug!(video_id = %video_id, "Search returned no segments, using transcript head");
            return Ok(segments.iter().take(k).cloned().collect());
        }
        Ok(hits.into_iter().map(|hit| hit.segment).collect())
    }

    /// Context for answering `query`. `None` when there is nothing to show.
    pub async fn qa_context(
        &self,
        video_id: &str,
        query: &str,
        segments: &[TranscriptSegment],
    ) -> Result<Option<String>, RepositoryError> {
        let relevant = self
            .relevant_segments(video_id, query, segments, self.qa_k)
            .await?;
        if relevant.is_empty() {
            return Ok(None);
        }

        let mut parts = vec!["Here are relevant parts of the video transcript:".to_string()];
        parts.extend(relevant.iter().map(segment_line));
        Ok(Some(parts.join("\n\n")))
    }

    /// Context for locating the part of the video `query` refers to.
    pub async fn navigation_context(
        &self,
        video_id: &str,
        query: &str,
        segments: &[TranscriptSegment],
    ) -> Result<Option<String>, RepositoryError> {
        if segments.is_empty() {
            return Ok(None);
        }
        let relevant = self
            .relevant_segments(video_id, query, segments, NAVIGATION_SEARCH_K)
            .await?;

        let mut parts = vec![
            "The user wants to navigate to a specific part of the video.".to_string(),
            "Your task is to identify the most relevant timestamp based on their query."
                .to_string(),
            "Here are some relevant parts of the transcript:".to_string(),
        ];
        parts.extend(relevant.iter().map(segment_line));
        parts.push(
            "\nRespond with a timestamp (in the format MM:SS or HH:MM:SS) and a brief \
             explanation of why this is the right part of the video."
                .to_string(),
        );
        Ok(Some(parts.join("\n\n")))
    }

    pub fn summary_context(full_text: &str) -> Option<String> {
        if full_text.trim().is_empty() {
            return None;
        }
        Some(format!(
            "Here is the transcript of a video that needs to be summarized:\n\n{full_text}"
        ))
    }

    pub fn quiz_context(full_text: &str) -> Option<String> {
        if full_text.trim().is_empty() {
            return None;
        }
        let ask = format!(
            "\nCreate a quiz with {QUIZ_QUESTION_COUNT} questions based on the video content."
        );
        Some(
            [
                "Here is the transcript of a video that you need to create a quiz for:",
                full_text,
                ask.as_str(),
                "For each question, provide 4 possible answers with one correct answer.",
                "Format the output as a JSON array of objects with these fields: \
                 question, options (array), correctAnswerIndex",
            ]
            .join("\n\n"),
        )
    }
}

fn segment_line(segment: &TranscriptSegment) -> String {
    format!("[{}] {}", format_position(segment.start), segment.text)
}

//! Transcript types.
//!
//! Transcripts are produced by an external speech-to-text service and are
//! read-only to the core.

use serde::{Deserialize, Serialize};

use crate::ports::RepositoryError;

/// A timestamped unit of transcript text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds (>= start).
    pub end: f64,
    /// Spoken text for this span.
    pub text: String,
}

impl TranscriptSegment {
    /// Create a segment, rejecting negative or inverted spans and empty text.
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Result<Self, RepositoryError> {
        let text = text.into();
        if !start.is_finite() || start < 0.0 {
            return Err(RepositoryError::Invalid(format!(
                "segment start must be a non-negative number, got {start}"
            )));
        }
        if !end.is_finite() || end < start {
            return Err(RepositoryError::Invalid(format!(
                "segment end ({end}) must not precede start ({start})"
            )));
        }
        if text.trim().is_empty() {
            return Err(RepositoryError::Invalid(
                "segment text must not be empty".to_string(),
            ));
        }
        Ok(Self { start, end, text })
    }
}

/// Full transcript of a video.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    /// Concatenated transcript text.
    pub full_text: String,
    /// Ordered segments with timing information.
    pub segments: Vec<TranscriptSegment>,
}

impl Transcript {
    /// Build a transcript whose full text is the segments joined by spaces.
    pub fn from_segments(segments: Vec<TranscriptSegment>) -> Self {
        let full_text = segments
            .iter()
            .map(|s| s.text.trim())
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            full_text,
            segments,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty() && self.full_text.trim().is_empty()
    }
}

/// A segment returned by similarity search, with its relevance score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredSegment {
    pub segment: TranscriptSegment,
    /// Higher is more relevant. Scale is defined by the search backend.
    pub score: f32,
}

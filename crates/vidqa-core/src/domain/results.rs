//! Tagged results returned by the public operations.
//!
//! Every operation returns one of these instead of an error: `success`
//! says whether the payload is meaningful and `error` carries a
//! human-readable reason when it is not.

use serde::{Deserialize, Serialize};

use super::quiz::QuizItem;
use crate::cache::Cacheable;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerResult {
    pub video_id: String,
    pub query: String,
    pub answer: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub video_id: String,
    pub summary: String,
    pub success: bool,
    /// True when the summary was generated by this call rather than loaded.
    pub regenerated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizResult {
    pub video_id: String,
    pub questions: Vec<QuizItem>,
    pub success: bool,
    pub regenerated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A transcript segment matching a text search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptMatch {
    pub start: f64,
    pub end: f64,
    pub text: String,
    /// Formatted start position.
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSearchResult {
    pub video_id: String,
    pub search_text: String,
    pub matches: Vec<TranscriptMatch>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Cacheable for AnswerResult {
    fn is_cacheable(&self) -> bool {
        self.success
    }
}

impl Cacheable for SummaryResult {
    fn is_cacheable(&self) -> bool {
        self.success
    }
}

impl Cacheable for QuizResult {
    fn is_cacheable(&self) -> bool {
        self.success
    }
}

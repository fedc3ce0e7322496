//! Core domain types.
//!
//! These types represent the pure domain model, independent of any
//! infrastructure concerns (process management, HTTP, storage).
//!
//! # Structure
//!
//! - `transcript` - Transcript and segment types supplied by the transcription service
//! - `generation` - Generation requests and per-use-case sampling profiles
//! - `navigation` - Navigation results and how they were resolved
//! - `quiz` - Quiz items and the validator for model-produced quiz payloads
//! - `results` - Tagged result objects returned by the public operations

pub mod generation;
pub mod navigation;
pub mod quiz;
pub mod results;
pub mod transcript;

pub use generation::{GenerationProfile, GenerationRequest};
pub use navigation::{NavigationResult, ResolvedBy};
pub use quiz::{QuizItem, validate_quiz_items};
pub use results::{
    AnswerResult, QuizResult, SummaryResult, TranscriptMatch, TranscriptSearchResult,
};
pub use transcript::{ScoredSegment, Transcript, TranscriptSegment};

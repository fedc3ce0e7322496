//! Core services - the application's business logic layer.
//!
//! Services orchestrate between ports and domain logic. They never know
//! about concrete adapters and never return errors from their public
//! operations: failures come back as tagged results.

mod assistant;
mod context;
mod generation_client;
mod navigation;
mod qa;
mod quiz;
mod summary;

pub use assistant::{ANSWER_QUESTION_OP, AssistantPorts, NAVIGATE_OP, VideoAssistant};
pub use context::{ContextBuilder, NAVIGATION_SEARCH_K, NO_TRANSCRIPT, QUIZ_QUESTION_COUNT};
pub use generation_client::{
    Confidence, Extracted, FALLBACK_TIMESTAMP, GenerationClient, INCOMPLETE_NAVIGATION_REASON,
    NavigationCandidate, UNPARSABLE_NAVIGATION_REASON,
};
pub use navigation::NavigationResolver;
pub use qa::{ANSWER_FAILED, QaEngine};
pub use quiz::{GENERATE_QUIZ_OP, QuizService};
pub use summary::{GENERATE_SUMMARY_OP, SUMMARY_FAILED, SummaryService};

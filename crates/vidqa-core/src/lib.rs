//! Core domain types, ports, caching and services for vidqa.
//!
//! This crate has no knowledge of processes or HTTP. The inference server
//! and other adapters live in `vidqa-runtime` and plug into the ports
//! defined here.

#![deny(unused_crate_dependencies)]

pub mod cache;
pub mod domain;
pub mod memory;
pub mod ports;
pub mod services;
pub mod settings;
pub mod utils;

// Re-export commonly used types for convenience
pub use cache::{CacheKey, CachePolicy, Cacheable, CachedOperation, KeyedCache};
pub use domain::{
    AnswerResult, GenerationProfile, GenerationRequest, NavigationResult, QuizItem, QuizResult,
    ResolvedBy, ScoredSegment, SummaryResult, Transcript, TranscriptMatch, TranscriptSearchResult,
    TranscriptSegment,
};
pub use memory::InMemoryStore;
pub use ports::{InferenceError, RepositoryError, SegmentSearch, TextGenerator, TranscriptStore};
pub use services::{
    AssistantPorts, Confidence, ContextBuilder, GenerationClient, NavigationCandidate,
    NavigationResolver, QaEngine, QuizService, SummaryService, VideoAssistant,
};
pub use settings::{Settings, SettingsError, validate_settings};
